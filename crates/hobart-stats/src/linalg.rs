//! Dense linear algebra kernels.
//!
//! Symmetric eigendecomposition (Jacobi rotations), sample covariance,
//! and Gaussian elimination for the small systems least squares produces.

use crate::error::StatsError;
use ndarray::{Array1, Array2, Axis};

/// Pivot magnitude below which a system is treated as singular, relative
/// to the largest absolute entry of the matrix.
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Result of eigenvalue decomposition
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues (sorted in descending order)
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors (columns are eigenvectors)
    pub eigenvectors: Array2<f64>,
}

/// Jacobi eigenvalue decomposition for symmetric matrices
///
/// Repeatedly annihilates the largest off-diagonal element until every
/// off-diagonal element is below `tolerance` times the Frobenius norm of
/// the input, or `max_iterations` rotations have been applied.
///
/// # Arguments
/// * `matrix` - Symmetric matrix to decompose
/// * `max_iterations` - Maximum number of rotations
/// * `tolerance` - Relative convergence tolerance for off-diagonal elements
///
/// # Returns
/// * Eigenvalues and eigenvectors
pub fn jacobi_eigendecomp(
    matrix: &Array2<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> Result<EigenDecomposition, StatsError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(StatsError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }

    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);

    let norm = matrix.iter().map(|x| x * x).sum::<f64>().sqrt();
    let threshold = tolerance * norm.max(f64::MIN_POSITIVE);

    if n > 1 {
        for _iter in 0..max_iterations {
            let (p, q, max_val) = find_largest_off_diagonal(&a);

            if max_val.abs() < threshold {
                break;
            }

            let (cos_theta, sin_theta) = compute_rotation(a[[p, p]], a[[q, q]], a[[p, q]]);
            apply_jacobi_rotation(&mut a, &mut v, p, q, cos_theta, sin_theta);
        }
    }

    let eigenvalues: Array1<f64> = a.diag().to_owned();

    // Sort eigenvalues and eigenvectors in descending order
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&i, &j| {
        eigenvalues[j]
            .partial_cmp(&eigenvalues[i])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let sorted_eigenvalues = indices.iter().map(|&i| eigenvalues[i]).collect();
    let mut sorted_eigenvectors = Array2::<f64>::zeros((n, n));
    for (new_idx, &old_idx) in indices.iter().enumerate() {
        sorted_eigenvectors
            .column_mut(new_idx)
            .assign(&v.column(old_idx));
    }

    Ok(EigenDecomposition {
        eigenvalues: sorted_eigenvalues,
        eigenvectors: sorted_eigenvectors,
    })
}

/// Rotation budget for an `n x n` matrix: a handful of sweeps' worth.
pub const fn default_max_rotations(n: usize) -> usize {
    let budget = 30 * n * n;
    if budget < 100 { 100 } else { budget }
}

/// Find the largest off-diagonal element in a symmetric matrix
fn find_largest_off_diagonal(matrix: &Array2<f64>) -> (usize, usize, f64) {
    let n = matrix.nrows();
    let mut max_val = 0.0;
    let mut p = 0;
    let mut q = 1;

    for i in 0..n {
        for j in (i + 1)..n {
            let val = matrix[[i, j]].abs();
            if val > max_val {
                max_val = val;
                p = i;
                q = j;
            }
        }
    }

    (p, q, matrix[[p, q]])
}

/// Compute the rotation (cos, sin) for Jacobi rotation
fn compute_rotation(app: f64, aqq: f64, apq: f64) -> (f64, f64) {
    if apq.abs() < 1e-300 {
        return (1.0, 0.0);
    }

    let tau = (aqq - app) / (2.0 * apq);
    let t = if tau >= 0.0 {
        1.0 / (tau + (1.0 + tau * tau).sqrt())
    } else {
        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
    };

    let cos_theta = 1.0 / (1.0 + t * t).sqrt();
    let sin_theta = t * cos_theta;

    (cos_theta, sin_theta)
}

/// Apply a Jacobi rotation to matrix A and eigenvector matrix V
fn apply_jacobi_rotation(
    a: &mut Array2<f64>,
    v: &mut Array2<f64>,
    p: usize,
    q: usize,
    cos_theta: f64,
    sin_theta: f64,
) {
    let n = a.nrows();

    let app = a[[p, p]];
    let aqq = a[[q, q]];
    let apq = a[[p, q]];

    a[[p, p]] = cos_theta * cos_theta * app - 2.0 * cos_theta * sin_theta * apq
        + sin_theta * sin_theta * aqq;
    a[[q, q]] = sin_theta * sin_theta * app
        + 2.0 * cos_theta * sin_theta * apq
        + cos_theta * cos_theta * aqq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for i in 0..n {
        if i != p && i != q {
            let aip = a[[i, p]];
            let aiq = a[[i, q]];

            a[[i, p]] = cos_theta * aip - sin_theta * aiq;
            a[[p, i]] = a[[i, p]];

            a[[i, q]] = sin_theta * aip + cos_theta * aiq;
            a[[q, i]] = a[[i, q]];
        }
    }

    for i in 0..n {
        let vip = v[[i, p]];
        let viq = v[[i, q]];

        v[[i, p]] = cos_theta * vip - sin_theta * viq;
        v[[i, q]] = sin_theta * vip + cos_theta * viq;
    }
}

/// Column means and sample covariance (denominator `n - 1`) of `data`,
/// where rows are observations and columns are variables.
pub fn sample_covariance(data: &Array2<f64>) -> Result<(Array1<f64>, Array2<f64>), StatsError> {
    let n = data.nrows();
    if n < 2 {
        return Err(StatsError::InsufficientData {
            required: 2,
            actual: n,
        });
    }

    let means = data
        .mean_axis(Axis(0))
        .ok_or(StatsError::InsufficientData {
            required: 2,
            actual: n,
        })?;
    let centered = data - &means;
    let cov = centered.t().dot(&centered) / (n - 1) as f64;

    Ok((means, cov))
}

/// Compute the condition number of a symmetric matrix
///
/// The ratio of the largest to smallest eigenvalue magnitude; infinity
/// when the smallest is numerically zero.
pub fn condition_number(matrix: &Array2<f64>) -> f64 {
    match jacobi_eigendecomp(matrix, default_max_rotations(matrix.nrows()), 1e-14) {
        Ok(decomp) => {
            let max_eig = decomp
                .eigenvalues
                .iter()
                .map(|v| v.abs())
                .fold(f64::NEG_INFINITY, f64::max);
            let min_eig = decomp
                .eigenvalues
                .iter()
                .map(|v| v.abs())
                .fold(f64::INFINITY, f64::min);

            if min_eig < 1e-300 {
                f64::INFINITY
            } else {
                max_eig / min_eig
            }
        }
        Err(_) => f64::INFINITY,
    }
}

/// Solve `a x = b` by Gaussian elimination with partial pivoting.
pub fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, StatsError> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(StatsError::DimensionMismatch {
            expected: n,
            actual: a.ncols(),
        });
    }
    if b.len() != n {
        return Err(StatsError::DimensionMismatch {
            expected: n,
            actual: b.len(),
        });
    }

    let mut aug = Array2::zeros((n, n + 1));
    aug.slice_mut(ndarray::s![.., ..n]).assign(a);
    aug.column_mut(n).assign(b);

    eliminate(&mut aug, n)?;

    // Back substitution
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = aug[[i, n]];
        for j in (i + 1)..n {
            sum -= aug[[i, j]] * x[j];
        }
        x[i] = sum / aug[[i, i]];
    }

    Ok(x)
}

/// Invert a square matrix by Gauss-Jordan elimination.
pub fn invert(a: &Array2<f64>) -> Result<Array2<f64>, StatsError> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(StatsError::DimensionMismatch {
            expected: n,
            actual: a.ncols(),
        });
    }

    let mut aug = Array2::zeros((n, 2 * n));
    aug.slice_mut(ndarray::s![.., ..n]).assign(a);
    aug.slice_mut(ndarray::s![.., n..]).assign(&Array2::<f64>::eye(n));

    eliminate(&mut aug, n)?;

    // Reduce to the identity from the bottom up
    for col in (0..n).rev() {
        let pivot = aug[[col, col]];
        aug.row_mut(col).mapv_inplace(|v| v / pivot);
        for row in 0..col {
            let factor = aug[[row, col]];
            if factor != 0.0 {
                let pivot_row = aug.row(col).to_owned();
                aug.row_mut(row).scaled_add(-factor, &pivot_row);
            }
        }
    }

    Ok(aug.slice(ndarray::s![.., n..]).to_owned())
}

/// Forward elimination with partial pivoting over the first `n` columns of
/// an augmented matrix, leaving it upper triangular in that block.
fn eliminate(aug: &mut Array2<f64>, n: usize) -> Result<(), StatsError> {
    let width = aug.ncols();
    let scale = aug
        .slice(ndarray::s![.., ..n])
        .iter()
        .fold(0.0_f64, |m, v| m.max(v.abs()));
    if n == 0 || scale == 0.0 {
        return Err(StatsError::Singular("matrix is zero or empty".to_string()));
    }

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[[col, col]].abs();
        for row in (col + 1)..n {
            if aug[[row, col]].abs() > max_val {
                max_val = aug[[row, col]].abs();
                max_row = row;
            }
        }

        if max_val < SINGULAR_TOLERANCE * scale {
            return Err(StatsError::Singular(
                "matrix is singular or nearly singular".to_string(),
            ));
        }

        if max_row != col {
            for j in 0..width {
                aug.swap([col, j], [max_row, j]);
            }
        }

        for row in (col + 1)..n {
            let factor = aug[[row, col]] / aug[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for j in col..width {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    Ok(())
}
