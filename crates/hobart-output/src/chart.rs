//! Chart descriptions for the presentation layer.
//!
//! A [`Chart`] is plain data: a title, axis labels and a list of traces.
//! Renderers consume the JSON form. A chart built from an empty series has
//! no traces and acts as a placeholder.

use hobart_stats::{PcaResult, RollingOlsResult};
use serde::{Deserialize, Serialize};

/// Single data series within a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    /// Categorical bars.
    Bar {
        /// Legend label.
        name: String,
        /// Category labels.
        x: Vec<String>,
        /// Bar heights.
        y: Vec<f64>,
    },
    /// Connected line, categorical or date x-axis.
    Line {
        /// Legend label.
        name: String,
        /// X values as labels (dates render as `YYYY-MM-DD`).
        x: Vec<String>,
        /// Y values.
        y: Vec<f64>,
        /// Draw a marker at each point.
        markers: bool,
    },
    /// Labelled points.
    Scatter {
        /// Legend label.
        name: String,
        /// X coordinates.
        x: Vec<f64>,
        /// Y coordinates.
        y: Vec<f64>,
        /// Text shown next to each point.
        text: Vec<String>,
    },
}

impl Trace {
    /// Number of points in the trace.
    pub fn len(&self) -> usize {
        match self {
            Self::Bar { y, .. } | Self::Line { y, .. } | Self::Scatter { y, .. } => y.len(),
        }
    }

    /// Whether the trace has no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Legend label.
    pub fn name(&self) -> &str {
        match self {
            Self::Bar { name, .. } | Self::Line { name, .. } | Self::Scatter { name, .. } => name,
        }
    }
}

/// A chart with its layout labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    /// Chart title.
    pub title: String,
    /// X-axis label.
    pub x_axis: String,
    /// Y-axis label.
    pub y_axis: String,
    /// Data series, empty for a placeholder.
    pub traces: Vec<Trace>,
}

impl Chart {
    /// Create a chart with no traces.
    pub fn new(
        title: impl Into<String>,
        x_axis: impl Into<String>,
        y_axis: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            x_axis: x_axis.into(),
            y_axis: y_axis.into(),
            traces: Vec::new(),
        }
    }

    /// Add a trace, skipping it when it has no points.
    pub fn with_trace(mut self, trace: Trace) -> Self {
        if !trace.is_empty() {
            self.traces.push(trace);
        }
        self
    }

    /// Whether the chart has nothing to draw.
    pub fn is_placeholder(&self) -> bool {
        self.traces.is_empty()
    }
}

/// The three PCA views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaCharts {
    /// Explained variance ratio per component.
    pub bar: Chart,
    /// Cumulative explained variance.
    pub line: Chart,
    /// Exposures on the first two components, labelled by ticker.
    pub scatter: Chart,
}

impl PcaCharts {
    /// Placeholder charts shown before any analysis has run.
    pub fn placeholder() -> Self {
        pca_charts(&PcaResult::empty())
    }
}

fn component_labels(k: usize) -> Vec<String> {
    (1..=k).map(|i| format!("PC{i}")).collect()
}

/// Shape a PCA fit into bar, line and scatter charts.
///
/// With a single component the scatter's second coordinate is zero for
/// every ticker.
pub fn pca_charts(result: &PcaResult) -> PcaCharts {
    let k = result.n_components();
    let labels = component_labels(k);

    let bar = Chart::new(
        "Explained Variance by Components",
        "Principal Components",
        "Explained Variance",
    )
    .with_trace(Trace::Bar {
        name: "Explained Variance".to_string(),
        x: labels.clone(),
        y: result.explained_variance_ratio.to_vec(),
    });

    let line = Chart::new(
        "Cumulative Explained Variance",
        "Principal Components",
        "Cumulative Explained Variance",
    )
    .with_trace(Trace::Line {
        name: "Cumulative Explained Variance".to_string(),
        x: labels,
        y: result.cumulative_variance_ratio.to_vec(),
        markers: true,
    });

    let exposures = &result.factor_exposures;
    let (x, y) = if k == 0 {
        (Vec::new(), Vec::new())
    } else {
        let x = exposures.column(0).to_vec();
        let y = if k > 1 {
            exposures.column(1).to_vec()
        } else {
            vec![0.0; x.len()]
        };
        (x, y)
    };
    let scatter = Chart::new("Scatter Plot of First Two Factors", "Factor 1", "Factor 2")
        .with_trace(Trace::Scatter {
            name: "Exposures".to_string(),
            x,
            y,
            text: result.assets.clone(),
        });

    PcaCharts { bar, line, scatter }
}

/// One line per coefficient of a rolling regression, indexed by window end.
pub fn rolling_coefficients_chart(result: &RollingOlsResult) -> Chart {
    let dates: Vec<String> = result
        .dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();

    result.names.iter().enumerate().fold(
        Chart::new("Rolling Factor Coefficients", "Date", "Coefficient"),
        |chart, (idx, name)| {
            chart.with_trace(Trace::Line {
                name: name.clone(),
                x: dates.clone(),
                y: result.params.column(idx).to_vec(),
                markers: false,
            })
        },
    )
}
