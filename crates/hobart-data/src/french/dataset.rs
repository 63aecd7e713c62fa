//! Published daily factor datasets.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A daily factor dataset published in the Ken French data library.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactorDataset {
    /// Fama-French 3 factors: `Mkt-RF`, `SMB`, `HML` plus `RF`.
    #[display("3-factor-daily")]
    ThreeFactorDaily,
    /// Fama-French 5 factors (2x3 sorts): adds `RMW` and `CMA`.
    #[display("5-factor-daily")]
    FiveFactorDaily,
}

impl FactorDataset {
    /// File stem of the dataset in the data library.
    pub const fn file_stem(&self) -> &'static str {
        match self {
            Self::ThreeFactorDaily => "F-F_Research_Data_Factors_daily",
            Self::FiveFactorDaily => "F-F_Research_Data_5_Factors_2x3_daily",
        }
    }

    /// Columns the dataset is expected to carry.
    pub const fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::ThreeFactorDaily => &["Mkt-RF", "SMB", "HML", "RF"],
            Self::FiveFactorDaily => &["Mkt-RF", "SMB", "HML", "RMW", "CMA", "RF"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_labels() {
        assert_eq!(FactorDataset::ThreeFactorDaily.to_string(), "3-factor-daily");
        assert_eq!(FactorDataset::FiveFactorDaily.to_string(), "5-factor-daily");
    }

    #[test]
    fn test_five_factor_is_superset() {
        let three = FactorDataset::ThreeFactorDaily.columns();
        let five = FactorDataset::FiveFactorDaily.columns();
        assert!(three.iter().all(|c| five.contains(c)));
        assert!(five.contains(&"RMW") && five.contains(&"CMA"));
    }
}
