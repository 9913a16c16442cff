use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidValue {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(ProductionLine {
    All => "all",
    Standard => "standard",
    Surplus => "surplus",
});

str_enum!(ReinsuranceProgram {
    Standard => "standard",
    Surplus => "surplus",
});

str_enum!(HazardLevel {
    Low => "low",
    BelowAverage => "below_average",
    Average => "average",
    AboveAverage => "above_average",
    High => "high",
});

impl Default for ProductionLine {
    fn default() -> Self {
        ProductionLine::All
    }
}

/// Agency status as recorded on production reports.
///
/// Not a closed set: unrecognised spreadsheet values are kept verbatim,
/// so this only classifies the common spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveFlag {
    Active,
    Inactive,
}

impl ActiveFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveFlag::Active => "Active",
            ActiveFlag::Inactive => "Inactive",
        }
    }

    pub fn classify(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "y" | "yes" | "active" | "1" | "true" => Some(ActiveFlag::Active),
            "n" | "no" | "inactive" | "0" | "false" => Some(ActiveFlag::Inactive),
            _ => None,
        }
    }

    /// Canonical spelling for known values, trimmed input otherwise.
    pub fn normalize(raw: &str) -> String {
        match Self::classify(raw) {
            Some(flag) => flag.as_str().to_string(),
            None => raw.trim().to_string(),
        }
    }
}
