//! Named sequences and their external identifier formats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::IdError;

/// Generates the sequence enum with `as_str`, `ALL` and `FromStr`.
///
/// Counter record names are the camelCase strings; anything else is
/// rejected with `InvalidSequenceName` before reaching the store.
macro_rules! sequence_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(IdError::InvalidSequenceName(s.into())),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

sequence_enum!(Sequence {
    PatientId => "patientId",
    OrderNumber => "orderNumber",
    ReportNumber => "reportNumber",
    TestCode => "testCode",
    SampleId => "sampleId",
    Barcode => "barcode",
});

/// Date segment embedded between the prefix and the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateComponent {
    None,
    /// Four-digit calendar year.
    Year,
    /// `YYYYMMDD`.
    Date,
}

/// External representation rule of one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceFormat {
    pub prefix: &'static str,
    pub date: DateComponent,
    /// Minimum digit count; wider numbers are never truncated.
    pub width: usize,
}

impl SequenceFormat {
    /// Build the identifier for `value` at instant `now` (UTC).
    pub fn render(&self, value: u64, now: DateTime<Utc>) -> String {
        let width = self.width;
        match self.date {
            DateComponent::None => format!("{}-{value:0width$}", self.prefix),
            DateComponent::Year => {
                format!("{}-{}-{value:0width$}", self.prefix, now.format("%Y"))
            }
            DateComponent::Date => {
                format!("{}-{}-{value:0width$}", self.prefix, now.format("%Y%m%d"))
            }
        }
    }
}

impl Sequence {
    pub fn format(&self) -> SequenceFormat {
        match self {
            Sequence::PatientId => SequenceFormat { prefix: "PAT", date: DateComponent::Year, width: 6 },
            Sequence::OrderNumber => SequenceFormat { prefix: "ORD", date: DateComponent::Year, width: 6 },
            Sequence::ReportNumber => SequenceFormat { prefix: "RPT", date: DateComponent::Year, width: 6 },
            Sequence::TestCode => SequenceFormat { prefix: "TST", date: DateComponent::None, width: 4 },
            Sequence::SampleId => SequenceFormat { prefix: "SPL", date: DateComponent::Year, width: 6 },
            Sequence::Barcode => SequenceFormat { prefix: "SMP", date: DateComponent::Date, width: 6 },
        }
    }

    /// Sequence owning an identifier prefix such as `"PAT"`.
    pub fn from_prefix(prefix: &str) -> Option<Sequence> {
        Sequence::ALL.iter().copied().find(|s| s.format().prefix == prefix)
    }
}
