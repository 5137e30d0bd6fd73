use serde::{Deserialize, Deserializer, Serialize};

use super::RecordError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
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
            type Err = RecordError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(RecordError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(RecommendedAction {
    NoAction => "no_action",
    Monitor => "monitor",
    Escalate => "escalate",
    Emergency => "emergency",
});

impl RecommendedAction {
    /// The full label set in ordinal order. Label ordinals are fixed at
    /// training time; tie-breaking in the classifier relies on this order.
    pub const ALL: [RecommendedAction; 4] = [
        RecommendedAction::NoAction,
        RecommendedAction::Monitor,
        RecommendedAction::Escalate,
        RecommendedAction::Emergency,
    ];

    pub fn ordinal(&self) -> usize {
        Self::ALL
            .iter()
            .position(|a| a == self)
            .unwrap_or(Self::ALL.len())
    }
}

/// Patient gender as reported at ingestion.
///
/// Unrecognized raw values collapse to `Unknown` rather than failing
/// deserialization — novel categorical values must never reject a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::Unknown => "unknown",
        }
    }

    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "male" | "m" => Gender::Male,
            "female" | "f" => Gender::Female,
            "other" => Gender::Other,
            _ => Gender::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for Gender {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Gender::from_raw(&raw))
    }
}

/// Smoking status with the same lenient-ingestion behavior as [`Gender`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SmokingStatus {
    Never,
    Former,
    Current,
    #[default]
    Unknown,
}

impl SmokingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmokingStatus::Never => "never",
            SmokingStatus::Former => "former",
            SmokingStatus::Current => "current",
            SmokingStatus::Unknown => "unknown",
        }
    }

    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "never" => SmokingStatus::Never,
            "former" => SmokingStatus::Former,
            "current" => SmokingStatus::Current,
            _ => SmokingStatus::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for SmokingStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(SmokingStatus::from_raw(&raw))
    }
}
