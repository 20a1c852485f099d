use serde::{Deserialize, Serialize};

/// A stored or wire string that matches no variant of the target enum.
#[derive(Debug, thiserror::Error)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
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
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Criticality {
    Low => "low",
    High => "high",
    UnableToAssess => "unable-to-assess",
});

impl Criticality {
    /// Precedence when several allergy matches compete for the reported
    /// reason. Unassessed allergies rank above low: an unknown severity is
    /// treated as potentially serious.
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 2,
            Self::UnableToAssess => 1,
            Self::Low => 0,
        }
    }
}

str_enum!(AllergyKind {
    Allergy => "allergy",
    Intolerance => "intolerance",
});

str_enum!(MedicationStatus {
    Active => "active",
    Completed => "completed",
    Stopped => "stopped",
    OnHold => "on-hold",
    Intended => "intended",
    EnteredInError => "entered-in-error",
    NotTaken => "not-taken",
    Unknown => "unknown",
});

str_enum!(UnknownMedicationPolicy {
    Block => "block",
    Permissive => "permissive",
});
