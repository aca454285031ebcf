//! Macro for implementing Display and FromStr for status enums
//!
//! CRM status values are persisted and exchanged as their human-facing
//! labels ("Site Survey", "Not Sent"), so the macro keeps the label exactly
//! as written for Display and parses case-insensitively on the way back in.

/// Implements Display and FromStr traits for status enums
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $label` - Mapping of enum variants to their persisted
///   labels
///
/// # Features
///
/// - Display writes the label verbatim (labels are title-case in the CRM)
/// - Case-insensitive parsing ("SITE SURVEY" and "site survey" both work)
/// - Descriptive error messages with enum name
#[macro_export]
macro_rules! impl_status_conversions {
    ($enum_name:ident { $($variant:ident => $label:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $label),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(if s.eq_ignore_ascii_case($label) {
                    return Ok(Self::$variant);
                })+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}
