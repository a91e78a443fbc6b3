//! Closed string-labelled enumerations.
//!
//! Statuses, roles and priorities are stored as text columns and sent as JSON
//! strings. [`define_label_enum!`] generates the enum together with its
//! `as_str`, `Display`, `FromStr` and serde implementations so the label is
//! written down exactly once.

/// Define a fieldless enum whose variants map one-to-one onto string labels.
///
/// Parsing an unknown label yields
/// [`ValidationError::UnknownValue`](crate::error::ValidationError::UnknownValue).
#[macro_export]
macro_rules! define_label_enum {
    (
        $(#[doc = $doc:expr])*
        $name:ident ($kind:literal) {
            $($(#[doc = $vdoc:expr])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($(#[doc = $vdoc])* #[serde(rename = $label)] $variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The stored / wire label.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Self::$variant),)+
                    other => Err($crate::error::ValidationError::UnknownValue {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}
