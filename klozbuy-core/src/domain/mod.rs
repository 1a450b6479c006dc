//! Row shapes and request payloads for every entity the API serves.

/// Declares a lowercase string-backed enum that round-trips through serde and
/// database text columns.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::common::error::KlozbuyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(crate::common::error::KlozbuyError::Storage {
                        message: format!("unknown {} value '{}'", stringify!($name), other),
                    }),
                }
            }
        }
    };
}

pub(crate) use text_enum;

/// Deserializes a clearable field of a partial update: absent stays `None`
/// (keep) while an explicit `null` becomes `Some(None)` (clear).
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    <Option<T> as serde::Deserialize<'de>>::deserialize(deserializer).map(Some)
}

mod business;
mod follow;
mod location;
mod media;
mod mention;
mod post;
mod user;

pub use business::*;
pub use follow::*;
pub use location::*;
pub use media::*;
pub use mention::*;
pub use post::*;
pub use user::*;
