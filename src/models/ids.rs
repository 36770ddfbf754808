//! Identifier newtypes
//!
//! Ids arrive as raw strings from CLI arguments and API responses. Wrapping
//! them keeps a post id from being passed where a user id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw id string
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Valid iff non-empty after trimming
            pub fn is_valid(&self) -> bool {
                !self.0.trim().is_empty()
            }

            /// Borrow the raw id
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Unwrap into the raw id
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&String> for $name {
            fn from(id: &String) -> Self {
                Self(id.clone())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Id of a published post or reply
    PostId
);
string_id!(
    /// Id of a user account
    UserId
);
string_id!(
    /// Id of a media container awaiting publish
    ContainerId
);
string_id!(
    /// Id of a tagged location
    LocationId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_tracks_trimmed_emptiness() {
        for raw in ["", " ", "\t\n", "123", " 123 ", "abc"] {
            assert_eq!(PostId::from(raw).is_valid(), !raw.trim().is_empty(), "{raw:?}");
            assert_eq!(UserId::from(raw).is_valid(), !raw.trim().is_empty(), "{raw:?}");
            assert_eq!(ContainerId::from(raw).is_valid(), !raw.trim().is_empty(), "{raw:?}");
            assert_eq!(LocationId::from(raw).is_valid(), !raw.trim().is_empty(), "{raw:?}");
        }
    }

    #[test]
    fn test_equality_is_string_equality() {
        assert_eq!(PostId::from("123"), PostId::new(String::from("123")));
        assert_ne!(PostId::from("123"), PostId::from(" 123"));
    }

    #[test]
    fn test_serde_is_transparent() {
        let id: UserId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(id.as_str(), "42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
        assert_eq!(id.to_string(), "42");
    }
}
