use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! newtype_string {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        #[cfg_attr(feature = "openapi", schema(value_type = String))]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Return the inner string as a str slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(Token, "An externally generated string identifying one redemption right.");
newtype_string!(ResourceId, "An opaque reference to a stored file.");
newtype_string!(PathPrefix, "The URL path segment that precedes a token.");

impl Token {
    /// Whether the token can appear as the last segment of a request URL.
    ///
    /// Requests are split on their last `/` and cut at `?`, so a token that
    /// contains either character could never be matched.
    #[must_use]
    pub fn is_addressable(&self) -> bool {
        !self.0.is_empty() && !self.0.contains(['/', '?'])
    }

    /// A shortened form safe to put in logs.
    #[must_use]
    pub fn masked(&self) -> String {
        let visible: String = self.0.chars().take(4).collect();
        if visible.len() == self.0.len() {
            "****".to_owned()
        } else {
            format!("{visible}****")
        }
    }
}

impl PathPrefix {
    /// Normalize a submitted prefix: ensure a leading `/` and strip trailing
    /// slashes. Returns `None` when nothing but slashes (or whitespace) remain.
    #[must_use]
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().trim_end_matches('/');
        let body = trimmed.trim_start_matches('/');
        if body.is_empty() {
            return None;
        }
        Some(Self(format!("/{body}")))
    }
}
