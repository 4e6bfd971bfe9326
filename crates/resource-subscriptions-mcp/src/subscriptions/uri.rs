//! Canonical resource identifiers.

use std::borrow::Borrow;
use std::fmt;

/// A resource URI in canonical textual form.
///
/// Canonicalisation trims surrounding whitespace and lower-cases the scheme.
/// The rest of the URI is kept verbatim, so `res://A` and `res://a` are
/// different resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceUri(String);

impl ResourceUri {
    /// Canonicalise a URI.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        let canonical = match trimmed.split_once("://") {
            Some((scheme, rest)) if !scheme.is_empty() => {
                format!("{}://{rest}", scheme.to_ascii_lowercase())
            }
            _ => trimmed.to_string(),
        };
        Self(canonical)
    }

    /// The canonical string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The scheme, if the URI has one.
    pub fn scheme(&self) -> Option<&str> {
        self.0.split_once("://").map(|(scheme, _)| scheme)
    }

    /// Consume into the canonical string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ResourceUri {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceUri {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ResourceUri {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&String> for ResourceUri {
    fn from(raw: &String) -> Self {
        Self::new(raw)
    }
}

impl From<&ResourceUri> for ResourceUri {
    fn from(uri: &ResourceUri) -> Self {
        uri.clone()
    }
}
