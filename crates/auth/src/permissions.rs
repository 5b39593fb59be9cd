use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission code carried by Action nodes (e.g. `"system:user:create"`).
///
/// Codes are opaque strings; the engine only compares them for equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionCode(Cow<'static, str>);

impl PermissionCode {
    pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for PermissionCode {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PermissionCode {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl core::borrow::Borrow<str> for PermissionCode {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}
