//! Single `key=value` directive, optionally with a double-quoted value.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A `key=value` directive.
///
/// Quoting is carried explicitly rather than inferred from the value, so
/// `KvOption::unmarshal(s)?.marshal() == s` for any well-formed `s`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvOption {
    pub key: String,
    pub value: String,
    pub quoted: bool,
}

impl KvOption {
    /// Create a new option
    pub fn new(key: impl Into<String>, value: impl Into<String>, quoted: bool) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            quoted,
        }
    }

    /// Render as `key=value` or `key="value"`
    pub fn marshal(&self) -> String {
        marshal(&self.key, &self.value, self.quoted)
    }

    /// Parse a directive.
    ///
    /// Splits on the first `=` only, so values may contain `=`. A value
    /// wrapped in a matching pair of double quotes is unwrapped and marked
    /// as quoted.
    pub fn unmarshal(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Parse("empty input".to_string()));
        }

        let (key, value) = text
            .split_once('=')
            .ok_or_else(|| Error::Parse("invalid input".to_string()))?;

        let (value, quoted) = match value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
        {
            Some(inner) => (inner, true),
            None => (value, false),
        };

        Ok(Self {
            key: key.to_string(),
            value: value.to_string(),
            quoted,
        })
    }
}

/// Render a directive without building a [`KvOption`]
pub fn marshal(key: &str, value: &str, quoted: bool) -> String {
    if quoted {
        format!("{}=\"{}\"", key, value)
    } else {
        format!("{}={}", key, value)
    }
}

impl fmt::Display for KvOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.marshal())
    }
}

impl FromStr for KvOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::unmarshal(s)
    }
}
