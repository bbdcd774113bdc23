//! `wsrep_provider_options` codec
//!
//! Options are `key=value` pairs joined by `;`. Keys are always emitted in
//! lexicographic order so that repeated reconciliations of the same map never
//! reorder the string and trigger a restart.
//!
//! Format constraint: no individual value may contain a literal `;`. A value
//! that needs one has to be carried as its own quoted directive outside the
//! provider options string.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::kv_option::{self, KvOption};
use crate::error::{Error, Result};

/// Separator between provider options
pub const DELIMITER: char = ';';

/// Collection of provider options with unique keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderOptions {
    entries: BTreeMap<String, String>,
}

impl ProviderOptions {
    /// Create an empty set of options
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Set `key`, replacing any existing value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Merge `overrides` in, replacing values on key collision.
    ///
    /// Later calls win, so apply layers in ascending priority order.
    pub fn update<I, K, V>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in overrides {
            self.entries.insert(k.into(), v.into());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as `k1=v1;k2=v2` with keys sorted
    pub fn marshal(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| kv_option::marshal(k, v, false))
            .collect::<Vec<_>>()
            .join(&*DELIMITER.to_string())
    }

    /// Parse a `;`-joined options string.
    ///
    /// The first clause that fails to parse aborts the whole parse; no
    /// partial result is returned.
    pub fn unmarshal(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(Error::Parse("empty input".to_string()));
        }

        let mut entries = BTreeMap::new();
        for clause in text.split(DELIMITER) {
            let opt = KvOption::unmarshal(clause)?;
            entries.insert(opt.key, opt.value);
        }
        Ok(Self { entries })
    }
}

impl fmt::Display for ProviderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.marshal())
    }
}

impl FromStr for ProviderOptions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::unmarshal(s)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProviderOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut opts = Self::new();
        opts.update(iter);
        opts
    }
}
