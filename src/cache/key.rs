//! Cache key generation.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CacheKey {
    pub hash: String,
}

impl CacheKey {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// First 16 characters, enough to tell entries apart in logs.
    pub fn short(&self) -> &str {
        log_prefix(&self.hash)
    }
}

/// Up to 16 leading characters of `key`, cut on a char boundary.
pub(crate) fn log_prefix(key: &str) -> &str {
    match key.char_indices().nth(16) {
        Some((end, _)) => &key[..end],
        None => key,
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Builds a deterministic key from a call's name, positional arguments and
/// keyword arguments.
///
/// Keyword arguments are kept in a `BTreeMap`, so insertion order never
/// changes the resulting hash.
#[derive(Debug, Clone, Default)]
pub struct CallKey {
    function: String,
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
}

impl CallKey {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, value: impl Serialize) -> Self {
        self.args.push(serde_json::to_value(value).unwrap_or(Value::Null));
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        self.kwargs.insert(
            name.into(),
            serde_json::to_value(value).unwrap_or(Value::Null),
        );
        self
    }

    /// Canonical JSON form that gets hashed.
    pub fn canonical(&self) -> String {
        let kwargs: Vec<(&String, &Value)> = self.kwargs.iter().collect();
        serde_json::json!({
            "function": self.function,
            "args": self.args,
            "kwargs": kwargs,
        })
        .to_string()
    }

    pub fn finish(&self) -> CacheKey {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical().as_bytes());
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        CacheKey::new(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_respects_char_boundaries() {
        let key = CacheKey::from("niveau d'acidité du sol");
        assert_eq!(key.short(), "niveau d'acidité");
        assert_eq!(CacheKey::from("日本語").short(), "日本語");
    }

    #[test]
    fn test_identical_calls_share_a_key() {
        let a = CallKey::new("generate_idea").arg("biology").arg("6-8").finish();
        let b = CallKey::new("generate_idea").arg("biology").arg("6-8").finish();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert_eq!(a.short().len(), 16);
    }

    #[test]
    fn test_keyword_order_does_not_matter() {
        let a = CallKey::new("generate_idea")
            .kwarg("topic", "gravity")
            .kwarg("grade", "9-12")
            .finish();
        let b = CallKey::new("generate_idea")
            .kwarg("grade", "9-12")
            .kwarg("topic", "gravity")
            .finish();
        assert_eq!(a, b);
    }

    #[test]
    fn test_positional_order_and_function_name_matter() {
        let a = CallKey::new("generate_idea").arg("a").arg("b").finish();
        let b = CallKey::new("generate_idea").arg("b").arg("a").finish();
        let c = CallKey::new("render_chart").arg("a").arg("b").finish();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_missing_argument_differs_from_empty_string() {
        let none = CallKey::new("generate_idea").arg(None::<&str>).finish();
        let empty = CallKey::new("generate_idea").arg("").finish();
        assert_ne!(none, empty);
    }
}
