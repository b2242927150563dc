//! Regular expressions for string nodes and `$reg` matching.
//!
//! Patterns match from the start of the value. Compiled expressions are kept
//! in a process-wide LRU cache of bounded size.

use crate::error::{SchemaError, SchemaResult};
use crate::tree::NodeRef;
use crate::value::Value;
use log::debug;
use lru::LruCache;
use once_cell::sync::Lazy;
use regex::Regex;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

pub type PatternFn = Arc<dyn Fn(&Value, &NodeRef<'_>) -> String + Send + Sync>;

/// A string pattern, literal or computed from `(value, root)`
#[derive(Clone)]
pub enum Pattern {
    Literal(String),
    Func(PatternFn),
}

impl Pattern {
    pub(crate) fn resolve(&self, value: &Value, root: &NodeRef<'_>) -> String {
        match self {
            Pattern::Literal(p) => p.clone(),
            Pattern::Func(f) => f(value, root),
        }
    }
}

const CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(size) => size,
    None => NonZeroUsize::MIN,
};

static CACHE: Lazy<Mutex<LruCache<String, Regex>>> =
    Lazy::new(|| Mutex::new(LruCache::new(CACHE_SIZE)));

fn compile(pattern: &str) -> SchemaResult<Regex> {
    let key = pattern.to_string();
    let mut cache = CACHE
        .lock()
        .map_err(|_| SchemaError::syntax("regexp cache poisoned", ""))?;
    if let Some(re) = cache.get(&key) {
        return Ok(re.clone());
    }
    let re = Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
        SchemaError::syntax(format!("invalid regexp: {e}"), "").with("regexp", pattern)
    })?;
    if let Some((evicted, _)) = cache.push(key, re.clone()) {
        debug!("Evicted regexp '{}' from cache", evicted);
    }
    Ok(re)
}

/// True when `text` matches `pattern` at its start.
pub fn matches_start(pattern: &str, text: &str) -> SchemaResult<bool> {
    Ok(compile(pattern)?.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchored_at_start() {
        assert!(matches_start("a.c", "abcdef").unwrap());
        assert!(!matches_start("bcd", "abcdef").unwrap());
        assert!(matches_start("x|ab", "abc").unwrap());
    }

    #[test]
    fn test_cache_is_bounded() {
        for i in 0..CACHE_SIZE.get() + 50 {
            assert!(matches_start(&format!("v{i}"), &format!("v{i}-x")).unwrap());
        }
        assert!(CACHE.lock().unwrap().len() <= CACHE_SIZE.get());
        assert!(matches_start("v0", "v0").unwrap());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = matches_start("(", "a").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Syntax);
    }
}
