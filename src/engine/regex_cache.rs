//! Thread-local regex cache for rule patterns
//!
//! Rule templates and sandhi filters are written as regex strings and
//! checked many times per analysis. Compiled patterns are cached per
//! thread, so parallel workers never contend on the cache.

use hashbrown::HashMap;
use regex::Regex;
use std::cell::RefCell;

thread_local! {
    /// Thread-local cache of compiled patterns, keyed by source text
    static REGEX_CACHE: RefCell<HashMap<String, Option<Regex>>> = RefCell::new(HashMap::new());
}

/// Get or compile a pattern
///
/// Invalid patterns are cached as `None` so they are reported only once
/// per thread.
#[inline]
pub fn get_or_compile(pattern: &str) -> Option<Regex> {
    REGEX_CACHE.with(|cache| {
        if let Some(compiled) = cache.borrow().get(pattern) {
            return compiled.clone();
        }

        let compiled = match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(_err) => {
                log_debug!("invalid rule pattern {:?}: {}", pattern, _err);
                None
            }
        };
        cache
            .borrow_mut()
            .insert(pattern.to_string(), compiled.clone());
        compiled
    })
}

/// Whether the pattern matches anywhere in `text`
///
/// An invalid pattern matches nothing.
pub fn is_match(pattern: &str, text: &str) -> bool {
    get_or_compile(pattern).is_some_and(|re| re.is_match(text))
}

/// Whether the pattern matches the whole of `text`
pub fn is_full_match(pattern: &str, text: &str) -> bool {
    get_or_compile(&format!("^(?:{})$", pattern)).is_some_and(|re| re.is_match(text))
}

/// Clear the cache of the current thread
pub fn clear_cache() {
    REGEX_CACHE.with(|cache| cache.borrow_mut().clear());
}

/// Number of patterns cached on the current thread
pub fn cache_size() -> usize {
    REGEX_CACHE.with(|cache| cache.borrow().len())
}
