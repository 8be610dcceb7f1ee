// ABOUTME: Compiled CSS matchers for the page structure, plus a cache for class selectors built at runtime.
// ABOUTME: Every tree query goes through dom_query's selector engine using these matchers.

use std::collections::HashMap;
use std::sync::RwLock;

use dom_query::Matcher;
use once_cell::sync::Lazy;

pub static SECTION: Lazy<Matcher> = Lazy::new(|| Matcher::new(".section").unwrap());
pub static BLOCK: Lazy<Matcher> = Lazy::new(|| Matcher::new(".block").unwrap());
pub static MAIN: Lazy<Matcher> = Lazy::new(|| Matcher::new("main").unwrap());
pub static DIV: Lazy<Matcher> = Lazy::new(|| Matcher::new("div").unwrap());
/// Elements a move must never hide.
pub static LANDMARK: Lazy<Matcher> = Lazy::new(|| Matcher::new("body, main, .section").unwrap());
pub static ACCORDION_BODY: Lazy<Matcher> = Lazy::new(|| Matcher::new(".accordion-item-body").unwrap());

static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Matcher>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles a CSS selector, caching the result.
///
/// Returns `None` for an invalid selector; the failure is cached too.
pub fn get_or_compile(css: &str) -> Option<Matcher> {
    {
        let cache = SELECTOR_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = Matcher::new(css).ok();
    let mut cache = SELECTOR_CACHE.write().unwrap_or_else(|e| e.into_inner());
    if let Some(cached) = cache.get(css) {
        return cached.clone();
    }
    cache.insert(css.to_string(), compiled.clone());
    compiled
}

/// Matcher for a single class name.
pub fn class(name: &str) -> Option<Matcher> {
    get_or_compile(&format!(".{}", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_matcher_is_cached() {
        assert!(class("accordion-item").is_some());
        let cache = SELECTOR_CACHE.read().unwrap();
        assert!(cache.contains_key(".accordion-item"));
    }

    #[test]
    fn test_invalid_class_is_none() {
        assert!(class("not valid!").is_none());
        assert!(get_or_compile("div[").is_none());
    }
}
