//! Process-wide pattern cache and the one-shot entry points built on it
//!
//! The free functions here take the pattern text with every call and fetch
//! the compiled form from a shared [`PatternCache`]. Call [`init_cache`]
//! before the first use to configure the cache; otherwise it starts with the
//! default configuration on first use.

use crate::cache::{CacheConfig, PatternCache};
use crate::error::Result;
use crate::matches::Match;
use crate::options::RegexOptions;
use crate::replace::Replacer;
use std::sync::OnceLock;

static SHARED_CACHE: OnceLock<PatternCache> = OnceLock::new();

/// The shared pattern cache
///
/// If [`init_cache`] has not run yet, this creates the cache with
/// [`CacheConfig::default`]. Every static entry point goes through here, so
/// the first of them to run fixes the configuration unless `init_cache`
/// came first.
pub fn cache() -> &'static PatternCache {
    SHARED_CACHE.get_or_init(PatternCache::new)
}

/// Configure the shared cache
///
/// Call this once at startup, before any static entry point. Returns `false`
/// if the cache already exists, either from an earlier call or from a static
/// call that created it with the default configuration; in that case only
/// its capacity is updated.
pub fn init_cache(config: CacheConfig) -> bool {
    let mut fresh = false;
    let cache = SHARED_CACHE.get_or_init(|| {
        fresh = true;
        PatternCache::with_config(config.clone())
    });
    if !fresh {
        cache.set_capacity(config.capacity);
    }
    fresh
}

/// Check whether `pattern` matches anywhere in `haystack`
pub fn is_match(haystack: &str, pattern: &str) -> Result<bool> {
    is_match_with(haystack, pattern, RegexOptions::NONE)
}

pub fn is_match_with(haystack: &str, pattern: &str, options: RegexOptions) -> Result<bool> {
    let regex = cache().get_or_compile(pattern, options)?;
    Ok(regex.is_match(haystack)?)
}

/// Find the first match of `pattern` in `haystack`
pub fn find<'h>(haystack: &'h str, pattern: &str) -> Result<Option<Match<'h>>> {
    find_with(haystack, pattern, RegexOptions::NONE)
}

pub fn find_with<'h>(
    haystack: &'h str,
    pattern: &str,
    options: RegexOptions,
) -> Result<Option<Match<'h>>> {
    let regex = cache().get_or_compile(pattern, options)?;
    Ok(regex.find(haystack)?)
}

/// Collect every match of `pattern` in `haystack`
pub fn find_all<'h>(haystack: &'h str, pattern: &str) -> Result<Vec<Match<'h>>> {
    find_all_with(haystack, pattern, RegexOptions::NONE)
}

pub fn find_all_with<'h>(
    haystack: &'h str,
    pattern: &str,
    options: RegexOptions,
) -> Result<Vec<Match<'h>>> {
    let regex = cache().get_or_compile(pattern, options)?;
    let matches = regex.find_iter(haystack).collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(matches)
}

/// Replace every match of `pattern` in `haystack`
pub fn replace<R: Replacer>(haystack: &str, pattern: &str, replacer: R) -> Result<String> {
    replace_with(haystack, pattern, RegexOptions::NONE, replacer)
}

pub fn replace_with<R: Replacer>(
    haystack: &str,
    pattern: &str,
    options: RegexOptions,
    replacer: R,
) -> Result<String> {
    let regex = cache().get_or_compile(pattern, options)?;
    Ok(regex.replace(haystack, replacer)?)
}
