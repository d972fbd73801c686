//! Regex matching engine
//!
//! This module ties the pipeline together: a pattern is parsed and compiled
//! once into a [`Regex`], which then searches any number of inputs. Searches
//! try each start position in turn and run the backtracking matcher there.

use crate::ast::is_meta_char;
use crate::error::{MatchTimeoutError, PatternSyntaxError};
use crate::groups::GroupRegistry;
use crate::matcher::{Deadline, Matcher};
use crate::matches::{Match, Matches};
use crate::options::RegexOptions;
use crate::parser::parse;
use crate::program::{compile, Program};
use crate::replace::{replace_matches, Replacer};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A compiled regular expression
///
/// Cloning is cheap: clones share the compiled program.
#[derive(Clone)]
pub struct Regex {
    inner: Arc<RegexInner>,
}

struct RegexInner {
    pattern: String,
    options: RegexOptions,
    timeout: Option<Duration>,
    program: Program,
    groups: GroupRegistry,
}

impl Regex {
    /// Compile a regex pattern with default options and no timeout
    pub fn new(pattern: &str) -> Result<Self, PatternSyntaxError> {
        RegexBuilder::new(pattern).build()
    }

    /// Compile a regex pattern with the given options
    pub fn with_options(pattern: &str, options: RegexOptions) -> Result<Self, PatternSyntaxError> {
        RegexBuilder::new(pattern).options(options).build()
    }

    /// Start configuring a regex
    pub fn builder(pattern: &str) -> RegexBuilder {
        RegexBuilder::new(pattern)
    }

    fn compile(
        pattern: &str,
        options: RegexOptions,
        timeout: Option<Duration>,
    ) -> Result<Self, PatternSyntaxError> {
        let parsed = parse(pattern, options)?;
        let program = compile(&parsed.expr, &parsed.groups)
            .map_err(|kind| PatternSyntaxError::new(0, kind))?;

        debug!(
            pattern,
            options = %options.to_flags(),
            groups = parsed.groups.group_count(),
            program_len = program.len(),
            "compiled pattern"
        );

        Ok(Regex {
            inner: Arc::new(RegexInner {
                pattern: pattern.to_string(),
                options,
                timeout,
                program,
                groups: parsed.groups,
            }),
        })
    }

    /// Check if the pattern matches anywhere in the input
    pub fn is_match(&self, haystack: &str) -> Result<bool, MatchTimeoutError> {
        Ok(self.find(haystack)?.is_some())
    }

    /// Find the first match in the input
    pub fn find<'h>(&self, haystack: &'h str) -> Result<Option<Match<'h>>, MatchTimeoutError> {
        self.search_at(haystack, 0)
    }

    /// Find the first match at or after byte offset `start`
    ///
    /// `\G` matches at `start`. An offset inside a character is moved forward
    /// to the next character boundary; an offset past the end finds nothing.
    pub fn find_at<'h>(
        &self,
        haystack: &'h str,
        start: usize,
    ) -> Result<Option<Match<'h>>, MatchTimeoutError> {
        if start > haystack.len() {
            return Ok(None);
        }
        let mut start = start;
        while !haystack.is_char_boundary(start) {
            start += 1;
        }
        self.search_at(haystack, start)
    }

    /// Iterate over all non-overlapping matches
    pub fn find_iter<'r, 'h>(&'r self, haystack: &'h str) -> Matches<'r, 'h> {
        Matches::new(self, haystack)
    }

    /// Replace every match
    ///
    /// `replacer` is a template string (see [`crate::replace`]), a
    /// [`crate::Template`], or a closure taking a [`Match`].
    pub fn replace<R: Replacer>(
        &self,
        haystack: &str,
        replacer: R,
    ) -> Result<String, MatchTimeoutError> {
        replace_matches(self, haystack, 0, replacer)
    }

    /// Replace at most `limit` matches; a limit of 0 replaces all of them
    pub fn replacen<R: Replacer>(
        &self,
        haystack: &str,
        limit: usize,
        replacer: R,
    ) -> Result<String, MatchTimeoutError> {
        replace_matches(self, haystack, limit, replacer)
    }

    /// The pattern text this regex was compiled from
    pub fn as_str(&self) -> &str {
        &self.inner.pattern
    }

    pub fn options(&self) -> RegexOptions {
        self.inner.options
    }

    /// The per-search timeout, if any
    pub fn match_timeout(&self) -> Option<Duration> {
        self.inner.timeout
    }

    /// Number of capture groups, group 0 included
    pub fn group_count(&self) -> usize {
        self.inner.groups.group_count()
    }

    /// Names of the named groups, in ordinal order
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.inner.groups.names()
    }

    /// Ordinal of the group called `name`
    pub fn group_number(&self, name: &str) -> Option<u32> {
        self.inner.groups.get_by_name(name)
    }

    /// Name of the group with ordinal `index`
    pub fn group_name(&self, index: u32) -> Option<&str> {
        self.inner.groups.name_of(index)
    }

    /// Search from `start`, which must be a character boundary
    ///
    /// The whole search runs under one deadline.
    pub(crate) fn search_at<'h>(
        &self,
        haystack: &'h str,
        start: usize,
    ) -> Result<Option<Match<'h>>, MatchTimeoutError> {
        let inner = &*self.inner;
        let deadline = inner.timeout.map(Deadline::after);
        let mut matcher = Matcher::new(&inner.program, &inner.pattern, haystack, start, deadline);

        let mut pos = start;
        loop {
            if let Some(spans) = matcher.try_match_at(pos)? {
                return Ok(Some(Match::new(self.clone(), haystack, spans)));
            }
            if inner.program.anchored {
                return Ok(None);
            }
            match haystack[pos..].chars().next() {
                Some(c) => pos += c.len_utf8(),
                None => return Ok(None),
            }
        }
    }
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Regex")
            .field("pattern", &self.inner.pattern)
            .field("options", &self.inner.options)
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.pattern)
    }
}

impl std::str::FromStr for Regex {
    type Err = PatternSyntaxError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        Regex::new(pattern)
    }
}

/// Configures and compiles a [`Regex`]
#[derive(Debug, Clone)]
pub struct RegexBuilder {
    pattern: String,
    options: RegexOptions,
    timeout: Option<Duration>,
}

impl RegexBuilder {
    pub fn new(pattern: &str) -> Self {
        RegexBuilder {
            pattern: pattern.to_string(),
            options: RegexOptions::default(),
            timeout: None,
        }
    }

    /// Replace all options at once
    pub fn options(&mut self, options: RegexOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn case_insensitive(&mut self, yes: bool) -> &mut Self {
        self.options.case_insensitive = yes;
        self
    }

    pub fn multiline(&mut self, yes: bool) -> &mut Self {
        self.options.multiline = yes;
        self
    }

    pub fn singleline(&mut self, yes: bool) -> &mut Self {
        self.options.singleline = yes;
        self
    }

    pub fn explicit_capture(&mut self, yes: bool) -> &mut Self {
        self.options.explicit_capture = yes;
        self
    }

    pub fn ignore_pattern_whitespace(&mut self, yes: bool) -> &mut Self {
        self.options.ignore_pattern_whitespace = yes;
        self
    }

    /// Abandon any single search that runs longer than `timeout`
    pub fn match_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(&self) -> Result<Regex, PatternSyntaxError> {
        Regex::compile(&self.pattern, self.options, self.timeout)
    }
}

/// Escape every character that has a meaning in a pattern
///
/// Whitespace is escaped too, so the result is also safe under
/// `ignore_pattern_whitespace`.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '\x0C' => escaped.push_str("\\f"),
            ' ' => escaped.push_str("\\ "),
            c if is_meta_char(c) => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped
}
