//! Error types for the regex engine
//!
//! Errors are split by the phase that raises them: pattern syntax errors come
//! out of compilation only, timeouts come out of matching only. A pattern that
//! simply does not match is not an error at all.

use std::time::Duration;
use thiserror::Error;

/// The umbrella error type, used by entry points that both compile and match
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegexError {
    /// The pattern text could not be compiled
    #[error(transparent)]
    Syntax(#[from] PatternSyntaxError),

    /// A search ran past its deadline
    #[error(transparent)]
    Timeout(#[from] MatchTimeoutError),
}

/// A malformed pattern, with the byte offset where the problem was detected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid pattern at position {position}: {kind}")]
pub struct PatternSyntaxError {
    /// Byte offset into the pattern text
    pub position: usize,
    /// What went wrong
    pub kind: SyntaxErrorKind,
}

impl PatternSyntaxError {
    /// Create a new syntax error
    pub fn new(position: usize, kind: SyntaxErrorKind) -> Self {
        PatternSyntaxError { position, kind }
    }

    /// Human readable description without the position prefix
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// Specific kinds of pattern syntax errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// A `)` with no matching `(`
    #[error("too many ')'")]
    UnbalancedParenthesis,

    /// A `(` that is never closed
    #[error("not enough ')'")]
    UnclosedGroup,

    /// Unclosed character class (e.g., `[abc` without `]`)
    #[error("unterminated [] set")]
    UnclosedCharacterClass,

    /// A quantifier with nothing in front of it, e.g. `*a` or `(|+)`
    #[error("quantifier '{0}' following nothing")]
    NothingToRepeat(char),

    /// A quantifier directly applied to another quantifier, e.g. `a**`
    #[error("nested quantifier '{0}'")]
    NestedQuantifier(char),

    /// `{n,m}` with `n > m`
    #[error("illegal {{x,y}} with x > y")]
    QuantifierOutOfOrder,

    /// `[z-a]`
    #[error("[x-y] range in reverse order")]
    ReversedRange,

    /// `\q` and friends
    #[error("unrecognized escape sequence '\\{0}'")]
    InvalidEscape(char),

    /// A backslash at the very end of the pattern
    #[error("illegal \\ at end of pattern")]
    TrailingBackslash,

    /// Malformed `\x`, `\u` or `\c` escape
    #[error("insufficient or invalid hexadecimal digits")]
    InvalidHexEscape,

    /// Malformed `\cX` control escape
    #[error("missing or invalid control character")]
    InvalidControlEscape,

    /// An unknown `(?...)` construct
    #[error("unrecognized grouping construct")]
    InvalidGroupConstruct,

    /// A group name that is not an identifier
    #[error("invalid group name '{0}'")]
    InvalidGroupName(String),

    /// The same name used by two groups
    #[error("duplicate group name '{0}'")]
    DuplicateGroupName(String),

    /// `\5` without a fifth group
    #[error("reference to undefined group number {0}")]
    UndefinedGroupNumber(u32),

    /// `\k<nope>` without such a group
    #[error("reference to undefined group name '{0}'")]
    UndefinedGroupName(String),

    /// Groups opened inside each other past the nesting limit
    #[error("groups nested deeper than {0} levels")]
    NestingTooDeep(usize),

    /// The lowered program is larger than the engine accepts
    #[error("pattern too large: program exceeds {0} instructions")]
    PatternTooLarge(usize),
}

/// A search that ran past its deadline
///
/// Carries enough context to diagnose the runaway pattern. The search that
/// timed out produced neither a match nor a normal failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("match timed out after {elapsed:?} (limit {timeout:?}) for pattern '{pattern}'")]
pub struct MatchTimeoutError {
    /// The input being searched
    pub input: String,
    /// The pattern text of the regex that timed out
    pub pattern: String,
    /// The configured timeout
    pub timeout: Duration,
    /// Time spent in the search before it was abandoned
    pub elapsed: Duration,
}

/// Result type alias for entry points that compile and match
pub type Result<T> = std::result::Result<T, RegexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = PatternSyntaxError::new(5, SyntaxErrorKind::UnclosedGroup);
        assert_eq!(err.to_string(), "invalid pattern at position 5: not enough ')'");
        assert_eq!(err.message(), "not enough ')'");
    }

    #[test]
    fn test_escape_error_display() {
        let err = SyntaxErrorKind::InvalidEscape('q');
        assert_eq!(err.to_string(), "unrecognized escape sequence '\\q'");
    }

    #[test]
    fn test_range_error_display() {
        assert_eq!(
            SyntaxErrorKind::QuantifierOutOfOrder.to_string(),
            "illegal {x,y} with x > y"
        );
    }

    #[test]
    fn test_regex_error_from_syntax_error() {
        let err: RegexError = PatternSyntaxError::new(0, SyntaxErrorKind::TrailingBackslash).into();
        assert!(matches!(err, RegexError::Syntax(_)));
        assert_eq!(
            err.to_string(),
            "invalid pattern at position 0: illegal \\ at end of pattern"
        );
    }

    #[test]
    fn test_timeout_error_display() {
        let err = MatchTimeoutError {
            input: "aaaa".to_string(),
            pattern: "(a+)+b".to_string(),
            timeout: Duration::from_millis(10),
            elapsed: Duration::from_millis(11),
        };
        let text = err.to_string();
        assert!(text.contains("(a+)+b"));
        assert!(text.contains("10ms"));

        let err: RegexError = err.into();
        assert!(matches!(err, RegexError::Timeout(_)));
    }
}
