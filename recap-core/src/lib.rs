//! Recap Core Library
//!
//! A backtracking regular expression engine with numbered and named capture
//! groups, lookaround, atomic groups, backreferences, template and closure
//! based replacement, and per-search match timeouts.
//!
//! ```
//! use recap_core::Regex;
//!
//! let re = Regex::new(r"(?<year>\d{4})-(?<month>\d\d)").unwrap();
//! let m = re.find("released 2024-05").unwrap().unwrap();
//! assert_eq!(m.name("year").unwrap().as_str(), "2024");
//! assert_eq!(re.replace("2024-05", "${month}/${year}").unwrap(), "05/2024");
//! ```

pub mod ast;
pub mod cache;
pub mod captures;
pub mod engine;
pub mod error;
pub mod groups;
pub mod lexer;
pub mod matcher;
pub mod matches;
pub mod options;
pub mod parser;
pub mod program;
pub mod replace;
pub mod shared;

pub use ast::Expr;
pub use cache::{CacheConfig, CacheStats, PatternCache};
pub use engine::{escape, Regex, RegexBuilder};
pub use error::{MatchTimeoutError, PatternSyntaxError, RegexError, Result, SyntaxErrorKind};
pub use groups::{GroupInfo, GroupRegistry};
pub use lexer::{Lexer, Token};
pub use matches::{Group, Groups, Match, Matches};
pub use options::RegexOptions;
pub use parser::{parse, Parser};
pub use replace::{Replacer, Template, TemplatePart};
pub use shared::{
    cache, find, find_all, find_all_with, find_with, init_cache, is_match, is_match_with, replace,
    replace_with,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end() {
        // pattern -> tokens -> AST -> program -> match
        let pattern = r"(\w+)\s(\w+)";
        let tokens = Lexer::new(pattern).tokenize().unwrap();
        assert_eq!(tokens.last(), Some(&Token::Eof));

        let parsed = parse(pattern, RegexOptions::NONE).unwrap();
        assert_eq!(parsed.expr.to_regex_string(), pattern);

        let re = Regex::new(pattern).unwrap();
        assert_eq!(re.replace("hello world", "$2 $1").unwrap(), "world hello");
    }
}
