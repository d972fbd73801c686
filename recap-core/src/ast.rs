//! Abstract Syntax Tree (AST) for regex patterns
//!
//! The parser resolves all option flags into the tree: a literal carries its
//! own case folding flag, `.` knows whether it crosses newlines, and `^`/`$`
//! are already resolved to line or text anchors. The compiler never needs to
//! consult the options again.

use std::fmt;

/// An expression in the AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Empty expression (matches empty string)
    Empty,

    /// A literal character, optionally compared case-insensitively
    Literal { c: char, fold: bool },

    /// Any character (dot). `dotall` lets it match `\n`.
    Any { dotall: bool },

    /// A sequence of expressions (concatenation)
    Sequence(Vec<Expr>),

    /// Alternation (e.g., a|b|c)
    Alternation(Vec<Expr>),

    /// A character class `[abc]`, `[^abc]`, `[a-z]` or a shorthand like `\d`
    Class { class: CharClass, fold: bool },

    /// Quantified expression (e.g., a*, a+?, a{3,5})
    Quantified {
        /// The expression being quantified
        expr: Box<Expr>,
        /// The quantifier
        quantifier: Quantifier,
    },

    /// A capturing group, numbered or named. `index` is the group ordinal.
    Group { index: u32, expr: Box<Expr> },

    /// A non-capturing group: `(?:...)`, or an unnamed group under explicit capture
    NonCapturingGroup(Box<Expr>),

    /// A zero-width assertion (`^`, `$`, `\b`, ...)
    Assertion(Assertion),

    /// Backreference to a group by number or name
    Backreference { target: GroupRef, fold: bool },

    /// Lookahead or lookbehind, positive or negative
    Lookaround {
        /// Which way to look and whether the result is negated
        kind: LookKind,
        /// The pattern that must (not) match
        expr: Box<Expr>,
    },

    /// Atomic group `(?>...)`: no backtracking into the group once it matched
    AtomicGroup(Box<Expr>),
}

/// How a backreference names its group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupRef {
    /// `\1`, `\k<1>`
    Number(u32),
    /// `\k<name>`
    Name(String),
}

/// Zero-width assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assertion {
    /// `\A`, or `^` without multiline
    StartText,
    /// `^` with multiline: start of text or after `\n`
    StartLine,
    /// `\z`
    EndText,
    /// `\Z`, or `$` without multiline: end of text or before a final `\n`
    EndTextOptionalNewline,
    /// `$` with multiline: end of text or before any `\n`
    EndLine,
    /// `\G`: the position where the current search started
    SearchStart,
    /// `\b`
    WordBoundary,
    /// `\B`
    NonWordBoundary,
}

/// Direction and polarity of a lookaround
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookKind {
    /// `(?=...)`
    Ahead,
    /// `(?!...)`
    NegativeAhead,
    /// `(?<=...)`
    Behind,
    /// `(?<!...)`
    NegativeBehind,
}

impl LookKind {
    /// Whether this lookaround matches backwards from the current position
    pub fn is_behind(self) -> bool {
        matches!(self, LookKind::Behind | LookKind::NegativeBehind)
    }

    /// Whether a successful inner match makes the assertion fail
    pub fn is_negated(self) -> bool {
        matches!(self, LookKind::NegativeAhead | LookKind::NegativeBehind)
    }
}

/// A character class `[abc]`, `[^abc]`, or `[a-z]`
#[derive(Debug, Clone, PartialEq)]
pub struct CharClass {
    /// Whether the class is negated [^...]
    pub negated: bool,
    /// The items in the class
    pub items: Vec<ClassItem>,
}

/// An item in a character class
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassItem {
    /// A single character
    Char(char),
    /// A character range (e.g., a-z)
    Range(char, char),
    /// A character class shorthand (\d, \w, \s, etc.)
    Shorthand(Shorthand),
}

/// The `\d \D \w \W \s \S` shorthands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shorthand {
    Digit,
    NonDigit,
    Word,
    NonWord,
    Space,
    NonSpace,
}

/// A quantifier: `min` to `max` repetitions (`None` = unbounded)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantifier {
    pub min: u32,
    pub max: Option<u32>,
    /// Lazy quantifiers (`*?`, `{n,m}?`) try the fewest repetitions first
    pub lazy: bool,
}

impl Quantifier {
    /// `*`
    pub fn zero_or_more() -> Self {
        Quantifier { min: 0, max: None, lazy: false }
    }

    /// `+`
    pub fn one_or_more() -> Self {
        Quantifier { min: 1, max: None, lazy: false }
    }

    /// `?`
    pub fn optional() -> Self {
        Quantifier { min: 0, max: Some(1), lazy: false }
    }

    /// `{min,max}`
    pub fn range(min: u32, max: Option<u32>) -> Self {
        Quantifier { min, max, lazy: false }
    }

    /// The same quantifier, lazy
    pub fn lazy(self) -> Self {
        Quantifier { lazy: true, ..self }
    }
}

/// Word characters for `\w` and `\b`: letters, digits, marks and `_`
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Decimal digits for `\d`
pub fn is_digit_char(c: char) -> bool {
    c.is_ascii_digit() || (!c.is_ascii() && c.is_numeric())
}

/// Simple one-to-one case folding
///
/// Characters whose lowercase form is more than one character fold to
/// themselves.
pub fn fold_char(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_lowercase();
    }
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

fn upper_char(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_uppercase();
    }
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

impl Shorthand {
    /// Whether `c` belongs to this shorthand class
    pub fn matches(self, c: char) -> bool {
        match self {
            Shorthand::Digit => is_digit_char(c),
            Shorthand::NonDigit => !is_digit_char(c),
            Shorthand::Word => is_word_char(c),
            Shorthand::NonWord => !is_word_char(c),
            Shorthand::Space => c.is_whitespace(),
            Shorthand::NonSpace => !c.is_whitespace(),
        }
    }

    fn letter(self) -> char {
        match self {
            Shorthand::Digit => 'd',
            Shorthand::NonDigit => 'D',
            Shorthand::Word => 'w',
            Shorthand::NonWord => 'W',
            Shorthand::Space => 's',
            Shorthand::NonSpace => 'S',
        }
    }
}

impl ClassItem {
    fn contains(&self, c: char) -> bool {
        match *self {
            ClassItem::Char(ch) => ch == c,
            ClassItem::Range(start, end) => (start..=end).contains(&c),
            ClassItem::Shorthand(sh) => sh.matches(c),
        }
    }
}

impl CharClass {
    /// A class holding a single shorthand, as produced by `\d` outside brackets
    pub fn shorthand(sh: Shorthand) -> Self {
        CharClass { negated: false, items: vec![ClassItem::Shorthand(sh)] }
    }

    /// Whether `c` is in the class
    ///
    /// With `fold`, a character matches if it or its simple lowercase or
    /// uppercase form is in the class.
    pub fn matches(&self, c: char, fold: bool) -> bool {
        let hit = |ch: char| self.items.iter().any(|item| item.contains(ch));
        let found = if fold {
            hit(c) || hit(fold_char(c)) || hit(upper_char(c))
        } else {
            hit(c)
        };
        found != self.negated
    }

    /// Convert character class to regex string
    fn to_regex_string(&self) -> String {
        let mut result = String::new();
        result.push('[');
        if self.negated {
            result.push('^');
        }
        for item in &self.items {
            match item {
                ClassItem::Char(c) => push_class_char(&mut result, *c),
                ClassItem::Range(start, end) => {
                    push_class_char(&mut result, *start);
                    result.push('-');
                    push_class_char(&mut result, *end);
                }
                ClassItem::Shorthand(sh) => {
                    result.push('\\');
                    result.push(sh.letter());
                }
            }
        }
        result.push(']');
        result
    }
}

fn push_class_char(out: &mut String, c: char) {
    if matches!(c, ']' | '\\' | '^' | '-' | '[') {
        out.push('\\');
    }
    out.push(c);
}

fn push_literal(out: &mut String, c: char) {
    match c {
        '\n' => out.push_str("\\n"),
        '\t' => out.push_str("\\t"),
        '\r' => out.push_str("\\r"),
        _ => {
            if is_meta_char(c) {
                out.push('\\');
            }
            out.push(c);
        }
    }
}

/// Characters with special meaning outside a character class
pub fn is_meta_char(c: char) -> bool {
    matches!(
        c,
        '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' | '#'
    )
}

impl Expr {
    /// Create a literal expression (case sensitive)
    pub fn literal(c: char) -> Self {
        Expr::Literal { c, fold: false }
    }

    /// Create a sequence from a vector of expressions
    pub fn sequence(mut exprs: Vec<Expr>) -> Self {
        match exprs.len() {
            0 => Expr::Empty,
            1 => exprs.remove(0),
            _ => Expr::Sequence(exprs),
        }
    }

    /// Create an alternation from a vector of expressions
    pub fn alternation(mut exprs: Vec<Expr>) -> Self {
        match exprs.len() {
            0 => Expr::Empty,
            1 => exprs.remove(0),
            _ => Expr::Alternation(exprs),
        }
    }

    /// Create a quantified expression
    pub fn quantified(expr: Expr, quantifier: Quantifier) -> Self {
        Expr::Quantified {
            expr: Box::new(expr),
            quantifier,
        }
    }

    /// Create a capturing group
    pub fn group(index: u32, expr: Expr) -> Self {
        Expr::Group {
            index,
            expr: Box::new(expr),
        }
    }

    /// Whether this expression can only ever match the empty string
    pub fn is_zero_width(&self) -> bool {
        match self {
            Expr::Empty | Expr::Assertion(_) | Expr::Lookaround { .. } => true,
            Expr::Sequence(exprs) | Expr::Alternation(exprs) => {
                exprs.iter().all(Expr::is_zero_width)
            }
            Expr::Group { expr, .. } | Expr::NonCapturingGroup(expr) | Expr::AtomicGroup(expr) => {
                expr.is_zero_width()
            }
            Expr::Quantified { expr, quantifier } => {
                quantifier.max == Some(0) || expr.is_zero_width()
            }
            _ => false,
        }
    }

    /// The most characters a match of this expression can span, `None` if
    /// unbounded
    pub fn max_width(&self) -> Option<usize> {
        match self {
            Expr::Empty | Expr::Assertion(_) | Expr::Lookaround { .. } => Some(0),
            Expr::Literal { .. } | Expr::Any { .. } | Expr::Class { .. } => Some(1),
            Expr::Sequence(exprs) => exprs
                .iter()
                .try_fold(0usize, |total, e| total.checked_add(e.max_width()?)),
            Expr::Alternation(exprs) => exprs
                .iter()
                .try_fold(0usize, |widest, e| Some(widest.max(e.max_width()?))),
            Expr::Group { expr, .. } | Expr::NonCapturingGroup(expr) | Expr::AtomicGroup(expr) => {
                expr.max_width()
            }
            Expr::Quantified { expr, quantifier } => {
                let width = expr.max_width();
                match (width, quantifier.max) {
                    (_, Some(0)) | (Some(0), _) => Some(0),
                    (Some(width), Some(max)) => width.checked_mul(max as usize),
                    _ => None,
                }
            }
            Expr::Backreference { .. } => None,
        }
    }

    /// Convert the AST back to a string (for debugging)
    ///
    /// Group names and case folding are not kept in the tree, so named groups
    /// render as plain groups and folded literals render as their character.
    pub fn to_regex_string(&self) -> String {
        match self {
            Expr::Empty => String::new(),
            Expr::Literal { c, .. } => {
                let mut s = String::new();
                push_literal(&mut s, *c);
                s
            }
            Expr::Any { .. } => ".".to_string(),
            Expr::Sequence(exprs) => exprs.iter().map(|e| e.to_regex_string()).collect(),
            Expr::Alternation(exprs) => {
                let parts: Vec<_> = exprs.iter().map(|e| e.to_regex_string()).collect();
                parts.join("|")
            }
            Expr::Class { class, .. } => {
                if let [ClassItem::Shorthand(sh)] = class.items.as_slice()
                    && !class.negated
                {
                    format!("\\{}", sh.letter())
                } else {
                    class.to_regex_string()
                }
            }
            Expr::Quantified { expr, quantifier } => {
                let needs_parens =
                    matches!(expr.as_ref(), Expr::Alternation(_) | Expr::Sequence(_));
                let expr_str = if needs_parens {
                    format!("(?:{})", expr.to_regex_string())
                } else {
                    expr.to_regex_string()
                };
                format!("{}{}", expr_str, quantifier)
            }
            Expr::Group { expr, .. } => format!("({})", expr.to_regex_string()),
            Expr::NonCapturingGroup(expr) => format!("(?:{})", expr.to_regex_string()),
            Expr::Assertion(a) => a.to_string(),
            Expr::Backreference { target, .. } => match target {
                GroupRef::Number(n) => format!("\\{}", n),
                GroupRef::Name(name) => format!("\\k<{}>", name),
            },
            Expr::Lookaround { kind, expr } => {
                let opener = match kind {
                    LookKind::Ahead => "(?=",
                    LookKind::NegativeAhead => "(?!",
                    LookKind::Behind => "(?<=",
                    LookKind::NegativeBehind => "(?<!",
                };
                format!("{}{})", opener, expr.to_regex_string())
            }
            Expr::AtomicGroup(expr) => format!("(?>{})", expr.to_regex_string()),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_regex_string())
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Assertion::StartText => "\\A",
            Assertion::StartLine => "^",
            Assertion::EndText => "\\z",
            Assertion::EndTextOptionalNewline => "\\Z",
            Assertion::EndLine => "$",
            Assertion::SearchStart => "\\G",
            Assertion::WordBoundary => "\\b",
            Assertion::NonWordBoundary => "\\B",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (0, None) => f.write_str("*")?,
            (1, None) => f.write_str("+")?,
            (0, Some(1)) => f.write_str("?")?,
            (n, None) => write!(f, "{{{},}}", n)?,
            (n, Some(m)) if n == m => write!(f, "{{{}}}", n)?,
            (n, Some(m)) => write!(f, "{{{},{}}}", n, m)?,
        }
        if self.lazy {
            f.write_str("?")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(Expr::Empty.to_regex_string(), "");
    }

    #[test]
    fn test_literal_escapes_meta() {
        assert_eq!(Expr::literal('a').to_regex_string(), "a");
        assert_eq!(Expr::literal('.').to_regex_string(), "\\.");
        assert_eq!(Expr::literal('\n').to_regex_string(), "\\n");
    }

    #[test]
    fn test_sequence_and_alternation() {
        let seq = Expr::sequence(vec![Expr::literal('a'), Expr::literal('b')]);
        assert_eq!(seq.to_regex_string(), "ab");
        let alt = Expr::alternation(vec![Expr::literal('a'), Expr::literal('b')]);
        assert_eq!(alt.to_regex_string(), "a|b");
        assert_eq!(Expr::sequence(vec![Expr::literal('x')]), Expr::literal('x'));
    }

    #[test]
    fn test_character_class_display() {
        let class = CharClass {
            negated: true,
            items: vec![ClassItem::Range('a', 'z'), ClassItem::Char(']')],
        };
        let expr = Expr::Class { class, fold: false };
        assert_eq!(expr.to_regex_string(), "[^a-z\\]]");
    }

    #[test]
    fn test_quantifier_display() {
        let cases = [
            (Quantifier::zero_or_more(), "*"),
            (Quantifier::one_or_more().lazy(), "+?"),
            (Quantifier::optional(), "?"),
            (Quantifier::range(3, Some(3)), "{3}"),
            (Quantifier::range(2, None), "{2,}"),
            (Quantifier::range(2, Some(5)).lazy(), "{2,5}?"),
        ];
        for (q, expected) in cases {
            assert_eq!(q.to_string(), expected);
        }
    }

    #[test]
    fn test_quantified_sequence_gets_parens() {
        let expr = Expr::quantified(
            Expr::sequence(vec![Expr::literal('a'), Expr::literal('b')]),
            Quantifier::zero_or_more(),
        );
        assert_eq!(expr.to_regex_string(), "(?:ab)*");
    }

    #[test]
    fn test_class_matching() {
        let class = CharClass {
            negated: false,
            items: vec![ClassItem::Range('a', 'f'), ClassItem::Shorthand(Shorthand::Digit)],
        };
        assert!(class.matches('c', false));
        assert!(class.matches('7', false));
        assert!(!class.matches('C', false));
        assert!(class.matches('C', true));
        assert!(!class.matches('z', true));
    }

    #[test]
    fn test_negated_class_with_fold() {
        let class = CharClass {
            negated: true,
            items: vec![ClassItem::Char('k')],
        };
        assert!(!class.matches('K', true));
        assert!(class.matches('K', false));
    }

    #[test]
    fn test_fold_char() {
        assert_eq!(fold_char('A'), 'a');
        assert_eq!(fold_char('Ä'), 'ä');
        assert_eq!(fold_char('1'), '1');
    }

    #[test]
    fn test_shorthands() {
        assert!(Shorthand::Word.matches('_'));
        assert!(Shorthand::Word.matches('é'));
        assert!(!Shorthand::Word.matches('-'));
        assert!(Shorthand::Space.matches('\t'));
        assert!(Shorthand::NonDigit.matches('x'));
        assert!(!Shorthand::Digit.matches('x'));
    }

    #[test]
    fn test_zero_width() {
        assert!(Expr::Assertion(Assertion::WordBoundary).is_zero_width());
        assert!(Expr::quantified(Expr::Empty, Quantifier::zero_or_more()).is_zero_width());
        assert!(!Expr::group(1, Expr::literal('a')).is_zero_width());
    }

    #[test]
    fn test_max_width() {
        let ab = Expr::sequence(vec![Expr::literal('a'), Expr::literal('b')]);
        assert_eq!(ab.max_width(), Some(2));
        let either = Expr::alternation(vec![ab.clone(), Expr::literal('c')]);
        assert_eq!(either.max_width(), Some(2));
        let bounded = Expr::quantified(ab.clone(), Quantifier::range(1, Some(3)));
        assert_eq!(bounded.max_width(), Some(6));
        assert_eq!(Expr::quantified(ab, Quantifier::one_or_more()).max_width(), None);
        let empty_loop = Expr::quantified(
            Expr::Assertion(Assertion::WordBoundary),
            Quantifier::zero_or_more(),
        );
        assert_eq!(empty_loop.max_width(), Some(0));
        let backref = Expr::Backreference {
            target: GroupRef::Number(1),
            fold: false,
        };
        assert_eq!(backref.max_width(), None);
    }

    #[test]
    fn test_lookaround_display() {
        let expr = Expr::Lookaround {
            kind: LookKind::NegativeBehind,
            expr: Box::new(Expr::literal('a')),
        };
        assert_eq!(expr.to_regex_string(), "(?<!a)");
        assert!(LookKind::NegativeBehind.is_behind());
        assert!(LookKind::NegativeBehind.is_negated());
        assert!(!LookKind::Ahead.is_negated());
    }
}
