//! Lexer for tokenizing regex patterns
//!
//! This module converts pattern text into a stream of tokens for the parser.
//! Character classes and `{n,m}` quantifiers are lexed whole, so the parser
//! only ever sees complete units. Every token remembers the byte offset it
//! started at for error reporting.

use crate::ast::{Assertion, CharClass, ClassItem, GroupRef, LookKind, Shorthand};
use crate::error::{PatternSyntaxError, SyntaxErrorKind};
use crate::options::RegexOptions;

/// A token in a regex pattern
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A plain capturing `(`
    LeftParen,
    /// Any `(?...` group opener
    GroupOpen(GroupKind),
    /// `(?imnsx-imnsx)`: changes options for the rest of the enclosing group
    InlineOptions(OptionChange),
    /// Right parenthesis `)`
    RightParen,
    /// Pipe `|` (alternation)
    Pipe,
    /// Caret `^`
    Caret,
    /// Dollar `$`
    Dollar,
    /// Dot `.`
    Dot,
    /// Star `*`
    Star,
    /// Plus `+`
    Plus,
    /// Question `?` (optional, or lazy suffix)
    Question,
    /// `{n}`, `{n,}` or `{n,m}`
    Repeat { min: u32, max: Option<u32> },
    /// A bracketed character class
    Class(CharClass),
    /// `\d`, `\w`, `\s` and their negations
    Shorthand(Shorthand),
    /// `\A`, `\z`, `\Z`, `\G`, `\b`, `\B`
    Assertion(Assertion),
    /// `\1`, `\k<name>`
    Backref(GroupRef),
    /// A literal character, escapes already resolved
    Literal(char),
    /// End of input
    Eof,
}

/// The kinds of `(?...` group openers
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKind {
    /// `(?:`
    NonCapturing,
    /// `(?<name>` or `(?'name'`
    Named(String),
    /// `(?=`, `(?!`, `(?<=`, `(?<!`
    Lookaround(LookKind),
    /// `(?>`
    Atomic,
    /// `(?imnsx-imnsx:`
    Scoped(OptionChange),
}

/// Option letters switched on and off by an inline option group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionChange {
    pub enable: Vec<char>,
    pub disable: Vec<char>,
}

impl OptionChange {
    /// Apply the change to a set of options
    pub fn apply(&self, options: &mut RegexOptions) {
        for &c in &self.enable {
            options.set_flag(c, true);
        }
        for &c in &self.disable {
            options.set_flag(c, false);
        }
    }
}

impl Token {
    /// The character that introduced a quantifier token
    pub fn quantifier_char(&self) -> Option<char> {
        match self {
            Token::Star => Some('*'),
            Token::Plus => Some('+'),
            Token::Question => Some('?'),
            Token::Repeat { .. } => Some('{'),
            _ => None,
        }
    }
}

/// Lexer for tokenizing regex patterns
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    token_start: usize,
    /// Skip whitespace and `#` comments between tokens
    extended: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input string
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            position: 0,
            token_start: 0,
            extended: false,
        }
    }

    /// Turn extended (`x`) mode on or off for tokens not yet lexed
    pub fn set_extended(&mut self, extended: bool) {
        self.extended = extended;
    }

    /// Byte offset where the most recent token started
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Byte offset of the next unread character
    pub fn position(&self) -> usize {
        self.position
    }

    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.position..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.position += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn error(&self, kind: SyntaxErrorKind) -> PatternSyntaxError {
        PatternSyntaxError::new(self.token_start, kind)
    }

    /// Skip whitespace and `#`-to-end-of-line comments in extended mode
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token, PatternSyntaxError> {
        if self.extended {
            self.skip_trivia();
        }
        self.token_start = self.position;

        let Some(c) = self.bump() else {
            return Ok(Token::Eof);
        };

        let token = match c {
            '\\' => self.read_escape()?,
            '(' => return self.read_group_open(),
            ')' => Token::RightParen,
            '|' => Token::Pipe,
            '^' => Token::Caret,
            '$' => Token::Dollar,
            '.' => Token::Dot,
            '*' => Token::Star,
            '+' => Token::Plus,
            '?' => Token::Question,
            '[' => self.read_class()?,
            '{' => match self.read_repeat()? {
                Some((min, max)) => Token::Repeat { min, max },
                None => Token::Literal('{'),
            },
            c => Token::Literal(c),
        };
        Ok(token)
    }

    /// Read an escape sequence outside a class (backslash already consumed)
    fn read_escape(&mut self) -> Result<Token, PatternSyntaxError> {
        let c = self
            .bump()
            .ok_or_else(|| self.error(SyntaxErrorKind::TrailingBackslash))?;

        let token = match c {
            'd' => Token::Shorthand(Shorthand::Digit),
            'D' => Token::Shorthand(Shorthand::NonDigit),
            'w' => Token::Shorthand(Shorthand::Word),
            'W' => Token::Shorthand(Shorthand::NonWord),
            's' => Token::Shorthand(Shorthand::Space),
            'S' => Token::Shorthand(Shorthand::NonSpace),
            'b' => Token::Assertion(Assertion::WordBoundary),
            'B' => Token::Assertion(Assertion::NonWordBoundary),
            'A' => Token::Assertion(Assertion::StartText),
            'z' => Token::Assertion(Assertion::EndText),
            'Z' => Token::Assertion(Assertion::EndTextOptionalNewline),
            'G' => Token::Assertion(Assertion::SearchStart),
            'k' => self.read_named_backref()?,
            '1'..='9' => {
                let digits_start = self.position - 1;
                while matches!(self.peek(), Some('0'..='9')) {
                    self.bump();
                }
                let n = self.parse_number(&self.input[digits_start..self.position])?;
                Token::Backref(GroupRef::Number(n))
            }
            c => Token::Literal(self.read_char_escape(c)?),
        };
        Ok(token)
    }

    /// Read `\k<name>` or `\k'name'` (backslash and `k` already consumed)
    fn read_named_backref(&mut self) -> Result<Token, PatternSyntaxError> {
        let close = match self.peek() {
            Some('<') => '>',
            Some('\'') => '\'',
            _ => return Err(self.error(SyntaxErrorKind::InvalidEscape('k'))),
        };
        self.bump();
        let name = self.read_delimited(close)?;
        if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
            let n = self.parse_number(name)?;
            return Ok(Token::Backref(GroupRef::Number(n)));
        }
        if !is_valid_name(name) {
            return Err(self.error(SyntaxErrorKind::InvalidGroupName(name.to_string())));
        }
        Ok(Token::Backref(GroupRef::Name(name.to_string())))
    }

    /// Resolve a character escape shared by classes and plain text
    fn read_char_escape(&mut self, c: char) -> Result<char, PatternSyntaxError> {
        let resolved = match c {
            't' => '\t',
            'n' => '\n',
            'r' => '\r',
            'f' => '\x0C',
            'v' => '\x0B',
            'a' => '\x07',
            'e' => '\x1B',
            '0' => {
                let mut value = 0u32;
                for _ in 0..2 {
                    match self.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                char::from_u32(value).unwrap_or('\0')
            }
            'x' => self.read_hex(2)?,
            'u' => self.read_hex(4)?,
            'c' => match self.bump() {
                Some(letter) if letter.is_ascii_alphabetic() => {
                    char::from(letter.to_ascii_uppercase() as u8 - b'@')
                }
                _ => return Err(self.error(SyntaxErrorKind::InvalidControlEscape)),
            },
            c if c.is_alphanumeric() || c == '_' => {
                return Err(self.error(SyntaxErrorKind::InvalidEscape(c)));
            }
            c => c,
        };
        Ok(resolved)
    }

    fn read_hex(&mut self, digits: usize) -> Result<char, PatternSyntaxError> {
        let mut value = 0u32;
        for _ in 0..digits {
            let d = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error(SyntaxErrorKind::InvalidHexEscape))?;
            value = value * 16 + d;
        }
        char::from_u32(value).ok_or_else(|| self.error(SyntaxErrorKind::InvalidHexEscape))
    }

    fn parse_number(&self, digits: &str) -> Result<u32, PatternSyntaxError> {
        digits
            .parse::<u32>()
            .map_err(|_| self.error(SyntaxErrorKind::PatternTooLarge(u32::MAX as usize)))
    }

    /// Read a `{n}`, `{n,}` or `{n,m}` quantifier (`{` already consumed)
    ///
    /// Anything else leaves the lexer where it was and returns `None`, and the
    /// `{` is taken literally.
    fn read_repeat(&mut self) -> Result<Option<(u32, Option<u32>)>, PatternSyntaxError> {
        let rest = &self.input[self.position..];
        let Some(close) = rest.find('}') else {
            return Ok(None);
        };
        let body = &rest[..close];
        let (min_text, max_text) = match body.split_once(',') {
            Some((min, max)) => (min, Some(max)),
            None => (body, None),
        };
        let is_number = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !is_number(min_text) || max_text.is_some_and(|m| !m.is_empty() && !is_number(m)) {
            return Ok(None);
        }

        let min = self.parse_number(min_text)?;
        let max = match max_text {
            None => Some(min),
            Some("") => None,
            Some(m) => Some(self.parse_number(m)?),
        };
        if let Some(max) = max
            && max < min
        {
            return Err(self.error(SyntaxErrorKind::QuantifierOutOfOrder));
        }
        self.position += close + 1;
        Ok(Some((min, max)))
    }

    /// Read a group opener (`(` already consumed)
    fn read_group_open(&mut self) -> Result<Token, PatternSyntaxError> {
        if !self.eat('?') {
            return Ok(Token::LeftParen);
        }

        let c = self
            .bump()
            .ok_or_else(|| self.error(SyntaxErrorKind::UnclosedGroup))?;
        let kind = match c {
            ':' => GroupKind::NonCapturing,
            '=' => GroupKind::Lookaround(LookKind::Ahead),
            '!' => GroupKind::Lookaround(LookKind::NegativeAhead),
            '>' => GroupKind::Atomic,
            '<' if self.eat('=') => GroupKind::Lookaround(LookKind::Behind),
            '<' if self.eat('!') => GroupKind::Lookaround(LookKind::NegativeBehind),
            '<' => GroupKind::Named(self.read_group_name('>')?),
            '\'' => GroupKind::Named(self.read_group_name('\'')?),
            '#' => {
                // (?#comment)
                loop {
                    match self.bump() {
                        Some(')') => break,
                        Some(_) => {}
                        None => return Err(self.error(SyntaxErrorKind::UnclosedGroup)),
                    }
                }
                return self.next_token();
            }
            c if c == '-' || is_option_letter(c) => {
                let change = self.read_option_change(c)?;
                if self.eat(')') {
                    return Ok(Token::InlineOptions(change));
                }
                if self.eat(':') {
                    GroupKind::Scoped(change)
                } else {
                    return Err(self.error(SyntaxErrorKind::InvalidGroupConstruct));
                }
            }
            _ => return Err(self.error(SyntaxErrorKind::InvalidGroupConstruct)),
        };
        Ok(Token::GroupOpen(kind))
    }

    /// Read `imnsx-imnsx` starting with the already consumed `first`
    fn read_option_change(&mut self, first: char) -> Result<OptionChange, PatternSyntaxError> {
        let mut change = OptionChange::default();
        let mut disabling = false;
        let mut next = Some(first);
        while let Some(c) = next {
            if c == '-' {
                if disabling {
                    return Err(self.error(SyntaxErrorKind::InvalidGroupConstruct));
                }
                disabling = true;
            } else if is_option_letter(c) {
                if disabling {
                    change.disable.push(c);
                } else {
                    change.enable.push(c);
                }
            } else {
                return Err(self.error(SyntaxErrorKind::InvalidGroupConstruct));
            }
            next = match self.peek() {
                Some(c) if c == '-' || is_option_letter(c) => self.bump(),
                _ => None,
            };
        }
        Ok(change)
    }

    /// Read the text up to `close`, consuming the terminator
    fn read_delimited(&mut self, close: char) -> Result<&'a str, PatternSyntaxError> {
        let start = self.position;
        loop {
            match self.bump() {
                Some(c) if c == close => break,
                Some(_) => {}
                None => {
                    let name = self.input[start..].to_string();
                    return Err(self.error(SyntaxErrorKind::InvalidGroupName(name)));
                }
            }
        }
        let input = self.input;
        Ok(&input[start..self.position - close.len_utf8()])
    }

    /// Read a group name up to `close`, consuming the terminator
    ///
    /// Names are identifiers. Explicitly numbered groups such as `(?<2>...)`
    /// are rejected here.
    fn read_group_name(&mut self, close: char) -> Result<String, PatternSyntaxError> {
        let name = self.read_delimited(close)?;
        if is_valid_name(name) {
            Ok(name.to_string())
        } else {
            Err(self.error(SyntaxErrorKind::InvalidGroupName(name.to_string())))
        }
    }

    /// Read a bracketed class (`[` already consumed)
    fn read_class(&mut self) -> Result<Token, PatternSyntaxError> {
        let negated = self.eat('^');
        let mut items = Vec::new();
        let mut first = true;

        loop {
            let c = self
                .bump()
                .ok_or_else(|| self.error(SyntaxErrorKind::UnclosedCharacterClass))?;
            if c == ']' && !first {
                break;
            }
            first = false;

            let item = if c == '\\' {
                self.read_class_escape()?
            } else {
                ClassItem::Char(c)
            };

            let ClassItem::Char(start) = item else {
                items.push(item);
                continue;
            };

            let is_range = self.peek() == Some('-')
                && self.peek_second().is_some_and(|next| next != ']');
            if !is_range {
                items.push(item);
                continue;
            }
            self.bump(); // consume '-'

            let end_item = match self.bump() {
                Some('\\') => self.read_class_escape()?,
                Some(c) => ClassItem::Char(c),
                None => return Err(self.error(SyntaxErrorKind::UnclosedCharacterClass)),
            };
            match end_item {
                ClassItem::Char(end) if end < start => {
                    return Err(self.error(SyntaxErrorKind::ReversedRange));
                }
                ClassItem::Char(end) => items.push(ClassItem::Range(start, end)),
                other => {
                    // [a-\d] is a, '-', and \d
                    items.push(ClassItem::Char(start));
                    items.push(ClassItem::Char('-'));
                    items.push(other);
                }
            }
        }

        Ok(Token::Class(CharClass { negated, items }))
    }

    /// Read an escape inside a class (backslash already consumed)
    fn read_class_escape(&mut self) -> Result<ClassItem, PatternSyntaxError> {
        let c = self
            .bump()
            .ok_or_else(|| self.error(SyntaxErrorKind::UnclosedCharacterClass))?;
        let item = match c {
            'd' => ClassItem::Shorthand(Shorthand::Digit),
            'D' => ClassItem::Shorthand(Shorthand::NonDigit),
            'w' => ClassItem::Shorthand(Shorthand::Word),
            'W' => ClassItem::Shorthand(Shorthand::NonWord),
            's' => ClassItem::Shorthand(Shorthand::Space),
            'S' => ClassItem::Shorthand(Shorthand::NonSpace),
            'b' => ClassItem::Char('\x08'),
            c => ClassItem::Char(self.read_char_escape(c)?),
        };
        Ok(item)
    }

    /// Tokenize the entire input and return a vector of tokens
    pub fn tokenize(&mut self) -> Result<Vec<Token>, PatternSyntaxError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}

fn is_option_letter(c: char) -> bool {
    matches!(c, 'i' | 'm' | 'n' | 's' | 'x')
}

/// Group names are identifiers: a letter or `_`, then word characters
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}
