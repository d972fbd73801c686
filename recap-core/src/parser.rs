//! Parser for regex patterns
//!
//! This module provides a recursive descent parser that converts
//! tokens into an Abstract Syntax Tree (AST).
//!
//! Grammar (in order of precedence, lowest to highest):
//!   regex       := alternation
//!   alternation := sequence ( '|' sequence )*
//!   sequence    := ( inline_options | quantified )*
//!   quantified  := atom quantifier?
//!   quantifier  := ( '*' | '+' | '?' | '{' n (',' m?)? '}' ) '?'?
//!   atom        := literal | anchor | group | class | shorthand | '.' | backref
//!   group       := ( '(' | '(?:' | '(?<name>' | '(?=' | ... ) alternation ')'
//!
//! Options are tracked while parsing. Inline `(?i)` changes last until the
//! end of the enclosing group, `(?i:...)` only inside its own group.

use crate::ast::{Assertion, CharClass, Expr, GroupRef, Quantifier};
use crate::error::{PatternSyntaxError, SyntaxErrorKind};
use crate::groups::GroupRegistry;
use crate::lexer::{GroupKind, Lexer, Token};
use crate::options::RegexOptions;

/// How deeply groups may nest inside each other
pub const MAX_NESTING_DEPTH: usize = 128;

/// The result of parsing: the tree plus the groups it declares
#[derive(Debug, Clone)]
pub struct ParsedPattern {
    pub expr: Expr,
    pub groups: GroupRegistry,
}

/// What a group opener turns into once its body is parsed
enum GroupShape {
    Capturing(u32),
    NonCapturing,
    Lookaround(crate::ast::LookKind),
    Atomic,
}

/// Parser for regex patterns
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
    options: RegexOptions,
    groups: GroupRegistry,
    /// Backreferences seen so far, checked once all groups are known
    backrefs: Vec<(usize, GroupRef)>,
    /// Groups currently open around the parse position
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given pattern and options
    pub fn new(input: &'a str, options: RegexOptions) -> Result<Self, PatternSyntaxError> {
        let mut lexer = Lexer::new(input);
        lexer.set_extended(options.ignore_pattern_whitespace);
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
            options,
            groups: GroupRegistry::new(),
            backrefs: Vec::new(),
            depth: 0,
        })
    }

    /// Advance to the next token
    fn advance(&mut self) -> Result<(), PatternSyntaxError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    /// Take the current token and advance past it
    fn take(&mut self) -> Result<Token, PatternSyntaxError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current_token, next))
    }

    fn error_here(&self, kind: SyntaxErrorKind) -> PatternSyntaxError {
        PatternSyntaxError::new(self.lexer.token_start(), kind)
    }

    fn set_options(&mut self, options: RegexOptions) {
        self.options = options;
        self.lexer.set_extended(options.ignore_pattern_whitespace);
    }

    /// Parse the entire input and return the AST
    pub fn parse(mut self) -> Result<ParsedPattern, PatternSyntaxError> {
        let expr = self.parse_alternation()?;

        match self.current_token {
            Token::Eof => {}
            _ => return Err(self.error_here(SyntaxErrorKind::UnbalancedParenthesis)),
        }

        for (position, target) in &self.backrefs {
            self.groups
                .validate(target)
                .map_err(|kind| PatternSyntaxError::new(*position, kind))?;
        }

        Ok(ParsedPattern {
            expr,
            groups: self.groups,
        })
    }

    /// Parse alternation (lowest precedence)
    /// alternation := sequence ( '|' sequence )*
    fn parse_alternation(&mut self) -> Result<Expr, PatternSyntaxError> {
        let mut alternatives = vec![self.parse_sequence()?];

        while self.current_token == Token::Pipe {
            self.advance()?; // consume '|'
            alternatives.push(self.parse_sequence()?);
        }

        Ok(Expr::alternation(alternatives))
    }

    /// Parse a sequence (concatenation)
    fn parse_sequence(&mut self) -> Result<Expr, PatternSyntaxError> {
        let mut expressions = Vec::new();

        while !self.is_sequence_end() {
            if let Token::InlineOptions(change) = &self.current_token {
                let mut options = self.options;
                change.apply(&mut options);
                self.set_options(options);
                self.advance()?;
                continue;
            }
            expressions.push(self.parse_quantified()?);
        }

        Ok(Expr::sequence(expressions))
    }

    /// Check if we've reached the end of a sequence
    fn is_sequence_end(&self) -> bool {
        matches!(
            self.current_token,
            Token::Eof | Token::RightParen | Token::Pipe
        )
    }

    /// Parse a quantified expression
    /// quantified := atom quantifier?
    fn parse_quantified(&mut self) -> Result<Expr, PatternSyntaxError> {
        if let Some(c) = self.current_token.quantifier_char() {
            return Err(self.error_here(SyntaxErrorKind::NothingToRepeat(c)));
        }

        let atom = self.parse_atom()?;

        let Some(quantifier) = self.parse_quantifier()? else {
            return Ok(atom);
        };
        if let Some(c) = self.current_token.quantifier_char() {
            return Err(self.error_here(SyntaxErrorKind::NestedQuantifier(c)));
        }
        Ok(Expr::quantified(atom, quantifier))
    }

    /// Parse a quantifier and its lazy suffix if present
    fn parse_quantifier(&mut self) -> Result<Option<Quantifier>, PatternSyntaxError> {
        let quantifier = match self.current_token {
            Token::Star => Quantifier::zero_or_more(),
            Token::Plus => Quantifier::one_or_more(),
            Token::Question => Quantifier::optional(),
            Token::Repeat { min, max } => Quantifier::range(min, max),
            _ => return Ok(None),
        };
        self.advance()?;

        if self.current_token == Token::Question {
            self.advance()?;
            return Ok(Some(quantifier.lazy()));
        }
        Ok(Some(quantifier))
    }

    /// Parse an atomic expression
    fn parse_atom(&mut self) -> Result<Expr, PatternSyntaxError> {
        if matches!(self.current_token, Token::LeftParen | Token::GroupOpen(_)) {
            return self.parse_group();
        }

        let start = self.lexer.token_start();
        let fold = self.options.case_insensitive;
        let expr = match self.take()? {
            Token::Literal(c) => Expr::Literal { c, fold },
            Token::Dot => Expr::Any {
                dotall: self.options.singleline,
            },
            Token::Caret => Expr::Assertion(if self.options.multiline {
                Assertion::StartLine
            } else {
                Assertion::StartText
            }),
            Token::Dollar => Expr::Assertion(if self.options.multiline {
                Assertion::EndLine
            } else {
                Assertion::EndTextOptionalNewline
            }),
            Token::Class(class) => Expr::Class { class, fold },
            Token::Shorthand(sh) => Expr::Class {
                class: CharClass::shorthand(sh),
                fold,
            },
            Token::Assertion(assertion) => Expr::Assertion(assertion),
            Token::Backref(target) => {
                self.backrefs.push((start, target.clone()));
                Expr::Backreference { target, fold }
            }
            other => {
                let kind = match other.quantifier_char() {
                    Some(c) => SyntaxErrorKind::NothingToRepeat(c),
                    None => SyntaxErrorKind::UnbalancedParenthesis,
                };
                return Err(PatternSyntaxError::new(start, kind));
            }
        };
        Ok(expr)
    }

    /// Parse a group, from its opener through the closing parenthesis
    fn parse_group(&mut self) -> Result<Expr, PatternSyntaxError> {
        let start = self.lexer.token_start();
        if self.depth == MAX_NESTING_DEPTH {
            return Err(PatternSyntaxError::new(
                start,
                SyntaxErrorKind::NestingTooDeep(MAX_NESTING_DEPTH),
            ));
        }
        let saved = self.options;

        let opener = std::mem::replace(&mut self.current_token, Token::Eof);
        let shape = match opener {
            Token::LeftParen if self.options.explicit_capture => GroupShape::NonCapturing,
            Token::LeftParen => GroupShape::Capturing(self.register(start, None)?),
            Token::GroupOpen(GroupKind::Named(name)) => {
                GroupShape::Capturing(self.register(start, Some(name))?)
            }
            Token::GroupOpen(GroupKind::NonCapturing) => GroupShape::NonCapturing,
            Token::GroupOpen(GroupKind::Lookaround(kind)) => GroupShape::Lookaround(kind),
            Token::GroupOpen(GroupKind::Atomic) => GroupShape::Atomic,
            Token::GroupOpen(GroupKind::Scoped(change)) => {
                let mut options = self.options;
                change.apply(&mut options);
                self.set_options(options);
                GroupShape::NonCapturing
            }
            _ => return Err(PatternSyntaxError::new(start, SyntaxErrorKind::InvalidGroupConstruct)),
        };
        self.advance()?; // consume the opener

        self.depth += 1;
        let inner = self.parse_alternation()?;
        self.depth -= 1;

        if self.current_token != Token::RightParen {
            return Err(PatternSyntaxError::new(start, SyntaxErrorKind::UnclosedGroup));
        }
        // restore before lexing past ')' so extended mode ends with the group
        self.set_options(saved);
        self.advance()?;

        let expr = match shape {
            GroupShape::Capturing(index) => Expr::group(index, inner),
            GroupShape::NonCapturing => Expr::NonCapturingGroup(Box::new(inner)),
            GroupShape::Lookaround(kind) => Expr::Lookaround {
                kind,
                expr: Box::new(inner),
            },
            GroupShape::Atomic => Expr::AtomicGroup(Box::new(inner)),
        };
        Ok(expr)
    }

    fn register(&mut self, start: usize, name: Option<String>) -> Result<u32, PatternSyntaxError> {
        self.groups
            .register_group(name)
            .map_err(|kind| PatternSyntaxError::new(start, kind))
    }
}

/// Parse a regex pattern string into an AST and its group table
pub fn parse(input: &str, options: RegexOptions) -> Result<ParsedPattern, PatternSyntaxError> {
    Parser::new(input, options)?.parse()
}
