//! Instruction program for the backtracking matcher
//!
//! This module lowers an AST into a flat list of instructions. Control flow
//! is expressed with `Split` (try one branch, remember the other) and `Jmp`;
//! lookaround and atomic groups run a sub-program that ends in its own
//! `Succeed`.
//!
//! Loops that can match the empty string are guarded by a progress register:
//! `Mark` records the position at the start of an iteration and `LoopCheck`
//! leaves the loop when an iteration consumed nothing.

use crate::ast::{fold_char, Assertion, CharClass, Expr, LookKind, Quantifier};
use crate::error::SyntaxErrorKind;
use crate::groups::GroupRegistry;

/// Index of an instruction in a program
pub type InstId = usize;

/// The largest program the compiler produces
pub const MAX_PROGRAM_SIZE: usize = 1 << 20;

/// A single matcher instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Inst {
    /// Match one character. With `fold`, `c` is already folded.
    Char { c: char, fold: bool },
    /// Match any character, `\n` only when `dotall`
    Any { dotall: bool },
    /// Match one character from a class
    Class { class: CharClass, fold: bool },
    /// Zero-width check of the current position
    Assert(Assertion),
    /// Continue at `primary`; on failure resume at `secondary`
    Split { primary: InstId, secondary: InstId },
    /// Continue at the target
    Jmp(InstId),
    /// Record the current position in a loop register
    Mark(usize),
    /// Leave the loop at `exit` if no input was consumed since `Mark`
    LoopCheck { reg: usize, exit: InstId },
    /// Remember where group `n` starts
    Open(u32),
    /// Commit group `n` from its pending start to the current position
    Close(u32),
    /// Match the text group `group` captured
    Backref { group: u32, fold: bool },
    /// Run the sub-program at `body` as a lookaround, then continue at `next`
    ///
    /// `reach` bounds how many characters a lookbehind body can span.
    Look {
        kind: LookKind,
        body: InstId,
        next: InstId,
        reach: Option<usize>,
    },
    /// Run the sub-program at `body` once, discarding its alternatives
    Atomic { body: InstId, next: InstId },
    /// The (sub-)program matched
    Succeed,
}

/// A compiled pattern
#[derive(Debug, Clone)]
pub struct Program {
    pub insts: Vec<Inst>,
    /// Capture groups, group 0 included
    pub group_count: usize,
    /// Loop progress registers used by `Mark`/`LoopCheck`
    pub register_count: usize,
    /// Every match must start where the search starts
    pub anchored: bool,
}

impl Program {
    /// Number of instructions
    pub fn len(&self) -> usize {
        self.insts.len()
    }

    /// Whether the program has no instructions
    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }
}

/// Compile an expression with the default size limit
pub fn compile(expr: &Expr, groups: &GroupRegistry) -> Result<Program, SyntaxErrorKind> {
    compile_with_limit(expr, groups, MAX_PROGRAM_SIZE)
}

/// Compile an expression, failing once the program outgrows `limit`
pub fn compile_with_limit(
    expr: &Expr,
    groups: &GroupRegistry,
    limit: usize,
) -> Result<Program, SyntaxErrorKind> {
    let mut compiler = Compiler {
        insts: Vec::new(),
        registers: 0,
        groups,
        limit,
    };
    compiler.compile_expr(expr)?;
    compiler.push(Inst::Succeed)?;

    Ok(Program {
        insts: compiler.insts,
        group_count: groups.group_count(),
        register_count: compiler.registers,
        anchored: is_anchored(expr),
    })
}

/// Whether every match of `expr` must begin at the search start
fn is_anchored(expr: &Expr) -> bool {
    match expr {
        Expr::Assertion(Assertion::StartText | Assertion::SearchStart) => true,
        Expr::Sequence(exprs) => exprs.first().is_some_and(is_anchored),
        Expr::Alternation(exprs) => exprs.iter().all(is_anchored),
        Expr::Group { expr, .. } | Expr::NonCapturingGroup(expr) | Expr::AtomicGroup(expr) => {
            is_anchored(expr)
        }
        Expr::Quantified { expr, quantifier } => quantifier.min > 0 && is_anchored(expr),
        _ => false,
    }
}

struct Compiler<'g> {
    insts: Vec<Inst>,
    registers: usize,
    groups: &'g GroupRegistry,
    limit: usize,
}

impl Compiler<'_> {
    fn push(&mut self, inst: Inst) -> Result<InstId, SyntaxErrorKind> {
        if self.insts.len() >= self.limit {
            return Err(SyntaxErrorKind::PatternTooLarge(self.limit));
        }
        self.insts.push(inst);
        Ok(self.insts.len() - 1)
    }

    /// Id the next pushed instruction will get
    fn next_id(&self) -> InstId {
        self.insts.len()
    }

    /// Placeholder, overwritten once the jump targets are known
    fn hole(&mut self) -> Result<InstId, SyntaxErrorKind> {
        self.push(Inst::Jmp(0))
    }

    fn split(body: InstId, exit: InstId, lazy: bool) -> Inst {
        if lazy {
            Inst::Split { primary: exit, secondary: body }
        } else {
            Inst::Split { primary: body, secondary: exit }
        }
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<(), SyntaxErrorKind> {
        match expr {
            Expr::Empty => {}
            Expr::Literal { c, fold } => {
                let c = if *fold { fold_char(*c) } else { *c };
                self.push(Inst::Char { c, fold: *fold })?;
            }
            Expr::Any { dotall } => {
                self.push(Inst::Any { dotall: *dotall })?;
            }
            Expr::Class { class, fold } => {
                self.push(Inst::Class {
                    class: class.clone(),
                    fold: *fold,
                })?;
            }
            Expr::Sequence(exprs) => {
                for e in exprs {
                    self.compile_expr(e)?;
                }
            }
            Expr::Alternation(exprs) => self.compile_alternation(exprs)?,
            Expr::Quantified { expr, quantifier } => self.compile_quantified(expr, *quantifier)?,
            Expr::Group { index, expr } => {
                self.push(Inst::Open(*index))?;
                self.compile_expr(expr)?;
                self.push(Inst::Close(*index))?;
            }
            Expr::NonCapturingGroup(expr) => self.compile_expr(expr)?,
            Expr::Assertion(assertion) => {
                self.push(Inst::Assert(*assertion))?;
            }
            Expr::Backreference { target, fold } => {
                let group = self.groups.validate(target)?;
                self.push(Inst::Backref { group, fold: *fold })?;
            }
            Expr::Lookaround { kind, expr } => {
                let at = self.hole()?;
                self.compile_expr(expr)?;
                self.push(Inst::Succeed)?;
                self.insts[at] = Inst::Look {
                    kind: *kind,
                    body: at + 1,
                    next: self.next_id(),
                    reach: if kind.is_behind() { expr.max_width() } else { None },
                };
            }
            Expr::AtomicGroup(expr) => {
                let at = self.hole()?;
                self.compile_expr(expr)?;
                self.push(Inst::Succeed)?;
                self.insts[at] = Inst::Atomic {
                    body: at + 1,
                    next: self.next_id(),
                };
            }
        }
        Ok(())
    }

    /// `a|b|c` becomes a chain of splits, each branch jumping to the end
    fn compile_alternation(&mut self, exprs: &[Expr]) -> Result<(), SyntaxErrorKind> {
        let mut jumps = Vec::with_capacity(exprs.len());

        for (i, alt) in exprs.iter().enumerate() {
            if i + 1 == exprs.len() {
                self.compile_expr(alt)?;
                break;
            }
            let split = self.hole()?;
            self.compile_expr(alt)?;
            jumps.push(self.hole()?);
            self.insts[split] = Inst::Split {
                primary: split + 1,
                secondary: self.next_id(),
            };
        }

        let end = self.next_id();
        for jump in jumps {
            self.insts[jump] = Inst::Jmp(end);
        }
        Ok(())
    }

    fn compile_quantified(&mut self, expr: &Expr, q: Quantifier) -> Result<(), SyntaxErrorKind> {
        if q.max == Some(0) {
            return Ok(());
        }

        // repeating something that never consumes input is the same as once
        if expr.is_zero_width() {
            return if q.min == 0 {
                self.compile_optional(expr, q.lazy)
            } else {
                self.compile_expr(expr)
            };
        }

        for _ in 0..q.min {
            self.compile_expr(expr)?;
        }

        match q.max {
            None => self.compile_star(expr, q.lazy),
            Some(max) => {
                let mut splits = Vec::new();
                for _ in q.min..max {
                    splits.push(self.hole()?);
                    self.compile_expr(expr)?;
                }
                let end = self.next_id();
                for split in splits {
                    self.insts[split] = Self::split(split + 1, end, q.lazy);
                }
                Ok(())
            }
        }
    }

    fn compile_optional(&mut self, expr: &Expr, lazy: bool) -> Result<(), SyntaxErrorKind> {
        let split = self.hole()?;
        self.compile_expr(expr)?;
        self.insts[split] = Self::split(split + 1, self.next_id(), lazy);
        Ok(())
    }

    /// L0: split L1, exit
    /// L1: mark r; body; loopcheck r, exit; jmp L0
    fn compile_star(&mut self, expr: &Expr, lazy: bool) -> Result<(), SyntaxErrorKind> {
        let reg = self.registers;
        self.registers += 1;

        let split = self.hole()?;
        self.push(Inst::Mark(reg))?;
        self.compile_expr(expr)?;
        let check = self.hole()?;
        self.push(Inst::Jmp(split))?;

        let exit = self.next_id();
        self.insts[split] = Self::split(split + 1, exit, lazy);
        self.insts[check] = Inst::LoopCheck { reg, exit };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RegexOptions;
    use crate::parser::parse;

    fn program(pattern: &str) -> Program {
        let parsed = parse(pattern, RegexOptions::default()).unwrap();
        compile(&parsed.expr, &parsed.groups).unwrap()
    }

    #[test]
    fn test_compile_literal() {
        let prog = program("ab");
        assert_eq!(
            prog.insts,
            vec![
                Inst::Char { c: 'a', fold: false },
                Inst::Char { c: 'b', fold: false },
                Inst::Succeed,
            ]
        );
    }

    #[test]
    fn test_compile_folded_literal() {
        let parsed = parse("A", RegexOptions::from_flags("i")).unwrap();
        let prog = compile(&parsed.expr, &parsed.groups).unwrap();
        assert_eq!(prog.insts[0], Inst::Char { c: 'a', fold: true });
    }

    #[test]
    fn test_compile_alternation() {
        let prog = program("a|b");
        assert_eq!(
            prog.insts,
            vec![
                Inst::Split { primary: 1, secondary: 3 },
                Inst::Char { c: 'a', fold: false },
                Inst::Jmp(4),
                Inst::Char { c: 'b', fold: false },
                Inst::Succeed,
            ]
        );
    }

    #[test]
    fn test_compile_star() {
        let prog = program("a*");
        assert_eq!(
            prog.insts,
            vec![
                Inst::Split { primary: 1, secondary: 5 },
                Inst::Mark(0),
                Inst::Char { c: 'a', fold: false },
                Inst::LoopCheck { reg: 0, exit: 5 },
                Inst::Jmp(0),
                Inst::Succeed,
            ]
        );
        assert_eq!(prog.register_count, 1);
    }

    #[test]
    fn test_compile_lazy_optional() {
        let prog = program("a??");
        assert_eq!(prog.insts[0], Inst::Split { primary: 2, secondary: 1 });
    }

    #[test]
    fn test_compile_bounded_repeat() {
        // two mandatory copies, then one optional copy
        let prog = program("a{2,3}");
        assert_eq!(
            prog.insts,
            vec![
                Inst::Char { c: 'a', fold: false },
                Inst::Char { c: 'a', fold: false },
                Inst::Split { primary: 3, secondary: 4 },
                Inst::Char { c: 'a', fold: false },
                Inst::Succeed,
            ]
        );
    }

    #[test]
    fn test_compile_group() {
        let prog = program("(a)");
        assert_eq!(
            prog.insts,
            vec![
                Inst::Open(1),
                Inst::Char { c: 'a', fold: false },
                Inst::Close(1),
                Inst::Succeed,
            ]
        );
        assert_eq!(prog.group_count, 2);
    }

    #[test]
    fn test_compile_lookahead() {
        let prog = program("(?=a)b");
        assert_eq!(
            prog.insts,
            vec![
                Inst::Look {
                    kind: LookKind::Ahead,
                    body: 1,
                    next: 3,
                    reach: None,
                },
                Inst::Char { c: 'a', fold: false },
                Inst::Succeed,
                Inst::Char { c: 'b', fold: false },
                Inst::Succeed,
            ]
        );
    }

    #[test]
    fn test_lookbehind_reach() {
        let reach = |pattern: &str| match program(pattern).insts[0] {
            Inst::Look { reach, .. } => reach,
            ref other => panic!("expected a lookaround, got {:?}", other),
        };
        assert_eq!(reach("(?<=ab|c)x"), Some(2));
        assert_eq!(reach(r"(?<!\d{2,4})x"), Some(4));
        assert_eq!(reach("(?<=a+)x"), None);
        assert_eq!(reach("(?=abc)x"), None);
    }

    #[test]
    fn test_zero_width_loop_compiled_once() {
        let prog = program(r"\b*");
        assert_eq!(
            prog.insts,
            vec![
                Inst::Split { primary: 1, secondary: 2 },
                Inst::Assert(Assertion::WordBoundary),
                Inst::Succeed,
            ]
        );
        assert_eq!(prog.register_count, 0);
    }

    #[test]
    fn test_zero_max_compiles_to_nothing() {
        assert_eq!(program("a{0}").insts, vec![Inst::Succeed]);
    }

    #[test]
    fn test_anchored_detection() {
        assert!(program(r"^abc").anchored);
        assert!(program(r"\Ga|\Ab").anchored);
        assert!(!program(r"a|^b").anchored);
        assert!(!program(r"abc").anchored);
        let parsed = parse("^a", RegexOptions::from_flags("m")).unwrap();
        assert!(!compile(&parsed.expr, &parsed.groups).unwrap().anchored);
    }

    #[test]
    fn test_pattern_too_large() {
        let parsed = parse("a{100}", RegexOptions::default()).unwrap();
        assert_eq!(
            compile_with_limit(&parsed.expr, &parsed.groups, 50).unwrap_err(),
            SyntaxErrorKind::PatternTooLarge(50)
        );
        let parsed = parse("(?:a{2000}){1000}", RegexOptions::default()).unwrap();
        assert!(matches!(
            compile(&parsed.expr, &parsed.groups),
            Err(SyntaxErrorKind::PatternTooLarge(_))
        ));
    }
}
