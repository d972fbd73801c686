//! Backtracking matcher
//!
//! Runs a compiled [`Program`] at one input position. The search is depth
//! first: `Split` pushes the alternative it did not take onto an explicit
//! backtrack stack, so matching never recurses in proportion to the input.
//! The same stack holds undo records for every capture table write, and
//! popping back to an alternative restores the captures it saw.
//!
//! Lookaround and atomic groups run their sub-program in a nested call.
//! When the sub-program succeeds its alternatives are cut from the stack while
//! its undo records stay, so the outer search can still roll the captures
//! back.

use crate::ast::{fold_char, is_word_char, Assertion, LookKind};
use crate::captures::CaptureTable;
use crate::error::MatchTimeoutError;
use crate::program::{Inst, InstId, Program};
use std::time::{Duration, Instant};
use tracing::debug;

/// Steps between clock reads
const CHECK_INTERVAL: u32 = 64;

/// A point in time after which a search is abandoned
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    at: Option<Instant>,
    timeout: Duration,
}

impl Deadline {
    /// A deadline `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        let started = Instant::now();
        Deadline {
            started,
            // an unrepresentable instant is as good as no deadline
            at: started.checked_add(timeout),
            timeout,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// A backtrack stack entry
#[derive(Debug, Clone, Copy)]
enum Frame {
    /// An alternative to resume
    Retry { pc: InstId, pos: usize },
    /// A capture slot to put back
    Restore { slot: usize, old: usize },
}

/// Matcher working state for one search
///
/// A matcher is created per top-level search and reused for every start
/// position that search tries.
pub struct Matcher<'a> {
    program: &'a Program,
    pattern: &'a str,
    input: &'a str,
    search_start: usize,
    captures: CaptureTable,
    stack: Vec<Frame>,
    deadline: Option<Deadline>,
    countdown: u32,
}

impl<'a> Matcher<'a> {
    /// Create a matcher for `input`
    ///
    /// `search_start` is the position `\G` matches at. `pattern` is only used
    /// to describe a timeout.
    pub fn new(
        program: &'a Program,
        pattern: &'a str,
        input: &'a str,
        search_start: usize,
        deadline: Option<Deadline>,
    ) -> Self {
        Matcher {
            program,
            pattern,
            input,
            search_start,
            captures: CaptureTable::new(program.group_count, program.register_count),
            stack: Vec::new(),
            deadline,
            countdown: CHECK_INTERVAL,
        }
    }

    /// Try to match exactly at `start`
    ///
    /// On success returns the span of every group, indexed by ordinal, with
    /// group 0 holding the whole match.
    pub fn try_match_at(
        &mut self,
        start: usize,
    ) -> Result<Option<Vec<Option<(usize, usize)>>>, MatchTimeoutError> {
        self.stack.clear();
        self.captures.reset();

        let Some(end) = self.exec(0, start, None)? else {
            return Ok(None);
        };

        let start_slot = self.captures.start_slot(0);
        let end_slot = self.captures.end_slot(0);
        self.captures.replace(start_slot, start);
        self.captures.replace(end_slot, end);
        Ok(Some(self.captures.snapshot()))
    }

    /// Run from `pc` until a `Succeed` is reached or every alternative pushed
    /// by this call failed
    ///
    /// With `end_at`, `Succeed` only counts at that position.
    fn exec(
        &mut self,
        mut pc: InstId,
        mut pos: usize,
        end_at: Option<usize>,
    ) -> Result<Option<usize>, MatchTimeoutError> {
        let base = self.stack.len();
        let program = self.program;

        loop {
            self.tick()?;

            let next = match &program.insts[pc] {
                Inst::Char { c, fold } => self
                    .char_at(pos)
                    .filter(|&ch| if *fold { fold_char(ch) == *c } else { ch == *c })
                    .map(|ch| (pc + 1, pos + ch.len_utf8())),
                Inst::Any { dotall } => self
                    .char_at(pos)
                    .filter(|&ch| *dotall || ch != '\n')
                    .map(|ch| (pc + 1, pos + ch.len_utf8())),
                Inst::Class { class, fold } => self
                    .char_at(pos)
                    .filter(|&ch| class.matches(ch, *fold))
                    .map(|ch| (pc + 1, pos + ch.len_utf8())),
                Inst::Assert(assertion) => self.assert(*assertion, pos).then_some((pc + 1, pos)),
                Inst::Split { primary, secondary } => {
                    self.stack.push(Frame::Retry {
                        pc: *secondary,
                        pos,
                    });
                    Some((*primary, pos))
                }
                Inst::Jmp(target) => Some((*target, pos)),
                Inst::Mark(reg) => {
                    let slot = self.captures.register_slot(*reg);
                    self.write(slot, pos);
                    Some((pc + 1, pos))
                }
                Inst::LoopCheck { reg, exit } => {
                    let slot = self.captures.register_slot(*reg);
                    if self.captures.get(slot) == pos {
                        Some((*exit, pos))
                    } else {
                        Some((pc + 1, pos))
                    }
                }
                Inst::Open(group) => {
                    let slot = self.captures.pending_slot(*group);
                    self.write(slot, pos);
                    Some((pc + 1, pos))
                }
                Inst::Close(group) => {
                    let start = self.captures.get(self.captures.pending_slot(*group));
                    self.write(self.captures.start_slot(*group), start);
                    self.write(self.captures.end_slot(*group), pos);
                    Some((pc + 1, pos))
                }
                Inst::Backref { group, fold } => {
                    self.backref(*group, *fold, pos).map(|end| (pc + 1, end))
                }
                Inst::Look {
                    kind,
                    body,
                    next,
                    reach,
                } => self.look(*kind, *body, *reach, pos)?.then_some((*next, pos)),
                Inst::Atomic { body, next } => {
                    let mark = self.stack.len();
                    self.exec(*body, pos, None)?.map(|end| {
                        self.cut(mark);
                        (*next, end)
                    })
                }
                Inst::Succeed => {
                    if end_at.is_none_or(|end| end == pos) {
                        return Ok(Some(pos));
                    }
                    None
                }
            };

            match next.or_else(|| self.backtrack(base)) {
                Some((next_pc, next_pos)) => {
                    pc = next_pc;
                    pos = next_pos;
                }
                None => return Ok(None),
            }
        }
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        self.input[pos..].chars().next()
    }

    /// Write a capture slot, recording the old value for backtracking
    fn write(&mut self, slot: usize, value: usize) {
        let old = self.captures.replace(slot, value);
        if old != value {
            self.stack.push(Frame::Restore { slot, old });
        }
    }

    /// Pop to the most recent alternative above `base`, undoing writes on the way
    fn backtrack(&mut self, base: usize) -> Option<(InstId, usize)> {
        while self.stack.len() > base {
            match self.stack.pop()? {
                Frame::Retry { pc, pos } => return Some((pc, pos)),
                Frame::Restore { slot, old } => self.captures.restore(slot, old),
            }
        }
        None
    }

    /// Undo everything above `mark`
    fn unwind(&mut self, mark: usize) {
        while self.stack.len() > mark {
            if let Some(Frame::Restore { slot, old }) = self.stack.pop() {
                self.captures.restore(slot, old);
            }
        }
    }

    /// Drop the alternatives above `mark`, keeping their undo records
    fn cut(&mut self, mark: usize) {
        let mut kept = mark;
        for i in mark..self.stack.len() {
            if let Frame::Restore { .. } = self.stack[i] {
                self.stack.swap(kept, i);
                kept += 1;
            }
        }
        self.stack.truncate(kept);
    }

    /// Evaluate a lookaround at `pos`
    fn look(
        &mut self,
        kind: LookKind,
        body: InstId,
        reach: Option<usize>,
        pos: usize,
    ) -> Result<bool, MatchTimeoutError> {
        let mark = self.stack.len();
        let found = if kind.is_behind() {
            self.look_behind(body, reach, pos)?
        } else {
            self.exec(body, pos, None)?.is_some()
        };

        if found == kind.is_negated() {
            // a negative lookaround that matched leaves nothing behind
            self.unwind(mark);
            return Ok(false);
        }
        if found {
            self.cut(mark);
        }
        Ok(true)
    }

    /// Find a start position from which `body` matches up to exactly `pos`
    ///
    /// Starts are tried left to right, beginning `reach` characters back (or
    /// at the start of the input), so the lookbehind takes the longest span
    /// that ends at `pos`. Greedy quantifiers inside it capture as much as
    /// they would when matched right to left; lazy ones do not shorten it.
    fn look_behind(
        &mut self,
        body: InstId,
        reach: Option<usize>,
        pos: usize,
    ) -> Result<bool, MatchTimeoutError> {
        let before = &self.input[..pos];
        let lowest = match reach {
            Some(n) => before.char_indices().rev().take(n).last().map_or(pos, |(i, _)| i),
            None => 0,
        };
        for start in lowest..=pos {
            if !self.input.is_char_boundary(start) {
                continue;
            }
            if self.exec(body, start, Some(pos))?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Match the text of `group` at `pos`, returning the end position
    fn backref(&self, group: u32, fold: bool, pos: usize) -> Option<usize> {
        let (start, end) = self.captures.span(group)?;
        let captured = &self.input[start..end];
        let rest = &self.input[pos..];

        if !fold {
            return rest.starts_with(captured).then_some(pos + captured.len());
        }

        let mut consumed = 0;
        let mut rest_chars = rest.chars();
        for c in captured.chars() {
            let r = rest_chars.next()?;
            if fold_char(r) != fold_char(c) {
                return None;
            }
            consumed += r.len_utf8();
        }
        Some(pos + consumed)
    }

    fn assert(&self, assertion: Assertion, pos: usize) -> bool {
        let bytes = self.input.as_bytes();
        let len = bytes.len();
        match assertion {
            Assertion::StartText => pos == 0,
            Assertion::StartLine => pos == 0 || bytes[pos - 1] == b'\n',
            Assertion::EndText => pos == len,
            Assertion::EndTextOptionalNewline => {
                pos == len || (pos + 1 == len && bytes[pos] == b'\n')
            }
            Assertion::EndLine => pos == len || bytes[pos] == b'\n',
            Assertion::SearchStart => pos == self.search_start,
            Assertion::WordBoundary => self.is_word_boundary(pos),
            Assertion::NonWordBoundary => !self.is_word_boundary(pos),
        }
    }

    fn is_word_boundary(&self, pos: usize) -> bool {
        let before = self.input[..pos].chars().next_back().is_some_and(is_word_char);
        let after = self.input[pos..].chars().next().is_some_and(is_word_char);
        before != after
    }

    /// Count a step, reading the clock every `CHECK_INTERVAL` steps
    fn tick(&mut self) -> Result<(), MatchTimeoutError> {
        let Some(deadline) = self.deadline else {
            return Ok(());
        };
        self.countdown -= 1;
        if self.countdown > 0 {
            return Ok(());
        }
        self.countdown = CHECK_INTERVAL;
        if !deadline.is_expired() {
            return Ok(());
        }

        let elapsed = deadline.elapsed();
        debug!(
            pattern = self.pattern,
            input_len = self.input.len(),
            timeout = ?deadline.timeout(),
            elapsed = ?elapsed,
            "match timed out"
        );
        Err(MatchTimeoutError {
            input: self.input.to_string(),
            pattern: self.pattern.to_string(),
            timeout: deadline.timeout(),
            elapsed,
        })
    }
}
