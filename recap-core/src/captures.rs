//! Capture table: group boundaries and loop registers for one match attempt
//!
//! The table is a flat array of byte offsets. For `G` groups the layout is:
//!
//! ```text
//! [0, 2G)     start and end of each completed group
//! [2G, 3G)    pending start of each group that has been opened
//! [3G, ..)    loop progress registers
//! ```
//!
//! The matcher records the previous value of every slot it overwrites on its
//! backtrack stack, so undoing a failed path restores the table exactly.

/// Marker for a slot that holds no position
pub const UNSET: usize = usize::MAX;

/// Per-attempt capture storage
#[derive(Debug, Clone)]
pub struct CaptureTable {
    slots: Vec<usize>,
    group_count: usize,
}

impl CaptureTable {
    /// Create a table for `group_count` groups (group 0 included) and
    /// `register_count` loop registers
    pub fn new(group_count: usize, register_count: usize) -> Self {
        CaptureTable {
            slots: vec![UNSET; group_count * 3 + register_count],
            group_count,
        }
    }

    /// Clear every slot
    pub fn reset(&mut self) {
        self.slots.fill(UNSET);
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn start_slot(&self, group: u32) -> usize {
        group as usize * 2
    }

    pub fn end_slot(&self, group: u32) -> usize {
        group as usize * 2 + 1
    }

    pub fn pending_slot(&self, group: u32) -> usize {
        self.group_count * 2 + group as usize
    }

    pub fn register_slot(&self, reg: usize) -> usize {
        self.group_count * 3 + reg
    }

    pub fn get(&self, slot: usize) -> usize {
        self.slots[slot]
    }

    /// Overwrite a slot and return what it held before
    pub fn replace(&mut self, slot: usize, value: usize) -> usize {
        std::mem::replace(&mut self.slots[slot], value)
    }

    /// Put back a value returned by [`CaptureTable::replace`]
    pub fn restore(&mut self, slot: usize, old: usize) {
        self.slots[slot] = old;
    }

    /// The span of a completed group
    pub fn span(&self, group: u32) -> Option<(usize, usize)> {
        let start = self.slots[self.start_slot(group)];
        let end = self.slots[self.end_slot(group)];
        (start != UNSET && end != UNSET).then_some((start, end))
    }

    /// Copy out the completed group spans, indexed by group ordinal
    pub fn snapshot(&self) -> Vec<Option<(usize, usize)>> {
        (0..self.group_count as u32).map(|g| self.span(g)).collect()
    }
}
