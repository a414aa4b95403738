use crate::error::{Result, TraversalError};

/// Hard upper bound on the traversal stack. Trees built from 30-bit keys plus the index bits of
/// the tie-break stay well below this depth.
pub const MAX_STACK_CAPACITY: usize = 64;

/// Node waiting to be visited, with the ray parameter at which the ray enters its box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct StackEntry {
    pub(crate) node: usize,
    pub(crate) entry: f32,
}

/// Fixed-capacity LIFO living on the call stack. Pushing past the configured capacity is an
/// error, never a reallocation.
pub(crate) struct TraversalStack {
    entries: [StackEntry; MAX_STACK_CAPACITY],
    len: usize,
    capacity: usize,
}

impl TraversalStack {
    pub(crate) fn new(capacity: usize) -> Self {
        TraversalStack {
            entries: [StackEntry {
                node: 0,
                entry: 0.0,
            }; MAX_STACK_CAPACITY],
            len: 0,
            capacity: capacity.min(MAX_STACK_CAPACITY),
        }
    }

    pub(crate) fn push(&mut self, node: usize, entry: f32) -> Result<()> {
        if self.len >= self.capacity {
            return Err(TraversalError::StackOverflow {
                capacity: self.capacity,
            });
        }
        self.entries[self.len] = StackEntry { node, entry };
        self.len += 1;
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Option<StackEntry> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            Some(self.entries[self.len])
        }
    }
}
