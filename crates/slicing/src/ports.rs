//! Run-wide local port allocation.

use crate::SlicingError;

/// Hands out strictly increasing, never reused local ports.
///
/// Each slice asks for ports starting at its own base; the single counter
/// jumps forward to that base when the base is ahead of it and otherwise
/// keeps counting. One allocator serves the whole configuration phase, so no
/// two flows in a run ever share a port.
#[derive(Debug, Clone)]
pub struct PortAllocator {
    /// Next candidate port. Kept wider than `u16` so exhaustion is observable.
    next: u32,
    allocated: usize,
}

impl Default for PortAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PortAllocator {
    /// Create an allocator that has issued nothing yet.
    pub fn new() -> Self {
        Self {
            next: 1,
            allocated: 0,
        }
    }

    /// Allocate the next unused port at or above `base`.
    pub fn allocate(&mut self, base: u16) -> Result<u16, SlicingError> {
        let port = self.next.max(base as u32);
        let port = u16::try_from(port).map_err(|_| SlicingError::PortsExhausted { base })?;
        self.next = port as u32 + 1;
        self.allocated += 1;
        Ok(port)
    }

    /// Number of ports handed out so far.
    pub fn allocated(&self) -> usize {
        self.allocated
    }
}
