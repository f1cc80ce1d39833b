use crate::error::{Fault, Result};

/// # Call Stack
/// Return addresses pushed by CALL and popped by RET.
///
/// The depth is fixed when the stack is built; going past it is a fault rather than
/// wrapping around onto the oldest frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    frames: Vec<u16>,
    depth: usize,
}

impl Stack {
    pub fn new(depth: usize) -> Self {
        Stack {
            frames: Vec::with_capacity(depth),
            depth,
        }
    }

    pub fn push(&mut self, addr: u16) -> Result<()> {
        if self.frames.len() >= self.depth {
            return Err(Fault::StackOverflow { depth: self.depth });
        }
        self.frames.push(addr);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16> {
        self.frames.pop().ok_or(Fault::StackUnderflow)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Oldest frame first.
    pub fn frames(&self) -> &[u16] {
        &self.frames
    }
}
