use super::memory::ROM_START_ADDRESS;

/// Maximum number of nested subroutine calls.
pub const STACK_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StackError {
    #[error("call stack is full")]
    Overflow,
    #[error("call stack is empty")]
    Underflow,
}

/// Fixed-capacity stack of return addresses.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    slots: [u16; STACK_DEPTH],
    sp: usize,
}

impl CallStack {
    pub fn push(&mut self, address: u16) -> Result<(), StackError> {
        let slot = self.slots.get_mut(self.sp).ok_or(StackError::Overflow)?;
        *slot = address;
        self.sp += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, StackError> {
        self.sp = self.sp.checked_sub(1).ok_or(StackError::Underflow)?;
        Ok(self.slots[self.sp])
    }

    /// Number of return addresses currently held.
    pub fn depth(&self) -> usize {
        self.sp
    }

    /// The live part of the stack, bottom first.
    pub fn as_slice(&self) -> &[u16] {
        &self.slots[..self.sp]
    }
}

/// CPU register file
#[derive(Debug, Clone)]
pub struct Registers {
    /// General-purpose registers V0-VF (VF is used as a flag register)
    pub v: [u8; 16],
    /// Index register: used for memory operations
    pub i: u16,
    /// Program counter: address of the next instruction to execute
    pub pc: u16,
    /// Return addresses of the active subroutine calls
    pub stack: CallStack,
    /// Delay timer: decrements at 60Hz until it reaches 0
    pub delay_timer: u8,
    /// Sound timer: decrements at 60Hz, beeps while non-zero
    pub sound_timer: u8,
}

impl Registers {
    pub fn new() -> Self {
        Self {
            v: [0; 16],
            i: 0,
            pc: ROM_START_ADDRESS as u16,
            stack: CallStack::default(),
            delay_timer: 0,
            sound_timer: 0,
        }
    }

    /// Decrements both timers by one, stopping at zero.
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
