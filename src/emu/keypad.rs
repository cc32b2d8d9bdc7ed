use crate::u4;

/// Snapshot of the 16-key hex keypad (true = pressed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keypad([bool; 16]);

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot with exactly the given keys held down.
    pub fn with_pressed(keys: impl IntoIterator<Item = u4>) -> Self {
        let mut keypad = Self::new();
        for key in keys {
            keypad.set(key, true);
        }
        keypad
    }

    /// Set the state of a key on the keypad.
    pub fn set(&mut self, key: u4, pressed: bool) {
        self.0[key] = pressed;
    }

    pub fn is_pressed(&self, key: u4) -> bool {
        self.0[key]
    }

    /// The lowest-numbered key currently held, if any.
    pub fn first_pressed(&self) -> Option<u4> {
        self.0
            .iter()
            .position(|&pressed| pressed)
            .map(|key| u4::new(key as u8))
    }
}
