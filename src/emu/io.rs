//! Seams to the frontend: whatever owns the window, speaker and keyboard
//! implements these and hands them to the runner (or calls them itself).

use super::{Frame, Keypad};

/// Supplies the current key state once per frame.
pub trait Input {
    fn poll(&mut self) -> Keypad;
}

/// Plays the buzzer while the sound timer is running.
pub trait Audio {
    fn set_beep(&mut self, on: bool);
}

/// Paints a frame. Implementors own their window/surface handles.
pub trait Renderer {
    type Error;

    fn present(&mut self, frame: &Frame) -> Result<(), Self::Error>;
}

/// A fixed key state, for headless runs and tests.
impl Input for Keypad {
    fn poll(&mut self) -> Keypad {
        *self
    }
}
