use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use super::{
    Audio, Chip8, Chip8Error, Chip8Result, Config, Frame, Input, Keypad, MAX_CPU_HZ, TIMER_HZ,
};

const TIMER_TIME_STEP: f32 = 1.0 / TIMER_HZ;

/// Longest wall-clock step accepted by `update`. Anything longer (a stalled
/// window, a debugger pause) is treated as this much time.
pub const MAX_UPDATE_DT: f32 = 0.25;

/// Shared run flag. Clearing it from any thread stops the runner before its next instruction.
#[derive(Clone, Debug)]
pub struct QuitHandle(Arc<AtomicBool>);

impl QuitHandle {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn quit(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// High-level emulator runner that manages timing internally.
pub struct Chip8Runner {
    chip8: Chip8,
    cpu_time_step: f32,
    /// Upper bound on CPU cycles run by a single `update`
    max_cpu_steps: u32,
    cpu_dt_accumulator: f32,
    timer_dt_accumulator: f32,
    running: QuitHandle,
}

impl Chip8Runner {
    /// Fails with `InvalidCpuRate` unless `config.cpu_hz` is finite and in `(0, MAX_CPU_HZ]`.
    pub fn new(chip8: Chip8, config: &Config) -> Result<Self, Chip8Error> {
        let cpu_hz = config.cpu_hz;
        if !cpu_hz.is_finite() || cpu_hz <= 0.0 || cpu_hz > MAX_CPU_HZ {
            return Err(Chip8Error::InvalidCpuRate {
                cpu_hz,
                max: MAX_CPU_HZ,
            });
        }

        log::debug!("CPU at {} Hz, timers at {} Hz", cpu_hz, TIMER_HZ);

        Ok(Self {
            chip8,
            cpu_time_step: 1.0 / cpu_hz,
            // One spare step for the remainder carried over from the previous update
            max_cpu_steps: (MAX_UPDATE_DT * cpu_hz).ceil() as u32 + 1,
            cpu_dt_accumulator: 0.0,
            timer_dt_accumulator: 0.0,
            running: QuitHandle::new(),
        })
    }

    /// Update emulator by delta time, handles both CPU and timer cycles.
    ///
    /// Runs as many CPU cycles as the configured rate allows for `dt`, then as many
    /// 60Hz timer decrements as have come due. Timers catch up: a `dt` spanning
    /// several timer periods applies one decrement per period. The CPU batch ends early if an
    /// instruction asks to wait for the next frame. A fatal error stops the runner
    /// and is returned; afterwards `update` does nothing.
    pub fn update(&mut self, dt: f32, keys: &Keypad) -> Result<(), Chip8Error> {
        if !self.running.is_running() {
            return Ok(());
        }

        let dt = dt.clamp(0.0, MAX_UPDATE_DT);
        self.cpu_dt_accumulator += dt;
        self.timer_dt_accumulator += dt;

        let mut steps = 0;
        while self.cpu_dt_accumulator >= self.cpu_time_step {
            if steps == self.max_cpu_steps {
                // Rounding left more time than the clamped dt can hold; drop it
                self.cpu_dt_accumulator = 0.0;
                break;
            }
            steps += 1;

            if !self.running.is_running() {
                log::info!("Quit requested at PC {:03X}", self.chip8.pc());
                return Ok(());
            }

            self.cpu_dt_accumulator -= self.cpu_time_step;

            match self.chip8.cpu_cycle(keys) {
                Ok(Chip8Result::WaitForNextFrame) => {
                    // If we need to wait for the next frame we stop executing cycles.
                    // We clear the accumulator to avoid "catching up" in the next frame.
                    self.cpu_dt_accumulator = 0.0;
                    break;
                }
                Ok(Chip8Result::Continue) => {}
                Err(e) => {
                    log::error!("Halting: {e}");
                    self.running.quit();
                    return Err(e);
                }
            }
        }

        while self.timer_dt_accumulator >= TIMER_TIME_STEP {
            self.timer_dt_accumulator -= TIMER_TIME_STEP;
            self.chip8.timers_cycle();
        }

        Ok(())
    }

    /// Polls `input`, advances by `dt`, forwards the beep state to `audio` and
    /// returns the frame to present.
    pub fn step_frame<I: Input, A: Audio>(
        &mut self,
        dt: f32,
        input: &mut I,
        audio: &mut A,
    ) -> Result<&Frame, Chip8Error> {
        let keys = input.poll();
        let result = self.update(dt, &keys);
        audio.set_beep(self.should_beep());
        result?;

        Ok(self.chip8.frame())
    }

    /// Returns true if the sound timer is active, indicating a beep should be played.
    pub fn should_beep(&self) -> bool {
        self.running.is_running() && self.chip8.should_beep()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_running()
    }

    /// Stops the runner; no further instruction will be executed.
    pub fn quit(&self) {
        self.running.quit();
    }

    /// A handle that can stop this runner from elsewhere, e.g. another thread.
    pub fn quit_handle(&self) -> QuitHandle {
        self.running.clone()
    }

    pub fn chip8_ref(&self) -> &Chip8 {
        &self.chip8
    }

    pub fn chip8_mut(&mut self) -> &mut Chip8 {
        &mut self.chip8
    }
}
