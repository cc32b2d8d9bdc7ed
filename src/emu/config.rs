/// Default instruction rate; most ROMs are tuned for somewhere between 500 and 1000 Hz.
pub const DEFAULT_CPU_HZ: f32 = 700.0;
/// Fastest accepted instruction rate.
pub const MAX_CPU_HZ: f32 = 1_000_000.0;
/// Rate of the delay and sound timers. Fixed by the platform.
pub const TIMER_HZ: f32 = 60.0;

/// Behaviors that differ between CHIP-8 interpreters and that ROMs depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    /// 8xy6/8xyE shift Vy and store the result in Vx, instead of shifting Vx in place.
    pub shift_uses_vy: bool,
    /// Fx55/Fx65 leave I pointing past the last register transferred.
    pub load_store_increments_i: bool,
    /// 8xy1/8xy2/8xy3 clear VF.
    pub logic_resets_vf: bool,
    /// A draw ends the current frame, limiting sprites to one per 60Hz frame.
    pub display_wait: bool,
}

impl Quirks {
    /// Behavior of the original COSMAC VIP interpreter.
    pub const fn cosmac() -> Self {
        Self {
            shift_uses_vy: true,
            load_store_increments_i: true,
            logic_resets_vf: true,
            display_wait: false,
        }
    }

    /// Behavior of CHIP-48 / SUPER-CHIP era interpreters, expected by many later ROMs.
    pub const fn modern() -> Self {
        Self {
            shift_uses_vy: false,
            load_store_increments_i: false,
            logic_resets_vf: false,
            display_wait: false,
        }
    }
}

impl Default for Quirks {
    fn default() -> Self {
        Self::cosmac()
    }
}

/// Virtual machine configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Instructions executed per second of wall time.
    pub cpu_hz: f32,
    pub quirks: Quirks,
    /// Seed for the Cxnn random source. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cpu_hz: DEFAULT_CPU_HZ,
            quirks: Quirks::default(),
            seed: None,
        }
    }
}
