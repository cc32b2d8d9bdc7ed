use rand::{SeedableRng, rngs::StdRng};

use super::{
    Chip8Error, Chip8Result, Config, Display, Frame, Keypad, Memory, Opcode, Quirks, Registers,
};
use crate::u4;

/// CHIP-8 virtual machine state
pub struct Chip8 {
    /// 4KB memory, font preloaded
    pub(crate) memory: Memory,
    /// Display buffer: 64x32 monochrome pixels
    pub(crate) display: Display,
    /// V0-VF, I, PC, call stack and timers
    pub(crate) registers: Registers,

    /// Tracks which key is waiting to be released for the Fx0A instruction
    pub(crate) wait_release_key: Option<u4>,

    pub(crate) quirks: Quirks,
    /// Source for Cxnn
    pub(crate) rng: StdRng,
}

impl Chip8 {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        log::debug!("Quirks: {:?}", config.quirks);

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Chip8 {
            memory: Memory::new(),
            display: Display::new(),
            registers: Registers::new(),
            wait_release_key: None,
            quirks: config.quirks,
            rng,
        }
    }

    /// Loads a ROM into memory and points the program counter at it.
    pub fn load(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        self.memory.load_rom(rom)?;
        self.registers = Registers::new();
        self.display.clear();
        self.wait_release_key = None;

        log::info!("Loaded {} byte ROM", rom.len());
        Ok(())
    }

    /// Executes a single CPU cycle (fetch, decode, execute) against the given key state.
    ///
    /// On error nothing past the failing instruction has been applied and the
    /// program counter still points at it.
    pub fn cpu_cycle(&mut self, keys: &Keypad) -> Result<Chip8Result, Chip8Error> {
        let pc = self.registers.pc;
        let opcode = self.fetch()?;
        let decoded_opcode = Opcode::decode(opcode);

        log::trace!("{pc:03X}: {opcode:04X} {decoded_opcode:?}");

        self.execute(decoded_opcode, keys)
            .map_err(|fault| fault.at(opcode, pc))
    }

    /// Updates the delay and sound timers. Should be called at 60Hz.
    pub fn timers_cycle(&mut self) {
        self.registers.tick_timers();
    }

    /// Returns true if the sound timer is greater than zero, indicating a beep should be played.
    pub fn should_beep(&self) -> bool {
        self.registers.sound_timer > 0
    }

    pub fn frame(&self) -> &Frame {
        self.display.frame()
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn pc(&self) -> u16 {
        self.registers.pc
    }

    /// Fetches the next 16-bit opcode from memory.
    fn fetch(&self) -> Result<u16, Chip8Error> {
        let pc = self.registers.pc;
        self.memory
            .read_word(pc)
            .map_err(|e| Chip8Error::AddressOutOfRange {
                address: e.address,
                pc,
            })
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}
