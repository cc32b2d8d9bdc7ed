use std::{io::Write, path::PathBuf, sync::Arc, time::Instant};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use pixels::{Pixels, SurfaceTexture};
use rodio::{OutputStream, OutputStreamBuilder, Sink, Source, source::SquareWave};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, KeyCode, NamedKey, PhysicalKey},
    window::{Window, WindowId},
};

use chip8_vm::{
    emu::{
        Audio, Chip8, Chip8Runner, Config, DEFAULT_CPU_HZ, DISPLAY_X, DISPLAY_Y, Frame, Grid, Input,
        Keypad, MAX_CPU_HZ, Quirks, Renderer, read_rom,
    },
    u4,
};

/// The rate at which pixels fade out (phosphor decay).
const DISPLAY_PHOSPHOR_RATE: f32 = 10.0;

/// Mapping from physical keyboard keys to CHIP-8 hex keypad (0x0-0xF).
const KEY_MAP: [KeyCode; 16] = [
    KeyCode::KeyX,   // 0x00
    KeyCode::Digit1, // 0x01
    KeyCode::Digit2, // 0x02
    KeyCode::Digit3, // 0x03
    KeyCode::KeyQ,   // 0x04
    KeyCode::KeyW,   // 0x05
    KeyCode::KeyE,   // 0x06
    KeyCode::KeyA,   // 0x07
    KeyCode::KeyS,   // 0x08
    KeyCode::KeyD,   // 0x09
    KeyCode::KeyZ,   // 0x0A
    KeyCode::KeyC,   // 0x0B
    KeyCode::Digit4, // 0x0C
    KeyCode::KeyR,   // 0x0D
    KeyCode::KeyF,   // 0x0E
    KeyCode::KeyV,   // 0x0F
];

/// Window and pixel surface. Owned by the app, never global.
struct Screen {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    /// Stores the brightness of each pixel (0.0 to 1.0) to implement phosphor decay.
    brightness: Grid<f32>,
    last_present: Instant,
}

impl Screen {
    fn new(event_loop: &ActiveEventLoop, scale: u32) -> anyhow::Result<Self> {
        let size = LogicalSize::new(DISPLAY_X as u32 * scale, DISPLAY_Y as u32 * scale);
        let min_size = LogicalSize::new(DISPLAY_X as u32, DISPLAY_Y as u32);

        let window = Arc::new(
            event_loop
                .create_window(
                    Window::default_attributes()
                        .with_title("chip8-vm")
                        .with_inner_size(size)
                        .with_min_inner_size(min_size),
                )
                .context("Failed to create window")?,
        );

        let window_size = window.inner_size();
        let surface_texture =
            SurfaceTexture::new(window_size.width, window_size.height, window.clone());
        let pixels = Pixels::new(DISPLAY_X as u32, DISPLAY_Y as u32, surface_texture)
            .context("Failed to create pixels surface")?;

        window.request_redraw();

        Ok(Self {
            window,
            pixels,
            brightness: [[0.0; DISPLAY_X]; DISPLAY_Y],
            last_present: Instant::now(),
        })
    }

    fn resize(&mut self, width: u32, height: u32) -> anyhow::Result<()> {
        self.pixels
            .resize_surface(width, height)
            .context("Failed to resize pixels surface")
    }
}

impl Renderer for Screen {
    type Error = anyhow::Error;

    fn present(&mut self, frame: &Frame) -> anyhow::Result<()> {
        let now = Instant::now();
        let dt = (now - self.last_present).as_secs_f32();
        self.last_present = now;

        let buff = self.pixels.frame_mut();
        for (i, pxl) in buff.chunks_exact_mut(4).enumerate() {
            let x = i % DISPLAY_X;
            let y = i / DISPLAY_X;

            // Lit pixels jump to full brightness, unlit ones fade out over time
            self.brightness[y][x] = if frame[y][x] {
                1.0
            } else {
                (self.brightness[y][x] - DISPLAY_PHOSPHOR_RATE * dt).max(0.0)
            };

            let rgba = [0, 0xff, 0, (self.brightness[y][x] * 255.0) as u8];
            pxl.copy_from_slice(&rgba);
        }

        self.pixels.render().context("Pixels render error")?;
        self.window.request_redraw();
        Ok(())
    }
}

/// Square wave buzzer driven by the sound timer.
struct Buzzer {
    /// Audio output stream (must be kept alive).
    _stream: OutputStream,
    sink: Sink,
}

impl Buzzer {
    fn new(tone: f32, volume: f32) -> anyhow::Result<Self> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .context("Failed to open audio output stream")?;
        stream.log_on_drop(false);

        let sink = Sink::connect_new(stream.mixer());
        sink.pause();
        sink.append(SquareWave::new(tone).amplify(volume));

        Ok(Self {
            _stream: stream,
            sink,
        })
    }
}

impl Audio for Buzzer {
    fn set_beep(&mut self, on: bool) {
        if on {
            self.sink.play();
        } else {
            self.sink.pause();
        }
    }
}

/// Keypad state accumulated from window key events.
#[derive(Default)]
struct Keyboard {
    keys: Keypad,
}

impl Keyboard {
    fn handle(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };

        if let Some(key) = KEY_MAP.iter().position(|&k| k == code) {
            let pressed = event.state == ElementState::Pressed;
            self.keys.set(u4::new(key as u8), pressed);
        }
    }
}

impl Input for Keyboard {
    fn poll(&mut self) -> Keypad {
        self.keys
    }
}

struct App {
    screen: Option<Screen>,
    buzzer: Buzzer,
    keyboard: Keyboard,
    scale: u32,

    runner: Chip8Runner,
    /// Used for delta time calculation.
    last_frame_instant: Instant,

    /// Stores the result of the application to be returned from main.
    exit_result: anyhow::Result<()>,
}

impl App {
    fn new(rom: &[u8], args: &Args) -> anyhow::Result<Self> {
        let buzzer = Buzzer::new(args.tone, args.volume)?;

        let config = args.config();
        let mut chip8 = Chip8::with_config(&config);
        chip8
            .load(rom)
            .context("Failed to load ROM into CHIP-8 memory")?;
        let runner = Chip8Runner::new(chip8, &config)?;

        Ok(Self {
            screen: None,
            buzzer,
            keyboard: Keyboard::default(),
            scale: args.scale,

            runner,
            last_frame_instant: Instant::now(),
            exit_result: Ok(()),
        })
    }

    fn try_resumed(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        self.screen = Some(Screen::new(event_loop, self.scale)?);

        // Avoid large dt on first frame
        self.last_frame_instant = Instant::now();
        Ok(())
    }

    fn try_window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        event: WindowEvent,
    ) -> anyhow::Result<()> {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        ..
                    },
                ..
            } => {
                log::info!("Quit requested");
                self.runner.quit();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(screen) = self.screen.as_mut() {
                    screen.resize(size.width, size.height)?;
                }
            }

            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.last_frame_instant).as_secs_f32();
                self.last_frame_instant = now;

                let frame = self
                    .runner
                    .step_frame(dt, &mut self.keyboard, &mut self.buzzer)
                    .context("CHIP-8 execution error")?;

                if let Some(screen) = self.screen.as_mut() {
                    screen.present(frame)?;
                }
            }

            WindowEvent::KeyboardInput { event, .. } => self.keyboard.handle(&event),

            _ => (),
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.try_resumed(event_loop) {
            self.exit_result = Err(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Err(e) = self.try_window_event(event_loop, event) {
            self.exit_result = Err(e);
            event_loop.exit();
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum QuirksPreset {
    /// Original COSMAC VIP behavior
    Cosmac,
    /// CHIP-48 / SUPER-CHIP behavior
    Modern,
}

/// CHIP-8 emulator written in Rust.
///
/// Keys 1-4, Q-R, A-F, Z-V map to CHIP-8 keys.
/// Escape is used to exit the emulator.
#[derive(Parser, Debug)]
#[command(about, version)]
struct Args {
    /// Path to the CHIP-8 ROM file
    rom_path: PathBuf,

    /// Instructions executed per second
    #[arg(long, default_value_t = DEFAULT_CPU_HZ)]
    cpu_hz: f32,

    /// Interpreter behavior to emulate
    #[arg(long, value_enum, default_value_t = QuirksPreset::Cosmac)]
    quirks: QuirksPreset,

    /// Limit sprite draws to one per 60Hz frame
    #[arg(long)]
    display_wait: bool,

    /// Window scale factor
    #[arg(long, default_value_t = 10)]
    scale: u32,

    /// Buzzer frequency in Hz
    #[arg(long, default_value_t = 440.0)]
    tone: f32,

    /// Buzzer volume (0.0 - 1.0)
    #[arg(long, default_value_t = 0.5)]
    volume: f32,

    /// Seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> Config {
        let mut quirks = match self.quirks {
            QuirksPreset::Cosmac => Quirks::cosmac(),
            QuirksPreset::Modern => Quirks::modern(),
        };
        quirks.display_wait = self.display_wait;

        Config {
            cpu_hz: self.cpu_hz,
            quirks,
            seed: self.seed,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(filter)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();

    if !args.cpu_hz.is_finite() || args.cpu_hz <= 0.0 || args.cpu_hz > MAX_CPU_HZ {
        anyhow::bail!("--cpu-hz must be positive and at most {MAX_CPU_HZ}");
    }

    let rom = read_rom(&args.rom_path)?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(&rom, &args).context("Failed to initialize application")?;
    event_loop
        .run_app(&mut app)
        .context("Error occurred during event loop execution")?;

    // Return the result captured during the event loop
    app.exit_result
}
