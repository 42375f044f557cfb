//! NES front end.
//!
//! Windowed mode drives the console from the event loop: each pass steps
//! one frame when its deadline arrives, hands the APU batch to the audio
//! queue, and blits the ARGB framebuffer into the GPU surface. Headless
//! mode runs a fixed number of frames and can dump PNGs for scripted
//! checks on machines without a display.

#![allow(clippy::cast_possible_truncation)]

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use nes_core::{capture, ppu, Nes, NesButton, NesConfig};
use pixels::{Pixels, SurfaceTexture};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

mod audio;
use audio::AudioOutput;

const FB_WIDTH: u32 = ppu::FB_WIDTH as u32;
const FB_HEIGHT: u32 = ppu::FB_HEIGHT as u32;

/// Integer window scale.
const SCALE: u32 = 3;

/// Host audio rate.
const SAMPLE_RATE: u32 = 44_100;

/// NTSC frame period (60.0988 Hz).
const FRAME_TIME: Duration = Duration::from_nanos(16_639_267);

/// Report a fatal condition and quit.
fn die(msg: impl Display) -> ! {
    eprintln!("nes-runner: {msg}");
    std::process::exit(1);
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

struct Options {
    rom: PathBuf,
    mode: Mode,
}

enum Mode {
    Windowed,
    Headless {
        frames: u32,
        screenshot: Option<PathBuf>,
        record: Option<PathBuf>,
    },
}

fn usage() -> ! {
    eprintln!("usage: nes-runner <rom.nes> [--headless] [--frames N]");
    eprintln!("                  [--screenshot FILE] [--record DIR]");
    eprintln!();
    eprintln!("keys: X=A  Z=B  A=Select  S=Start  arrows=D-pad  R=reset  Esc=quit");
    std::process::exit(0);
}

fn parse_options() -> Options {
    let mut rom = None;
    let mut headless = false;
    let mut frames = 200u32;
    let mut screenshot = None;
    let mut record = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .unwrap_or_else(|| die(format!("{flag} needs a value")))
        };
        match arg.as_str() {
            "--help" | "-h" => usage(),
            "--headless" => headless = true,
            "--frames" => {
                let v = value("--frames");
                frames = v
                    .parse()
                    .unwrap_or_else(|_| die(format!("--frames: not a number: {v}")));
            }
            "--screenshot" => screenshot = Some(PathBuf::from(value("--screenshot"))),
            "--record" => record = Some(PathBuf::from(value("--record"))),
            _ if arg.starts_with('-') => die(format!("unknown option {arg} (try --help)")),
            _ if rom.is_none() => rom = Some(PathBuf::from(arg)),
            _ => die(format!("unexpected argument {arg}")),
        }
    }

    Options {
        rom: rom.unwrap_or_else(|| die("no ROM given (try --help)")),
        mode: if headless {
            Mode::Headless { frames, screenshot, record }
        } else {
            Mode::Windowed
        },
    }
}

fn load_rom(path: &Path) -> Nes {
    let rom_data = std::fs::read(path)
        .unwrap_or_else(|e| die(format!("cannot read {}: {e}", path.display())));
    let nes = Nes::new(&NesConfig { rom_data })
        .unwrap_or_else(|e| die(format!("{}: {e}", path.display())));
    eprintln!("nes-runner: running {}", path.display());
    nes
}

// ---------------------------------------------------------------------------
// Headless mode
// ---------------------------------------------------------------------------

fn run_headless(nes: &mut Nes, frames: u32, screenshot: Option<&Path>, record: Option<&Path>) {
    if let Some(dir) = record {
        match capture::record(nes, dir, frames) {
            Ok(written) => {
                eprintln!("nes-runner: wrote {} frames under {}", written.len(), dir.display());
            }
            Err(e) => die(format!("recording to {}: {e}", dir.display())),
        }
        return;
    }

    for _ in 0..frames {
        nes.run_frame();
    }

    if let Some(path) = screenshot {
        if let Err(e) = capture::save_screenshot(nes, path) {
            die(format!("screenshot {}: {e}", path.display()));
        }
        eprintln!("nes-runner: screenshot at {}", path.display());
    }
}

// ---------------------------------------------------------------------------
// Windowed mode
// ---------------------------------------------------------------------------

/// The window and its GPU pixel surface. The surface owns a handle clone,
/// so no lifetime gymnastics are needed.
struct View {
    window: Arc<Window>,
    pixels: Pixels<'static>,
}

fn open_view(event_loop: &ActiveEventLoop) -> Result<View, String> {
    let attrs = Window::default_attributes()
        .with_title("NES")
        .with_inner_size(LogicalSize::new(FB_WIDTH * SCALE, FB_HEIGHT * SCALE))
        .with_resizable(false);

    let window = Arc::new(
        event_loop
            .create_window(attrs)
            .map_err(|e| format!("opening a window: {e}"))?,
    );

    let inner = window.inner_size();
    let surface = SurfaceTexture::new(inner.width, inner.height, Arc::clone(&window));
    let pixels = Pixels::new(FB_WIDTH, FB_HEIGHT, surface)
        .map_err(|e| format!("creating the pixel surface: {e}"))?;

    Ok(View { window, pixels })
}

struct Frontend {
    nes: Nes,
    view: Option<View>,
    audio: Option<AudioOutput>,
    next_frame: Instant,
}

impl Frontend {
    fn new(nes: Nes) -> Self {
        Self {
            nes,
            view: None,
            audio: None,
            next_frame: Instant::now(),
        }
    }

    fn on_key(&mut self, code: KeyCode, pressed: bool) {
        let button = match code {
            KeyCode::KeyX => NesButton::A,
            KeyCode::KeyZ => NesButton::B,
            KeyCode::KeyA => NesButton::Select,
            KeyCode::KeyS => NesButton::Start,
            KeyCode::ArrowUp => NesButton::Up,
            KeyCode::ArrowDown => NesButton::Down,
            KeyCode::ArrowLeft => NesButton::Left,
            KeyCode::ArrowRight => NesButton::Right,
            KeyCode::KeyR => {
                if pressed {
                    self.nes.reset();
                }
                return;
            }
            _ => return,
        };
        if pressed {
            self.nes.press_button(button);
        } else {
            self.nes.release_button(button);
        }
    }

    /// Copy the ARGB framebuffer into the surface's RGBA bytes.
    fn blit(&mut self) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        let rgba = view.pixels.frame_mut().chunks_exact_mut(4);
        for (dst, &src) in rgba.zip(self.nes.framebuffer()) {
            dst[0] = (src >> 16) as u8;
            dst[1] = (src >> 8) as u8;
            dst[2] = src as u8;
            dst[3] = 0xFF;
        }
    }
}

impl ApplicationHandler for Frontend {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.view.is_some() {
            return;
        }
        match open_view(event_loop) {
            Ok(view) => {
                self.audio = AudioOutput::start(SAMPLE_RATE);
                if self.audio.is_some() {
                    self.nes.set_sample_rate(SAMPLE_RATE);
                } else {
                    eprintln!("nes-runner: audio unavailable, continuing silent");
                }
                self.next_frame = Instant::now();
                self.view = Some(view);
            }
            Err(e) => {
                eprintln!("nes-runner: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    let pressed = event.state == ElementState::Pressed;
                    if code == KeyCode::Escape && pressed {
                        event_loop.exit();
                    } else {
                        self.on_key(code, pressed);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(view) = self.view.as_mut() {
                    if let Err(e) = view.pixels.render() {
                        eprintln!("nes-runner: presenting a frame: {e}");
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.view.is_none() {
            return;
        }

        // Step the console whenever the frame deadline has passed; the
        // audio queue drops on overflow, so pacing lives here.
        let now = Instant::now();
        if now >= self.next_frame {
            self.nes.run_frame();
            let batch = self.nes.take_audio_samples();
            if let Some(audio) = self.audio.as_mut() {
                audio.push(&batch);
            }
            self.blit();

            self.next_frame += FRAME_TIME;
            if self.next_frame < now {
                // Fell behind (debugger, window drag); skip the backlog.
                self.next_frame = now + FRAME_TIME;
            }
        }

        if let Some(view) = &self.view {
            view.window.request_redraw();
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    let options = parse_options();
    let mut nes = load_rom(&options.rom);

    match options.mode {
        Mode::Headless { frames, screenshot, record } => {
            run_headless(&mut nes, frames, screenshot.as_deref(), record.as_deref());
        }
        Mode::Windowed => {
            let event_loop =
                EventLoop::new().unwrap_or_else(|e| die(format!("event loop: {e}")));
            let mut frontend = Frontend::new(nes);
            if let Err(e) = event_loop.run_app(&mut frontend) {
                die(format!("event loop: {e}"));
            }
        }
    }
}
