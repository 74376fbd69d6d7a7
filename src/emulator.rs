use std::io::Stdout;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use chip8vm::host::{AudioSink, DisplaySink, InputSource, Silent};
use chip8vm::{DISPLAY_HEIGHT, DISPLAY_WIDTH, Framebuffer, Interpreter, NUM_KEYS};
use crossterm::{
    ExecutableCommand,
    event::{
        self, Event, KeyCode, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    terminal::{disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};
use rodio::{OutputStream, Sink, Source, source::SineWave};

/// Without release events a key counts as held for this long after its last press or
/// auto-repeat event.
const KEY_HOLD: Duration = Duration::from_millis(120);

const RATE_WINDOW: Duration = Duration::from_secs(1);

pub struct Settings {
    pub frame_rate: u32,
    pub ips: u32,
    pub tone: f32,
    pub trace: bool,
    pub rom: PathBuf,
}

pub struct Beep {
    sink: Sink,
    #[allow(dead_code)]
    stream: OutputStream,
}

impl Beep {
    pub fn new(freq: f32) -> anyhow::Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&stream_handle)?;
        let source = SineWave::new(freq).repeat_infinite();

        sink.append(source);
        sink.pause();

        Ok(Self { sink, stream })
    }
}

impl AudioSink for Beep {
    fn set_tone(&mut self, active: bool) {
        if active {
            self.sink.play();
        } else {
            self.sink.pause();
        }
    }
}

/// Sound output, or nothing when the machine has no audio device.
enum Speaker {
    Beep(Beep),
    Silent(Silent),
}

impl AudioSink for Speaker {
    fn set_tone(&mut self, active: bool) {
        match self {
            Speaker::Beep(beep) => beep.set_tone(active),
            Speaker::Silent(silent) => silent.set_tone(active),
        }
    }
}

/// Maps the left side of a QWERTY keyboard onto the hex keypad:
///
/// ```text
/// 1 2 3 4        1 2 3 C
/// Q W E R   ->   4 5 6 D
/// A S D F        7 8 9 E
/// Z X C V        A 0 B F
/// ```
fn keypad_index(code: KeyCode) -> Option<usize> {
    let KeyCode::Char(c) = code else {
        return None;
    };
    let key = match c.to_ascii_lowercase() {
        '1' => 0x1,
        '2' => 0x2,
        '3' => 0x3,
        '4' => 0xC,
        'q' => 0x4,
        'w' => 0x5,
        'e' => 0x6,
        'r' => 0xD,
        'a' => 0x7,
        's' => 0x8,
        'd' => 0x9,
        'f' => 0xE,
        'z' => 0xA,
        'x' => 0x0,
        'c' => 0xB,
        'v' => 0xF,
        _ => return None,
    };
    Some(key)
}

/// Player keys that act on the emulator rather than the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Control {
    Quit,
    Pause,
    Reboot,
}

fn control_for(code: KeyCode) -> Option<Control> {
    match code {
        KeyCode::Esc => Some(Control::Quit),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'p' => Some(Control::Pause),
            'b' => Some(Control::Reboot),
            _ => None,
        },
        _ => None,
    }
}

fn is_held(last_seen: Option<Instant>, now: Instant, releases_reported: bool) -> bool {
    match last_seen {
        Some(_) if releases_reported => true,
        Some(seen) => now.duration_since(seen) < KEY_HOLD,
        None => false,
    }
}

pub struct Keyboard {
    last_seen: [Option<Instant>; NUM_KEYS],
    releases_reported: bool,
    controls: Vec<Control>,
}

impl Keyboard {
    /// `releases_reported` is true when the terminal sends release events, in which case
    /// a key stays down until it is released.
    pub fn new(releases_reported: bool) -> Self {
        Keyboard {
            last_seen: [None; NUM_KEYS],
            releases_reported,
            controls: Vec::new(),
        }
    }

    fn drain_controls(&mut self) -> std::vec::Drain<'_, Control> {
        self.controls.drain(..)
    }
}

impl InputSource for Keyboard {
    fn poll_keys(&mut self) -> anyhow::Result<[bool; NUM_KEYS]> {
        let now = Instant::now();
        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if let Some(control) = control_for(key.code) {
                if key.kind == KeyEventKind::Press {
                    self.controls.push(control);
                }
                continue;
            }
            if let Some(index) = keypad_index(key.code) {
                self.last_seen[index] = match key.kind {
                    KeyEventKind::Release => None,
                    KeyEventKind::Press | KeyEventKind::Repeat => Some(now),
                };
            }
        }

        let mut keys = [false; NUM_KEYS];
        for (held, &seen) in keys.iter_mut().zip(self.last_seen.iter()) {
            *held = is_held(seen, now, self.releases_reported);
        }
        Ok(keys)
    }
}

/// Measured frame and instruction rates, averaged over [`RATE_WINDOW`].
struct RateMonitor {
    window_start: Instant,
    frames: u32,
    cycles: u64,
    fps: f64,
    ips: f64,
}

impl RateMonitor {
    fn new(now: Instant) -> Self {
        RateMonitor {
            window_start: now,
            frames: 0,
            cycles: 0,
            fps: 0.0,
            ips: 0.0,
        }
    }

    /// Counts one frame that ran `cycles` instructions. Returns true when a window closed
    /// and the rates were recomputed.
    fn record(&mut self, now: Instant, cycles: u32) -> bool {
        self.frames += 1;
        self.cycles += u64::from(cycles);

        let elapsed = now.duration_since(self.window_start);
        if elapsed < RATE_WINDOW {
            return false;
        }
        let secs = elapsed.as_secs_f64();
        self.fps = f64::from(self.frames) / secs;
        self.ips = self.cycles as f64 / secs;
        self.window_start = now;
        self.frames = 0;
        self.cycles = 0;
        true
    }
}

fn status_line(monitor: &RateMonitor, paused: bool) -> String {
    let mode = if paused { "paused" } else { "running" };
    format!("{:.0} fps  {:.0} ips  [{mode}]", monitor.fps, monitor.ips)
}

/// Power-cycles the machine and loads `rom` into it again.
fn reboot(interpreter: &mut Interpreter, rom: &Path) -> anyhow::Result<usize> {
    interpreter.reset();
    let loaded = interpreter
        .load_program(rom)
        .with_context(|| format!("could not reload {}", rom.display()))?;
    Ok(loaded)
}

pub struct TerminalDisplay {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    title: String,
    screen: String,
    status: String,
}

impl TerminalDisplay {
    pub fn new(title: String) -> anyhow::Result<Self> {
        let backend = CrosstermBackend::new(std::io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(TerminalDisplay {
            terminal,
            title,
            screen: String::new(),
            status: String::new(),
        })
    }

    pub fn clear(&mut self) -> anyhow::Result<()> {
        self.terminal.clear()?;
        Ok(())
    }

    /// Replaces the line under the key map and redraws with the last presented frame.
    pub fn set_status(&mut self, status: String) -> anyhow::Result<()> {
        self.status = status;
        self.draw()
    }

    fn draw(&mut self) -> anyhow::Result<()> {
        let TerminalDisplay {
            terminal,
            title,
            screen,
            status,
        } = self;

        terminal.draw(|frame| {
            // 64x32 grid plus borders
            let game_width = (DISPLAY_WIDTH as u16) + 2;
            let game_height = (DISPLAY_HEIGHT as u16) + 2;

            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(game_height),
                    Constraint::Length(8),
                    Constraint::Min(0),
                ])
                .split(frame.area());

            let game_area = if chunks[0].width > game_width {
                Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Min(0),
                        Constraint::Length(game_width),
                        Constraint::Min(0),
                    ])
                    .split(chunks[0])[1]
            } else {
                chunks[0]
            };

            let game_paragraph = Paragraph::new(screen.as_str())
                .block(Block::default().borders(Borders::ALL).title(title.as_str()))
                .style(Style::default().fg(Color::White));
            frame.render_widget(game_paragraph, game_area);

            let key_mapping = format!(
                "Key Mapping:\n\
    1 2 3 4    →    1 2 3 C\n\
    Q W E R    →    4 5 6 D\n\
    A S D F    →    7 8 9 E\n\
    Z X C V    →    A 0 B F\n\
    {status}"
            );
            let key_paragraph = Paragraph::new(key_mapping)
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Keypad (P pause, B reboot, Esc quits)"),
                )
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(key_paragraph, chunks[1]);
        })?;
        Ok(())
    }
}

fn render_rows(frame: &Framebuffer) -> String {
    let mut row_string = String::with_capacity(DISPLAY_WIDTH * DISPLAY_HEIGHT + DISPLAY_HEIGHT);
    for row in frame.rows() {
        row_string.extend(row.map(|lit| if lit { '█' } else { ' ' }));
        row_string.push('\n');
    }
    row_string
}

impl DisplaySink for TerminalDisplay {
    fn present(&mut self, fb: &Framebuffer) -> anyhow::Result<()> {
        self.screen = render_rows(fb);
        self.draw()
    }
}

pub struct Emulator {
    interpreter: Interpreter,
    settings: Settings,
}

impl Emulator {
    pub fn new(interpreter: Interpreter, settings: Settings) -> Self {
        Emulator {
            interpreter,
            settings,
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut speaker = match Beep::new(self.settings.tone) {
            Ok(beep) => Speaker::Beep(beep),
            Err(e) => {
                eprintln!("no audio output, running silent: {e}");
                Speaker::Silent(Silent)
            }
        };

        let rom_stem: String = self
            .settings
            .rom
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unknown ROM".to_string());

        enable_raw_mode()?;
        let releases_reported = supports_keyboard_enhancement().unwrap_or(false);
        if releases_reported {
            std::io::stdout().execute(PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
            ))?;
        }

        let mut keyboard = Keyboard::new(releases_reported);
        let result = TerminalDisplay::new(rom_stem)
            .and_then(|mut display| self.main_loop(&mut display, &mut speaker, &mut keyboard));
        speaker.set_tone(false);

        if releases_reported {
            std::io::stdout().execute(PopKeyboardEnhancementFlags)?;
        }
        disable_raw_mode()?;

        result
    }

    fn main_loop(
        &mut self,
        display: &mut TerminalDisplay,
        speaker: &mut Speaker,
        keyboard: &mut Keyboard,
    ) -> anyhow::Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / f64::from(self.settings.frame_rate));
        let cycles_per_frame = (self.settings.ips / self.settings.frame_rate).max(1);
        let mut stderr = std::io::stderr();
        let mut paused = false;
        let mut monitor = RateMonitor::new(Instant::now());
        display.set_status(status_line(&monitor, paused))?;

        loop {
            let frame_start = Instant::now();

            let trace: Option<&mut dyn std::io::Write> = if self.settings.trace {
                Some(&mut stderr)
            } else {
                None
            };
            // A paused machine still polls keys and redraws, but runs no cycles.
            let cycles = if paused {
                self.interpreter
                    .run_frame(0, keyboard, display, &mut Silent, trace)?;
                0
            } else {
                self.interpreter
                    .run_frame(cycles_per_frame, keyboard, display, speaker, trace)?;
                cycles_per_frame
            };

            for control in keyboard.drain_controls() {
                match control {
                    Control::Quit => {
                        display.clear()?;
                        return Ok(());
                    }
                    Control::Pause => {
                        paused = !paused;
                        speaker.set_tone(false);
                        display.set_status(status_line(&monitor, paused))?;
                    }
                    Control::Reboot => {
                        reboot(&mut self.interpreter, &self.settings.rom)?;
                    }
                }
            }

            if monitor.record(Instant::now(), cycles) {
                display.set_status(status_line(&monitor, paused))?;
            }

            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }
    }
}
