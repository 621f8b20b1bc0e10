//! Console collaborators for the executor
//!
//! The executor never touches stdin/stdout directly. Program output, INPUT
//! lines, color changes and random numbers all go through the capabilities
//! defined here, so the same engine runs against a real terminal or an
//! in-memory buffer.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Append-only program output
pub trait TextOutput {
    fn write(&mut self, text: &str) -> io::Result<()>;

    fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.write(text)?;
        self.write("\n")
    }
}

/// Blocking line input; `Ok(None)` signals end of input
pub trait LineInput {
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Terminal color control
pub trait Terminal {
    fn set_foreground_color(&mut self, color: TerminalColor) -> io::Result<()>;
    fn set_background_color(&mut self, color: TerminalColor) -> io::Result<()>;
}

/// Everything the executor needs from its host
pub trait Console: TextOutput + LineInput + Terminal {}

impl<T: TextOutput + LineInput + Terminal> Console for T {}

/// Source of uniformly distributed values in [0, 1)
pub trait RandomSource {
    fn next_uniform(&mut self) -> f64;
}

/// Terminal colors known to the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkCyan,
    DarkRed,
    DarkMagenta,
    Gray,
    DarkGray,
    Blue,
    Green,
    Cyan,
    Red,
    Magenta,
    Yellow,
    White,
}

// Color names, compared after lowercasing and dropping '_' and '-'
const COLOR_NAMES: &[(&str, TerminalColor)] = &[
    ("red", TerminalColor::Red),
    ("green", TerminalColor::Green),
    ("blue", TerminalColor::Blue),
    ("yellow", TerminalColor::Yellow),
    ("cyan", TerminalColor::Cyan),
    ("magenta", TerminalColor::Magenta),
    ("white", TerminalColor::White),
    ("black", TerminalColor::Black),
    ("gray", TerminalColor::Gray),
    ("darkred", TerminalColor::DarkRed),
    ("darkgreen", TerminalColor::DarkGreen),
    ("darkblue", TerminalColor::DarkBlue),
    ("darkcyan", TerminalColor::DarkCyan),
    ("darkmagenta", TerminalColor::DarkMagenta),
    ("darkgray", TerminalColor::DarkGray),
    // No light gray on a 16-color console
    ("lightgray", TerminalColor::Gray),
];

impl TerminalColor {
    /// Resolve a color name such as `DarkRed`, `dark_red` or `DARK-RED`
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        COLOR_NAMES
            .iter()
            .find(|(spelling, _)| *spelling == key)
            .map(|&(_, color)| color)
    }

    /// ANSI SGR foreground code
    pub fn fg_sgr(self) -> u8 {
        match self {
            TerminalColor::Black => 30,
            TerminalColor::DarkRed => 31,
            TerminalColor::DarkGreen => 32,
            TerminalColor::DarkBlue => 34,
            TerminalColor::DarkMagenta => 35,
            TerminalColor::DarkCyan => 36,
            TerminalColor::Gray => 37,
            TerminalColor::DarkGray => 90,
            TerminalColor::Red => 91,
            TerminalColor::Green => 92,
            TerminalColor::Yellow => 93,
            TerminalColor::Blue => 94,
            TerminalColor::Magenta => 95,
            TerminalColor::Cyan => 96,
            TerminalColor::White => 97,
        }
    }

    /// ANSI SGR background code
    pub fn bg_sgr(self) -> u8 {
        self.fg_sgr() + 10
    }
}

/// Console bound to the process's stdin and stdout
pub struct StdConsole {
    stdin: io::Stdin,
    stdout: io::Stdout,
    colored: bool,
}

impl StdConsole {
    pub fn new() -> Self {
        Self {
            stdin: io::stdin(),
            stdout: io::stdout(),
            colored: false,
        }
    }

    fn write_sgr(&mut self, code: u8) -> io::Result<()> {
        self.colored = true;
        let mut out = self.stdout.lock();
        write!(out, "\x1b[{}m", code)?;
        out.flush()
    }

    /// Restore default colors if the program changed them
    pub fn reset_colors(&mut self) -> io::Result<()> {
        if self.colored {
            self.colored = false;
            let mut out = self.stdout.lock();
            write!(out, "\x1b[0m")?;
            out.flush()?;
        }
        Ok(())
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl TextOutput for StdConsole {
    fn write(&mut self, text: &str) -> io::Result<()> {
        let mut out = self.stdout.lock();
        out.write_all(text.as_bytes())?;
        // Prompts have no newline, flush so they show before INPUT blocks
        out.flush()
    }
}

impl LineInput for StdConsole {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.stdin.lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

impl Terminal for StdConsole {
    fn set_foreground_color(&mut self, color: TerminalColor) -> io::Result<()> {
        self.write_sgr(color.fg_sgr())
    }

    fn set_background_color(&mut self, color: TerminalColor) -> io::Result<()> {
        self.write_sgr(color.bg_sgr())
    }
}

/// Which layer a color change applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChange {
    Foreground(TerminalColor),
    Background(TerminalColor),
}

/// In-memory console: scripted input, captured output
#[derive(Debug, Clone, Default)]
pub struct BufferConsole {
    output: String,
    input: VecDeque<String>,
    colors: Vec<ColorChange>,
}

impl BufferConsole {
    /// Create a console with no pending input
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a console that answers INPUT with the given lines in order
    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Everything written so far
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Color changes in the order they were applied
    pub fn colors(&self) -> &[ColorChange] {
        &self.colors
    }

    pub fn clear_output(&mut self) {
        self.output.clear();
    }
}

impl TextOutput for BufferConsole {
    fn write(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        Ok(())
    }
}

impl LineInput for BufferConsole {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.input.pop_front())
    }
}

impl Terminal for BufferConsole {
    fn set_foreground_color(&mut self, color: TerminalColor) -> io::Result<()> {
        self.colors.push(ColorChange::Foreground(color));
        Ok(())
    }

    fn set_background_color(&mut self, color: TerminalColor) -> io::Result<()> {
        self.colors.push(ColorChange::Background(color));
        Ok(())
    }
}

/// Random source backed by the thread-local generator
pub struct ThreadRandom {
    rng: ThreadRng,
}

impl ThreadRandom {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn next_uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Deterministic random source for reproducible runs
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}
