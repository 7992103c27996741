//! Line-oriented console for the installer
//!
//! Prompts read one line at a time from any `BufRead`; status lines go to any
//! `Write`. Colors are emitted only when the output is a terminal, so tests can
//! drive a `Console` over byte buffers and read plain text back.
//!
//! Color scheme:
//! - cyan: step headers and info
//! - green: success
//! - yellow: warnings (fallbacks, non-fatal tool failures)
//! - red: fatal errors

pub mod spinner;

use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use crossterm::tty::IsTty;
use std::fmt::Display;
use std::io::{self, BufRead, StdinLock, Stdout, Write};

use crate::types::BootMode;
use spinner::Spinner;

const BANNER: &str = r"
   ______     ____  __   __    _
  / ____/ |  / / / / /  / /   (_)___  __  ___  __
 / /    | | / / /_/ /  / /   / / __ \/ / / / |/_/
/ /___  | |/ / __  /  / /___/ / / / / /_/ />  <
\____/  |___/_/ /_/  /_____/_/_/ /_/\__,_/_/|_|
";

/// Interactive console over an input reader and an output writer.
pub struct Console<R, W> {
    input: R,
    output: W,
    color: bool,
    spinner: Spinner,
}

impl Console<StdinLock<'static>, Stdout> {
    /// Console on the process terminal, colored when stdout is a TTY.
    pub fn stdio() -> Self {
        let output = io::stdout();
        let color = output.is_tty();
        Self {
            input: io::stdin().lock(),
            output,
            color,
            spinner: Spinner::new(),
        }
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Plain console without colors.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            color: false,
            spinner: Spinner::new(),
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn banner(&mut self, boot_mode: BootMode) -> io::Result<()> {
        if self.color {
            writeln!(self.output, "{}", BANNER.cyan().bold())?;
        } else {
            writeln!(self.output, "{}", BANNER)?;
        }
        writeln!(self.output, "  CVH Linux installer ({} mode)\n", boot_mode)
    }

    /// Progress header: `[3/8] Disk preparation`
    pub fn step(&mut self, position: usize, total: usize, label: &str) -> io::Result<()> {
        let line = format!("[{}/{}] {}", position, total, label);
        writeln!(self.output)?;
        if self.color {
            writeln!(self.output, "{}", line.cyan().bold())
        } else {
            writeln!(self.output, "{}", line)
        }
    }

    pub fn info(&mut self, msg: impl Display) -> io::Result<()> {
        self.status("::", msg, Tone::Info)
    }

    pub fn success(&mut self, msg: impl Display) -> io::Result<()> {
        self.status("✓", msg, Tone::Success)
    }

    pub fn warning(&mut self, msg: impl Display) -> io::Result<()> {
        self.status("!", msg, Tone::Warning)
    }

    pub fn error(&mut self, msg: impl Display) -> io::Result<()> {
        self.status("✗", msg, Tone::Error)
    }

    /// Uncolored line
    pub fn line(&mut self, msg: impl Display) -> io::Result<()> {
        writeln!(self.output, "{}", msg)
    }

    /// Numbered menu; `default` is a zero-based index.
    pub fn menu(&mut self, title: &str, options: &[String], default: usize) -> io::Result<()> {
        writeln!(self.output, "{}", title)?;
        for (i, option) in options.iter().enumerate() {
            if i == default {
                writeln!(self.output, "  {}) {} (default)", i + 1, option)?;
            } else {
                writeln!(self.output, "  {}) {}", i + 1, option)?;
            }
        }
        Ok(())
    }

    /// Print `question` and read one line. Returns None at end of input.
    pub fn prompt(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        // Bytes that are not UTF-8 become U+FFFD and fail validation later
        let mut answer = Vec::new();
        if self.input.read_until(b'\n', &mut answer)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&answer).trim().to_string()))
    }

    /// Redraw the spinner line in place.
    pub fn spinner_tick(&mut self, msg: &str) -> io::Result<()> {
        let frame = self.spinner.next_frame();
        if self.color {
            crossterm::queue!(self.output, Clear(ClearType::CurrentLine))?;
            write!(self.output, "\r{} {}", frame.cyan(), msg)?;
        } else {
            write!(self.output, "\r{} {}", frame, msg)?;
        }
        self.output.flush()
    }

    /// Clear the spinner line and move on.
    pub fn spinner_done(&mut self) -> io::Result<()> {
        if self.spinner.ticks() > 0 {
            if self.color {
                crossterm::queue!(self.output, Clear(ClearType::CurrentLine))?;
            }
            write!(self.output, "\r")?;
        }
        self.spinner.reset();
        self.output.flush()
    }

    fn status(&mut self, marker: &str, msg: impl Display, tone: Tone) -> io::Result<()> {
        let line = format!("{} {}", marker, msg);
        if !self.color {
            return writeln!(self.output, "{}", line);
        }
        match tone {
            Tone::Info => writeln!(self.output, "{}", line.cyan()),
            Tone::Success => writeln!(self.output, "{}", line.green()),
            Tone::Warning => writeln!(self.output, "{}", line.yellow()),
            Tone::Error => writeln!(self.output, "{}", line.red().bold()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn text(console: Console<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(console.into_output()).expect("utf8")
    }

    #[test]
    fn test_step_line() {
        let mut c = console("");
        c.step(3, 8, "Disk preparation").expect("write");
        assert!(text(c).contains("[3/8] Disk preparation\n"));
    }

    #[test]
    fn test_prompt_trims_and_detects_eof() {
        let mut c = console("  yes \n");
        assert_eq!(c.prompt("> ").expect("read"), Some("yes".to_string()));
        assert_eq!(c.prompt("> ").expect("read"), None);
    }

    #[test]
    fn test_prompt_replaces_invalid_utf8() {
        let mut c = Console::new(Cursor::new(b"host\xffname\nok\n".to_vec()), Vec::new());
        assert_eq!(
            c.prompt("> ").expect("read"),
            Some("host\u{fffd}name".to_string())
        );
        assert_eq!(c.prompt("> ").expect("read"), Some("ok".to_string()));
    }

    #[test]
    fn test_plain_status_lines() {
        let mut c = console("");
        c.warning("Invalid hostname").expect("write");
        c.error("boom").expect("write");
        let out = text(c);
        assert!(out.contains("! Invalid hostname\n"));
        assert!(out.contains("✗ boom\n"));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn test_menu_marks_default() {
        let mut c = console("");
        c.menu("Compositor:", &["Niri".into(), "Hyprland".into()], 0)
            .expect("write");
        let out = text(c);
        assert!(out.contains("  1) Niri (default)\n"));
        assert!(out.contains("  2) Hyprland\n"));
    }

    #[test]
    fn test_spinner_redraws_in_place() {
        let mut c = console("");
        c.spinner_tick("Installing packages").expect("tick");
        c.spinner_tick("Installing packages").expect("tick");
        c.spinner_done().expect("done");
        let out = text(c);
        assert_eq!(out.matches("\r").count(), 3);
        assert!(out.contains("Installing packages"));
    }
}
