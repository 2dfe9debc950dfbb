// Terminal: console I/O for the interactive wizard, with trace integration
// and secret masking of anything read through `read_secret`.

use crate::host_context::HostContext;
use crate::secret_masker::SecretMasker;
use crate::tracing::Tracing;

use anyhow::{Context, Result};
use macrunner_sdk::TraceWriter;
use std::io::{self, BufRead, Write};

/// Console color codes for terminal output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleColor {
    Red,
    Green,
    Yellow,
    Cyan,
    White,
    Default,
}

impl ConsoleColor {
    /// ANSI escape code for the color.
    pub fn ansi_code(&self) -> &'static str {
        match self {
            ConsoleColor::Red => "\x1b[31m",
            ConsoleColor::Green => "\x1b[32m",
            ConsoleColor::Yellow => "\x1b[33m",
            ConsoleColor::Cyan => "\x1b[36m",
            ConsoleColor::White => "\x1b[37m",
            ConsoleColor::Default => "",
        }
    }

    /// ANSI reset code.
    pub fn reset() -> &'static str {
        "\x1b[0m"
    }

    /// Wrap `text` in this color.
    pub fn paint(&self, text: &str) -> String {
        match self {
            ConsoleColor::Default => text.to_string(),
            _ => format!("{}{}{}", self.ansi_code(), text, Self::reset()),
        }
    }
}

/// Erase the screen and move the cursor home.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Terminal abstraction for console I/O with tracing and secret masking.
pub struct Terminal {
    /// Whether to suppress output.
    pub silent: bool,
    trace: Tracing,
    secret_masker: SecretMasker,
}

impl Terminal {
    pub fn new(context: &HostContext) -> Self {
        Self {
            silent: false,
            trace: context.get_trace("Terminal"),
            secret_masker: context.secret_masker.clone(),
        }
    }

    /// Read a line from stdin. End of input is an error so a wizard loop
    /// cannot spin forever on a closed stdin.
    pub fn read_line(&self) -> Result<String> {
        self.trace.verbose("READ LINE");

        let mut input = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut input)
            .context("Failed to read from stdin")?;
        if read == 0 {
            anyhow::bail!("Unexpected end of input");
        }
        let value = trim_line_ending(&input);

        self.trace.verbose(&format!("Read value: '{}'", value));
        Ok(value)
    }

    /// Read a secret from stdin without echo. The value is registered with
    /// the secret masker before it is traced.
    pub fn read_secret(&self) -> Result<String> {
        self.trace.verbose("READ SECRET");

        let value = read_secret_line()?;
        self.secret_masker.add_value(&value);

        self.trace.verbose(&format!("Read value: '{}'", value));
        Ok(value)
    }

    /// Write a string to stdout (no newline).
    pub fn write(&self, message: &str, color: Option<ConsoleColor>) {
        self.trace.verbose(&format!("WRITE: {}", message));

        if !self.silent {
            match color {
                Some(color) => print!("{}", color.paint(message)),
                None => print!("{}", message),
            }
            let _ = io::stdout().flush();
        }
    }

    /// Write a line to stdout.
    pub fn write_line(&self, line: &str, color: Option<ConsoleColor>) {
        self.trace.verbose(&format!("WRITE LINE: {}", line));

        if !self.silent {
            match color {
                Some(color) => println!("{}", color.paint(line)),
                None => println!("{}", line),
            }
        }
    }

    /// Write an empty line.
    pub fn write_empty_line(&self) {
        self.write_line("", None);
    }

    /// Write an error message to stderr in red.
    pub fn write_error(&self, line: &str) {
        self.trace.error(&format!("WRITE ERROR: {}", line));

        if !self.silent {
            eprintln!("{}", ConsoleColor::Red.paint(line));
        }
    }

    /// Write an error from an `anyhow::Error`, including its cause chain.
    pub fn write_error_err(&self, err: &anyhow::Error) {
        self.trace.error_err(err);

        if !self.silent {
            eprintln!(
                "{}",
                ConsoleColor::Red.paint(&self.secret_masker.mask_secrets(&format!("{:#}", err)))
            );
        }
    }

    /// Write a success message with a checkmark prefix.
    pub fn write_success_message(&self, message: &str) {
        self.trace.info(&format!("SUCCESS: {}", message));

        if !self.silent {
            println!("{} {}", ConsoleColor::Green.paint("√"), message);
        }
    }

    /// Clear the visible screen.
    pub fn clear(&self) {
        self.trace.verbose("CLEAR");

        if !self.silent {
            print!("{}", CLEAR_SCREEN);
            let _ = io::stdout().flush();
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn trim_line_ending(input: &str) -> String {
    input.trim_end_matches('\n').trim_end_matches('\r').to_string()
}

/// Read a line from stdin with echo disabled when stdin is a terminal.
fn read_secret_line() -> Result<String> {
    #[cfg(unix)]
    {
        use nix::sys::termios::{tcgetattr, tcsetattr, LocalFlags, SetArg};

        let stdin = io::stdin();
        if let Ok(mut termios) = tcgetattr(&stdin) {
            let old_flags = termios.local_flags;
            termios.local_flags &= !LocalFlags::ECHO;
            if tcsetattr(&stdin, SetArg::TCSANOW, &termios).is_ok() {
                let mut input = String::new();
                let read = stdin.lock().read_line(&mut input);

                termios.local_flags = old_flags;
                let _ = tcsetattr(&stdin, SetArg::TCSANOW, &termios);
                // Echo was off, so the user's Enter never reached the screen.
                println!();

                let read = read.context("Failed to read from stdin")?;
                if read == 0 {
                    anyhow::bail!("Unexpected end of input");
                }
                return Ok(trim_line_ending(&input));
            }
        }
    }

    let mut input = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read from stdin")?;
    if read == 0 {
        anyhow::bail!("Unexpected end of input");
    }
    Ok(trim_line_ending(&input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_wraps_in_ansi_codes() {
        assert_eq!(ConsoleColor::Red.paint("x"), "\x1b[31mx\x1b[0m");
        assert_eq!(ConsoleColor::Default.paint("x"), "x");
    }

    #[test]
    fn line_endings_are_trimmed() {
        assert_eq!(trim_line_ending("abc\r\n"), "abc");
        assert_eq!(trim_line_ending("abc\n"), "abc");
        assert_eq!(trim_line_ending("  abc  "), "  abc  ");
    }

    #[test]
    fn silent_terminal_writes_nothing_but_still_traces() {
        let ctx = HostContext::with_root("/tmp/mr");
        let mut terminal = Terminal::new(&ctx);
        terminal.silent = true;
        terminal.write_line("hidden", Some(ConsoleColor::Cyan));
        terminal.write_error("hidden error");
        terminal.write_success_message("done");
        terminal.clear();
    }
}
