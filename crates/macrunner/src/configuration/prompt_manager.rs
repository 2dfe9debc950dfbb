// PromptManager: the console implementation of UserInput used by the
// `create` wizard.

use anyhow::Result;
use macrunner_common::{ConsoleColor, Terminal};

/// Everything the wizard needs from the person at the keyboard.
///
/// Implementations render `help` above the question (when they show help at
/// all) and return the raw answer with surrounding whitespace removed.
pub trait UserInput: Send + Sync {
    /// Ask a question; the answer is echoed.
    fn ask(&self, help: &str, question: &str) -> Result<String>;

    /// Ask for a secret; the answer is not echoed and is masked in traces.
    fn ask_secret(&self, help: &str, question: &str) -> Result<String>;

    /// Clear the screen before the next prompt.
    fn clear(&self);

    /// Show a failure message (rendered in red on a console).
    fn show_error(&self, message: &str);

    /// Show an informational message.
    fn show_message(&self, message: &str);
}

/// Interactive prompts on the process terminal.
///
/// With `verbose` off the help blocks above each question are skipped.
pub struct PromptManager {
    terminal: Terminal,
    verbose: bool,
}

impl PromptManager {
    pub fn new(terminal: Terminal, verbose: bool) -> Self {
        Self { terminal, verbose }
    }

    fn render_question(&self, help: &str, question: &str) {
        if self.verbose && !help.is_empty() {
            self.terminal.write_line(help, None);
        }
        self.terminal
            .write(&format!("{} ", ConsoleColor::Green.paint("?")), None);
        self.terminal.write(&format!("{} ", question), Some(ConsoleColor::White));
    }
}

impl UserInput for PromptManager {
    fn ask(&self, help: &str, question: &str) -> Result<String> {
        self.render_question(help, question);
        Ok(self.terminal.read_line()?.trim().to_string())
    }

    fn ask_secret(&self, help: &str, question: &str) -> Result<String> {
        self.render_question(help, question);
        Ok(self.terminal.read_secret()?.trim().to_string())
    }

    fn clear(&self) {
        self.terminal.clear();
    }

    fn show_error(&self, message: &str) {
        self.terminal.write_line(message, Some(ConsoleColor::Red));
    }

    fn show_message(&self, message: &str) {
        self.terminal.write_line(message, None);
    }
}
