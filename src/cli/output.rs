//! Output formatting for the controllerx CLI
//!
//! Inventory documents go to stdout untouched; diagnostics go to stderr,
//! colored when stderr is a terminal.

use colored::Colorize;
use is_terminal::IsTerminal;

/// Output formatter for documents and diagnostics
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool) -> Self {
        // Respect NO_COLOR environment variable
        let use_color =
            use_color && std::env::var("NO_COLOR").is_err() && std::io::stderr().is_terminal();
        Self { use_color }
    }

    /// Print a document to stdout
    pub fn document(&self, text: &str) {
        println!("{}", text.trim_end_matches('\n'));
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "ERROR!".red().bold(), message.red());
        } else {
            eprintln!("ERROR! {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "[WARNING]:".magenta().bold(), message);
        } else {
            eprintln!("[WARNING]: {}", message);
        }
    }

    /// Print a hint message
    pub fn hint(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "HINT:".cyan().bold(), message);
        } else {
            eprintln!("HINT: {}", message);
        }
    }
}
