//! Styled status messages on stderr.
//!
//! Colors are applied only when stderr is a terminal. `--quiet` silences
//! everything except errors.

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Writes prefixed, optionally colored messages.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    pub quiet: bool,
    pub colors: bool,
}

impl Console {
    /// A console writing to stderr, colored when stderr is a terminal.
    pub fn stderr(quiet: bool) -> Self {
        Self {
            quiet,
            colors: io::stderr().is_terminal(),
        }
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            let _ = print_info_message(&mut io::stderr(), msg.as_ref(), self.colors);
        }
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            let _ = print_success_message(&mut io::stderr(), msg.as_ref(), self.colors);
        }
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            let _ = print_warn_message(&mut io::stderr(), msg.as_ref(), self.colors);
        }
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        let _ = print_error_message(&mut io::stderr(), msg.as_ref(), self.colors);
    }
}

pub fn print_info_message<W: Write>(w: &mut W, msg: &str, colors: bool) -> io::Result<()> {
    if colors {
        writeln!(w, "{} {}", "info:".cyan().bold(), msg)
    } else {
        writeln!(w, "info: {}", msg)
    }
}

pub fn print_success_message<W: Write>(w: &mut W, msg: &str, colors: bool) -> io::Result<()> {
    if colors {
        writeln!(w, "{} {}", "done:".green().bold(), msg)
    } else {
        writeln!(w, "done: {}", msg)
    }
}

pub fn print_warn_message<W: Write>(w: &mut W, msg: &str, colors: bool) -> io::Result<()> {
    if colors {
        writeln!(w, "{} {}", "warning:".yellow().bold(), msg)
    } else {
        writeln!(w, "warning: {}", msg)
    }
}

pub fn print_error_message<W: Write>(w: &mut W, msg: &str, colors: bool) -> io::Result<()> {
    if colors {
        writeln!(w, "{} {}", "error:".red().bold(), msg)
    } else {
        writeln!(w, "error: {}", msg)
    }
}
