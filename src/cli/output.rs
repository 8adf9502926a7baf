//! Styled console output
//!
//! Reports go to stdout unconditionally; status messages honour `--quiet`,
//! errors always go to stderr.

use console::style;

use crate::exit_code;

/// Width of the separator printed between batch reports
const SEPARATOR_WIDTH: usize = 60;

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        // Errors are always shown, even in quiet mode
        eprintln!("{} {}", style("✖").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    /// Print a message only in verbose mode
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    pub fn header(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    /// Separator line between batch reports
    pub fn separator(&self) {
        println!("{}", style("=".repeat(SEPARATOR_WIDTH)).dim());
    }

    /// Print a rendered lint report
    pub fn report(&self, report: &str) {
        println!("{report}");
    }

    /// One-line verdict under a report
    pub fn verdict(&self, code: i32, downgraded: usize) {
        if downgraded > 0 {
            self.warning(&format!("{downgraded} failing check(s) allowed to fail by override"));
        }
        match code {
            exit_code::SUCCESS => self.success("All checks passed"),
            exit_code::CHECKS_FAILED => self.warning("Some checks failed"),
            _ => self.error("Verdict unknown: linting did not complete"),
        }
    }
}
