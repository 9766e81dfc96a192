//! Output management and formatting.
//!
//! Results (JSON documents, summaries, search listings) go to **stdout**.
//! Status lines and diagnostics go to **stderr**, so piping the result into
//! another tool never mixes the two.

use std::io::{self, IsTerminal};
use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use newapp_core::domain::{Diagnostic, DiagnosticLevel};

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

/// Manages CLI output based on configuration.
pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    out: Term,
    err: Term,
}

impl OutputManager {
    /// Build an `OutputManager` from parsed CLI flags and loaded config.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        let requested = match args.output_format {
            OutputFormat::Auto => parse_format(&config.output.format),
            explicit => explicit,
        };
        // Auto: human summary on a terminal, JSON when piped.
        let resolved_format = if requested == OutputFormat::Auto {
            if io::stdout().is_terminal() {
                OutputFormat::Human
            } else {
                OutputFormat::Json
            }
        } else {
            requested
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color
                || config.output.no_color
                || resolved_format == OutputFormat::Plain
                || !io::stderr().is_terminal(),
            out: Term::stdout(),
            err: Term::stderr(),
        }
    }

    // ── Result output (stdout) ─────────────────────────────────────────────

    /// A result line. Never suppressed: `--quiet` only silences status.
    pub fn data(&self, text: &str) -> io::Result<()> {
        self.out.write_line(text)
    }

    // ── Status output (stderr) ─────────────────────────────────────────────

    /// Success indicator: `✓ <msg>`.
    pub fn success(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2713} {msg}") // ✓
        } else {
            format!("{} {}", "\u{2713}".green().bold(), msg.green())
        };
        self.err.write_line(&line)
    }

    /// Warning indicator: `⚠ <msg>`.
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{26a0} {msg}") // ⚠
        } else {
            format!("{} {}", "\u{26a0}".yellow().bold(), msg.yellow())
        };
        self.err.write_line(&line)
    }

    /// Informational indicator: `ℹ <msg>`.
    pub fn info(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2139} {msg}") // ℹ
        } else {
            format!("{} {}", "\u{2139}".blue().bold(), msg.blue())
        };
        self.err.write_line(&line)
    }

    /// Bold cyan header line.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            text.to_owned()
        } else {
            text.cyan().bold().to_string()
        };
        self.err.write_line(&line)
    }

    /// One engine diagnostic, in its `--> ` form.
    ///
    /// Warnings survive `--quiet`; informational lines do not.
    pub fn diagnostic(&self, diagnostic: &Diagnostic) -> io::Result<()> {
        let line = diagnostic.to_string();
        match diagnostic.level {
            DiagnosticLevel::Warning if self.no_color => self.err.write_line(&line),
            DiagnosticLevel::Warning => self.err.write_line(&line.yellow().to_string()),
            DiagnosticLevel::Info if self.quiet => Ok(()),
            DiagnosticLevel::Info => self.err.write_line(&line),
        }
    }

    /// A spinner on stderr for long-running steps, or `None` when nobody
    /// would see it.
    pub fn spinner(&self, msg: &str) -> Option<ProgressBar> {
        if self.quiet || !self.err.is_term() || self.resolved_format != OutputFormat::Human {
            return None;
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(msg.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// `true` if ANSI colours are enabled.
    pub fn supports_color(&self) -> bool {
        !self.no_color
    }

    /// The resolved (non-Auto) output format.
    pub fn format(&self) -> OutputFormat {
        self.resolved_format
    }
}

fn parse_format(s: &str) -> OutputFormat {
    match s.to_ascii_lowercase().as_str() {
        "human" => OutputFormat::Human,
        "plain" => OutputFormat::Plain,
        "json" => OutputFormat::Json,
        "compact" => OutputFormat::Compact,
        _ => OutputFormat::Auto,
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
