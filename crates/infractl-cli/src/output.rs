//! Terminal output for the CLI.
//!
//! Progress printing and confirmation prompts live here so the core library
//! stays free of direct terminal access.

use std::io::{self, Write};

use anyhow::Result;
use console::style;
use dialoguer::{Confirm as ConfirmPrompt, theme::ColorfulTheme};

use infractl_core::backend::Confirm;
use infractl_core::dispatch::{LifecycleResult, ProgressReporter, VariantOutcome, VariantReport};
use infractl_core::types::LifecycleOperation;
use infractl_core::workspace::InfraConfig;

pub fn print_heading(msg: &str) {
    println!("{}", style(msg).bold().cyan());
}

pub fn print_subheading(msg: &str) {
    println!("{}", style(msg).bold());
}

pub fn print_info(msg: &str) {
    println!("{msg}");
}

/// Prints one block per config, separated by blank lines.
pub struct ConsoleReporter<W: Write = io::Stdout> {
    writer: std::cell::RefCell<W>,
}

impl ConsoleReporter<io::Stdout> {
    pub fn new() -> Self {
        Self {
            writer: std::cell::RefCell::new(io::stdout()),
        }
    }
}

impl Default for ConsoleReporter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ConsoleReporter<W> {
    /// Create a reporter with a custom writer (for testing).
    #[cfg(test)]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer: std::cell::RefCell::new(writer),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_line(&self, line: std::fmt::Arguments<'_>) {
        // Output errors on stdout are not worth aborting a run for.
        let _ = writeln!(self.writer.borrow_mut(), "{line}");
    }
}

impl<W: Write> ProgressReporter for ConsoleReporter<W> {
    fn variant_started(&self, operation: LifecycleOperation, config: &InfraConfig) {
        let env = config.env.as_deref().unwrap_or("-");
        self.write_line(format_args!(
            "{} {} ({}, env: {})",
            style(format!("{}:", capitalize(operation.as_str()))).bold().cyan(),
            style(&config.name).green(),
            config.backend,
            env
        ));
    }

    fn variant_finished(&self, report: &VariantReport) {
        match &report.outcome {
            VariantOutcome::Completed => {
                self.write_line(format_args!("  {} {}", style("✓").green(), report.config))
            }
            VariantOutcome::Failed { reason } => self.write_line(format_args!(
                "  {} {}: {}",
                style("✗").red(),
                report.config,
                reason
            )),
            VariantOutcome::Unsupported => self.write_line(format_args!(
                "  {} {}: no adapter registered for backend '{}'",
                style("⚠").yellow(),
                report.config,
                report.backend
            )),
        }
    }

    fn separator(&self) {
        self.write_line(format_args!(""));
    }
}

/// Confirmation prompt backed by dialoguer.
pub struct DialoguerConfirm {
    theme: ColorfulTheme,
}

impl DialoguerConfirm {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for DialoguerConfirm {
    fn default() -> Self {
        Self::new()
    }
}

impl Confirm for DialoguerConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        let confirmed = ConfirmPrompt::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}

/// Print the summary line and, when earned, the success banner.
pub fn print_lifecycle_result(result: &LifecycleResult) {
    print_subheading(&result.summary_line());
    if result.claims_mutation() {
        print_heading(&format!("Workspace {} success", result.operation));
    } else if result.dry_run && result.is_success() {
        print_info("Dry run, nothing was changed");
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
