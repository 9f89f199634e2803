//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use std::collections::BTreeSet;

use td_core::{PushReport, Topic};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single topic identity
    pub fn print_topic(&self, topic: &Topic) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", topic.id);
                println!("Name:    {}", topic.name);
                if let Some(created_at) = topic.created_at {
                    println!("Created: {}", created_at.format("%Y-%m-%d %H:%M"));
                }
            }
            OutputFormat::Json => {
                println!("{:#}", serde_json::json!(topic.identity()));
            }
            OutputFormat::Quiet => {
                println!("{}", topic.name);
            }
        }
    }

    /// Print a list of topic names, sorted
    pub fn print_topics(&self, names: &[String]) {
        let names = sorted(names);
        match self.format {
            OutputFormat::Human => {
                if names.is_empty() {
                    println!("No topics found.");
                    return;
                }
                for name in &names {
                    println!("{}", name);
                }
            }
            OutputFormat::Json => {
                println!("{:#}", serde_json::json!(names));
            }
            OutputFormat::Quiet => {
                for name in &names {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print the outcome of a push
    pub fn print_push_report(&self, report: &PushReport) {
        match self.format {
            OutputFormat::Human => {
                if report.is_complete() {
                    println!("✓ Pushed {} topic(s)", report.pushed.len());
                    return;
                }
                println!(
                    "Pushed {} topic(s), {} failed:",
                    report.pushed.len(),
                    report.failed.len()
                );
                for name in &report.failed {
                    println!("  ✗ {}", name);
                }
                println!();
                println!("Failed topics stay pending. Run `td push` again to retry.");
            }
            OutputFormat::Json => {
                println!("{:#}", serde_json::json!(report));
            }
            OutputFormat::Quiet => {
                for name in &report.failed {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print the topics with unpushed edits
    pub fn print_changes(&self, changes: &BTreeSet<String>) {
        match self.format {
            OutputFormat::Human => {
                if changes.is_empty() {
                    println!("No local changes.");
                    return;
                }
                println!("Changed topics:");
                for name in changes {
                    println!("  {}", name);
                }
                println!("\n{} topic(s) to push", changes.len());
            }
            OutputFormat::Json => {
                println!("{:#}", serde_json::json!(changes));
            }
            OutputFormat::Quiet => {
                for name in changes {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr (suppressed in quiet mode)
    pub fn warn(&self, message: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", message);
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn sorted(names: &[String]) -> Vec<&str> {
    let mut names: Vec<&str> = names.iter().map(String::as_str).collect();
    names.sort_unstable();
    names
}
