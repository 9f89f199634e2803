//! Interactive editing support
//!
//! Opens $EDITOR inside the working snapshot so every topic can be edited
//! in place.

use anyhow::{bail, Context, Result};
use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::process::Command;

use tracing::debug;

/// Open the user's preferred editor with `dir` as its working directory
///
/// Uses $EDITOR, $VISUAL, or falls back to common editors. The editor
/// command may carry arguments (e.g. `code -w`).
pub fn edit_in(dir: &Path) -> Result<()> {
    let editor = find_editor()?;
    let (program, args) = split_command(&editor)?;
    debug!(%editor, dir = ?dir, "opening editor");

    let status = Command::new(program)
        .args(args)
        .current_dir(dir)
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor))?;

    if !status.success() {
        bail!(
            "Editor '{}' exited with non-zero status. Check that your editor is configured correctly.",
            editor
        );
    }

    Ok(())
}

/// Find the user's preferred editor
fn find_editor() -> Result<String> {
    for var in ["EDITOR", "VISUAL"] {
        if let Ok(editor) = env::var(var) {
            if !editor.trim().is_empty() {
                return Ok(editor);
            }
        }
    }

    // Try common editors
    let common_editors = ["nano", "vim", "vi", "emacs"];

    for editor in common_editors {
        if command_exists(editor) {
            return Ok(editor.to_string());
        }
    }

    bail!(
        "No editor found. Set $EDITOR environment variable.\n\
         Example: export EDITOR=nano"
    )
}

/// Split an editor command into the program and its arguments
fn split_command(editor: &str) -> Result<(&str, Vec<&str>)> {
    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("The editor command is empty");
    };
    Ok((program, parts.collect()))
}

/// Check if a command exists in PATH
fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Whether stdin is attached to a terminal
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin)
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !is_interactive() {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
