//! Fetch, push and edit command handlers

use anyhow::Result;

use td_core::{Mirror, MirrorError, Snapshot, TopicServer};

use crate::editor;
use crate::output::Output;

/// Replace the local mirror with the server's topics
pub fn fetch<S: TopicServer>(mirror: &Mirror<S>, output: &Output) -> Result<()> {
    let topics = mirror.fetch()?;
    output.success(&format!("Topics updated ({} topic(s))", topics.len()));
    Ok(())
}

/// Push every local topic to the server
///
/// Partial failures are reported but still make the command fail, so
/// scripts notice them.
pub fn push<S: TopicServer>(mirror: &Mirror<S>, output: &Output) -> Result<()> {
    let report = mirror.push()?;
    output.print_push_report(&report);

    if !report.is_complete() {
        anyhow::bail!("{} topic(s) could not be pushed", report.failed.len());
    }
    Ok(())
}

/// Fetch, open the editor on the working snapshot, then push
///
/// Unpushed edits from an earlier session are kept: the fetch is skipped
/// and they go out with this session's push.
pub fn edit<S: TopicServer>(mirror: &Mirror<S>, output: &Output) -> Result<()> {
    match mirror.fetch() {
        Ok(_) => {}
        Err(MirrorError::PendingChanges { topics }) => {
            output.warn(&format!(
                "Not fetching, {} topic(s) have unpushed changes: {}",
                topics.len(),
                topics.join(", ")
            ));
        }
        Err(e) => return Err(e.into()),
    }

    editor::edit_in(&mirror.store().path(Snapshot::Working))?;

    if mirror.pending_changes()?.is_empty() {
        output.message("No changes to push.");
        return Ok(());
    }
    push(mirror, output)
}
