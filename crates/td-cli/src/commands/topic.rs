//! Topic command handlers

use anyhow::Result;

use td_core::{Config, Mirror, Snapshot, SnapshotStore, TopicServer};

use crate::editor::{confirm, is_interactive};
use crate::output::Output;

/// Create a new, empty topic
pub fn create<S: TopicServer>(mirror: &Mirror<S>, name: String, output: &Output) -> Result<()> {
    let topic = mirror.create_topic(&name)?;
    output.success(&format!("Created topic: {}", topic.name));
    if !output.is_quiet() {
        output.print_topic(&topic);
    }
    Ok(())
}

/// Delete a topic, asking first when a terminal is attached
pub fn delete<S: TopicServer>(
    mirror: &Mirror<S>,
    name: String,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let ask = !yes && output.should_prompt() && is_interactive();
    if ask && !confirm(&format!("Delete topic '{}'?", name))? {
        output.message("Cancelled.");
        return Ok(());
    }

    let topic = mirror.delete_topic(&name)?;
    output.success(&format!("Deleted topic: {}", topic.name));
    Ok(())
}

/// Rename a topic
pub fn rename<S: TopicServer>(
    mirror: &Mirror<S>,
    old_name: String,
    new_name: String,
    output: &Output,
) -> Result<()> {
    let topic = mirror.rename_topic(&old_name, &new_name)?;
    output.success(&format!("Renamed topic: {} -> {}", old_name, topic.name));
    Ok(())
}

/// List the topics, refreshing them from the server first when possible
pub fn list(config: &Config, output: &Output) -> Result<()> {
    match super::open_mirror(config) {
        Ok(mirror) => list_mirror(&mirror, output),
        Err(e) => {
            output.warn(&format!("Showing cached topics: {:#}", e));
            let store = SnapshotStore::new(config.mirror_dir.clone());
            output.print_topics(&store.read_snapshot_names(Snapshot::Working)?);
            Ok(())
        }
    }
}

fn list_mirror<S: TopicServer>(mirror: &Mirror<S>, output: &Output) -> Result<()> {
    if let Err(e) = mirror.fetch() {
        output.warn(&format!("Could not fetch the topics: {}", e));
    }
    output.print_topics(&mirror.list_local_topics()?);
    Ok(())
}
