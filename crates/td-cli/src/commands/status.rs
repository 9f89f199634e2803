//! Status command handler

use anyhow::Result;

use td_core::{changed_topics, Config, Snapshot, SnapshotStore, TopicIndex};

use crate::output::{Output, OutputFormat};

/// Show the mirror location, the server and the unpushed topics
///
/// Works offline: only the local mirror is read.
pub fn show(config: &Config, output: &Output) -> Result<()> {
    let store = SnapshotStore::new(config.mirror_dir.clone());
    let index = TopicIndex::load(config.topics_path())?;
    let changes = changed_topics(&store, Snapshot::Baseline, Snapshot::Working)?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{:#}",
                serde_json::json!({
                    "mirror_dir": config.mirror_dir,
                    "server": config.server,
                    "topics": index.len(),
                    "changed": changes,
                })
            );
        }
        OutputFormat::Quiet => {
            output.print_changes(&changes);
        }
        OutputFormat::Human => {
            println!("td Status");
            println!("=========");
            println!();
            println!("Server: {}", config.server.as_deref().unwrap_or("(not set)"));
            println!("Mirror: {}", config.mirror_dir.display());
            println!("Topics: {}", index.len());
            println!();
            output.print_changes(&changes);
        }
    }

    Ok(())
}
