//! td Core Library
//!
//! This crate provides the core functionality for td, a local mirror of the
//! topics kept on a td server.
//!
//! # Architecture
//!
//! - **Snapshots**: three directories of `<name>.md` files. The baseline
//!   holds what the server last confirmed, the working copy holds what the
//!   user edits, and staging receives a fetch before it is promoted.
//! - **Topic Index**: `topics.json`, the `{id, name}` of every topic.
//! - **Change detection**: a topic is pending when its working file differs
//!   from its baseline file.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mirror = Mirror::new(&config, HttpTopicServer::from_config(&config)?);
//! mirror.initialize()?;
//!
//! mirror.fetch()?;
//! // ... edit files under the working snapshot ...
//! let report = mirror.push()?;
//! ```
//!
//! # Modules
//!
//! - `mirror`: fetch, push and topic management (main entry point)
//! - `changes`: change detection between two snapshots
//! - `storage`: snapshot directories and the Topic Index
//! - `remote`: the server collaborator and its HTTP implementation
//! - `models`: topics and push reports
//! - `config`: application configuration

pub mod changes;
pub mod config;
pub mod mirror;
pub mod models;
pub mod remote;
pub mod storage;

pub use changes::changed_topics;
pub use config::Config;
pub use mirror::{Mirror, MirrorError, MirrorResult};
pub use models::{PushReport, Topic};
pub use remote::{HttpTopicServer, RemoteError, TopicServer};
pub use storage::{Snapshot, SnapshotStore, StorageError, TopicIndex};
