//! Server collaborator
//!
//! The mirror only talks to the server through [`TopicServer`], one
//! blocking call per operation. [`HttpTopicServer`] is the real
//! implementation; tests substitute in-memory ones.
//!
//! ## Protocol
//!
//! ```text
//! GET    /topics        -> [topic]
//! POST   /topics        {"name"}     -> topic
//! PUT    /topics/<id>   {"contents"} -> topic
//! PUT    /topics/<id>   {"name"}     -> topic
//! DELETE /topics/<id>   -> 2xx
//! ```

mod error;
mod http;

pub use error::{RemoteError, RemoteResult};
pub use http::HttpTopicServer;

use crate::models::Topic;

/// Operations the mirror needs from the server
pub trait TopicServer {
    /// Every topic with its contents
    fn list_topics(&self) -> RemoteResult<Vec<Topic>>;

    /// Create an empty topic, returning it with its assigned id
    fn create_topic(&self, name: &str) -> RemoteResult<Topic>;

    /// Replace a topic's contents
    fn update_topic(&self, id: &str, contents: &str) -> RemoteResult<Topic>;

    /// Delete a topic
    fn delete_topic(&self, id: &str) -> RemoteResult<()>;

    /// Give a topic a new name
    fn rename_topic(&self, id: &str, new_name: &str) -> RemoteResult<Topic>;
}
