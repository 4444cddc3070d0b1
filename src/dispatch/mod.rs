//! Delivery of new content to the downstream queue.

pub mod cytube;
pub mod session;
pub mod socketio;
pub mod transport;

use async_trait::async_trait;

use crate::app::DispatchError;

pub use cytube::CytubeDispatcher;

/// What the server did with each id of a delivered batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub queued: Vec<String>,
    /// Ids the server refused, with its reason. They are not retried.
    pub rejected: Vec<(String, String)>,
}

#[async_trait]
pub trait Dispatcher {
    /// Submit `ids` in order. An empty slice succeeds without connecting.
    ///
    /// A refused item is recorded in the report and the rest of the batch
    /// is still sent. Only connection, login, protocol and timeout failures
    /// fail the whole dispatch.
    async fn dispatch(&self, ids: &[String]) -> Result<DispatchReport, DispatchError>;
}
