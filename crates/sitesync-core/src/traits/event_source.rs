// # Site Event Source Trait
//
// Defines the interface for the inbound site lifecycle event feed.
//
// ## Implementations
//
// - JSONL feed: `sitesync-events-jsonl` crate
// - Test double: `ControlledEventSource` in the contract tests
//
// ## Usage
//
// ```rust,ignore
// use sitesync_core::traits::SiteEventSource;
// use tokio_stream::StreamExt;
//
// let source = /* SiteEventSource implementation */;
// let mut stream = source.watch();
// while let Some(event) = stream.next().await {
//     println!("site event: {:?}", event);
// }
// ```

use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// Minimal descriptor of a tenant site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDescriptor {
    /// Host platform identifier for the site
    pub id: u64,
    /// Full host name of the site (e.g., "foo.example.com")
    pub host: String,
}

impl SiteDescriptor {
    /// Create a new site descriptor
    pub fn new(id: u64, host: impl Into<String>) -> Self {
        Self {
            id,
            host: host.into(),
        }
    }
}

/// A site lifecycle notification from the host platform
///
/// Events are ephemeral: consumed once, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SiteEvent {
    /// A new site was created on the network
    Created {
        /// The new site
        site: SiteDescriptor,
    },

    /// A site's host changed
    Renamed {
        /// Descriptor after the rename
        new_site: SiteDescriptor,
        /// Descriptor before the rename
        old_site: SiteDescriptor,
    },

    /// A site was removed from the network
    Deleted {
        /// The removed site
        old_site: SiteDescriptor,
    },
}

impl SiteEvent {
    /// Host name the event is primarily about
    ///
    /// For creates and renames this is the (new) site host; for deletes it
    /// is the removed site's host.
    pub fn subject_host(&self) -> &str {
        match self {
            SiteEvent::Created { site } => &site.host,
            SiteEvent::Renamed { new_site, .. } => &new_site.host,
            SiteEvent::Deleted { old_site } => &old_site.host,
        }
    }
}

/// Trait for site event feed implementations
///
/// Sources are observers only: they surface host-platform notifications and
/// make no decisions about DNS. Spawned reader tasks must stop when the
/// stream is dropped.
pub trait SiteEventSource: Send + Sync {
    /// Watch for site lifecycle events
    ///
    /// Returns a stream that yields a `SiteEvent` per notification. The
    /// stream ends when the feed is exhausted or the platform disconnects.
    fn watch(&self) -> Pin<Box<dyn Stream<Item = SiteEvent> + Send + 'static>>;
}
