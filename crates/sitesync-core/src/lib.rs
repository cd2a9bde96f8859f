// # sitesync-core
//
// Core library for the event-driven multisite DNS synchronizer.
//
// ## Architecture Overview
//
// This library keeps provider DNS records aligned with a multisite web
// host's tenant sites:
// - **SiteEventSource**: Trait for the inbound site lifecycle event feed
// - **ApiClient**: Trait for the provider HTTP surface (thin, uninterpreted)
// - **ConfigStore**: Trait for credential and zone-id persistence
// - **ZoneResolver**: Store-first, cached zone resolution with the
//   over-broad-token check
// - **Reconciler**: Core engine for the site event → CNAME mutation flow
// - **StatusView**: Read-only diagnostic report over cached provider state
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Event-Driven**: Async streams carry site lifecycle notifications
// 3. **Failure Isolation**: DNS sync failures never block site lifecycle
// 4. **Library-First**: All core functionality can be used as a library

pub mod cache;
pub mod config;
pub mod error;
pub mod reconciler;
pub mod resolver;
pub mod status;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use cache::{Namespace, StatusCache};
pub use config::{ApiConfig, RetryConfig, StoreConfig, SyncConfig};
pub use error::{Error, Result};
pub use reconciler::{Outcome, Reconciler, ReconcilerEvent, SkipReason};
pub use resolver::{ResolvedZone, ZoneResolver, normalize_domain};
pub use status::{RecordRow, StatusReport, StatusView};
pub use store::{FileConfigStore, MemoryConfigStore};
pub use traits::{
    API_TOKEN_KEY, ApiClient, ConfigStore, SiteDescriptor, SiteEvent, SiteEventSource,
    ZONE_ID_KEY,
};
