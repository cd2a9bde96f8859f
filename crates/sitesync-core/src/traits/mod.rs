//! Trait seams for the site synchronizer
//!
//! - `ApiClient`: low-level provider HTTP client
//! - `ConfigStore`: key-value configuration storage
//! - `SiteEventSource`: inbound site lifecycle event feed

pub mod api_client;
pub mod config_store;
pub mod event_source;

pub use api_client::ApiClient;
pub use config_store::{API_TOKEN_KEY, ConfigStore, ZONE_ID_KEY};
pub use event_source::{SiteDescriptor, SiteEvent, SiteEventSource};
