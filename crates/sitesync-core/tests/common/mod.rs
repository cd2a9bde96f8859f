//! Test doubles and common utilities for architecture contract tests
//!
//! This module provides minimal test doubles that verify architectural
//! constraints without implementing real functionality.

use serde_json::{Value, json};
use sitesync_core::config::SyncConfig;
use sitesync_core::error::{Error, Result};
use sitesync_core::traits::{ApiClient, SiteEvent, SiteEventSource};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tokio_stream::Stream;

/// A scripted response for one endpoint
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Scripted {
    Ok(Value),
    ApiErr(u16, String),
    TransportErr(String),
}

impl Scripted {
    fn to_result(&self) -> Result<Value> {
        match self {
            Scripted::Ok(value) => Ok(value.clone()),
            Scripted::ApiErr(status, message) => Err(Error::api(*status, message.clone())),
            Scripted::TransportErr(message) => Err(Error::transport(message.clone())),
        }
    }
}

/// One recorded API call, with everything the client was given
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub token: String,
}

/// A mock ApiClient with scripted per-endpoint responses
///
/// Endpoints are keyed by `"METHOD path"` with the rendered query string
/// appended (e.g. `"GET zones?name=example.com"`). Unscripted endpoints
/// fail with a transport error, so a test that expects zero calls also
/// catches unexpected ones.
pub struct MockApiClient {
    responses: std::sync::Mutex<HashMap<String, Scripted>>,
    calls: std::sync::Mutex<Vec<RecordedCall>>,
    call_count: AtomicUsize,
}

#[allow(dead_code)]
impl MockApiClient {
    pub fn new() -> Self {
        Self {
            responses: std::sync::Mutex::new(HashMap::new()),
            calls: std::sync::Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Script a response for an endpoint key
    pub fn script(&self, key: impl Into<String>, response: Scripted) {
        self.responses.lock().unwrap().insert(key.into(), response);
    }

    /// Total number of API calls made, across all endpoints
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded calls matching a method and path prefix
    pub fn calls_matching(&self, method: &str, path_prefix: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method && call.path.starts_with(path_prefix))
            .collect()
    }

    fn key(method: &str, path: &str, query: &[(&str, &str)]) -> String {
        let mut key = format!("{method} {path}");
        for (i, (name, value)) in query.iter().enumerate() {
            key.push(if i == 0 { '?' } else { '&' });
            key.push_str(name);
            key.push('=');
            key.push_str(value);
        }
        key
    }

    fn respond(
        &self,
        method: &'static str,
        token: &str,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            query: query
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            body: body.cloned(),
            token: token.to_string(),
        });

        let key = Self::key(method, path, query);
        match self.responses.lock().unwrap().get(&key) {
            Some(scripted) => scripted.to_result(),
            None => Err(Error::transport(format!("unscripted endpoint: {key}"))),
        }
    }
}

#[async_trait::async_trait]
impl ApiClient for MockApiClient {
    async fn get(&self, token: &str, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.respond("GET", token, path, query, None)
    }

    async fn post(&self, token: &str, path: &str, body: &Value) -> Result<Value> {
        self.respond("POST", token, path, &[], Some(body))
    }

    async fn delete(&self, token: &str, path: &str) -> Result<Value> {
        self.respond("DELETE", token, path, &[], None)
    }
}

/// A controlled SiteEventSource that can emit events on demand
pub struct ControlledEventSource {
    /// Receiver for the reconciler's watch stream
    engine_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<SiteEvent>>>,
}

#[allow(dead_code)]
impl ControlledEventSource {
    /// Create a new controlled event source
    pub fn new() -> (Self, mpsc::UnboundedSender<SiteEvent>) {
        let (test_tx, engine_rx) = mpsc::unbounded_channel();
        let source = Self {
            engine_rx: std::sync::Mutex::new(Some(engine_rx)),
        };
        (source, test_tx)
    }
}

impl SiteEventSource for ControlledEventSource {
    fn watch(&self) -> Pin<Box<dyn Stream<Item = SiteEvent> + Send + 'static>> {
        // Take the receiver (only called once)
        let rx = self
            .engine_rx
            .lock()
            .unwrap()
            .take()
            .expect("watch() can only be called once");
        Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))
    }
}

/// Helper to create a minimal SyncConfig for testing
#[allow(dead_code)]
pub fn test_config(network_domain: &str) -> SyncConfig {
    SyncConfig::new(network_domain)
}

/// A one-zone unfiltered listing response
#[allow(dead_code)]
pub fn zone_listing(total_count: u64) -> Value {
    json!({
        "success": true,
        "result": [{"id": "zone-1", "name": "example.com"}],
        "result_info": {"total_count": total_count}
    })
}

/// A name-filtered lookup response resolving to the given zone id
#[allow(dead_code)]
pub fn zone_lookup(id: &str, name: &str) -> Value {
    json!({
        "success": true,
        "result": [{"id": id, "name": name}],
        "result_info": {"total_count": 1}
    })
}

/// A name-filtered lookup with no result (token cannot see the domain)
#[allow(dead_code)]
pub fn empty_zone_lookup() -> Value {
    json!({
        "success": true,
        "result": [],
        "result_info": {"total_count": 0}
    })
}

/// Script the standard happy-path zone resolution for a domain
#[allow(dead_code)]
pub fn script_zone_resolution(client: &MockApiClient, domain: &str, zone_id: &str) {
    client.script("GET zones", Scripted::Ok(zone_listing(1)));
    client.script(
        format!("GET zones?name={domain}"),
        Scripted::Ok(zone_lookup(zone_id, domain)),
    );
}

/// Convenient Arc alias used when wiring mocks into the reconciler
#[allow(dead_code)]
pub type SharedClient = Arc<MockApiClient>;
