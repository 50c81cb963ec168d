//! Shared test utilities.

#![allow(dead_code, unused_imports)]

use parking_lot::Mutex;
use reduxable::{Container, ContainerBuilder, LifecycleEvent};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub type EventLog = Arc<Mutex<Vec<String>>>;

/// `Counter`: initial value 0, `increment` / `decrement` by one.
pub fn counter() -> Container {
    counter_builder().build().unwrap()
}

pub fn counter_builder() -> ContainerBuilder {
    Container::builder()
        .initial_state(json!(0))
        .operation("increment", |s, _| json!(s.as_i64().unwrap_or(0) + 1))
        .operation("decrement", |s, _| json!(s.as_i64().unwrap_or(0) - 1))
}

/// Counter that records `"{label}:{event}"` for every lifecycle event.
pub fn observed_counter(label: &str, log: &EventLog) -> ContainerBuilder {
    counter_builder().observe(recorder(label, log))
}

pub fn recorder(
    label: &str,
    log: &EventLog,
) -> impl Fn(&LifecycleEvent<'_>) + Send + Sync + 'static {
    let label = label.to_string();
    let log = log.clone();
    move |event: &LifecycleEvent<'_>| log.lock().push(format!("{}:{}", label, event.name()))
}

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn take(log: &EventLog) -> Vec<String> {
    std::mem::take(&mut *log.lock())
}

/// Write `content` to a temporary `manifest.toml`.
pub fn temp_manifest(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("manifest.toml");
    std::fs::write(&path, content).expect("Failed to write manifest");
    (temp_dir, path)
}

pub fn as_i64(value: &Value) -> i64 {
    value.as_i64().expect("numeric slice")
}
