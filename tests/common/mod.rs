#![allow(dead_code, unused_imports)]

pub use changelink_test_utils::builders;
pub use changelink_test_utils::{FakeHttpClient, init_tracing, with_timeout};

use changelink::engine::TriggerEngine;
use changelink::store::MemoryStore;
use changelink::watcher::Watcher;

/// Engine over an in-memory store holding `watchers`.
pub fn engine_with(watchers: Vec<Watcher>) -> TriggerEngine<MemoryStore> {
    TriggerEngine::new(MemoryStore::from_watchers(watchers).expect("valid test watchers"))
}
