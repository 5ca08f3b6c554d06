// tests/watcher_store.rs

mod common;
use crate::common::builders::{WatcherBuilder, range, sample_actions};
use crate::common::init_tracing;

use std::error::Error;
use std::fs;

use tempfile::TempDir;

use changelink::actions::Action;
use changelink::config::{ConfigFile, load_and_validate};
use changelink::errors::ChangelinkError;
use changelink::store::{LocalStore, WatcherStore};

type TestResult = Result<(), Box<dyn Error>>;

const TOML_DOC: &str = r##"
[config]
http_timeout_secs = 5

[integrations.slack]
token_env = "CHANGELINK_TEST_SLACK"

[integrations.issue_tracker]
base_url = "https://issues.example.com/"

[[watchers]]
name = "payments"
file_path = "services/foo.go"
lines = [{ start_line = 61, end_line = 80 }]
trigger_on_rename = true

[[watchers.actions]]
type = "slack"
name = "notify"
channel = "#eng"
message = "{watcher} touched in {file}: {reason}"

[[watchers.actions]]
type = "log"
name = "note"

[[watchers]]
name = "bad-range"
file_path = "services/bar.go"
lines = [{ start_line = 10, end_line = 2 }]

[[watchers]]
name = "pigeon"
file_path = "services/foo.go"

[[watchers.actions]]
type = "carrier_pigeon"
name = "coo"
"##;

#[test]
fn loads_toml_document_and_excludes_malformed_watchers() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let path = dir.path().join(".changelink.toml");
    fs::write(&path, TOML_DOC)?;

    let store = LocalStore::open(&path)?;
    let cfg = store.config();
    assert_eq!(cfg.config.http_timeout_secs, 5);
    assert_eq!(cfg.integrations.slack.token_env, "CHANGELINK_TEST_SLACK");
    assert_eq!(cfg.integrations.slack.api_base, "https://slack.com/api");
    assert_eq!(
        cfg.integrations.issue_tracker.as_ref().map(|t| t.token_env.as_str()),
        Some("ISSUE_TRACKER_TOKEN")
    );

    let names: Vec<_> = store.watchers().iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["payments"]);
    assert_eq!(cfg.rejected.len(), 2);

    let found = store.find_watchers_for_path("services/foo.go")?;
    assert_eq!(found.len(), 1);
    let watcher = &found[0];
    assert_eq!(watcher.lines, vec![range(61, 80)]);
    assert!(watcher.trigger_on_rename);
    assert_eq!(watcher.actions.len(), 2);
    assert!(matches!(watcher.actions[0], Action::Slack(ref s) if s.channel == "#eng"));

    assert!(store.find_watchers_for_path("services/bar.go")?.is_empty());
    Ok(())
}

#[test]
fn save_round_trips_in_each_format() -> TestResult {
    let dir = TempDir::new()?;
    for ext in ["toml", "yaml", "json", "msgpack"] {
        let path = dir.path().join(format!("watchers.{ext}"));

        let mut store = LocalStore::empty(&path)?;
        let mut builder = WatcherBuilder::new("W", "src/lib.rs").lines(1, 5).on_delete();
        for action in sample_actions() {
            builder = builder.action(action);
        }
        store.add_watcher(builder.build())?;
        store.add_watcher(WatcherBuilder::new("any", "README.md").trigger_any().build())?;
        store.save()?;

        let reopened = LocalStore::open(&path)?;
        assert_eq!(reopened.watchers(), store.watchers(), "format {ext}");
        assert!(reopened.config().rejected.is_empty());
    }
    Ok(())
}

#[test]
fn save_keeps_rejected_entries() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join(".changelink.toml");
    fs::write(&path, TOML_DOC)?;

    let mut store = LocalStore::open(&path)?;
    store.add_watcher(WatcherBuilder::new("new", "a.rs").build())?;
    store.save()?;

    let reopened = LocalStore::open(&path)?;
    let names: Vec<_> = reopened.watchers().iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["payments", "new"]);
    let rejected: Vec<_> = reopened
        .config()
        .rejected
        .iter()
        .filter_map(|r| r.name.as_deref())
        .collect();
    assert_eq!(rejected, vec!["bad-range", "pigeon"]);
    Ok(())
}

#[test]
fn add_watcher_rejects_invalid_and_duplicate() -> TestResult {
    let dir = TempDir::new()?;
    let mut store = LocalStore::empty(dir.path().join("w.yaml"))?;

    store.add_watcher(WatcherBuilder::new("W", "a.rs").build())?;
    let dup = store.add_watcher(WatcherBuilder::new("W", "b.rs").build());
    assert!(matches!(dup, Err(ChangelinkError::MalformedWatcher { .. })));

    let mut nameless = WatcherBuilder::new("tmp", "a.rs").build();
    nameless.name.clear();
    assert!(store.add_watcher(nameless).is_err());

    assert_eq!(store.watchers().len(), 1);
    Ok(())
}

#[test]
fn repeated_action_names_still_load() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join(".changelink.toml");
    fs::write(
        &path,
        r##"
[[watchers]]
name = "W"
file_path = "services/foo.go"

[[watchers.actions]]
type = "slack"
name = "notify"
channel = "#eng"

[[watchers.actions]]
type = "slack"
name = "notify"
channel = "#ops"
"##,
    )?;

    let store = LocalStore::open(&path)?;
    assert!(store.config().rejected.is_empty());
    let watcher = &store.find_watchers_for_path("services/foo.go")?[0];
    let channels: Vec<_> = watcher
        .actions
        .iter()
        .filter_map(|a| match a {
            Action::Slack(s) => Some(s.channel.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(channels, vec!["#eng", "#ops"]);
    Ok(())
}

#[test]
fn yaml_document_with_defaults() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join(".changelink.yml");
    fs::write(
        &path,
        "watchers:\n  - name: docs\n    file_path: docs/api.md\n    actions:\n      - type: webhook\n        name: hook\n        url: https://hooks.example.com/docs\n",
    )?;

    let cfg: ConfigFile = load_and_validate(&path)?;
    assert_eq!(cfg.config.http_timeout_secs, 10);
    assert!(cfg.integrations.issue_tracker.is_none());
    assert_eq!(cfg.watchers[0].name, "docs");
    assert!(cfg.watchers[0].lines.is_empty());
    Ok(())
}

#[test]
fn missing_file_and_unknown_extension_are_errors() {
    let dir = TempDir::new().unwrap();
    assert!(LocalStore::open(dir.path().join("absent.toml")).is_err());

    let odd = dir.path().join("watchers.ini");
    fs::write(&odd, "").unwrap();
    let err = LocalStore::open(&odd).unwrap_err();
    assert!(matches!(err, ChangelinkError::ConfigError(_)));
}

#[test]
fn zero_timeout_is_rejected() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("c.toml");
    fs::write(&path, "[config]\nhttp_timeout_secs = 0\n")?;
    assert!(matches!(
        load_and_validate(&path),
        Err(ChangelinkError::ConfigError(_))
    ));
    Ok(())
}
