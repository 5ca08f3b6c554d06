// tests/action_dispatch.rs

mod common;
use crate::common::builders::{WatcherBuilder, action_env, bare_action_env, modified, renamed};
use crate::common::{FakeHttpClient, engine_with, init_tracing, with_timeout};

use std::io::Cursor;

use serde_json::json;

use changelink::actions::http::HttpMethod;
use changelink::actions::{
    Action, ActionOutcome, ActionRequest, IssueTicketAction, LogAction, SlackAction, WebhookAction,
};
use changelink::diff::{DiffReader, Hunk, VecSource};
use changelink::engine::{Evidence, Runtime, RuntimeOptions, TriggerReason, dispatch_triggered};
use changelink::engine::RunReport;
use changelink::errors::ChangelinkError;

fn line_evidence() -> Evidence {
    Evidence {
        reason: TriggerReason::WatchedLinesChanged,
        changed: Some(changelink::types::LineRange::new(80, 100).unwrap()),
        watched: Some(changelink::types::LineRange::new(61, 80).unwrap()),
        hunk: Some(Hunk::new(77, 26).with_body(" a\n-b\n+c\n d")),
    }
}

fn request(evidence: &Evidence) -> ActionRequest<'_> {
    ActionRequest {
        watcher_name: "payments",
        file_path: "services/foo.go",
        evidence,
    }
}

#[tokio::test]
async fn slack_resolves_channel_across_pages_then_posts() {
    init_tracing();
    let http = FakeHttpClient::new()
        .reply(
            "/conversations.list",
            200,
            json!({
                "ok": true,
                "channels": [{ "id": "C1", "name": "random" }],
                "response_metadata": { "next_cursor": "page2" }
            }),
        )
        .reply(
            "/conversations.list",
            200,
            json!({
                "ok": true,
                "channels": [{ "id": "C2", "name": "eng" }],
                "response_metadata": { "next_cursor": "" }
            }),
        )
        .reply("/chat.postMessage", 200, json!({ "ok": true }));
    let env = action_env(&http);
    let evidence = line_evidence();

    let action = SlackAction::new("notify", "#eng", "{watcher} changed {file} ({lines})");
    let outcome = action.perform(&env, &request(&evidence)).await.unwrap();
    assert_eq!(outcome, ActionOutcome::Delivered { status: 200 });

    let lists = http.requests_to("/conversations.list");
    assert_eq!(lists.len(), 2);
    assert!(lists[0].query.contains(&("limit".to_string(), "400".to_string())));
    assert!(lists[1].query.contains(&("cursor".to_string(), "page2".to_string())));

    let posts = http.requests_to("/chat.postMessage");
    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert_eq!(post.method, HttpMethod::Post);
    assert!(
        post.headers
            .contains(&("Authorization".to_string(), "Bearer xoxb-test".to_string()))
    );
    let body = post.body.as_ref().unwrap();
    assert_eq!(body["channel"], "C2");
    let blocks = body["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 4);
    assert_eq!(blocks[0]["type"], "header");
    assert_eq!(blocks[1]["text"]["text"], "payments changed services/foo.go (80-100)");
    assert_eq!(blocks[2]["type"], "divider");
    assert!(blocks[3]["text"]["text"].as_str().unwrap().contains("+c"));
}

#[tokio::test]
async fn slack_without_token_names_the_env_var() {
    let http = FakeHttpClient::new();
    let env = bare_action_env(&http);
    let evidence = line_evidence();

    let err = SlackAction::new("notify", "eng", "")
        .perform(&env, &request(&evidence))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("missing slack token. Is SLACK_TOKEN set?"));
    assert!(http.requests().is_empty());
}

#[tokio::test]
async fn slack_unknown_channel_is_reported() {
    let http = FakeHttpClient::new().with_slack_channel("general", "C9");
    let env = action_env(&http);
    let evidence = line_evidence();

    let err = SlackAction::new("notify", "#eng", "")
        .perform(&env, &request(&evidence))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("did you /invite @changelink"));
}

#[tokio::test]
async fn webhook_posts_evidence_and_fails_on_error_status() {
    let http = FakeHttpClient::new()
        .reply("/ok", 204, json!(null))
        .reply("/down", 503, json!({ "error": "maintenance" }));
    let env = action_env(&http);
    let evidence = line_evidence();

    let ok = WebhookAction::new("hook", "https://hooks.test/ok").with_header("X-Token", "t");
    let outcome = ok.perform(&env, &request(&evidence)).await.unwrap();
    assert_eq!(outcome, ActionOutcome::Delivered { status: 204 });

    let sent = &http.requests_to("/ok")[0];
    assert!(sent.headers.contains(&("X-Token".to_string(), "t".to_string())));
    let body = sent.body.as_ref().unwrap();
    assert_eq!(body["reason"], "Watched lines changed");
    assert_eq!(body["changed_lines"], json!({ "start_line": 80, "end_line": 100 }));
    assert_eq!(body["watched_lines"], json!({ "start_line": 61, "end_line": 80 }));

    let down = WebhookAction::new("hook", "https://hooks.test/down");
    let err = down.perform(&env, &request(&evidence)).await.unwrap_err();
    assert!(matches!(err, ChangelinkError::ActionExecutionFailed { .. }));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn issue_ticket_returns_created_key() {
    let http = FakeHttpClient::new().reply("/rest/api/2/issue", 201, json!({ "key": "OPS-42" }));
    let env = action_env(&http);
    let evidence = line_evidence();

    let action = IssueTicketAction::new("ticket", "OPS", "Review {file}").with_label("changelink");
    let outcome = action.perform(&env, &request(&evidence)).await.unwrap();
    assert_eq!(
        outcome,
        ActionOutcome::TicketCreated {
            key: "OPS-42".to_string()
        }
    );

    let sent = &http.requests_to("/rest/api/2/issue")[0];
    assert_eq!(sent.url, "https://issues.test/rest/api/2/issue");
    let fields = &sent.body.as_ref().unwrap()["fields"];
    assert_eq!(fields["project"]["key"], "OPS");
    assert_eq!(fields["summary"], "Review services/foo.go");
    assert_eq!(fields["issuetype"]["name"], "Task");
    assert_eq!(fields["labels"], json!(["changelink"]));
}

#[tokio::test]
async fn issue_ticket_without_tracker_fails() {
    let http = FakeHttpClient::new();
    let env = bare_action_env(&http);
    let evidence = Evidence::structural(TriggerReason::Renamed);

    let err = IssueTicketAction::new("ticket", "OPS", "s")
        .perform(&env, &request(&evidence))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("issue_tracker"));
}

#[tokio::test]
async fn one_failing_action_does_not_stop_siblings() {
    init_tracing();
    let http = FakeHttpClient::new().reply("/down", 500, json!({}));
    let env = action_env(&http);

    let engine = engine_with(vec![
        WatcherBuilder::new("W", "x.go")
            .on_rename()
            .action(WebhookAction::new("first", "https://hooks.test/down"))
            .action(LogAction::new("second", "{watcher}: {reason}"))
            .action(WebhookAction::new("third", "https://hooks.test/up"))
            .build(),
    ]);
    let triggered = engine.evaluate_record(&renamed("x.go", "y.go")).unwrap();

    let mut report = RunReport::default();
    dispatch_triggered(&env, &triggered, &mut report).await;

    assert_eq!(report.actions_performed, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].action, "first");
    assert_eq!(report.failures[0].watcher, "W");
    assert!(!report.is_success());
    assert_eq!(http.requests_to("/up").len(), 1);
}

#[tokio::test]
async fn runtime_processes_records_in_order_and_collects_failures() {
    init_tracing();
    let http = FakeHttpClient::new().reply("/down", 500, json!({}));
    let env = action_env(&http);
    let engine = engine_with(vec![
        WatcherBuilder::new("lines", "a.go")
            .lines(10, 20)
            .action(WebhookAction::new("hook", "https://hooks.test/down"))
            .build(),
        WatcherBuilder::new("any", "b.go")
            .action(WebhookAction::new("hook", "https://hooks.test/b"))
            .build(),
    ]);
    let runtime = Runtime::new(engine, env, RuntimeOptions::default());

    let mut source = VecSource::new(vec![
        modified("a.go", &[(5, 10)]),
        modified("c.go", &[(1, 7)]),
        modified("b.go", &[(1, 7)]),
    ]);
    let report = with_timeout(runtime.run(&mut source)).await;

    assert_eq!(report.records, 3);
    let hits: Vec<_> = report.triggered.iter().map(|t| t.watcher.name.as_str()).collect();
    assert_eq!(hits, vec!["lines", "any"]);
    assert_eq!(report.actions_performed, 1);
    assert_eq!(report.failures.len(), 1);

    let urls: Vec<_> = http.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(urls, vec!["https://hooks.test/down", "https://hooks.test/b"]);
}

#[tokio::test]
async fn dry_run_performs_nothing() {
    let http = FakeHttpClient::new();
    let env = action_env(&http);
    let engine = engine_with(vec![
        WatcherBuilder::new("W", "services/foo.go")
            .lines(61, 80)
            .action(Action::from(WebhookAction::new("hook", "https://hooks.test/x")))
            .build(),
    ]);
    let runtime = Runtime::new(engine, env, RuntimeOptions { dry_run: true });

    let diff = "\
diff --git a/services/foo.go b/services/foo.go
--- a/services/foo.go
+++ b/services/foo.go
@@ -60,7 +60,7 @@
 a
 b
 c
-d
+D
 e
 f
 g
";
    let mut source = DiffReader::new(Cursor::new(diff.as_bytes().to_vec()));
    let report = runtime.run(&mut source).await;

    assert_eq!(report.triggered.len(), 1);
    assert_eq!(report.triggered[0].evidence.reason, TriggerReason::WatchedLinesChanged);
    assert_eq!(report.actions_performed, 0);
    assert!(http.requests().is_empty());
}
