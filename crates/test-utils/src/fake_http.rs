use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use changelink::actions::http::{HttpClient, HttpRequest, HttpResponse};
use changelink::errors::Result;

struct Route {
    url_suffix: String,
    replies: VecDeque<HttpResponse>,
}

/// A fake HTTP client that:
/// - records every request it is sent
/// - answers from per-URL scripted replies, falling back to
///   `200 {"ok": true}`.
///
/// Routes match on URL suffix. A route's last reply is repeated once the
/// others have been used up.
#[derive(Clone, Default)]
pub struct FakeHttpClient {
    sent: Arc<Mutex<Vec<HttpRequest>>>,
    routes: Arc<Mutex<Vec<Route>>>,
}

impl FakeHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for requests whose URL ends with `url_suffix`.
    pub fn reply(self, url_suffix: &str, status: u16, body: serde_json::Value) -> Self {
        {
            let mut routes = self.routes.lock().unwrap();
            let response = HttpResponse {
                status,
                body: body.to_string(),
            };
            match routes.iter_mut().find(|r| r.url_suffix == url_suffix) {
                Some(route) => route.replies.push_back(response),
                None => routes.push(Route {
                    url_suffix: url_suffix.to_string(),
                    replies: VecDeque::from([response]),
                }),
            }
        }
        self
    }

    /// Slack replies that make `channel` resolvable and posting succeed.
    pub fn with_slack_channel(self, channel: &str, id: &str) -> Self {
        self.reply(
            "/conversations.list",
            200,
            serde_json::json!({
                "ok": true,
                "channels": [{ "id": id, "name": channel }],
                "response_metadata": { "next_cursor": "" }
            }),
        )
        .reply("/chat.postMessage", 200, serde_json::json!({ "ok": true }))
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn requests_to(&self, url_suffix: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.ends_with(url_suffix))
            .collect()
    }

    fn answer(&self, url: &str) -> HttpResponse {
        let mut routes = self.routes.lock().unwrap();
        let Some(route) = routes.iter_mut().find(|r| url.ends_with(&r.url_suffix)) else {
            return HttpResponse {
                status: 200,
                body: r#"{"ok":true}"#.to_string(),
            };
        };
        if route.replies.len() > 1 {
            route.replies.pop_front().unwrap()
        } else {
            route.replies[0].clone()
        }
    }
}

impl HttpClient for FakeHttpClient {
    fn send(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + '_>> {
        let response = self.answer(&request.url);
        self.sent.lock().unwrap().push(request);
        Box::pin(async move { Ok(response) })
    }
}
