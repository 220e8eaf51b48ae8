//! In-memory fakes for the injected capabilities.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::api::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::notify::{Notifier, Severity};
use crate::router::Navigator;

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.paths.lock().push(path.to_string());
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.messages.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        self.messages.lock().push((severity, message.to_string()));
    }
}

/// Replies with queued outcomes in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn reply(&self, outcome: Result<HttpResponse, TransportError>) {
        self.replies.lock().push_back(outcome);
    }

    pub fn reply_json(&self, status: u16, body: &str) {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        self.reply(Ok(HttpResponse {
            status: reqwest::StatusCode::from_u16(status).unwrap(),
            headers,
            body: body.as_bytes().to_vec(),
        }));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request);
        self.replies
            .lock()
            .pop_front()
            .expect("ScriptedTransport ran out of replies")
    }
}
