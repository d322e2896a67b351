//! Scripted inference backend for testing
//!
//! Generation replies, pull outcomes and pull progress lines are queued up
//! front; every call is counted so tests can assert on the retry flow.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::{stream, StreamExt};
use safegate_classifiers::{GenerateRequest, InferenceBackend, LineStream};
use safegate_core::{Error, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Scripted outcome of one backend call
#[derive(Debug, Clone)]
pub enum Reply {
    /// Successful call; text for generation, ignored for pulls
    Text(String),
    /// Non-success HTTP status
    Status(u16),
    /// Request deadline exceeded
    Timeout,
    /// Connection refused
    Refused,
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Self::Text(text.to_string())
    }

    fn into_result(self) -> Result<String> {
        match self {
            Reply::Text(text) => Ok(text),
            Reply::Status(status) => Err(Error::backend_status(status, "scripted failure")),
            Reply::Timeout => Err(Error::Timeout),
            Reply::Refused => Err(Error::transport("connection refused")),
        }
    }
}

/// A configurable mock backend for testing
pub struct MockBackend {
    generate_replies: Mutex<VecDeque<Reply>>,
    pull_reply: Mutex<Reply>,
    progress_lines: Mutex<Vec<Result<String>>>,
    progress_feed: Mutex<Option<mpsc::UnboundedReceiver<Result<String>>>>,
    stream_open_failure: Mutex<Option<u16>>,
    models: Vec<String>,
    requests: Mutex<Vec<GenerateRequest>>,
    generate_calls: AtomicU32,
    pull_calls: AtomicU32,
    stream_calls: AtomicU32,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            generate_replies: Mutex::new(VecDeque::new()),
            pull_reply: Mutex::new(Reply::text("")),
            progress_lines: Mutex::new(Vec::new()),
            progress_feed: Mutex::new(None),
            stream_open_failure: Mutex::new(None),
            models: Vec::new(),
            requests: Mutex::new(Vec::new()),
            generate_calls: AtomicU32::new(0),
            pull_calls: AtomicU32::new(0),
            stream_calls: AtomicU32::new(0),
        }
    }

    /// Queue generation replies; once drained, generation answers SAFE
    pub fn with_replies(self, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.generate_replies.lock().unwrap().extend(replies);
        self
    }

    /// Outcome of every best-effort pull
    pub fn with_pull_reply(self, reply: Reply) -> Self {
        *self.pull_reply.lock().unwrap() = reply;
        self
    }

    /// NDJSON lines served by the next streamed pull
    pub fn with_progress_lines<I, S>(self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.progress_lines.lock().unwrap() = lines.into_iter().map(|l| Ok(l.into())).collect();
        self
    }

    /// Append a mid-stream transport failure after the scripted lines
    pub fn with_stream_failure(self, message: &str) -> Self {
        self.progress_lines
            .lock()
            .unwrap()
            .push(Err(Error::stream(message)));
        self
    }

    /// Refuse to open the pull stream with the given status
    pub fn with_stream_open_failure(self, status: u16) -> Self {
        *self.stream_open_failure.lock().unwrap() = Some(status);
        self
    }

    /// Feed the next streamed pull by hand; the stream ends when the sender drops
    pub fn with_progress_feed(self) -> (Self, mpsc::UnboundedSender<Result<String>>) {
        let (tx, rx) = mpsc::unbounded();
        *self.progress_feed.lock().unwrap() = Some(rx);
        (self, tx)
    }

    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = models.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn generate_calls(&self) -> u32 {
        self.generate_calls.load(Ordering::Relaxed)
    }

    pub fn pull_calls(&self) -> u32 {
        self.pull_calls.load(Ordering::Relaxed)
    }

    pub fn stream_calls(&self) -> u32 {
        self.stream_calls.load(Ordering::Relaxed)
    }

    /// Generation requests in the order they were received
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        self.generate_calls.fetch_add(1, Ordering::Relaxed);
        self.requests.lock().unwrap().push(request.clone());

        let reply = self
            .generate_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::text("VERDICT:SAFE\nCATEGORY:"));
        reply.into_result()
    }

    async fn pull(&self, _model: &str) -> Result<()> {
        self.pull_calls.fetch_add(1, Ordering::Relaxed);
        let reply = self.pull_reply.lock().unwrap().clone();
        reply.into_result().map(|_| ())
    }

    async fn pull_stream(&self, _model: &str) -> Result<LineStream> {
        self.stream_calls.fetch_add(1, Ordering::Relaxed);

        if let Some(status) = *self.stream_open_failure.lock().unwrap() {
            return Err(Error::backend_status(status, "pull refused"));
        }
        if let Some(feed) = self.progress_feed.lock().unwrap().take() {
            return Ok(feed.boxed());
        }

        let lines = std::mem::take(&mut *self.progress_lines.lock().unwrap());
        Ok(stream::iter(lines).boxed())
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(self.models.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
