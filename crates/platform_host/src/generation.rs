//! Generation-backend contracts: interaction events, requests, and content streams.
//!
//! The backend itself (prompt construction, transport) lives outside this workspace. The runtime
//! only sees [`ContentStreamClient`], which turns a bounded interaction history into a lazy stream
//! of markup fragments.

use std::{cell::RefCell, collections::VecDeque, pin::Pin, rc::Rc};

use futures::{
    channel::mpsc::{self, UnboundedSender},
    stream, Stream,
};
use serde::{Deserialize, Serialize};

/// Lazy, append-only sequence of generated markup fragments.
///
/// An `Err` item terminates the stream; a connection failure is reported as the first item.
pub type ContentStream = Pin<Box<dyn Stream<Item = Result<String, String>>>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Immutable record of one user action on the desktop or inside generated content.
pub struct InteractionEvent {
    /// Identifier of the element or action that fired. Unique only within one generated screen.
    pub id: String,
    /// Opaque interaction kind such as `app_open`, `search`, or `generic_click`.
    pub kind: String,
    /// User-entered text, when the element carried a value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Visible label of the element.
    #[serde(default)]
    pub element_label: String,
    /// Element category (`icon`, `button`, `search_input`, ...).
    #[serde(default)]
    pub element_kind: String,
    /// Id of the application instance that owns the element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_context: Option<String>,
}

impl InteractionEvent {
    /// Creates an event with the given id and kind and empty descriptive fields.
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            value: None,
            element_label: String::new(),
            element_kind: String::new(),
            app_context: None,
        }
    }

    /// Attaches user-entered text.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Attaches the element label and category.
    pub fn with_element(mut self, label: impl Into<String>, kind: impl Into<String>) -> Self {
        self.element_label = label.into();
        self.element_kind = kind.into();
        self
    }

    /// Attaches the owning application instance id.
    pub fn with_app_context(mut self, app_context: impl Into<String>) -> Self {
        self.app_context = Some(app_context.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Payload handed to the generation backend for one generation attempt.
pub struct GenerationRequest {
    /// Interaction history, most recent first.
    pub history: Vec<InteractionEvent>,
    /// History cap in effect when the request was issued.
    pub max_history_length: usize,
    /// Output language tag, forwarded verbatim.
    pub language: String,
}

/// Network-facing generation service.
pub trait ContentStreamClient {
    /// Starts one generation and returns its fragment stream.
    ///
    /// Dropping the returned stream must release the underlying connection.
    fn generate(&self, request: GenerationRequest) -> ContentStream;
}

#[derive(Debug, Clone, Copy, Default)]
/// Client for hosts without a configured backend. Every request fails immediately.
pub struct NoopContentStreamClient;

impl ContentStreamClient for NoopContentStreamClient {
    fn generate(&self, _request: GenerationRequest) -> ContentStream {
        Box::pin(stream::once(async {
            Err("generation backend unavailable".to_string())
        }))
    }
}

#[derive(Default)]
struct ScriptedInner {
    scripts: VecDeque<Vec<Result<String, String>>>,
    requests: Vec<GenerationRequest>,
}

#[derive(Clone, Default)]
/// In-memory client that replays queued scripts, one per `generate` call.
///
/// Calls beyond the queued scripts yield an empty stream.
pub struct ScriptedContentStreamClient {
    inner: Rc<RefCell<ScriptedInner>>,
}

impl ScriptedContentStreamClient {
    /// Queues a successful generation made of `fragments`.
    pub fn push_fragments<I, S>(&self, fragments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script = fragments.into_iter().map(|f| Ok(f.into())).collect();
        self.inner.borrow_mut().scripts.push_back(script);
    }

    /// Queues a raw script, allowing a failure after some fragments.
    pub fn push_script(&self, script: Vec<Result<String, String>>) {
        self.inner.borrow_mut().scripts.push_back(script);
    }

    /// Queues a generation that fails before producing anything.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.push_script(vec![Err(message.into())]);
    }

    /// Returns every request received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.inner.borrow().requests.clone()
    }
}

impl ContentStreamClient for ScriptedContentStreamClient {
    fn generate(&self, request: GenerationRequest) -> ContentStream {
        let mut inner = self.inner.borrow_mut();
        inner.requests.push(request);
        let script = inner.scripts.pop_front().unwrap_or_default();
        Box::pin(stream::iter(script))
    }
}

#[derive(Debug, Clone)]
/// Producer half of a stream created by [`ChannelContentStreamClient`].
pub struct ContentStreamSender {
    tx: UnboundedSender<Result<String, String>>,
}

impl ContentStreamSender {
    /// Delivers one fragment. Returns `false` once the consumer has dropped the stream.
    pub fn send_fragment(&self, fragment: impl Into<String>) -> bool {
        self.tx.unbounded_send(Ok(fragment.into())).is_ok()
    }

    /// Terminates the stream with an error. Returns `false` once the consumer is gone.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        let delivered = self.tx.unbounded_send(Err(message.into())).is_ok();
        self.tx.close_channel();
        delivered
    }

    /// Ends the stream normally.
    pub fn finish(&self) {
        self.tx.close_channel();
    }

    /// Returns whether the consumer dropped the stream (or it was finished).
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[derive(Default)]
struct ChannelInner {
    senders: Vec<ContentStreamSender>,
    requests: Vec<GenerationRequest>,
}

#[derive(Clone, Default)]
/// In-memory client whose streams are fed manually, one channel per `generate` call.
///
/// Lets callers interleave fragment delivery with other runtime operations.
pub struct ChannelContentStreamClient {
    inner: Rc<RefCell<ChannelInner>>,
}

impl ChannelContentStreamClient {
    /// Returns the producer for the `index`-th generation, if it was requested.
    pub fn sender(&self, index: usize) -> Option<ContentStreamSender> {
        self.inner.borrow().senders.get(index).cloned()
    }

    /// Returns the producer for the most recent generation.
    pub fn latest_sender(&self) -> Option<ContentStreamSender> {
        self.inner.borrow().senders.last().cloned()
    }

    /// Returns every request received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.inner.borrow().requests.clone()
    }
}

impl ContentStreamClient for ChannelContentStreamClient {
    fn generate(&self, request: GenerationRequest) -> ContentStream {
        let (tx, rx) = mpsc::unbounded();
        let mut inner = self.inner.borrow_mut();
        inner.requests.push(request);
        inner.senders.push(ContentStreamSender { tx });
        Box::pin(rx)
    }
}
