//! # Transactions
//!
//! A `Transaction` pairs an opaque `Message` with a write-once response path.
//! Whoever ends up holding the transaction (a consumer, or a stage that has to
//! give up on it) answers exactly once through that path.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

/// Opaque multi-part payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    parts: Vec<Vec<u8>>,
}

impl Message {
    /// Create a message from its parts.
    #[must_use]
    pub fn new(parts: Vec<Vec<u8>>) -> Self {
        Self { parts }
    }

    /// Create a single-part message.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            parts: vec![bytes.into()],
        }
    }

    /// All parts, in order.
    #[must_use]
    pub fn parts(&self) -> &[Vec<u8>] {
        &self.parts
    }

    /// Number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns true if the message has no parts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Why a transaction was not delivered successfully.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    /// The downstream consumer refused the transaction.
    #[error("rejected by consumer: {0}")]
    Rejected(String),

    /// A stage shut down while holding the transaction and discarded it.
    #[error("stage closed before the transaction was handed off")]
    StageClosed,

    /// The transaction was dropped without anyone answering it.
    #[error("transaction dropped without a response")]
    Dropped,
}

/// Outcome reported back to the sender of a transaction.
pub type Response = Result<(), ResponseError>;

/// One unit of pipeline work.
#[derive(Debug)]
pub struct Transaction {
    payload: Message,
    response_tx: oneshot::Sender<Response>,
}

impl Transaction {
    /// Create a transaction and the receiver its sender uses to learn the outcome.
    #[must_use]
    pub fn new(payload: Message) -> (Self, ResponseReceiver) {
        let (response_tx, response_rx) = oneshot::channel();
        (
            Self {
                payload,
                response_tx,
            },
            ResponseReceiver { inner: response_rx },
        )
    }

    /// The payload. Stages never mutate it.
    #[must_use]
    pub fn payload(&self) -> &Message {
        &self.payload
    }

    /// Take the payload without answering. The sender observes `Dropped`.
    #[must_use]
    pub fn into_payload(self) -> Message {
        self.payload
    }

    /// Answer the sender. Returns false if the sender stopped listening.
    pub fn respond(self, response: Response) -> bool {
        self.response_tx.send(response).is_ok()
    }

    /// Report successful delivery.
    pub fn ack(self) -> bool {
        self.respond(Ok(()))
    }

    /// Report that the consumer refused the transaction.
    pub fn reject(self, reason: impl Into<String>) -> bool {
        self.respond(Err(ResponseError::Rejected(reason.into())))
    }

    /// Returns true if the sender has dropped its `ResponseReceiver`.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.response_tx.is_closed()
    }
}

/// Receiving half of a transaction's response path.
#[derive(Debug)]
pub struct ResponseReceiver {
    inner: oneshot::Receiver<Response>,
}

impl ResponseReceiver {
    /// Wait for the outcome.
    ///
    /// Resolves to `Err(ResponseError::Dropped)` if the transaction was
    /// dropped unanswered.
    pub async fn outcome(self) -> Response {
        self.inner.await.unwrap_or(Err(ResponseError::Dropped))
    }

    /// Check for an outcome without waiting.
    ///
    /// - `Some(response)` - The transaction was answered (or dropped)
    /// - `None` - No answer yet
    pub fn try_outcome(&mut self) -> Option<Response> {
        match self.inner.try_recv() {
            Ok(response) => Some(response),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(ResponseError::Dropped)),
        }
    }
}
