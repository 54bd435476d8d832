//! Event sinks notified after a checkout commits.
//!
//! Delivery is best-effort. A failing sink never undoes a committed order.

use std::collections::BTreeMap;

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::info;

/// Event type published once per successful checkout.
pub const ORDER_CREATED: &str = "ORDER_CREATED";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEvent {
    pub event_type: String,
    pub payload: Value,
    pub metadata: BTreeMap<String, String>,
}

impl OutboundEvent {
    /// The event type is also recorded under the `event_type` metadata key.
    #[must_use]
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        let event_type = event_type.into();
        let metadata = BTreeMap::from([("event_type".to_string(), event_type.clone())]);

        Self {
            event_type,
            payload,
            metadata,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum EventSinkError {
    #[error("event sink is closed")]
    Closed,
}

#[automock]
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: OutboundEvent) -> Result<(), EventSinkError>;
}

/// Writes each event as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

#[async_trait]
impl EventSink for LogEventSink {
    async fn publish(&self, event: OutboundEvent) -> Result<(), EventSinkError> {
        info!(
            event_type = %event.event_type,
            payload = %event.payload,
            metadata = ?event.metadata,
            "event published"
        );

        Ok(())
    }
}

/// Hands events to an in-process queue consumer.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: UnboundedSender<OutboundEvent>,
}

impl ChannelEventSink {
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<OutboundEvent>) {
        let (sender, receiver) = unbounded_channel();

        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EventSink for ChannelEventSink {
    async fn publish(&self, event: OutboundEvent) -> Result<(), EventSinkError> {
        self.sender
            .send(event)
            .map_err(|_closed| EventSinkError::Closed)
    }
}
