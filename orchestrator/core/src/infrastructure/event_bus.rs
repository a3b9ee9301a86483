// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - In-process change feed
//
// Stands in for the external pub/sub transport using tokio broadcast channels.
// Blob store adapters publish the wire JSON of every change; the router and
// any watchers subscribe. Messages are lost on restart.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::events::{ChangeEvent, ChangeEventEnvelope};
use crate::domain::journal::InstanceId;

/// One transport message: the raw JSON body of a change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub body: String,
}

impl ChangeNotification {
    pub fn from_envelope(envelope: &ChangeEventEnvelope) -> Result<Self, serde_json::Error> {
        Ok(Self {
            body: serde_json::to_string(envelope)?,
        })
    }

    pub fn parse(&self) -> ChangeEvent {
        ChangeEvent::from_json(&self.body)
    }
}

/// Event bus carrying change notifications to every subscriber
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<ChangeNotification>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    /// Capacity determines how many messages can be buffered before slow
    /// receivers start lagging
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(1024)
    }

    /// Publish an envelope
    pub fn publish_envelope(&self, envelope: &ChangeEventEnvelope) {
        match ChangeNotification::from_envelope(envelope) {
            Ok(notification) => self.publish(notification),
            Err(e) => warn!(error = %e, subject = %envelope.subject, "Failed to encode change event"),
        }
    }

    /// Publish a raw message body, e.g. one read from an external feed
    pub fn publish_raw(&self, body: impl Into<String>) {
        self.publish(ChangeNotification { body: body.into() });
    }

    fn publish(&self, notification: ChangeNotification) {
        debug!(body = %notification.body, "Publishing change notification");

        let receiver_count = self.sender.send(notification).unwrap_or(0);
        if receiver_count == 0 {
            debug!("No subscribers listening to change notification");
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe and filter for a single collaboration instance
    pub fn subscribe_instance(&self, instance_id: InstanceId) -> InstanceEventReceiver {
        InstanceEventReceiver {
            receiver: self.sender.subscribe(),
            instance_id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} messages", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Receiver for all change notifications
pub struct EventReceiver {
    receiver: broadcast::Receiver<ChangeNotification>,
}

impl EventReceiver {
    /// Receive the next message (waits until one is available)
    pub async fn recv(&mut self) -> Result<ChangeNotification, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    /// Try to receive a message without blocking
    pub fn try_recv(&mut self) -> Result<ChangeNotification, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} messages", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Receiver yielding parsed events of one instance only
pub struct InstanceEventReceiver {
    receiver: broadcast::Receiver<ChangeNotification>,
    instance_id: InstanceId,
}

impl InstanceEventReceiver {
    pub async fn recv(&mut self) -> Result<ChangeEvent, EventBusError> {
        loop {
            let notification = self.receiver.recv().await.map_err(map_recv_error)?;
            let event = notification.parse();
            if event.instance_id == self.instance_id {
                return Ok(event);
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} messages")]
    Lagged(u64),
}
