//! Pub/sub for hub events

use std::marker::PhantomData;

use dashmap::DashMap;
use ha_core::{Context, Event, EventData};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, trace, warn};

const CHANNEL_CAPACITY: usize = 1024;

/// One broadcast channel per event type, opened by the first subscriber
///
/// Events are stored as JSON; typed receivers parse them on the way out.
#[derive(Default)]
pub struct EventBus {
    channels: DashMap<String, broadcast::Sender<Event>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, event_type: &str) -> broadcast::Receiver<Event> {
        trace!(event_type, "New subscriber");
        self.channels
            .entry(event_type.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    pub fn subscribe_typed<T: EventData + DeserializeOwned>(&self) -> TypedEventReceiver<T> {
        TypedEventReceiver {
            rx: self.subscribe(T::EVENT_TYPE),
            _data: PhantomData,
        }
    }

    /// Deliver `event` to the current subscribers of its type, if any
    pub fn fire(&self, event: Event) {
        debug!(event_type = %event.event_type, "Firing event");
        if let Some(sender) = self.channels.get(&event.event_type) {
            // Err only means every receiver is gone
            let _ = sender.send(event);
        }
    }

    pub fn fire_typed<T: EventData + Serialize>(&self, data: T, context: Context) {
        let data = match serde_json::to_value(&data) {
            Ok(data) => data,
            Err(e) => {
                warn!(event_type = T::EVENT_TYPE, error = %e, "Dropping unserializable event");
                return;
            }
        };
        self.fire(Event::new(T::EVENT_TYPE, data, context));
    }
}

/// Subscription that yields events already parsed into `T`
pub struct TypedEventReceiver<T> {
    rx: broadcast::Receiver<Event>,
    _data: PhantomData<T>,
}

impl<T: EventData + DeserializeOwned> TypedEventReceiver<T> {
    /// Next event of this type; payloads that do not parse as `T` are skipped
    pub async fn recv(&mut self) -> Result<Event<T>, RecvError> {
        loop {
            let event = self.rx.recv().await?;
            match T::deserialize(&event.data) {
                Ok(data) => return Ok(event.with_data(data)),
                Err(e) => trace!(event_type = T::EVENT_TYPE, error = %e, "Skipping event"),
            }
        }
    }
}
