//! Events carried on the hub bus

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Context;

/// Payload with a fixed event name on the bus
pub trait EventData: Clone + Send + Sync + 'static {
    const EVENT_TYPE: &'static str;
}

/// A fired event; `T` is raw JSON until a typed receiver parses it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T = Value> {
    pub event_type: String,
    pub data: T,
    pub fired_at: DateTime<Utc>,
    pub context: Context,
}

impl<T> Event<T> {
    pub fn new(event_type: impl Into<String>, data: T, context: Context) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            fired_at: Utc::now(),
            context,
        }
    }

    /// Same event with a different payload
    pub fn with_data<U>(self, data: U) -> Event<U> {
        Event {
            event_type: self.event_type,
            data,
            fired_at: self.fired_at,
            context: self.context,
        }
    }
}

impl<T: EventData> Event<T> {
    pub fn typed(data: T, context: Context) -> Self {
        Self::new(T::EVENT_TYPE, data, context)
    }
}
