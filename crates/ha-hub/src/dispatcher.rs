//! Signal dispatcher
//!
//! Lightweight fan-out between components of an integration, e.g. the Music
//! Assistant event relay and its media player platform. Signals are plain
//! strings; payloads travel as JSON and are parsed by the receiver.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{trace, warn};

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Signal-keyed broadcast dispatcher
pub struct Dispatcher {
    signals: DashMap<String, broadcast::Sender<serde_json::Value>>,
    capacity: usize,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            signals: DashMap::new(),
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Connect to a signal
    ///
    /// Only payloads sent after this call are received.
    pub fn connect(&self, signal: &str) -> SignalReceiver {
        trace!(signal = %signal, "Connecting to signal");
        let rx = self
            .signals
            .entry(signal.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();
        SignalReceiver {
            signal: signal.to_string(),
            rx,
        }
    }

    /// Send a payload to every receiver connected to `signal`
    ///
    /// Returns the number of receivers the payload reached.
    pub fn send<T: Serialize>(&self, signal: &str, payload: &T) -> usize {
        let value = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                warn!(signal = %signal, error = %e, "Dropping unserializable payload");
                return 0;
            }
        };

        trace!(signal = %signal, "Dispatching signal");
        self.signals
            .get(signal)
            .and_then(|tx| tx.send(value).ok())
            .unwrap_or(0)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of a dispatcher signal
pub struct SignalReceiver {
    signal: String,
    rx: broadcast::Receiver<serde_json::Value>,
}

impl SignalReceiver {
    /// The signal this receiver is connected to
    pub fn signal(&self) -> &str {
        &self.signal
    }

    /// Receive the next raw payload
    pub async fn recv(&mut self) -> Result<serde_json::Value, broadcast::error::RecvError> {
        self.rx.recv().await
    }

    /// Receive the next payload that parses as `T`
    ///
    /// Payloads of another shape are logged and skipped.
    pub async fn recv_typed<T: DeserializeOwned>(
        &mut self,
    ) -> Result<T, broadcast::error::RecvError> {
        loop {
            let value = self.rx.recv().await?;
            match serde_json::from_value(value) {
                Ok(payload) => return Ok(payload),
                Err(e) => warn!(signal = %self.signal, error = %e, "Skipping malformed payload"),
            }
        }
    }
}
