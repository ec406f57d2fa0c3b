//! In-process hub services
//!
//! The pieces of the hub the Music Assistant integration talks to:
//!
//! - [`EventBus`] - typed pub/sub for hub events such as `state_changed`
//! - [`StateMachine`] - current entity states
//! - [`ServiceRegistry`] - async service handlers keyed by `domain.service`
//! - [`Dispatcher`] - signal-keyed messages between components of one integration
//!
//! [`Hub`] bundles them the way an integration receives them at setup.

mod dispatcher;
mod event_bus;
mod service_registry;
mod state_machine;

use std::sync::Arc;

pub use dispatcher::{Dispatcher, SignalReceiver};
pub use event_bus::{EventBus, TypedEventReceiver};
pub use service_registry::{
    ServiceError, ServiceFuture, ServiceHandler, ServiceRegistry, ServiceResult,
};
pub use state_machine::StateMachine;

/// The hub handle passed to integrations
#[derive(Clone)]
pub struct Hub {
    /// Event bus for pub/sub communication
    pub bus: Arc<EventBus>,
    /// State machine for entity states
    pub states: Arc<StateMachine>,
    /// Service registry for service calls
    pub services: Arc<ServiceRegistry>,
    /// Cross-component signal dispatch
    pub dispatcher: Arc<Dispatcher>,
}

impl Hub {
    pub fn new() -> Self {
        let bus = Arc::new(EventBus::new());
        let states = Arc::new(StateMachine::new(bus.clone()));
        let services = Arc::new(ServiceRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new());

        Self {
            bus,
            states,
            services,
            dispatcher,
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
