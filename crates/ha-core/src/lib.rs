//! Types shared by the hub and its integrations
//!
//! Entities are addressed by [`EntityId`], their current value is a
//! [`State`], and every change travels as an [`Event`] tagged with the
//! [`Context`] that caused it.

pub mod consts;
mod context;
mod entity_id;
mod event;
mod service_call;
mod state;

pub use context::Context;
pub use entity_id::{slugify, EntityId, EntityIdError};
pub use event::{Event, EventData};
pub use service_call::ServiceCall;
pub use state::State;

/// Event payloads the hub itself fires
pub mod events {
    use serde::{Deserialize, Serialize};

    use crate::{EntityId, EventData, State};

    pub const STATE_CHANGED: &str = "state_changed";

    /// `old_state` is `None` for a new entity, `new_state` for a removed one
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct StateChangedData {
        pub entity_id: EntityId,
        pub old_state: Option<State>,
        pub new_state: Option<State>,
    }

    impl EventData for StateChangedData {
        const EVENT_TYPE: &'static str = STATE_CHANGED;
    }
}
