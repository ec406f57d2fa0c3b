use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Context;

/// What a service handler receives, e.g. `media_player.select_source`
/// with `{"entity_id": ..., "source": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub service_data: Value,
    pub context: Context,
}

impl ServiceCall {
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        service_data: Value,
        context: Context,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            service_data,
            context,
        }
    }

    /// `domain.service`
    pub fn service_id(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_service_id() {
        let call = ServiceCall::new(
            "media_player",
            "volume_set",
            json!({"entity_id": "media_player.tv", "volume_level": 0.5}),
            Context::new(),
        );
        assert_eq!(call.service_id(), "media_player.volume_set");
        assert_eq!(call.service_data["volume_level"], json!(0.5));
    }
}
