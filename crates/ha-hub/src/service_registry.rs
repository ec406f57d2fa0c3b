//! Async service handlers addressed by `domain.service`

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;
use ha_core::{Context, ServiceCall};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Optional response payload of a handler
pub type ServiceResult = Result<Option<Value>, ServiceError>;

pub type ServiceFuture = Pin<Box<dyn Future<Output = ServiceResult> + Send>>;

pub type ServiceHandler = Arc<dyn Fn(ServiceCall) -> ServiceFuture + Send + Sync>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("service not found: {domain}.{service}")]
    NotFound { domain: String, service: String },

    #[error("service call failed: {0}")]
    CallFailed(String),

    #[error("invalid service data: {0}")]
    InvalidData(String),
}

#[derive(Default)]
pub struct ServiceRegistry {
    handlers: DashMap<(String, String), ServiceHandler>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler`, replacing any previous one for the same service
    pub fn register<F, Fut>(&self, domain: impl Into<String>, service: impl Into<String>, handler: F)
    where
        F: Fn(ServiceCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ServiceResult> + Send + 'static,
    {
        let key = (domain.into(), service.into());
        debug!(domain = %key.0, service = %key.1, "Registering service");
        let handler: ServiceHandler = Arc::new(move |call| Box::pin(handler(call)) as ServiceFuture);
        self.handlers.insert(key, handler);
    }

    /// Run the handler to completion; its error, if any, is returned as is
    #[instrument(skip(self, service_data, context))]
    pub async fn call(
        &self,
        domain: &str,
        service: &str,
        service_data: Value,
        context: Context,
    ) -> ServiceResult {
        // Clone out of the map so no shard lock is held across the await
        let handler = self
            .handlers
            .get(&(domain.to_string(), service.to_string()))
            .map(|h| Arc::clone(h.value()));

        let Some(handler) = handler else {
            warn!("No such service");
            return Err(ServiceError::NotFound {
                domain: domain.to_string(),
                service: service.to_string(),
            });
        };
        handler(ServiceCall::new(domain, service, service_data, context)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_handler_receives_call() {
        let registry = ServiceRegistry::new();
        registry.register("media_player", "select_source", |call: ServiceCall| async move {
            Ok(Some(json!({ "called": call.service_id(), "data": call.service_data })))
        });

        let result = registry
            .call("media_player", "select_source", json!({"source": "HDMI1"}), Context::new())
            .await;
        assert_eq!(
            tokio_test::assert_ok!(result),
            Some(json!({"called": "media_player.select_source", "data": {"source": "HDMI1"}}))
        );
    }

    #[tokio::test]
    async fn test_unknown_service() {
        let registry = ServiceRegistry::new();
        registry.register("media_player", "turn_on", |_: ServiceCall| async { Ok(None) });

        let result = registry
            .call("media_player", "select_source", json!({}), Context::new())
            .await;
        assert_eq!(
            result,
            Err(ServiceError::NotFound {
                domain: "media_player".to_string(),
                service: "select_source".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_handler_error_is_returned() {
        let registry = ServiceRegistry::new();
        registry.register("switch", "turn_on", |_: ServiceCall| async {
            Err(ServiceError::CallFailed("relay stuck".to_string()))
        });

        let err = tokio_test::assert_err!(
            registry.call("switch", "turn_on", json!({}), Context::new()).await
        );
        assert_eq!(err.to_string(), "service call failed: relay stuck");
    }

    #[tokio::test]
    async fn test_register_replaces() {
        let registry = ServiceRegistry::new();
        registry.register("switch", "turn_on", |_: ServiceCall| async { Ok(Some(json!(1))) });
        registry.register("switch", "turn_on", |_: ServiceCall| async { Ok(Some(json!(2))) });

        let result = registry.call("switch", "turn_on", json!({}), Context::new()).await;
        assert_eq!(result, Ok(Some(json!(2))));
    }
}
