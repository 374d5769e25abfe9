//! Posting metrics to the BoxCast collector

use std::sync::Arc;
use std::thread;

use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::{Metric, MetricSink, PlatformInfo};
use crate::client::build_request;
use crate::config::ClientConfig;
use crate::dispatch::CallbackQueue;
use crate::error::BoxCastError;
use crate::http::{Method, Transport};
use crate::models::{Broadcast, BroadcastView};

/// Posts metrics for one playback session to the collector.
///
/// Posting is fire-and-forget: each metric goes out on its own thread and a
/// failure is only logged, from the callback queue.
pub struct MetricsConsumer {
    transport: Arc<dyn Transport>,
    endpoint: String,
    broadcast: Broadcast,
    is_live: bool,
    view_id: String,
    viewer_id: String,
    platform: PlatformInfo,
    callbacks: CallbackQueue,
}

impl MetricsConsumer {
    pub fn new(
        broadcast: Broadcast,
        view: &BroadcastView,
        transport: Arc<dyn Transport>,
        config: &ClientConfig,
        viewer_id: String,
        callbacks: CallbackQueue,
    ) -> Self {
        Self {
            transport,
            endpoint: format!("{}/player/interaction", config.metrics_url.trim_end_matches('/')),
            broadcast,
            is_live: view.is_live(),
            view_id: Uuid::new_v4().to_string(),
            viewer_id,
            platform: PlatformInfo::from_config(config),
            callbacks,
        }
    }

    pub fn view_id(&self) -> &str {
        &self.view_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The full request body for `metric`, or `None` when the broadcast has
    /// no account id (it was not fetched in detail).
    pub fn payload(&self, metric: &Metric) -> Option<Map<String, Value>> {
        let account_id = self.broadcast.account_id.as_ref()?;

        let mut params = Map::new();
        params.insert("is_live".to_string(), json!(self.is_live));
        params.insert("account_id".to_string(), json!(account_id));
        params.insert("broadcast_id".to_string(), json!(self.broadcast.id));
        params.insert("channel_id".to_string(), json!(self.broadcast.channel_id));
        params.insert("view_id".to_string(), json!(self.view_id));
        params.insert("viewer_id".to_string(), json!(self.viewer_id));
        params.extend(metric.to_params(&self.platform));
        Some(params)
    }
}

/// Send one metric body to the collector.
pub(crate) fn post_metric(
    transport: &dyn Transport,
    endpoint: &str,
    payload: &Map<String, Value>,
) -> Result<(), BoxCastError> {
    let request = build_request(endpoint, Method::Post, Some(payload), &[])?;
    let response = transport.execute(&request)?;
    if !response.is_success() {
        return Err(BoxCastError::from_response_body(&response.body));
    }
    Ok(())
}

impl MetricSink for MetricsConsumer {
    fn consume(&self, metric: Metric) {
        let Some(payload) = self.payload(&metric) else {
            tracing::warn!(
                broadcast_id = %self.broadcast.id,
                "no account id, broadcast was not detailed; dropping metric"
            );
            return;
        };

        let transport = Arc::clone(&self.transport);
        let endpoint = self.endpoint.clone();
        let callbacks = self.callbacks.clone();
        let action = metric.action.name();

        thread::spawn(move || {
            let result = post_metric(transport.as_ref(), &endpoint, &payload);
            callbacks.dispatch(move || {
                if let Err(e) = result {
                    tracing::warn!(action, error = %e, "error posting metric");
                }
            });
        });
    }
}
