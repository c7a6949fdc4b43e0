pub mod config;
pub mod domain {
    pub mod event;
    pub mod payment;
}
pub mod error;
pub mod gateways;
pub mod http {
    pub mod handlers {
        pub mod gateways;
        pub mod payments;
        pub mod webhooks;
    }
}
pub mod webhooks {
    pub mod dedup;
    pub mod pipeline;
    pub mod sink;
}

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<gateways::registry::GatewayRegistry>,
    pub pipeline: webhooks::pipeline::WebhookPipeline,
}
