pub mod webhook;

pub use webhook::{create_router, WebhookResponse, WebhookServer, WebhookState};
