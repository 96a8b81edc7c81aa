//! Kassaflow - payment gateway webhook verification and reconciliation
//!
//! Kassaflow authenticates asynchronous payment-status notifications from
//! third-party payment gateways, each with its own signing scheme and field
//! layout, and reconciles them against locally held payment records.
//!
//! # Pipeline
//!
//! An inbound notification is matched to a gateway by shape, then driven
//! through a fixed verification sequence: attempt rate limit, schema
//! validation, signature check, merchant check, payment lookup, amount
//! check, status translation, persistence. The first failing step aborts
//! with a typed error; nothing is persisted on failure.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use kassaflow::{AppState, ConfigBuilder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigBuilder::new().from_env().build()?;
//!     kassaflow::init_tracing_with_config(&config);
//!
//!     let addr = config.server.addr()?;
//!     let state = AppState::new(config);
//!
//!     let listener = tokio::net::TcpListener::bind(addr).await?;
//!     axum::serve(listener, kassaflow::http::router(state)).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
pub mod gateway;
pub mod http;
pub mod payment;
pub mod pipeline;
pub mod ratelimit;
pub mod store;
pub mod validation;

// Re-exports for public API
pub use config::{Config, ConfigBuilder, GatewayConfig, GatewaysConfig, LoggingConfig, ServerConfig};
pub use error::{KassaflowError, Result};
pub use gateway::{detect, Gateway, GatewayKind, Notification};
pub use http::{router, AppState};
pub use payment::{Currency, Payment, PaymentStatus};
pub use pipeline::{Ack, Processor};
pub use ratelimit::{AttemptLimiter, GovernorAttemptLimiter};
pub use store::{InMemoryPaymentStore, PaymentStore};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging from a loaded configuration.
///
/// Call this early, typically in main() right after building the config.
/// The log level and JSON toggle come from the `logging` section, which
/// `ConfigBuilder::from_env` fills from `KASSAFLOW_LOG_LEVEL` and
/// `KASSAFLOW_LOG_JSON`.
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
