//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - Durable repositories
//! - `memory` - In-process repositories for tests and local development
//! - `gateway` - Hosted payment gateway and offline stand-in
//! - `events` - Event publishers
//! - `http` - Axum REST endpoints

pub mod events;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod postgres;

pub use events::{InMemoryEventBus, TracingEventPublisher};
pub use gateway::{HostedGateway, HostedGatewayConfig, OfflineGateway};
