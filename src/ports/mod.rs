//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Payment Ports
//!
//! - `PaymentIntentRepository` - Intent store with the terminal CAS
//! - `PaymentGateway` - Redirect building and callback verification
//!
//! ## Entitlement Ports
//!
//! - `SubscriptionRepository`, `BoostRepository`, `ListingCreditRepository`
//! - `InvoiceRepository`, `ReferralRepository`
//! - `DeferredTaskRepository` - Retry queue for failed side effects
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Fire-and-forget domain event delivery

mod boost_repository;
mod deferred_task_repository;
mod event_publisher;
mod invoice_repository;
mod listing_credit_repository;
mod payment_gateway;
mod payment_intent_repository;
mod referral_repository;
mod save_result;
mod subscription_repository;

pub use boost_repository::BoostRepository;
pub use deferred_task_repository::DeferredTaskRepository;
pub use event_publisher::EventPublisher;
pub use invoice_repository::InvoiceRepository;
pub use listing_credit_repository::ListingCreditRepository;
pub use payment_gateway::{CallbackPayload, PaymentGateway, ReturnUrls};
pub use payment_intent_repository::{PaymentIntentRepository, TransitionOutcome};
pub use referral_repository::ReferralRepository;
pub use save_result::SaveResult;
pub use subscription_repository::SubscriptionRepository;
