//! Payment command and query handlers.

mod create_payment;
mod expire_stale;
mod get_payment_status;
mod handle_gateway_callback;
mod retry_deferred;
mod sweep_unactivated;

pub use create_payment::{CreatePaymentCommand, CreatePaymentHandler, CreatePaymentResult};
pub use expire_stale::ExpireStalePaymentsHandler;
pub use get_payment_status::{GetPaymentStatusHandler, GetPaymentStatusQuery, PaymentStatusView};
pub use handle_gateway_callback::{HandleGatewayCallbackCommand, HandleGatewayCallbackHandler};
pub use retry_deferred::{RetryDeferredTasksHandler, RetrySummary};
pub use sweep_unactivated::{SweepSummary, SweepUnactivatedHandler};
