//! Checkout

pub mod config;
pub mod coordinator;
pub mod errors;
pub mod events;
pub mod retry;
pub mod service;

pub use config::CheckoutConfig;
pub use coordinator::{CheckoutCoordinator, CheckoutStage};
pub use errors::CheckoutError;
pub use events::{
    ChannelEventSink, EventSink, EventSinkError, LogEventSink, MockEventSink, ORDER_CREATED,
    OutboundEvent,
};
pub use retry::RetryConfig;
pub use service::*;
