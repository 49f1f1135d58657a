//! Payment provider adapters
pub mod vnpay;

pub use vnpay::{build_payment_url, verify_callback, CallbackOutcome, PaymentError, PaymentOrder, VnPayConfig};
