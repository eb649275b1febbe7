//! Portfolio domain: server payloads and user-triggered writes.

pub mod payloads;
pub mod requests;

pub use payloads::Preferences;
pub use requests::{Action, Feedback, TradeOrder, ValidationError, WriteRequest};
