//! `tenantchat-channels` — channel rows and provider-owned messages.

pub mod channel;
pub mod message;

pub use channel::{CHANNEL_TYPE, Channel, NewChannel};
pub use message::{Message, NewMessage};
