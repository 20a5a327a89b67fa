//! Bounce relay: routes inbound mail to known mailboxes and bounces the rest.

pub mod config;
pub mod delivery;
pub mod directory;
pub mod email;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod storage;
