//! Recipient pipeline.
//!
//! Every inbound message flows through:
//! 1. `Receipt::from_event()`: decode the receipt notification
//! 2. `BlobStore::fetch()` + `EmailParser::parse()`: load the message
//! 3. `classify()`: one directory lookup per recipient
//! 4. `DeliveryOrchestrator::process()`: local delivery, then at most one
//!    bounce for the unknown recipients
//!
//! **A directory failure aborts the invocation.** A delivery or bounce
//! failure is recorded and never hides the others.

pub mod bounce;
pub mod classifier;
pub mod event;
pub mod handler;
pub mod orchestrator;
pub mod types;

pub use bounce::{BounceComposer, BounceTemplateData, RecipientBuckets};
pub use classifier::classify;
pub use event::{Receipt, ReceiptAction};
pub use handler::{InvocationHandler, InvocationStatus};
pub use orchestrator::DeliveryOrchestrator;
pub use types::{BounceOutcome, ClassificationResult, DeliveryReport, InvocationState, RecipientFailure};
