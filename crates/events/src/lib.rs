//! Cosign Events - vault audit records
//!
//! Every committed vault operation publishes one `VaultEvent` to an `EventSink`.
//! The JSONL journal (`EventStore` / `EventReader`) is the durable sink; it is
//! an audit trail only and is never read back to drive vault logic.

pub mod error;
pub mod event;
pub mod reader;
pub mod sink;
pub mod store;

pub use error::EventError;
pub use event::{EventKind, VaultEvent};
pub use reader::EventReader;
pub use sink::{EventSink, JournalSink, MemorySink, NullSink};
pub use store::EventStore;
