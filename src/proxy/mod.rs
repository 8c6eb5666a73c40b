//! Backend dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Resolution (terminal route + rewritten request)
//!     → transport.rs (build upstream request, send via hyper-util)
//!     → Response streamed back to the client
//!
//! Resolution.tees
//!     → tee.rs (detached task per duplicate, response discarded)
//! ```

pub mod tee;
pub mod transport;

pub use tee::{TeeDuplicator, TeeOutcome};
pub use transport::{build_upstream_request, HyperTransport, Transport, X_REQUEST_ID};
