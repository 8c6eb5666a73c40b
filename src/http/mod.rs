//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, body buffering)
//!     → routing (loopback resolver decides terminal route)
//!     → proxy (tee duplicates, upstream forwarding)
//!     → response filters applied, inner route first
//!     → Send to client
//! ```

pub mod server;

pub use server::{AppState, HttpServer};
