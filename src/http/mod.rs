//! HTTP protocol implementation.
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`buffer`**: Growable byte buffer used while reading the request head
//! - **`parser`**: Reads one request off a byte stream
//! - **`request`**: HTTP request representation
//! - **`headers`**: Ordered header map with normalized names
//! - **`response`**: Mutable response, and the builder that creates and finalizes it
//! - **`writer`**: Serializes a response onto the socket
//! - **`connection`**: Per-connection state machine
//! - **`error`**: Errors carrying an HTTP status
//! - **`status`**, **`mime`**: Status and content type tables
//!
//! # Connection State Machine
//!
//! Each client connection serves exactly one request:
//!
//! ```text
//!        ┌─────────────────┐
//!        │      Idle       │ ← Keep-alive off, fresh response built
//!        └──────┬──────────┘
//!               ▼
//!        ┌─────────────────┐   parse error
//!        │ ReadingRequest  │ ─────────────┐
//!        └──────┬──────────┘              │
//!               │ Request parsed          │
//!               ▼                         ▼
//!        ┌─────────────────┐  error  ┌─────────┐
//!        │   Dispatching   │ ──────→ │ Errored │
//!        └──────┬──────────┘         └────┬────┘
//!               ▼                         │
//!        ┌─────────────────┐              │
//!        │ WritingResponse │ ←────────────┘
//!        └──────┬──────────┘
//!               ▼
//!            Closed         (end of stream while reading goes here directly)
//! ```

pub mod buffer;
pub mod connection;
pub mod error;
pub mod headers;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod status;
pub mod writer;
