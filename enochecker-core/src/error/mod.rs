//! Error handling for the checker harness
//!
//! Every failure inside the harness is an [`EnoError`]. Two variants are
//! signals rather than faults:
//!
//! - **Offline**: the remote service could not be reached, the session broke,
//!   or an I/O deadline passed. Scoreboard-visible.
//! - **Mumble**: the service answered but violated the expected protocol or
//!   semantics. Scoreboard-visible.
//!
//! Everything else (configuration, validation, I/O on the harness side, HTTP
//! client failures, bugs) is internal. The dispatcher maps internal errors to
//! `INTERNAL_ERROR` and never forwards their text to the scoreboard.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                  Harness Error Taxonomy               │
//! ├───────────────────────────────────────────────────────┤
//! │  Service Signals       │  Harness Faults              │
//! │  ┌─────────────────┐   │  ┌────────────────────────┐  │
//! │  │ • Offline       │   │  │ • Configuration        │  │
//! │  │ • Mumble        │   │  │ • Validation           │  │
//! │  └─────────────────┘   │  │ • CheckerNotFound      │  │
//! │                        │  │ • Io / Json / Http     │  │
//! │                        │  │ • Internal             │  │
//! │                        │  └────────────────────────┘  │
//! └───────────────────────────────────────────────────────┘
//! ```

pub mod types;
pub mod constructors;
pub mod conversions;


pub use types::{EnoError, EnoResult};
