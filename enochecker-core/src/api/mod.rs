//! HTTP surface of a checker
//!
//! ```text
//!  scheduler ──POST / (TaskMessage)──▶ rest::checker::submit_task
//!                                         │ TaskDescription::try_from   (400 on failure)
//!                                         ▼
//!                                     TaskDispatcher::execute ──▶ Checker
//!  scheduler ◀──200 (ResultMessage)───────┘
//! ```

pub mod rest;
pub mod schemas;
pub mod server;

pub use rest::{create_api_router, handle_eno_error, AppState};
pub use schemas::ErrorResponse;
pub use server::CheckerServer;
