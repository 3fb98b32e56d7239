//! Checker execution harness for attack/defense CTF scoring
//!
//! A scheduler posts task descriptions to a checker service; the service
//! dispatches each task to one of five lifecycle operations of a
//! [`Checker`](checker::Checker) and answers with a result code.
//!
//! ```text
//! POST / ─▶ TaskDescription ─▶ TaskDispatcher::execute ─▶ Checker::<op>(task, ctx)
//!                                      │                        │
//!                                      │                 PipelinedConnection ─▶ team service
//!                                      ▼
//!                              result_mapper ─▶ ResultMessage
//! ```

pub mod api;
pub mod checker;
pub mod checkers;
pub mod client;
pub mod config;
pub mod connection;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod observability;
pub mod registry;
pub mod result_mapper;
pub mod types;

pub use checker::{Checker, CheckerOutcome};
pub use context::TaskContext;
pub use dispatcher::TaskDispatcher;
pub use error::{EnoError, EnoResult};
