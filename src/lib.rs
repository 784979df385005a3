#![forbid(unsafe_code)]

//! `folder-courier` — periodic folder polling with webhook forwarding.
//!
//! A background scheduling engine drives the whole crate: a delay-aware
//! in-memory [`scheduler::TaskQueue`], a single crash-isolated worker loop,
//! and a bounded-parallelism [`poller::FolderPollExecutor`] that transmits
//! each discovered file to the folder's configured webhook and then deletes
//! or moves it per policy.

pub mod config;
pub mod errors;
pub mod fsops;
pub mod poller;
pub mod registry;
pub mod scheduler;
pub mod webhook;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
