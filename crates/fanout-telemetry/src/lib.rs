#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Telemetry primitives shared across the fanout workspace.
//!
//! The emitter crates only depend on `tracing`; this crate installs the
//! subscriber for binaries and captures formatted output for tests.

pub mod capture;
pub mod error;
pub mod init;

pub use capture::{CapturedLogs, capture_logs, capture_logs_at};
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
