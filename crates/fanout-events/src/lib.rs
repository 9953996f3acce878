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
#![allow(
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::redundant_pub_crate
)]

//! In-process, synchronous named-event emitter.
//!
//! Listeners register under an event name and run in registration order when
//! that name is emitted. Dispatch works on a snapshot of the listener set, so
//! listeners may add, remove or emit re-entrantly with deterministic results.
//!
//! Layout: `listener.rs` (handles, once-wrapper), `registry.rs` (per-event
//! sets), `emitter.rs` (registration + dispatch), `leak.rs` (listener-limit
//! diagnostics), `config.rs` (limits and options), `payloads.rs` (arguments
//! and reserved event names).
//!
//! ```
//! use fanout_events::{Emitter, EmitterResult, Listener, args};
//!
//! fn main() -> EmitterResult<()> {
//!     let emitter = Emitter::new();
//!     emitter.on("greet", Listener::new(|_, args| {
//!         assert_eq!(args[0].as_str(), Some("world"));
//!         Ok(())
//!     }))?;
//!
//!     assert!(emitter.emit("greet", &args!["world"])?);
//!     assert!(!emitter.emit("unheard", &[])?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod emitter;
pub mod error;
pub mod leak;
pub mod listener;
pub mod payloads;
mod registry;

pub use config::{
    DEFAULT_MAX_LISTENERS, EmitterOptions, UNLIMITED, default_max_listeners, parse_max_listeners,
    set_default_max_listeners,
};
pub use emitter::{Emitter, ErrorHook, LeakHook, listener_count};
pub use error::{BoxError, EmitterError, EmitterResult, SignalError};
pub use leak::LeakWarning;
pub use listener::Listener;
pub use payloads::{Arg, ERROR_EVENT, NEW_LISTENER_EVENT, REMOVE_LISTENER_EVENT};
