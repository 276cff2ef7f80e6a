//! Development helpers.
//!
//! - [`logging::install_tracing`] - console subscriber for the reconciler's `tracing` events
//! - [`logging::install_panic_logger`] - panic hook that reports through `tracing`

pub mod logging;
