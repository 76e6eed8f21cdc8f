//! ui
//!
//! User-facing output utilities.
//!
//! # Modules
//!
//! - [`output`] - Verbosity and message formatting
//!
//! # Design
//!
//! Human-readable messages go through this module so that `--quiet` is
//! honoured in one place. Machine-readable envelopes bypass it.

pub mod output;
