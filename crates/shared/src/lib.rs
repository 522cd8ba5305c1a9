//! # Shared
//! The shared components between the backup job and the notification clients.
//!

#![warn(missing_docs)]

mod failure;
mod logger;

pub use failure::{Failure, log_and_panic};
pub use logger::{LoggerError, init_logger};
