use core::fmt::Display;

use tracing::error;

/// Log an error with some context, then panic with the same message.
pub fn log_and_panic<Err: Display>(error: Err, message: &str) -> ! {
    error!("{message}: {error}");

    panic!("{message}: {error}");
}

/// Extension trait for results that the program cannot continue without.
pub trait Failure<T> {
    /// Log an error and panic.
    fn or_log_and_panic(self, message: &str) -> T;
}

impl<T, E: Display> Failure<T> for Result<T, E> {
    fn or_log_and_panic(self, message: &str) -> T {
        match self {
            Ok(value) => value,
            Err(error) => log_and_panic(error, message),
        }
    }
}
