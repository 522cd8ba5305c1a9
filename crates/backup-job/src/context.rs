//! Context for the current backup
//!

use core::fmt;

use crate::BackupRequest;

/// Context for the current backup. Used for prefixing logs.
#[derive(Debug, Clone)]
pub struct Context {
    /// The application being backed up.
    pub app_name: String,

    /// The database being backed up.
    pub database_name: String,
}

impl From<&BackupRequest> for Context {
    fn from(request: &BackupRequest) -> Self {
        Self {
            app_name: request.app_name.clone(),
            database_name: request.database_name.clone(),
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] ", self.app_name, self.database_name)
    }
}
