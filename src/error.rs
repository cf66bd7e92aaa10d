use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),

    #[error("Connection to {host} timed out after {timeout:?}")]
    ConnectionTimeout { host: String, timeout: Duration },

    #[error("Authentication failed for user {user}")]
    AuthenticationFailure { user: String },

    #[error("Not connected to switch")]
    NotConnected,

    #[error("No socket address could be resolved for {0}")]
    NoAddress(String),

    #[error("Failed to execute command: {0}")]
    CommandExecution(String),

    #[error("Failed to enter configuration mode")]
    EnterConfigMode,

    #[error("Switch '{0}' not found")]
    UnknownSwitch(String),
}

impl Error {
    /// Whether the error was raised while opening the session, as opposed to
    /// while talking over an already established one.
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            Error::ConnectionTimeout { .. } | Error::AuthenticationFailure { .. } | Error::NoAddress(_)
        )
    }
}
