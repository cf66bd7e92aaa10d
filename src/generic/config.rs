use log::warn;

use crate::error::Error;
use crate::generic::connection::Connection;
use crate::generic::executor::Executor;

pub trait ConfigSession {
    fn execute(&mut self, command: &str) -> Result<String, Error>;
}

/// Configuration context on the device, left again when dropped.
pub struct ConfigurationMode<'e, 'a, C: Connection> {
    executor: &'e mut Executor<'a, C>,
}

impl<'e, 'a, C: Connection> ConfigurationMode<'e, 'a, C> {
    pub(crate) fn new(executor: &'e mut Executor<'a, C>) -> Self {
        ConfigurationMode { executor }
    }
}

impl<C: Connection> ConfigSession for ConfigurationMode<'_, '_, C> {
    fn execute(&mut self, command: &str) -> Result<String, Error> {
        self.executor.run(command)
    }
}

impl<C: Connection> Drop for ConfigurationMode<'_, '_, C> {
    fn drop(&mut self) {
        if let Err(e) = self.executor.exit_config() {
            warn!("Failed to leave configuration mode: {}", e);
        }
    }
}
