use log::{debug, info, warn};

use crate::config::{ConnectConfig, Device};
use crate::error::Error;
use crate::generic::connection::Connection;
use crate::generic::dialect::CommandSet;
use crate::generic::executor::Executor;

/// One authenticated shell to one device, opened lazily and re-opened when
/// the previous shell has died.
///
/// At most one live connection exists per `Session`. Dropping the session
/// closes it.
pub struct Session<C: Connection> {
    device: Device,
    config: ConnectConfig,
    commands: Box<dyn CommandSet>,
    connection: Option<C>,
}

impl<C: Connection> Session<C> {
    pub fn new(device: Device, config: ConnectConfig) -> Self {
        let commands = device.dialect().command_set();

        Self {
            device,
            config,
            commands,
            connection: None,
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn config(&self) -> &ConnectConfig {
        &self.config
    }

    pub fn commands(&self) -> &dyn CommandSet {
        self.commands.as_ref()
    }

    pub fn is_connected(&mut self) -> bool {
        self.connection.as_mut().is_some_and(|c| c.is_alive())
    }

    /// Opens the shell unless a live one already exists.
    ///
    /// Fails with [`Error::ConnectionTimeout`] or
    /// [`Error::AuthenticationFailure`]; neither is retried.
    pub fn connect(&mut self) -> Result<(), Error> {
        if self.is_connected() {
            return Ok(());
        }

        if self.connection.take().is_some() {
            debug!("Discarding dead session to {}", self.device.hostname());
        }

        info!("Connecting to {}...", self.device.hostname());
        let mut connection = C::connect(&self.device, &self.config).inspect_err(|e| {
            warn!("Connection to {} failed: {}", self.device.hostname(), e);
        })?;

        self.prepare(&mut connection)?;
        self.connection = Some(connection);
        info!("Connected to {}", self.device.hostname());

        Ok(())
    }

    /// Brings a fresh shell to the state commands expect: privileged mode
    /// and no paging.
    fn prepare(&self, connection: &mut C) -> Result<(), Error> {
        let prompt = self.commands.prompt();
        let banner = connection.read(prompt)?;

        if self.commands.requires_enable(&banner) {
            let command = self.commands.enable_command();
            let mut output = connection.execute(command, self.commands.enable_prompt())?;

            if self.commands.is_password_prompt(&output) {
                let password = self
                    .config
                    .enable_password
                    .as_deref()
                    .unwrap_or(self.device.password());
                output = connection.execute_secret(password, prompt)?;
            }

            if self.commands.requires_enable(&output) {
                return Err(Error::CommandExecution(command.to_string()));
            }
        }

        for command in self.commands.on_open_commands() {
            connection.execute(command, prompt)?;
        }

        Ok(())
    }

    /// Closes the shell if there is one. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };

        if !connection.is_alive() {
            debug!("Session to {} was already gone", self.device.hostname());
            return;
        }

        match connection.close() {
            Ok(()) => info!("Disconnected from {}", self.device.hostname()),
            Err(e) => warn!("Error while closing {}: {}", self.device.hostname(), e),
        }
    }

    /// Executor bound to the live shell, or [`Error::NotConnected`].
    pub fn executor(&mut self) -> Result<Executor<'_, C>, Error> {
        let Some(connection) = self.connection.as_mut() else {
            return Err(Error::NotConnected);
        };

        if !connection.is_alive() {
            return Err(Error::NotConnected);
        }

        Ok(Executor::new(connection, self.commands.as_ref()))
    }
}

impl<C: Connection> Drop for Session<C> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
