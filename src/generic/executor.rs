use log::{debug, warn};

use crate::error::Error;
use crate::generic::config::{ConfigSession, ConfigurationMode};
use crate::generic::connection::Connection;
use crate::generic::dialect::CommandSet;

/// Runs commands one at a time over a live shell.
///
/// Holding the executor borrows the shell mutably, so commands from two
/// callers can never interleave on the same session.
pub struct Executor<'a, C: Connection> {
    connection: &'a mut C,
    commands: &'a dyn CommandSet,
}

impl<'a, C: Connection> Executor<'a, C> {
    pub(crate) fn new(connection: &'a mut C, commands: &'a dyn CommandSet) -> Self {
        Self {
            connection,
            commands,
        }
    }

    pub fn commands(&self) -> &'a dyn CommandSet {
        self.commands
    }

    /// Runs one command and returns its output without the echoed command
    /// line.
    pub fn run(&mut self, command: &str) -> Result<String, Error> {
        debug!("Executing command: {}", command);
        let output = self.connection.execute(command, self.commands.prompt())?;

        let output = output
            .strip_prefix(&format!("{}\r\n", command))
            .or_else(|| output.strip_prefix(&format!("{}\n", command)))
            .unwrap_or(&output)
            .to_string();

        Ok(output)
    }

    /// Runs `commands` in order inside configuration mode and returns the
    /// concatenated responses.
    ///
    /// Responses are not authoritative: lines the device rejects are logged,
    /// not raised. Configuration mode is left on every path.
    pub fn run_batch<S: AsRef<str>>(&mut self, commands: &[S]) -> Result<String, Error> {
        let markers = self.commands().failure_markers();
        let mut config = self.enter_config()?;
        let mut output = String::new();

        for command in commands {
            let command = command.as_ref();
            let response = config.execute(command)?;

            if markers.iter().any(|marker| response.contains(marker)) {
                warn!("Device rejected '{}': {}", command, response.trim());
            }

            output.push_str(&response);
        }

        Ok(output)
    }

    pub fn enter_config(&mut self) -> Result<ConfigurationMode<'_, 'a, C>, Error> {
        let commands = self.commands();
        let output = self.run(commands.enter_config_command())?;

        let markers = commands.failure_markers();
        if markers.iter().any(|marker| output.contains(marker)) {
            return Err(Error::EnterConfigMode);
        }

        Ok(ConfigurationMode::new(self))
    }

    pub(crate) fn exit_config(&mut self) -> Result<(), Error> {
        let commands = self.commands();
        self.run(commands.exit_config_command())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConnectConfig, Device};
    use crate::error::Error;
    use crate::generic::session::Session;
    use crate::tests::sim::SimulatedSwitch;
    use crate::vendor::Dialect;

    fn connected() -> anyhow::Result<Session<SimulatedSwitch>> {
        let device = Device::new("sw1", "admin", "password", Dialect::RuckusFastiron);
        let mut session = Session::new(device, ConnectConfig::default());
        session.connect()?;
        Ok(session)
    }

    #[test]
    fn test_run_strips_echo() -> anyhow::Result<()> {
        crate::tests::init_logger();
        let _sim = SimulatedSwitch::install();

        let mut session = connected()?;
        let output = session.executor()?.run("show version")?;

        assert!(output.starts_with("Copyright"), "{}", output);

        Ok(())
    }

    #[test]
    fn test_batch_keeps_order_and_leaves_config() -> anyhow::Result<()> {
        let sim = SimulatedSwitch::install();

        let mut session = connected()?;
        session
            .executor()?
            .run_batch(&["interface ethernet 1/1/1", "disable", "exit"])?;

        let state = sim.lock().unwrap();
        assert_eq!(
            state.commands[1..],
            [
                "configure terminal",
                "interface ethernet 1/1/1",
                "disable",
                "exit",
                "end"
            ]
        );
        assert!(!state.ports["1/1/1"].enabled);

        Ok(())
    }

    #[test]
    fn test_batch_leaves_config_on_error() -> anyhow::Result<()> {
        let sim = SimulatedSwitch::install();

        let mut session = connected()?;
        sim.lock().unwrap().fail_on = Some("disable".to_string());

        let result = session
            .executor()?
            .run_batch(&["interface ethernet 1/1/1", "disable", "exit"]);
        assert!(matches!(result, Err(Error::Io(_))), "{:?}", result);

        let state = sim.lock().unwrap();
        assert_eq!(state.commands.last().map(String::as_str), Some("end"));

        Ok(())
    }

    #[test]
    fn test_batch_rejected_line_is_not_an_error() -> anyhow::Result<()> {
        let _sim = SimulatedSwitch::install();

        let mut session = connected()?;
        let output = session.executor()?.run_batch(&["frobnicate"])?;

        assert!(output.contains("Invalid input"), "{}", output);

        Ok(())
    }
}
