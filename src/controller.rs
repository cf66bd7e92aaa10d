use std::fmt::Debug;
use std::ops::{Deref, DerefMut};

use log::{error, info};

use crate::config::{ConnectConfig, Device};
use crate::error::Error;
use crate::generic::connection::{Connection, SSHConnection};
use crate::generic::session::Session;
use crate::mutator::{Mutation, StateMutator};
use crate::state::{PoeStatus, PortStatus, PortSummary, VLAN_ID_RANGE};
use crate::vendor::Dialect;

/// All operations on one managed switch.
///
/// Reads return the parsed state, or `None` when the device output does not
/// show it; they fail only on transport errors. Writes return `true` only
/// when a read-back after the change shows the requested state.
///
/// Every operation connects on demand. Use [`SwitchController::session`] to
/// bound the connection's lifetime to a block.
pub struct SwitchController<C: Connection = SSHConnection> {
    session: Session<C>,
}

impl SwitchController<SSHConnection> {
    pub fn new(hostname: &str, username: &str, password: &str, dialect: Dialect) -> Self {
        Self::with_config(
            Device::new(hostname, username, password, dialect),
            ConnectConfig::default(),
        )
    }
}

impl<C: Connection> SwitchController<C> {
    pub fn with_config(device: Device, config: ConnectConfig) -> Self {
        Self {
            session: Session::new(device, config),
        }
    }

    pub fn device(&self) -> &Device {
        self.session.device()
    }

    pub fn connect(&mut self) -> Result<(), Error> {
        self.session.connect()
    }

    pub fn disconnect(&mut self) {
        self.session.disconnect();
    }

    pub fn is_connected(&mut self) -> bool {
        self.session.is_connected()
    }

    /// Connects and returns a guard that disconnects when dropped.
    pub fn session(&mut self) -> Result<ScopedSession<'_, C>, Error> {
        self.connect()?;

        Ok(ScopedSession { controller: self })
    }

    /// Runs one read-only command and parses its output.
    fn read<T>(
        &mut self,
        query: impl FnOnce(&Session<C>) -> String,
        parse: impl FnOnce(&Session<C>, &str) -> Option<T>,
    ) -> Result<Option<T>, Error> {
        self.connect()?;

        let command = query(&self.session);
        let output = self.session.executor()?.run(&command)?;

        Ok(parse(&self.session, &output))
    }

    pub fn get_port_status(&mut self, port: &str) -> Result<Option<PortStatus>, Error> {
        self.read(
            |s| s.commands().port_status_query(port),
            |s, output| s.commands().parse_port_status(output, port),
        )
    }

    pub fn get_vlan(&mut self, port: &str) -> Result<Option<u16>, Error> {
        self.read(
            |s| s.commands().vlan_query(port),
            |s, output| s.commands().parse_vlan(output, port),
        )
    }

    pub fn get_poe_status(&mut self, port: &str) -> Result<Option<PoeStatus>, Error> {
        self.read(
            |s| s.commands().poe_query(port),
            |s, output| s.commands().parse_poe_status(output, port),
        )
    }

    /// Status, VLAN and PoE state of `port` over a single connection.
    pub fn port_summary(&mut self, port: &str) -> Result<PortSummary, Error> {
        Ok(PortSummary {
            status: self.get_port_status(port)?,
            vlan: self.get_vlan(port)?,
            poe: self.get_poe_status(port)?,
        })
    }

    /// Moves `port` to `vlan` as an untagged member and saves the
    /// configuration.
    ///
    /// The port is first removed from the VLAN it is currently observed in,
    /// if any. A failure after removal can leave the port in neither VLAN.
    pub fn change_vlan(&mut self, port: &str, vlan: u16) -> bool {
        if !VLAN_ID_RANGE.contains(&vlan) {
            error!("Refusing to move port {} to invalid VLAN {}", port, vlan);
            return false;
        }

        self.mutate("change VLAN", port, |session| {
            let current = {
                let query = session.commands().vlan_query(port);
                let output = session.executor()?.run(&query)?;
                session.commands().parse_vlan(&output, port)
            };

            let commands = session.commands();
            Ok(Mutation {
                port,
                target: vlan,
                commands: commands.vlan_commands(port, current, vlan),
                persist: true,
                query: commands.vlan_query(port),
                read: |commands, output, port| commands.parse_vlan(output, port),
            })
        })
    }

    /// Administratively enables or disables `port` and saves the
    /// configuration.
    pub fn set_port_status(&mut self, port: &str, status: PortStatus) -> bool {
        self.mutate("set port status", port, |session| {
            let commands = session.commands();
            Ok(Mutation {
                port,
                target: status,
                commands: commands.port_status_commands(port, status),
                persist: true,
                query: commands.port_status_query(port),
                read: |commands, output, port| commands.parse_port_status(output, port),
            })
        })
    }

    /// Turns PoE on `port` on or off.
    ///
    /// Unlike the other writes this does not save the configuration, so the
    /// change does not survive a reload.
    pub fn set_poe_status(&mut self, port: &str, status: PoeStatus) -> bool {
        self.mutate("set PoE status", port, |session| {
            let commands = session.commands();
            Ok(Mutation {
                port,
                target: status,
                commands: commands.poe_commands(port, status),
                persist: false,
                query: commands.poe_query(port),
                read: |commands, output, port| commands.parse_poe_status(output, port),
            })
        })
    }

    /// Runs a verified change and collapses every failure into `false`.
    fn mutate<'p, T: PartialEq + Debug>(
        &mut self,
        action: &str,
        port: &'p str,
        plan: impl FnOnce(&mut Session<C>) -> Result<Mutation<'p, T>, Error>,
    ) -> bool {
        let config = self.session.config();
        let mut mutator = StateMutator::new(config.settle_interval, config.verify_attempts);

        let result = self.connect().and_then(|()| {
            let mutation = plan(&mut self.session)?;
            mutator.apply(&mut self.session.executor()?, mutation)
        });

        let hostname = self.device().hostname();
        match result {
            Ok(verification) if verification.is_confirmed() => {
                info!("{} on {} port {}: confirmed", action, hostname, port);
                true
            }
            Ok(_) => {
                error!("{} on {} port {}: change not confirmed", action, hostname, port);
                false
            }
            Err(e) if e.is_connect_failure() => {
                error!("{} on {} port {}: could not connect: {}", action, hostname, port, e);
                false
            }
            Err(e) => {
                error!(
                    "Failed to {} on {} port {} while {}: {}",
                    action,
                    hostname,
                    port,
                    mutator.phase(),
                    e
                );
                false
            }
        }
    }
}

/// A connected controller that disconnects when it goes out of scope,
/// however the scope is left.
pub struct ScopedSession<'c, C: Connection> {
    controller: &'c mut SwitchController<C>,
}

impl<C: Connection> Deref for ScopedSession<'_, C> {
    type Target = SwitchController<C>;

    fn deref(&self) -> &Self::Target {
        self.controller
    }
}

impl<C: Connection> DerefMut for ScopedSession<'_, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.controller
    }
}

impl<C: Connection> Drop for ScopedSession<'_, C> {
    fn drop(&mut self) {
        self.controller.disconnect();
    }
}
