use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use log::debug;

use crate::controller::{ScopedSession, SwitchController};
use crate::error::Error;
use crate::generic::connection::{Connection, SSHConnection};

/// Named switches, each usable by one caller at a time.
///
/// Work on different switches can proceed in parallel from different
/// threads; work on the same switch is serialised by that switch's lock.
pub struct Inventory<C: Connection = SSHConnection> {
    switches: BTreeMap<String, Mutex<SwitchController<C>>>,
}

impl<C: Connection> Default for Inventory<C> {
    fn default() -> Self {
        Self {
            switches: BTreeMap::new(),
        }
    }
}

impl<C: Connection> Inventory<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the switch known as `name`.
    pub fn insert(&mut self, name: &str, controller: SwitchController<C>) {
        self.switches.insert(name.to_string(), Mutex::new(controller));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.switches.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.switches.contains_key(name)
    }

    /// Locks the switch `name`, connects, and runs `f` against it.
    ///
    /// The session is closed again before the lock is released.
    pub fn with_switch<R>(
        &self,
        name: &str,
        f: impl FnOnce(&mut ScopedSession<'_, C>) -> R,
    ) -> Result<R, Error> {
        let switch = self
            .switches
            .get(name)
            .ok_or_else(|| Error::UnknownSwitch(name.to_string()))?;

        // A panic in an earlier caller leaves the controller itself intact.
        let mut controller = switch.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("Acquired switch {}", name);

        let mut session = controller.session()?;

        Ok(f(&mut session))
    }
}
