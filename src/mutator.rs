//! Apply a configuration change, then prove it took effect.
//!
//! A change walks `Idle -> Applying -> AwaitingSettle -> Verifying` and ends
//! in `Confirmed` or `Unconfirmed`. What the device prints in response to
//! the configuration lines is ignored; only a later read-back decides.

use std::fmt::Debug;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use strum::Display;

use crate::error::Error;
use crate::generic::connection::Connection;
use crate::generic::dialect::CommandSet;
use crate::generic::executor::Executor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    Idle,
    Applying,
    AwaitingSettle,
    Verifying,
    Confirmed,
    Unconfirmed,
}

/// Extracts the observed value from a read-back.
pub type Reader<T> = fn(commands: &dyn CommandSet, output: &str, port: &str) -> Option<T>;

/// One intended change on one port.
pub struct Mutation<'p, T> {
    pub port: &'p str,
    pub target: T,

    /// Configuration lines, in the order they must be sent.
    pub commands: Vec<String>,

    /// Whether to write the configuration to non-volatile storage as part
    /// of the change.
    pub persist: bool,

    /// Read-only query whose output reflects the changed state.
    pub query: String,

    pub read: Reader<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification<T> {
    Confirmed,
    Unconfirmed { observed: Option<T> },
}

impl<T> Verification<T> {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Verification::Confirmed)
    }
}

pub struct StateMutator {
    settle_interval: Duration,
    verify_attempts: u32,
    phase: Phase,
}

impl StateMutator {
    pub fn new(settle_interval: Duration, verify_attempts: u32) -> Self {
        Self {
            settle_interval,
            verify_attempts: verify_attempts.max(1),
            phase: Phase::Idle,
        }
    }

    /// Phase reached by the last call to [`StateMutator::apply`].
    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        debug!("Mutation phase {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    /// Runs `mutation` to completion.
    ///
    /// Transport errors abort the run and are returned; the phase then shows
    /// how far the change got. A partially applied change is not rolled
    /// back.
    pub fn apply<C, T>(
        &mut self,
        executor: &mut Executor<'_, C>,
        mutation: Mutation<'_, T>,
    ) -> Result<Verification<T>, Error>
    where
        C: Connection,
        T: PartialEq + Debug,
    {
        self.phase = Phase::Idle;
        let commands = executor.commands();

        self.enter(Phase::Applying);
        let mut lines = mutation.commands;
        if mutation.persist {
            lines.extend(commands.persist_commands());
        }
        executor.run_batch(lines.as_slice())?;

        let mut observed = None;

        for attempt in 1..=self.verify_attempts {
            self.enter(Phase::AwaitingSettle);
            if !self.settle_interval.is_zero() {
                thread::sleep(self.settle_interval);
            }

            self.enter(Phase::Verifying);
            let output = executor.run(&mutation.query)?;
            observed = (mutation.read)(commands, &output, mutation.port);

            if observed.as_ref() == Some(&mutation.target) {
                info!("Port {} confirmed at {:?}", mutation.port, mutation.target);
                self.enter(Phase::Confirmed);
                return Ok(Verification::Confirmed);
            }

            debug!(
                "Verification {}/{} on port {}: wanted {:?}, saw {:?}",
                attempt, self.verify_attempts, mutation.port, mutation.target, observed
            );
        }

        warn!(
            "Change on port {} not confirmed: wanted {:?}, saw {:?}",
            mutation.port, mutation.target, observed
        );
        self.enter(Phase::Unconfirmed);

        Ok(Verification::Unconfirmed { observed })
    }
}
