//! Verified configuration changes on managed network switches.
//!
//! A [`SwitchController`] owns one shell session to one switch. Reads parse
//! device state out of `show` output; writes apply a change, wait for the
//! device to settle, and report success only if a read-back shows the
//! requested state.
//!
//! ```no_run
//! use switch_control::{Dialect, PortStatus, SwitchController};
//!
//! let mut switch = SwitchController::new("10.0.0.2", "admin", "secret", Dialect::RuckusFastiron);
//! let mut session = switch.session()?;
//!
//! if session.get_port_status("1/1/1")? == Some(PortStatus::Disabled) {
//!     session.set_port_status("1/1/1", PortStatus::Enabled);
//! }
//! # Ok::<(), switch_control::Error>(())
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod generic;
pub mod inventory;
pub mod mutator;
pub mod parser;
pub mod state;
pub mod vendor;

pub use config::{ConnectConfig, Device};
pub use controller::{ScopedSession, SwitchController};
pub use error::Error;
pub use inventory::Inventory;
pub use state::{PoeStatus, PortStatus, PortSummary};
pub use vendor::Dialect;
