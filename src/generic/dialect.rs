use regex::Regex;

use crate::state::{PoeStatus, PortStatus};

/// Command syntax and output layouts of one device family.
///
/// The session, executor and mutator only talk to a device through this
/// trait, so a new family is added by implementing it in `vendor/` and
/// registering it on [`crate::vendor::Dialect`].
pub trait CommandSet: Send + Sync {
    /// Matches the end of any shell prompt, privileged or not.
    fn prompt(&self) -> &Regex;

    /// Whether `output` ends at an unprivileged prompt.
    fn requires_enable(&self, output: &str) -> bool;

    fn enable_command(&self) -> &str;

    /// Matches either a privileged prompt or a password request.
    fn enable_prompt(&self) -> &Regex;

    fn is_password_prompt(&self, output: &str) -> bool;

    /// Sent once after login, e.g. to disable paging.
    fn on_open_commands(&self) -> &[&'static str];

    fn enter_config_command(&self) -> &str;

    fn exit_config_command(&self) -> &str;

    /// Substrings that mark a line as rejected by the device.
    fn failure_markers(&self) -> &[&'static str];

    fn port_status_query(&self, port: &str) -> String;

    fn vlan_query(&self, port: &str) -> String;

    fn poe_query(&self, port: &str) -> String;

    /// Moves `port` out of `current` (if known) and into `target` as an
    /// untagged member.
    fn vlan_commands(&self, port: &str, current: Option<u16>, target: u16) -> Vec<String>;

    fn port_status_commands(&self, port: &str, status: PortStatus) -> Vec<String>;

    fn poe_commands(&self, port: &str, status: PoeStatus) -> Vec<String>;

    /// Writes the running configuration to non-volatile storage.
    fn persist_commands(&self) -> Vec<String>;

    fn parse_port_status(&self, output: &str, port: &str) -> Option<PortStatus>;

    fn parse_vlan(&self, output: &str, port: &str) -> Option<u16>;

    fn parse_poe_status(&self, output: &str, port: &str) -> Option<PoeStatus>;
}
