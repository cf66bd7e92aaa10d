use strum::{Display, EnumString};

/// Administrative state of a port. Independent of physical link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum PortStatus {
    #[strum(to_string = "enabled", serialize = "enable", serialize = "up")]
    Enabled,
    #[strum(to_string = "disabled", serialize = "disable", serialize = "down")]
    Disabled,
}

/// Power-over-Ethernet state of a port. Ports without PoE are reported as
/// `None` by the readers rather than with a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum PoeStatus {
    #[strum(to_string = "enabled", serialize = "enable", serialize = "on")]
    Enabled,
    #[strum(to_string = "disabled", serialize = "disable", serialize = "off")]
    Disabled,
}

/// Lowest and highest usable 802.1Q VLAN identifiers.
pub const VLAN_ID_RANGE: std::ops::RangeInclusive<u16> = 1..=4094;

/// Everything the readers know about one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSummary {
    pub status: Option<PortStatus>,
    pub vlan: Option<u16>,
    pub poe: Option<PoeStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("enable".parse::<PortStatus>().ok(), Some(PortStatus::Enabled));
        assert_eq!("Disabled".parse::<PortStatus>().ok(), Some(PortStatus::Disabled));
        assert_eq!("OFF".parse::<PoeStatus>().ok(), Some(PoeStatus::Disabled));
        assert!("sideways".parse::<PortStatus>().is_err());

        assert_eq!(PortStatus::Enabled.to_string(), "enabled");
        assert_eq!(PoeStatus::Disabled.to_string(), "disabled");
    }
}
