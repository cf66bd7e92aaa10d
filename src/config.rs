use std::fmt;
use std::time::Duration;

use encoding_rs::Encoding;

use crate::vendor::Dialect;

/// Identity of one managed switch. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Device {
    hostname: String,
    username: String,
    password: String,
    dialect: Dialect,
}

impl Device {
    pub fn new(hostname: &str, username: &str, password: &str, dialect: Dialect) -> Self {
        Self {
            hostname: hostname.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            dialect,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Address suitable for `ToSocketAddrs`.
    pub fn socket_addr(&self, port: u16) -> String {
        format!("{}:{}", self.hostname, port)
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("dialect", &self.dialect)
            .finish()
    }
}

/// Connection and verification tunables for one controller.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// SSH port on the device.
    pub ssh_port: u16,

    /// Upper bound for TCP connect and SSH handshake.
    pub connect_timeout: Duration,

    /// Upper bound for a single blocking read on the shell channel.
    pub command_timeout: Duration,

    /// Wait between submitting a change and trusting a read-back.
    pub settle_interval: Duration,

    /// Number of read-backs before a change is declared unconfirmed.
    pub verify_attempts: u32,

    /// Password for privileged mode; the login password is used when unset.
    pub enable_password: Option<String>,

    /// Character encoding of the device's shell output.
    pub encoding: &'static Encoding,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            ssh_port: 22,
            connect_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(30),
            settle_interval: Duration::from_secs(3),
            verify_attempts: 1,
            enable_password: None,
            encoding: encoding_rs::UTF_8,
        }
    }
}

impl ConnectConfig {
    pub fn with_ssh_port(mut self, port: u16) -> Self {
        self.ssh_port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_settle_interval(mut self, interval: Duration) -> Self {
        self.settle_interval = interval;
        self
    }

    /// Zero is treated as one: every change gets at least one read-back.
    pub fn with_verify_attempts(mut self, attempts: u32) -> Self {
        self.verify_attempts = attempts.max(1);
        self
    }

    pub fn with_enable_password(mut self, password: &str) -> Self {
        self.enable_password = Some(password.to_string());
        self
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_debug_hides_password() {
        let device = Device::new("10.0.0.2", "admin", "hunter2", Dialect::RuckusFastiron);

        let debug = format!("{:?}", device);
        assert!(!debug.contains("hunter2"), "{}", debug);
        assert_eq!(device.socket_addr(22), "10.0.0.2:22");
    }

    #[test]
    fn test_verify_attempts_floor() {
        let config = ConnectConfig::default().with_verify_attempts(0);
        assert_eq!(config.verify_attempts, 1);
    }
}
