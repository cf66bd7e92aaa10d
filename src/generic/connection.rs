use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use encoding_rs::Encoding;
use log::{debug, info};
use regex::Regex;
use ssh2::{Channel, ErrorCode, MethodType, Session};

use crate::config::{ConnectConfig, Device};
use crate::error::Error;

// libssh2 session error codes.
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;
const LIBSSH2_ERROR_PASSWORD_EXPIRED: i32 = -15;
const LIBSSH2_ERROR_AUTHENTICATION_FAILED: i32 = -18;

/// A raw interactive shell to one device.
pub trait Connection: Sized {
    /// Opens and authenticates a new shell.
    fn connect(device: &Device, config: &ConnectConfig) -> Result<Self, Error>;

    /// Reads until `prompt_end` matches. Fails if the shell times out or
    /// closes first.
    fn read(&mut self, prompt_end: &Regex) -> Result<String, Error>;

    /// Writes one line and reads the response up to the next prompt.
    fn execute(&mut self, command: &str, prompt_end: &Regex) -> Result<String, Error>;

    /// Like [`Connection::execute`], but the line never reaches the logs.
    fn execute_secret(&mut self, secret: &str, prompt_end: &Regex) -> Result<String, Error>;

    /// Checks the shell is still usable. The remote end can drop it silently.
    fn is_alive(&mut self) -> bool;

    /// Closes the shell.
    fn close(&mut self) -> Result<(), Error>;
}

/// Encodes and writes `line` followed by a newline.
pub(crate) fn send_line<W: Write>(
    writer: &mut W,
    encoding: &'static Encoding,
    line: &str,
    secret: bool,
) -> Result<(), Error> {
    if secret {
        debug!("Wrote: <redacted>");
    } else {
        debug!("Wrote: {}", line);
    }

    let (bytes, _, _) = encoding.encode(line);
    writer.write_all(&bytes)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    Ok(())
}

/// Reads and decodes until the text read so far ends in `prompt_end`.
///
/// Output that stops short of a prompt leaves the shell out of step with
/// the commands sent to it, so a timeout or end of stream is an error.
pub(crate) fn read_until_prompt<R: Read>(
    reader: &mut R,
    encoding: &'static Encoding,
    prompt_end: &Regex,
) -> Result<String, Error> {
    debug!("Reading...");
    let mut raw = Vec::new();

    loop {
        let mut buf = [0u8; 1024];

        let size = match reader.read(&mut buf) {
            Ok(0) => {
                debug!("Channel closed by remote");
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "channel closed before the prompt",
                )
                .into());
            }
            Ok(s) => s,
            Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
                debug!("Timed out waiting for the prompt");
                return Err(io::Error::new(io::ErrorKind::TimedOut, "no prompt before timeout").into());
            }
            Err(e) => return Err(e.into()),
        };

        raw.extend_from_slice(&buf[..size]);

        let (text, _, _) = encoding.decode(&raw);
        debug!("Read: {}", String::from_utf8_lossy(&buf[..size]));

        if prompt_end.is_match(&text) {
            debug!("Found prompt. Ready for next command");
            return Ok(text.into_owned());
        }
    }
}

fn timed_out(device: &Device, config: &ConnectConfig) -> Error {
    Error::ConnectionTimeout {
        host: device.hostname().to_string(),
        timeout: config.connect_timeout,
    }
}

/// Sorts an error from password authentication into a rejection, a timeout
/// or a plain SSH failure.
fn auth_error(e: ssh2::Error, device: &Device, config: &ConnectConfig) -> Error {
    match e.code() {
        ErrorCode::Session(LIBSSH2_ERROR_AUTHENTICATION_FAILED | LIBSSH2_ERROR_PASSWORD_EXPIRED) => {
            Error::AuthenticationFailure {
                user: device.username().to_string(),
            }
        }
        ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT) => timed_out(device, config),
        _ => Error::Ssh(e),
    }
}

pub struct SSHConnection {
    sess: Session,
    channel: Channel,
    encoding: &'static Encoding,
}

impl SSHConnection {
    fn establish_connection(device: &Device, config: &ConnectConfig) -> Result<Session, Error> {
        let addr = device.socket_addr(config.ssh_port);

        let mut result = None;
        for addr in addr.to_socket_addrs()? {
            result = Some(TcpStream::connect_timeout(&addr, config.connect_timeout));
            match result {
                Some(Ok(_)) => break,
                _ => continue,
            }
        }
        let tcp = match result {
            None => return Err(Error::NoAddress(addr)),
            Some(Err(e)) if e.kind() == io::ErrorKind::TimedOut => {
                return Err(timed_out(device, config))
            }
            Some(result) => result?,
        };

        let mut sess = Session::new()?;
        sess.set_timeout(config.connect_timeout.as_millis() as u32);

        sess.method_pref(
            MethodType::HostKey,
            "ssh-rsa,rsa-sha2-256,rsa-sha2-512,ecdsa-sha2-nistp256,ssh-ed25519",
        )?;

        sess.set_tcp_stream(tcp);
        sess.handshake().map_err(|e| match e.code() {
            ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT) => timed_out(device, config),
            _ => Error::Ssh(e),
        })?;

        Ok(sess)
    }


    fn make_channel_session(
        session: Session,
        config: &ConnectConfig,
    ) -> Result<SSHConnection, Error> {
        let mut channel = session.channel_session()?;
        channel.request_pty("vt100", None, None)?;
        channel.shell()?;

        session.set_timeout(config.command_timeout.as_millis() as u32);
        session.set_keepalive(true, 30);

        Ok(SSHConnection {
            sess: session,
            channel,
            encoding: config.encoding,
        })
    }
}

impl Connection for SSHConnection {
    fn connect(device: &Device, config: &ConnectConfig) -> Result<SSHConnection, Error> {
        let sess = Self::establish_connection(device, config)?;

        sess.userauth_password(device.username(), device.password())
            .map_err(|e| auth_error(e, device, config))?;

        if !sess.authenticated() {
            return Err(Error::AuthenticationFailure {
                user: device.username().to_string(),
            });
        }

        info!("SSH session established with {}", device.hostname());

        Self::make_channel_session(sess, config)
    }

    fn read(&mut self, prompt_end: &Regex) -> Result<String, Error> {
        read_until_prompt(&mut self.channel, self.encoding, prompt_end)
    }

    fn execute(&mut self, command: &str, prompt_end: &Regex) -> Result<String, Error> {
        send_line(&mut self.channel, self.encoding, command, false)?;
        self.read(prompt_end)
    }

    fn execute_secret(&mut self, secret: &str, prompt_end: &Regex) -> Result<String, Error> {
        send_line(&mut self.channel, self.encoding, secret, true)?;
        self.read(prompt_end)
    }

    fn is_alive(&mut self) -> bool {
        !self.channel.eof() && self.sess.keepalive_send().is_ok()
    }

    fn close(&mut self) -> Result<(), Error> {
        self.channel.send_eof()?;
        self.channel.close()?;
        self.sess.disconnect(None, "closing session", None)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendor::Dialect;
    use encoding_rs::UTF_8;

    /// Hands out `chunks` one read at a time, then fails with `end`.
    struct Chunked {
        chunks: Vec<&'static str>,
        end: io::ErrorKind,
    }

    impl Read for Chunked {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.chunks.is_empty() {
                return match self.end {
                    io::ErrorKind::UnexpectedEof => Ok(0),
                    kind => Err(io::Error::new(kind, "simulated")),
                };
            }
            let chunk = self.chunks.remove(0).as_bytes();
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    fn prompt() -> Regex {
        Regex::new(r"(?:^|\n)\r?[\w@.\- ]*[\w@.]#\s*$").unwrap()
    }

    #[test]
    fn test_read_stops_at_prompt() -> anyhow::Result<()> {
        let mut reader = Chunked {
            chunks: vec!["show version\r\n  SW: Version 08.0.95", "\r\nSSH@ICX7150#", "left over"],
            end: io::ErrorKind::UnexpectedEof,
        };

        let output = read_until_prompt(&mut reader, UTF_8, &prompt())?;
        assert_eq!(output, "show version\r\n  SW: Version 08.0.95\r\nSSH@ICX7150#");
        assert_eq!(reader.chunks, ["left over"]);

        Ok(())
    }

    #[test]
    fn test_read_without_prompt_fails() {
        for end in [io::ErrorKind::TimedOut, io::ErrorKind::UnexpectedEof] {
            let mut reader = Chunked {
                chunks: vec!["show vlan brief ethernet 1/1/1\r\n"],
                end,
            };

            let result = read_until_prompt(&mut reader, UTF_8, &prompt());
            assert!(matches!(result, Err(Error::Io(ref e)) if e.kind() == end), "{:?}", result);
        }
    }

    #[test]
    fn test_send_line_appends_newline() -> anyhow::Result<()> {
        let mut written = Vec::new();
        send_line(&mut written, UTF_8, "show version", false)?;
        assert_eq!(written, b"show version\n");

        Ok(())
    }

    #[test]
    fn test_auth_error_kinds() {
        let device = Device::new("sw1", "admin", "password", Dialect::RuckusFastiron);
        let config = ConnectConfig::default();
        let error = |code| ssh2::Error::new(ErrorCode::Session(code), "simulated");

        let result = auth_error(error(LIBSSH2_ERROR_AUTHENTICATION_FAILED), &device, &config);
        assert!(matches!(result, Error::AuthenticationFailure { ref user } if user == "admin"));

        let result = auth_error(error(LIBSSH2_ERROR_TIMEOUT), &device, &config);
        assert!(matches!(result, Error::ConnectionTimeout { ref host, .. } if host == "sw1"));

        // LIBSSH2_ERROR_SOCKET_RECV
        let result = auth_error(error(-43), &device, &config);
        assert!(matches!(result, Error::Ssh(_)), "{:?}", result);
    }
}
