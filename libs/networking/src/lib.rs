//! Networking utilities for lifecycle verification.
//!
//! This library provides helpers for:
//! - Picking the address a server is reachable on
//! - Probing reachability (ICMP echo via the system `ping`, TCP connect)
//! - Confirming a server accepts remote logins

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use roast_poll::ReachabilityProbe;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::process::Command;
use tracing::{debug, warn};

/// Default time one probe may take before counting as no answer.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Networking errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The server has no addresses on the requested network.
    #[error("no addresses on network '{0}'")]
    UnknownNetwork(String),

    /// The network has no address of the requested version.
    #[error("no IPv{version} address on network '{network}'")]
    NoAddressForVersion { network: String, version: u8 },

    /// Unsupported IP version.
    #[error("unsupported IP version: {0}")]
    InvalidVersion(u8),

    /// The probe could not be run.
    #[error("probe of {addr} failed: {message}")]
    Probe { addr: IpAddr, message: String },

    /// Remote access check failed.
    #[error("remote access to {addr} failed: {message}")]
    RemoteAccess { addr: SocketAddr, message: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Address Selection
// ============================================================================

/// IP protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// The version of an address.
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }
}

impl TryFrom<u8> for IpVersion {
    type Error = NetworkError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            4 => Ok(Self::V4),
            6 => Ok(Self::V6),
            other => Err(NetworkError::InvalidVersion(other)),
        }
    }
}

impl From<IpVersion> for u8 {
    fn from(v: IpVersion) -> Self {
        match v {
            IpVersion::V4 => 4,
            IpVersion::V6 => 6,
        }
    }
}

impl std::fmt::Display for IpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IPv{}", u8::from(*self))
    }
}

/// One address entry of a server, as the compute API reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressEntry {
    pub addr: IpAddr,

    #[serde(default = "default_version")]
    pub version: IpVersion,
}

fn default_version() -> IpVersion {
    IpVersion::V4
}

/// Addresses grouped by network name.
pub type Addresses = BTreeMap<String, Vec<AddressEntry>>;

/// Pick the address on `network` with the requested IP version.
///
/// The entry's own `version` field is trusted only when it agrees with the
/// parsed address.
pub fn select_accessible_address(
    addresses: &Addresses,
    network: &str,
    version: IpVersion,
) -> Result<IpAddr, NetworkError> {
    let entries = addresses
        .get(network)
        .filter(|entries| !entries.is_empty())
        .ok_or_else(|| NetworkError::UnknownNetwork(network.to_string()))?;

    entries
        .iter()
        .find(|e| e.version == version && IpVersion::of(&e.addr) == version)
        .map(|e| e.addr)
        .ok_or_else(|| NetworkError::NoAddressForVersion {
            network: network.to_string(),
            version: version.into(),
        })
}

// ============================================================================
// Reachability Probes
// ============================================================================

/// ICMP echo probe using the system `ping` binary.
///
/// One echo request per probe. Exit status 0 means a reply came back, 1 means
/// none did; anything else means `ping` itself failed.
#[derive(Debug, Clone)]
pub struct PingProber {
    binary: String,
    attempt_timeout: Duration,
}

impl PingProber {
    pub fn new(attempt_timeout: Duration) -> Self {
        Self {
            binary: "ping".to_string(),
            attempt_timeout,
        }
    }

    /// Use a specific `ping` binary.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    fn command(&self, addr: IpAddr) -> Command {
        let wait_secs = self.attempt_timeout.as_secs().max(1);
        let mut cmd = Command::new(&self.binary);
        if addr.is_ipv6() {
            cmd.arg("-6");
        }
        cmd.arg("-c")
            .arg("1")
            .arg("-W")
            .arg(wait_secs.to_string())
            .arg(addr.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for PingProber {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

#[async_trait]
impl ReachabilityProbe for PingProber {
    type Error = NetworkError;

    async fn probe(&self, addr: IpAddr) -> Result<bool, NetworkError> {
        let mut child = self.command(addr).spawn().map_err(|e| NetworkError::Probe {
            addr,
            message: format!("failed to run {}: {e}", self.binary),
        })?;

        // Give ping a second past its own -W before giving up on it.
        let limit = self.attempt_timeout + Duration::from_secs(1);
        let status = match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                warn!(address = %addr, "ping did not exit in time");
                let _ = child.kill().await;
                return Ok(false);
            }
        };

        match status.code() {
            Some(0) => {
                debug!(address = %addr, "echo reply received");
                Ok(true)
            }
            Some(1) => {
                debug!(address = %addr, "no echo reply");
                Ok(false)
            }
            code => Err(NetworkError::Probe {
                addr,
                message: format!("{} exited with {:?}", self.binary, code),
            }),
        }
    }
}

/// TCP connect probe.
///
/// Refused and timed-out connections both count as unreachable.
#[derive(Debug, Clone)]
pub struct TcpProber {
    port: u16,
    attempt_timeout: Duration,
}

impl TcpProber {
    pub fn new(port: u16, attempt_timeout: Duration) -> Self {
        Self {
            port,
            attempt_timeout,
        }
    }
}

#[async_trait]
impl ReachabilityProbe for TcpProber {
    type Error = NetworkError;

    async fn probe(&self, addr: IpAddr) -> Result<bool, NetworkError> {
        let target = SocketAddr::new(addr, self.port);
        match tokio::time::timeout(self.attempt_timeout, TcpStream::connect(target)).await {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(e)) => {
                debug!(address = %target, error = %e, "connect failed");
                Ok(false)
            }
            Err(_) => {
                debug!(address = %target, "connect timed out");
                Ok(false)
            }
        }
    }
}

// ============================================================================
// Remote Access
// ============================================================================

/// Confirm `addr:port` accepts connections and greets with an SSH banner.
pub async fn check_remote_access(
    addr: IpAddr,
    port: u16,
    timeout: Duration,
) -> Result<(), NetworkError> {
    let target = SocketAddr::new(addr, port);
    let remote_err = |message: String| NetworkError::RemoteAccess {
        addr: target,
        message,
    };

    let greeting = tokio::time::timeout(timeout, async {
        let mut stream = TcpStream::connect(target).await?;
        let mut buf = [0u8; 64];
        let n = stream.read(&mut buf).await?;
        Ok::<_, std::io::Error>(buf[..n].to_vec())
    })
    .await
    .map_err(|_| remote_err(format!("no greeting within {timeout:?}")))?
    .map_err(|e| remote_err(e.to_string()))?;

    if greeting.starts_with(b"SSH-") {
        debug!(address = %target, "remote access confirmed");
        Ok(())
    } else {
        Err(remote_err(format!(
            "unexpected greeting: {:?}",
            String::from_utf8_lossy(&greeting)
        )))
    }
}

/// Confirms a server accepts remote logins.
#[async_trait]
pub trait RemoteAccessCheck: Send + Sync {
    async fn check(&self, addr: IpAddr) -> Result<(), NetworkError>;
}

/// [`RemoteAccessCheck`] that expects an SSH banner on `port`.
#[derive(Debug, Clone)]
pub struct SshBannerCheck {
    port: u16,
    timeout: Duration,
}

impl SshBannerCheck {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }
}

#[async_trait]
impl RemoteAccessCheck for SshBannerCheck {
    async fn check(&self, addr: IpAddr) -> Result<(), NetworkError> {
        check_remote_access(addr, self.port, self.timeout).await
    }
}
