//! Node-identity resolution.
//!
//! Every process needs a (worker id, datacenter id) pair that is unique
//! across the fleet before it may generate ids. Each field resolves
//! independently, in priority order:
//!
//! 1. an explicit value in [`NodeConfig`];
//! 2. the `WORKER_ID` / `DATACENTER_ID` environment variable;
//! 3. a derived fallback — worker id: last octet of the host's outbound
//!    IPv4 address mod 32; datacenter id: the constant `1`.
//!
//! Resolution runs once at startup and fails fast on malformed or
//! out-of-range input. Uniqueness across processes is an operational
//! invariant: deployments relying on the IP fallback must ensure host
//! addresses do not alias mod 32.

use std::env;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable consulted for the worker id.
pub const WORKER_ID_ENV: &str = "WORKER_ID";

/// Environment variable consulted for the datacenter id.
pub const DATACENTER_ID_ENV: &str = "DATACENTER_ID";

/// Datacenter id used when neither configuration nor environment names one.
const DEFAULT_DATACENTER_ID: u64 = 1;

/// Worker id used when the host address cannot be determined.
const FALLBACK_WORKER_ID: u64 = 1;

/// Optional node-identity settings, typically deserialized from an
/// application config file. Absent fields fall through to the environment
/// and then to the derived defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Worker id, 0–31.
    pub worker_id: Option<u64>,
    /// Datacenter id, 0–31.
    pub datacenter_id: Option<u64>,
}

/// The resolved (worker id, datacenter id) pair for this process.
///
/// Immutable once resolved; the generator embeds it into every id for the
/// process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIdentity {
    worker_id: u64,
    datacenter_id: u64,
}

impl NodeIdentity {
    /// Builds an identity from explicit values, range-checking both into
    /// [0, 31].
    pub fn new(worker_id: u64, datacenter_id: u64) -> Result<Self, ConfigError> {
        let max = crate::RecordId::max_worker_id();
        if worker_id > max {
            return Err(ConfigError::OutOfRange {
                field: "worker_id",
                value: worker_id,
                max,
            });
        }
        let max = crate::RecordId::max_datacenter_id();
        if datacenter_id > max {
            return Err(ConfigError::OutOfRange {
                field: "datacenter_id",
                value: datacenter_id,
                max,
            });
        }
        Ok(Self {
            worker_id,
            datacenter_id,
        })
    }

    /// Resolves the identity for this process from configuration, the
    /// process environment, and the host network address. Call once at
    /// startup.
    pub fn resolve(config: &NodeConfig) -> Result<Self, ConfigError> {
        let worker_id = pick(
            config.worker_id,
            WORKER_ID_ENV,
            env_raw(WORKER_ID_ENV)?,
            worker_id_from_host_addr,
        )?;
        let datacenter_id = pick(
            config.datacenter_id,
            DATACENTER_ID_ENV,
            env_raw(DATACENTER_ID_ENV)?,
            || DEFAULT_DATACENTER_ID,
        )?;

        let identity = Self::new(worker_id, datacenter_id)?;
        tracing::info!(worker_id, datacenter_id, "resolved node identity");
        Ok(identity)
    }

    pub const fn worker_id(&self) -> u64 {
        self.worker_id
    }

    pub const fn datacenter_id(&self) -> u64 {
        self.datacenter_id
    }
}

/// Applies the three-step precedence for one field.
fn pick(
    explicit: Option<u64>,
    var: &'static str,
    env_value: Option<String>,
    fallback: impl FnOnce() -> u64,
) -> Result<u64, ConfigError> {
    if let Some(value) = explicit {
        return Ok(value);
    }
    if let Some(raw) = env_value {
        return raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::MalformedEnv { var, value: raw });
    }
    Ok(fallback())
}

fn env_raw(var: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(var) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::MalformedEnv {
            var,
            value: "<non-unicode>".to_owned(),
        }),
    }
}

fn worker_id_from_host_addr() -> u64 {
    match outbound_ipv4() {
        Some(ip) => u64::from(ip.octets()[3]) % 32,
        None => {
            tracing::warn!(
                fallback = FALLBACK_WORKER_ID,
                "could not determine host address; using fallback worker id"
            );
            FALLBACK_WORKER_ID
        }
    }
}

/// Returns the IPv4 address the host would use for outbound traffic.
///
/// Connecting a UDP socket selects the interface of the default route
/// without sending any packet. The destination address only has to be
/// routable on paper.
fn outbound_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("198.51.100.1:80").ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}
