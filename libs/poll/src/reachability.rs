//! Waiting for an address to become reachable or unreachable.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::retry::{retry_until, Observation};
use crate::{PollConfig, PollError};

/// A network-level check of whether an address currently responds.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Probe failure (the probe could not be run at all, as opposed to the
    /// address not answering).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Probe `addr` once.
    async fn probe(&self, addr: IpAddr) -> Result<bool, Self::Error>;
}

#[async_trait]
impl<T: ReachabilityProbe + ?Sized> ReachabilityProbe for Arc<T> {
    type Error = T::Error;

    async fn probe(&self, addr: IpAddr) -> Result<bool, Self::Error> {
        (**self).probe(addr).await
    }
}

/// Desired probe outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Reachable,
    Unreachable,
}

impl Reachability {
    fn from_probe(reachable: bool) -> Self {
        if reachable {
            Self::Reachable
        } else {
            Self::Unreachable
        }
    }
}

impl std::fmt::Display for Reachability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reachable => write!(f, "reachable"),
            Self::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// Blocks until an address reaches a desired reachability.
///
/// Calls are independent: waiting for `Unreachable` and later for
/// `Reachable` on the same address shares no state.
#[derive(Debug, Clone)]
pub struct ReachabilityVerifier<P> {
    prober: P,
}

impl<P: ReachabilityProbe> ReachabilityVerifier<P> {
    pub fn new(prober: P) -> Self {
        Self { prober }
    }

    /// Wait until probing `addr` yields `desired`.
    pub async fn wait_until(
        &self,
        addr: IpAddr,
        desired: Reachability,
        config: &PollConfig,
    ) -> Result<(), PollError> {
        let what = format!("{addr} to become {desired}");
        info!(
            address = %addr,
            desired = %desired,
            timeout_secs = config.timeout.as_secs(),
            interval_secs = config.interval.as_secs(),
            "Waiting for reachability"
        );

        let prober = &self.prober;
        retry_until(config, &what, move || async move {
            let observed = Reachability::from_probe(prober.probe(addr).await?);
            let observation = if observed == desired {
                Observation::Matched(())
            } else {
                Observation::Pending(observed.to_string())
            };
            Ok::<_, P::Error>(observation)
        })
        .await?;

        info!(address = %addr, state = %desired, "Reachability confirmed");
        Ok(())
    }

    /// Wait until `addr` answers probes.
    pub async fn wait_until_reachable(
        &self,
        addr: IpAddr,
        config: &PollConfig,
    ) -> Result<(), PollError> {
        self.wait_until(addr, Reachability::Reachable, config).await
    }

    /// Wait until `addr` stops answering probes.
    pub async fn wait_until_unreachable(
        &self,
        addr: IpAddr,
        config: &PollConfig,
    ) -> Result<(), PollError> {
        self.wait_until(addr, Reachability::Unreachable, config).await
    }
}
