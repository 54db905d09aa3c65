use std::net::{Ipv4Addr, SocketAddr};

use crate::{Error, NodeId, Result};

/// Port of participant `0`; participant `i` listens on `BASE_NODE_PORT + i`.
pub const BASE_NODE_PORT: u16 = 3000;

/// Size of the participant set and how many of them may be faulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub n: usize,
    pub f: usize,
    pub base_port: u16,
}

impl Config {
    pub fn new(n: usize, f: usize) -> Result<Self> {
        if n == 0 || n <= 2 * f {
            return Err(Error::InvalidConfig { n, f });
        }
        Ok(Self {
            n,
            f,
            base_port: BASE_NODE_PORT,
        })
    }

    #[must_use]
    pub fn with_base_port(mut self, base_port: u16) -> Self {
        self.base_port = base_port;
        self
    }

    /// Votes needed for a round before acting on it: `n - f`.
    pub fn quorum(&self) -> usize {
        self.n - self.f
    }

    /// Strictly more than half of all `n` participants.
    pub fn is_majority(&self, count: usize) -> bool {
        2 * count > self.n
    }

    pub fn check_id(&self, id: NodeId) -> Result<()> {
        if id < self.n {
            Ok(())
        } else {
            Err(Error::UnknownParticipant { id, n: self.n })
        }
    }

    /// Every participant id except `id`.
    pub fn peers(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        (0..self.n).filter(move |p| *p != id)
    }

    pub fn port(&self, id: NodeId) -> Result<u16> {
        self.check_id(id)?;
        u16::try_from(id)
            .ok()
            .and_then(|offset| self.base_port.checked_add(offset))
            .ok_or(Error::UnknownParticipant { id, n: self.n })
    }

    pub fn addr(&self, id: NodeId) -> Result<SocketAddr> {
        Ok(SocketAddr::from((Ipv4Addr::LOCALHOST, self.port(id)?)))
    }

    /// `route` is one of the endpoint paths, e.g. `/message`.
    pub fn url(&self, id: NodeId, route: &str) -> Result<String> {
        Ok(format!("http://localhost:{}{}", self.port(id)?, route))
    }
}
