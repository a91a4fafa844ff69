//! Opens the single connection a game is played over.
//!
//! The hosting side listens, accepts exactly one peer and plays [`Symbol::X`];
//! the connecting side dials out and plays [`Symbol::O`].

use crate::board::Symbol;
use clap::ValueEnum;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to bind to {0}: {1}")]
    Bind(String, io::Error),
    #[error("failed to accept new connection: {0}")]
    Accept(io::Error),
    #[error("failed to connect to remote host {0}: {1}")]
    Connect(String, io::Error),
}

type Result<T, E = ConnectionError> = std::result::Result<T, E>;

/// Which end of the connection this process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    /// Listen for the opponent and move first.
    Host,
    /// Dial the opponent and move second.
    Connect,
}

impl Role {
    pub fn symbol(self) -> Symbol {
        match self {
            Role::Host => Symbol::FIRST,
            Role::Connect => Symbol::FIRST.opponent(),
        }
    }
}

/// A live stream to the opponent plus the symbol this side plays.
#[derive(Debug)]
pub struct Connection {
    pub stream: TcpStream,
    pub peer_addr: SocketAddr,
    pub symbol: Symbol,
}

/// A bound listener waiting for its one opponent.
pub struct Host {
    pub local_addr: SocketAddr,
    listener: TcpListener,
}

impl Host {
    #[instrument]
    pub async fn bind(address: &str, port: u16) -> Result<Self> {
        let target = format!("{address}:{port}");
        let listener = TcpListener::bind((address, port))
            .await
            .map_err(|e| ConnectionError::Bind(target.clone(), e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ConnectionError::Bind(target, e))?;
        info!(%local_addr, "waiting for an opponent");
        Ok(Self {
            local_addr,
            listener,
        })
    }

    /// Accepts one connection. The listener is closed afterwards.
    pub async fn accept(self) -> Result<Connection> {
        let (stream, peer_addr) = self
            .listener
            .accept()
            .await
            .map_err(ConnectionError::Accept)?;
        info!(%peer_addr, "opponent connected");
        Ok(Connection {
            stream,
            peer_addr,
            symbol: Role::Host.symbol(),
        })
    }
}

pub async fn host(address: &str, port: u16) -> Result<Connection> {
    Host::bind(address, port).await?.accept().await
}

#[instrument]
pub async fn connect(address: &str, port: u16) -> Result<Connection> {
    let target = format!("{address}:{port}");
    let stream = TcpStream::connect((address, port))
        .await
        .map_err(|e| ConnectionError::Connect(target.clone(), e))?;
    let peer_addr = stream
        .peer_addr()
        .map_err(|e| ConnectionError::Connect(target, e))?;
    info!(%peer_addr, "connected to host");
    Ok(Connection {
        stream,
        peer_addr,
        symbol: Role::Connect.symbol(),
    })
}

pub async fn establish(role: Role, address: &str, port: u16) -> Result<Connection> {
    match role {
        Role::Host => host(address, port).await,
        Role::Connect => connect(address, port).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_moves_first() {
        assert_eq!(Role::Host.symbol(), Symbol::X);
        assert_eq!(Role::Connect.symbol(), Symbol::O);
    }

    #[tokio::test]
    async fn host_and_connect_pair_up() {
        let host = Host::bind("127.0.0.1", 0).await.unwrap();
        let port = host.local_addr.port();
        let (hosted, dialed) = tokio::join!(host.accept(), connect("127.0.0.1", port));
        let (hosted, dialed) = (hosted.unwrap(), dialed.unwrap());
        assert_eq!(hosted.symbol, Symbol::X);
        assert_eq!(dialed.symbol, Symbol::O);
        assert_eq!(dialed.peer_addr.port(), port);
    }

    #[tokio::test]
    async fn listener_stops_after_one_accept() {
        let host = Host::bind("127.0.0.1", 0).await.unwrap();
        let port = host.local_addr.port();
        let (hosted, _dialed) = tokio::join!(host.accept(), connect("127.0.0.1", port));
        hosted.unwrap();
        assert!(matches!(
            connect("127.0.0.1", port).await,
            Err(ConnectionError::Connect(..))
        ));
    }

    #[tokio::test]
    async fn binding_a_taken_port_fails() {
        let first = Host::bind("127.0.0.1", 0).await.unwrap();
        let port = first.local_addr.port();
        assert!(matches!(
            Host::bind("127.0.0.1", port).await,
            Err(ConnectionError::Bind(..))
        ));
    }

    #[tokio::test]
    async fn connecting_to_nobody_fails() {
        let port = {
            let probe = Host::bind("127.0.0.1", 0).await.unwrap();
            probe.local_addr.port()
        };
        assert!(matches!(
            establish(Role::Connect, "127.0.0.1", port).await,
            Err(ConnectionError::Connect(..))
        ));
    }
}
