//! Data channel negotiation
//!
//! A session holds at most one pending `DataMode`. PASV binds an ephemeral
//! listener and defers the accept to the transfer command; PORT records the
//! client-supplied address and dials out when the transfer runs. Either way
//! the negotiation is consumed by exactly one transfer.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use log::{info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use crate::error::TransferError;

/// Pending data-connection negotiation for one session.
#[derive(Debug, Default)]
pub enum DataMode {
    /// Nothing negotiated; transfer commands reply 425.
    #[default]
    None,
    /// PASV issued: the listener is held until the transfer accepts on it.
    Passive(TcpListener),
    /// PORT issued: the server dials this address on the next transfer.
    Active(SocketAddr),
}

impl DataMode {
    pub fn is_none(&self) -> bool {
        matches!(self, DataMode::None)
    }
}

/// Binds an ephemeral passive-mode listener on the given local address
/// (the address the control connection arrived on, so the client can
/// reach it).
pub async fn open_passive(local_ip: IpAddr) -> Result<(TcpListener, SocketAddr), TransferError> {
    let listener = TcpListener::bind((local_ip, 0))
        .await
        .map_err(TransferError::BindFailed)?;
    let addr = listener.local_addr().map_err(TransferError::BindFailed)?;
    Ok((listener, addr))
}

/// Encodes a socket address in the PASV reply format
/// `h1,h2,h3,h4,p1,p2`. Only IPv4 addresses can be encoded.
pub fn encode_pasv_addr(addr: &SocketAddr) -> Option<String> {
    match addr.ip() {
        IpAddr::V4(ip) => {
            let [h1, h2, h3, h4] = ip.octets();
            let port = addr.port();
            Some(format!(
                "{},{},{},{},{},{}",
                h1,
                h2,
                h3,
                h4,
                port / 256,
                port % 256
            ))
        }
        IpAddr::V6(_) => None,
    }
}

/// Parses a PORT argument (`h1,h2,h3,h4,p1,p2`) into a socket address.
pub fn parse_port_arg(arg: &str) -> Result<SocketAddr, TransferError> {
    let invalid = || TransferError::InvalidPortArgument(arg.to_string());

    let mut parts = arg.split(',');
    let mut next = || -> Result<u8, TransferError> {
        parts
            .next()
            .and_then(|p| p.trim().parse::<u8>().ok())
            .ok_or_else(invalid)
    };

    let octets = [next()?, next()?, next()?, next()?];
    let p1 = next()?;
    let p2 = next()?;
    if parts.next().is_some() {
        return Err(invalid());
    }

    let ip = Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]);
    let port = u16::from(p1) * 256 + u16::from(p2);
    Ok(SocketAddr::new(IpAddr::V4(ip), port))
}

/// Establishes the data connection for one transfer, consuming the
/// negotiation.
///
/// Passive mode accepts the one pending connection with a bounded wait and
/// rejects connections from a different host than the control peer. Active
/// mode dials the recorded address.
pub async fn open_data_stream(
    mode: DataMode,
    control_peer: IpAddr,
    wait: Duration,
) -> Result<TcpStream, TransferError> {
    match mode {
        DataMode::None => Err(TransferError::NotNegotiated),
        DataMode::Passive(listener) => {
            let (stream, peer) = timeout(wait, listener.accept())
                .await
                .map_err(|_| TransferError::AcceptTimeout)?
                .map_err(TransferError::Aborted)?;

            if peer.ip() != control_peer {
                warn!(
                    "Rejecting data connection from {} (control peer is {})",
                    peer, control_peer
                );
                return Err(TransferError::ForeignPeer {
                    expected: control_peer.to_string(),
                    got: peer.to_string(),
                });
            }

            info!("Passive data connection accepted from {}", peer);
            Ok(stream)
        }
        DataMode::Active(addr) => {
            let stream = timeout(wait, TcpStream::connect(addr))
                .await
                .map_err(|_| TransferError::ConnectTimeout(addr))?
                .map_err(|e| TransferError::ConnectFailed(addr, e))?;

            info!("Active data connection established to {}", addr);
            Ok(stream)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pasv_encoding_for_ipv4() {
        let addr: SocketAddr = "127.0.0.1:2122".parse().unwrap();
        // 2122 = 8 * 256 + 74
        assert_eq!(encode_pasv_addr(&addr).unwrap(), "127,0,0,1,8,74");
    }

    #[test]
    fn pasv_encoding_rejects_ipv6() {
        let addr: SocketAddr = "[::1]:2122".parse().unwrap();
        assert!(encode_pasv_addr(&addr).is_none());
    }

    #[test]
    fn port_argument_round_trip() {
        let addr = parse_port_arg("192,168,1,7,8,74").unwrap();
        assert_eq!(addr, "192.168.1.7:2122".parse().unwrap());
        assert_eq!(encode_pasv_addr(&addr).unwrap(), "192,168,1,7,8,74");
    }

    #[test]
    fn malformed_port_arguments_are_rejected() {
        for arg in ["", "1,2,3,4", "1,2,3,4,5,6,7", "a,b,c,d,e,f", "300,0,0,1,8,74"] {
            assert!(
                matches!(
                    parse_port_arg(arg),
                    Err(TransferError::InvalidPortArgument(_))
                ),
                "expected rejection for {arg:?}"
            );
        }
    }

    #[tokio::test]
    async fn no_negotiation_is_an_error() {
        let err = open_data_stream(DataMode::None, "127.0.0.1".parse().unwrap(), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::NotNegotiated));
    }

    #[tokio::test]
    async fn passive_accept_times_out() {
        let (listener, _) = open_passive("127.0.0.1".parse().unwrap()).await.unwrap();
        let err = open_data_stream(
            DataMode::Passive(listener),
            "127.0.0.1".parse().unwrap(),
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TransferError::AcceptTimeout));
    }

    #[tokio::test]
    async fn passive_accepts_the_control_peer() {
        let (listener, addr) = open_passive("127.0.0.1".parse().unwrap()).await.unwrap();

        let dial = tokio::spawn(async move { TcpStream::connect(addr).await });

        let stream = open_data_stream(
            DataMode::Passive(listener),
            "127.0.0.1".parse().unwrap(),
            Duration::from_secs(2),
        )
        .await
        .unwrap();
        assert_eq!(stream.peer_addr().unwrap().ip(), addr.ip());
        dial.await.unwrap().unwrap();
    }
}
