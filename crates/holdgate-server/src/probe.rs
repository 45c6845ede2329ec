//! Socket-backed prober: TCP connect probe and UDP magic packet.
//!
//! Sockets live for a single call. A probe opens one connection, drops it on
//! success and never writes a payload; a wake opens one datagram socket,
//! sends one packet and closes it.

use std::{
    future::Future,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    time::Duration,
};

use holdgate_app::{Prober, WakeError};
use holdgate_core::{
    MacAddress,
    wol::{MAGIC_PACKET_LEN, WOL_PORT, magic_packet},
};
use tokio::net::{TcpStream, UdpSocket};

/// Limited broadcast on the Wake-on-LAN port.
pub const WOL_BROADCAST: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::BROADCAST, WOL_PORT);

/// Production [`Prober`] using Tokio sockets.
#[derive(Debug, Clone, Copy)]
pub struct NetProber {
    broadcast: SocketAddr,
}

impl NetProber {
    /// Prober that wakes via the limited broadcast address.
    pub fn new() -> Self {
        Self { broadcast: SocketAddr::V4(WOL_BROADCAST) }
    }

    /// Send magic packets to `addr` instead of the limited broadcast.
    ///
    /// Useful for directed broadcast on routed networks.
    #[must_use]
    pub fn with_broadcast(mut self, addr: SocketAddr) -> Self {
        self.broadcast = addr;
        self
    }
}

impl Default for NetProber {
    fn default() -> Self {
        Self::new()
    }
}

impl Prober for NetProber {
    fn is_reachable(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = bool> + Send {
        async move {
            // Resolution happens inside the timeout as well
            match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
                Ok(Ok(_stream)) => true,
                Ok(Err(e)) => {
                    tracing::debug!(host, port, error = %e, "probe failed");
                    false
                },
                Err(_) => {
                    tracing::debug!(host, port, ?timeout, "probe timed out");
                    false
                },
            }
        }
    }

    fn wake(&self, mac: MacAddress) -> impl Future<Output = Result<(), WakeError>> + Send {
        let target = self.broadcast;
        async move {
            let bind: SocketAddr = match target {
                SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
                SocketAddr::V6(_) => (std::net::Ipv6Addr::UNSPECIFIED, 0).into(),
            };
            let socket = UdpSocket::bind(bind).await?;
            socket.set_broadcast(true)?;

            let packet = magic_packet(mac);
            let sent = socket.send_to(&packet, target).await?;
            if sent != MAGIC_PACKET_LEN {
                return Err(WakeError::ShortSend { sent, expected: MAGIC_PACKET_LEN });
            }
            tracing::debug!(%target, "magic packet sent");
            Ok(())
        }
    }
}
