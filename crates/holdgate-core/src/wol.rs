//! Wake-on-LAN magic packet.
//!
//! Six `0xFF` bytes followed by the target MAC repeated sixteen times, sent
//! as a single UDP datagram to the limited broadcast address.

use crate::config::MacAddress;

/// UDP port magic packets are sent to.
pub const WOL_PORT: u16 = 9;

/// Length of a magic packet in bytes.
pub const MAGIC_PACKET_LEN: usize = 6 + 16 * 6;

/// Build the magic packet for `mac`.
pub fn magic_packet(mac: MacAddress) -> [u8; MAGIC_PACKET_LEN] {
    let mut packet = [0xFF; MAGIC_PACKET_LEN];
    let octets = mac.octets();
    for chunk in packet[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(&octets);
    }
    packet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_packet_layout() {
        let mac = MacAddress::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        let packet = magic_packet(mac);

        assert_eq!(packet.len(), 102);
        assert_eq!(&packet[..6], &[0xFF; 6]);
        for repeat in packet[6..].chunks(6) {
            assert_eq!(repeat, &mac.octets());
        }
    }
}
