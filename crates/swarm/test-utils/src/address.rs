//! Address generators.

use std::net::Ipv4Addr;

use libp2p::multiaddr::{Multiaddr, Protocol};
use vertex_swarm_primitives::{MAX_PO, OverlayAddress};

/// Uniformly random overlay address.
pub fn random_address() -> OverlayAddress {
    OverlayAddress::from(rand::random::<[u8; 32]>())
}

/// Random overlay address at proximity order `po` from `base`.
///
/// The first `po` bits are copied from `base`, bit `po` is flipped and the
/// rest is random. Orders past [`MAX_PO`] are clamped.
pub fn random_address_at(base: &OverlayAddress, po: u8) -> OverlayAddress {
    let po = u32::from(po.min(MAX_PO));
    let mut bytes = rand::random::<[u8; 32]>();

    let prefix = u16::from_be_bytes([base.0[0], base.0[1]]);
    let random = u16::from_be_bytes([bytes[0], bytes[1]]);

    // bits of `base` kept as they are
    let keep = u16::MAX.checked_shl(16 - po).unwrap_or(0);
    let flip = 0x8000u16 >> po;
    let head = (prefix & keep) | (!prefix & flip) | (random & !keep & !flip);

    let [first, second] = head.to_be_bytes();
    bytes[0] = first;
    bytes[1] = second;
    OverlayAddress::from(bytes)
}

/// Number of distinct addresses [`underlay_for`] hands out before wrapping.
pub const UNDERLAY_HOSTS: usize = 1 << 24;

/// Deterministic underlay address for the `n`th test peer, in `10.0.0.0/8`.
///
/// Distinct for every `n` below [`UNDERLAY_HOSTS`].
pub fn underlay_for(n: u32) -> Multiaddr {
    let host = Ipv4Addr::from(0x0a00_0000 | (n & 0x00ff_ffff));
    Multiaddr::empty()
        .with(Protocol::Ip4(host))
        .with(Protocol::Tcp(1634))
}
