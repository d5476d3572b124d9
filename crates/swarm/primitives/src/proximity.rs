use crate::OverlayAddress;

/// Number of Kademlia bins. Proximity beyond the last bin is folded into it.
pub const MAX_BINS: usize = 16;

/// Deepest proximity order (`MAX_BINS - 1`).
pub const MAX_PO: u8 = (MAX_BINS - 1) as u8;

/// Proximity order relative to another overlay address.
pub trait Proximity {
    /// Number of leading bits shared with `other`, capped at [`MAX_PO`].
    fn proximity(&self, other: &Self) -> u8;
}

impl Proximity for OverlayAddress {
    fn proximity(&self, other: &Self) -> u8 {
        proximity(self.as_slice(), other.as_slice())
    }
}

// Proximity returns the proximity order of the MSB distance between one and other.
//
// The MSB distance of two equal length bit sequences is the big endian integer
// value of their XOR. Proximity is the number of leading zero bits of that XOR,
// i.e. the reverse rank of its base 2 logarithm. Only the first MAX_PO bits are
// inspected; anything closer lands in the deepest bin.
//
// (0 farthest, MAX_PO closest or equal)
pub fn proximity(one: &[u8], other: &[u8]) -> u8 {
    let b = (MAX_PO as usize / 8 + 1).min(one.len()).min(other.len());
    for (i, (x, y)) in one.iter().zip(other).take(b).enumerate() {
        let oxo = x ^ y;
        if oxo != 0 {
            let po = i * 8 + oxo.leading_zeros() as usize;
            return po.min(MAX_PO as usize) as u8;
        }
    }
    MAX_PO
}
