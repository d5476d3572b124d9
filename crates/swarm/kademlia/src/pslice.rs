//! Proximity-ordered peer storage (PSlice).
//!
//! Peers are organized into bins based on their proximity order (PO).
//! The base address is not stored here - callers provide the PO when adding peers.
//!
//! # Implementation
//!
//! One `Vec` per bin keeps insertion order for traversal, and a
//! `HashMap<OverlayAddress, u8>` index gives O(1) existence checks.
//! A `PSlice` carries no lock of its own: the topology keeps both of its
//! slices behind a single mutex so depth and membership change together.

use std::collections::HashMap;

use vertex_swarm_primitives::{MAX_BINS, MAX_PO, OverlayAddress};

/// Instruction returned by a [`PSlice::each_bin`] visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Visit the next peer.
    Continue,
    /// Skip the remaining peers of the current bin.
    NextBin,
    /// End the traversal.
    Stop,
}

/// Proximity-ordered peer storage.
#[derive(Debug, Clone, Default)]
pub struct PSlice {
    /// Peers per bin, in insertion order.
    bins: [Vec<OverlayAddress>; MAX_BINS],
    /// Maps peer address to its proximity order.
    index: HashMap<OverlayAddress, u8>,
}

impl PSlice {
    /// Create a new empty PSlice.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer with its proximity order.
    ///
    /// Returns `true` if the peer was added, `false` if it is already present
    /// in any bin (the slice is left unchanged).
    pub fn add(&mut self, peer: OverlayAddress, po: u8) -> bool {
        let po = po.min(MAX_PO);
        if self.index.contains_key(&peer) {
            return false;
        }
        let Some(bin) = self.bins.get_mut(usize::from(po)) else {
            return false;
        };

        bin.push(peer);
        self.index.insert(peer, po);
        true
    }

    /// Remove a peer from bin `po`.
    ///
    /// Returns `true` if the peer was present in that bin and removed.
    pub fn remove(&mut self, peer: &OverlayAddress, po: u8) -> bool {
        if self.index.get(peer) != Some(&po) {
            return false;
        }
        self.index.remove(peer);

        if let Some(bin) = self.bins.get_mut(usize::from(po))
            && let Some(idx) = bin.iter().position(|p| p == peer)
        {
            // keep insertion order for traversal
            bin.remove(idx);
        }
        true
    }

    /// Check if a peer exists in any bin.
    pub fn exists(&self, peer: &OverlayAddress) -> bool {
        self.index.contains_key(peer)
    }

    /// Get the proximity order of a peer, if present.
    pub fn po(&self, peer: &OverlayAddress) -> Option<u8> {
        self.index.get(peer).copied()
    }

    /// Get the number of peers in a specific bin.
    pub fn bin_size(&self, po: u8) -> usize {
        self.bin(po).len()
    }

    /// Get the total number of peers.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Get all peers in a specific bin, in insertion order.
    pub fn peers_in_bin(&self, po: u8) -> &[OverlayAddress] {
        self.bin(po)
    }

    /// Get bin sizes as an array.
    pub fn bin_sizes(&self) -> [usize; MAX_BINS] {
        std::array::from_fn(|i| self.bins.get(i).map_or(0, Vec::len))
    }

    /// Deepest bin holding at least one peer.
    pub fn deepest(&self) -> Option<u8> {
        (0..=MAX_PO).rev().find(|&po| !self.bin(po).is_empty())
    }

    /// Shallowest empty bin below the deepest occupied one.
    ///
    /// Returns `None` when every bin up to the deepest occupied bin holds a
    /// peer (no gap), including when the slice is empty.
    pub fn shallowest_empty(&self) -> Option<u8> {
        let deepest = self.deepest()?;
        (0..deepest).find(|&po| self.bin(po).is_empty())
    }

    /// Walk peers from the shallowest bin to the deepest.
    ///
    /// Within a bin peers are visited in insertion order. The visitor decides
    /// whether to continue, skip the rest of the bin or stop; an error aborts
    /// the walk and is returned.
    pub fn each_bin<E, F>(&self, f: F) -> Result<(), E>
    where
        F: FnMut(&OverlayAddress, u8) -> Result<Walk, E>,
    {
        self.walk(0..=MAX_PO, f)
    }

    /// Walk peers from the deepest bin to the shallowest.
    ///
    /// Same contract as [`each_bin`](Self::each_bin).
    pub fn each_bin_rev<E, F>(&self, f: F) -> Result<(), E>
    where
        F: FnMut(&OverlayAddress, u8) -> Result<Walk, E>,
    {
        self.walk((0..=MAX_PO).rev(), f)
    }

    /// Iterate over all peers with their proximity order, from shallowest to deepest.
    pub fn iter(&self) -> impl Iterator<Item = (u8, OverlayAddress)> + '_ {
        (0..=MAX_PO)
            .flat_map(move |po| self.bin(po).iter().map(move |peer| (po, *peer)))
    }

    /// Iterate over all peers with their proximity order, from deepest to shallowest.
    pub fn iter_rev(&self) -> impl Iterator<Item = (u8, OverlayAddress)> + '_ {
        (0..=MAX_PO)
            .rev()
            .flat_map(move |po| self.bin(po).iter().map(move |peer| (po, *peer)))
    }

    fn walk<E, F>(&self, order: impl Iterator<Item = u8>, mut f: F) -> Result<(), E>
    where
        F: FnMut(&OverlayAddress, u8) -> Result<Walk, E>,
    {
        for po in order {
            for peer in self.bin(po) {
                match f(peer, po)? {
                    Walk::Continue => {}
                    Walk::NextBin => break,
                    Walk::Stop => return Ok(()),
                }
            }
        }
        Ok(())
    }

    fn bin(&self, po: u8) -> &[OverlayAddress] {
        self.bins.get(usize::from(po)).map_or(&[], Vec::as_slice)
    }
}
