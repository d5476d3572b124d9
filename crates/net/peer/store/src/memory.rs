//! In-memory address book (does not persist across restarts).

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::trace;
use vertex_swarm_api::{AddressBookError, Multiaddr, OverlayAddress, SwarmAddressBook};

/// In-memory overlay → underlay mapping.
#[derive(Debug, Default)]
pub struct MemoryAddressBook {
    entries: RwLock<HashMap<OverlayAddress, Multiaddr>>,
}

impl MemoryAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reverse lookup: the overlay recorded for `underlay`, if any.
    pub fn overlay_of(&self, underlay: &Multiaddr) -> Option<OverlayAddress> {
        self.entries
            .read()
            .iter()
            .find(|(_, addr)| *addr == underlay)
            .map(|(overlay, _)| *overlay)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl SwarmAddressBook for MemoryAddressBook {
    fn get(&self, overlay: &OverlayAddress) -> Result<Multiaddr, AddressBookError> {
        self.entries
            .read()
            .get(overlay)
            .cloned()
            .ok_or(AddressBookError::NotFound(*overlay))
    }

    fn put(&self, overlay: OverlayAddress, underlay: Multiaddr) -> Result<(), AddressBookError> {
        trace!(%overlay, %underlay, "address book put");
        self.entries.write().insert(overlay, underlay);
        Ok(())
    }

    fn remove(&self, overlay: &OverlayAddress) -> Result<(), AddressBookError> {
        self.entries.write().remove(overlay);
        Ok(())
    }

    fn overlays(&self) -> Result<Vec<OverlayAddress>, AddressBookError> {
        Ok(self.entries.read().keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn underlay(port: u16) -> Multiaddr {
        format!("/ip4/127.0.0.1/tcp/{port}").parse().unwrap()
    }

    #[test]
    fn test_put_get_remove() {
        let book = MemoryAddressBook::new();
        let overlay = OverlayAddress::repeat_byte(0x11);

        assert_matches!(book.get(&overlay), Err(AddressBookError::NotFound(o)) if o == overlay);

        book.put(overlay, underlay(1634)).unwrap();
        assert_eq!(book.get(&overlay).unwrap(), underlay(1634));
        assert_eq!(book.len(), 1);

        // put replaces the previous entry
        book.put(overlay, underlay(1635)).unwrap();
        assert_eq!(book.get(&overlay).unwrap(), underlay(1635));
        assert_eq!(book.len(), 1);

        book.remove(&overlay).unwrap();
        assert!(book.is_empty());
        // removing an unknown overlay is not an error
        book.remove(&overlay).unwrap();
    }

    #[test]
    fn test_overlay_of() {
        let book = MemoryAddressBook::new();
        let a = OverlayAddress::repeat_byte(0xaa);
        let b = OverlayAddress::repeat_byte(0xbb);
        book.put(a, underlay(1)).unwrap();
        book.put(b, underlay(2)).unwrap();

        assert_eq!(book.overlay_of(&underlay(2)), Some(b));
        assert_eq!(book.overlay_of(&underlay(3)), None);

        let mut overlays = book.overlays().unwrap();
        overlays.sort();
        assert_eq!(overlays, vec![a, b]);
    }
}
