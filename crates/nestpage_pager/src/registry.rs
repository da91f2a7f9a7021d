//! Page slots
//!
//! Slots are indexed by page index. Each mount gets a fresh epoch so events
//! queued by a surface that has since been unloaded can be told apart from
//! events of its replacement.

use nestpage_core::{Rect, SubscriptionId};
use smallvec::SmallVec;

use crate::surface::{ContentSurface, SurfaceHandle};

/// A mounted page
pub struct PageSlot {
    pub index: usize,
    pub surface: SurfaceHandle,
    pub subscription: SubscriptionId,
    pub epoch: u64,
    /// Header anchor frame in the surface's content space
    pub anchor: Rect,
}

impl PageSlot {
    /// Container-space origin of this page's header anchor
    pub fn anchor_origin(&self) -> f32 {
        let offset_y = self.surface.borrow().offset().y;
        self.anchor_origin_at(offset_y)
    }

    /// Anchor origin with the surface scrolled to `offset_y`
    pub fn anchor_origin_at(&self, offset_y: f32) -> f32 {
        self.surface.borrow().frame_top() + self.anchor.y - offset_y
    }
}

impl std::fmt::Debug for PageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageSlot")
            .field("index", &self.index)
            .field("epoch", &self.epoch)
            .field("anchor", &self.anchor)
            .finish()
    }
}

/// Arena of page slots plus the current page
#[derive(Default)]
pub struct PageRegistry {
    slots: Vec<Option<PageSlot>>,
    current_index: usize,
    current_surface: Option<SurfaceHandle>,
    next_epoch: u64,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn set_current_index(&mut self, index: usize) {
        self.current_index = index;
    }

    /// The surface that is the vertical source of truth
    pub fn current_surface(&self) -> Option<SurfaceHandle> {
        self.current_surface.clone()
    }

    pub fn current_surface_ref(&self) -> Option<&SurfaceHandle> {
        self.current_surface.as_ref()
    }

    /// Make the current page's surface authoritative. Returns false (and
    /// clears the authoritative surface) if the current page is not mounted.
    pub fn promote_current(&mut self) -> bool {
        self.current_surface = self.surface(self.current_index);
        self.current_surface.is_some()
    }

    pub fn is_mounted(&self, index: usize) -> bool {
        self.slot(index).is_some()
    }

    pub fn slot(&self, index: usize) -> Option<&PageSlot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut PageSlot> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    pub fn surface(&self, index: usize) -> Option<SurfaceHandle> {
        self.slot(index).map(|slot| slot.surface.clone())
    }

    /// True if `epoch` is the live mount of `index`
    pub fn epoch_matches(&self, index: usize, epoch: u64) -> bool {
        self.slot(index).is_some_and(|slot| slot.epoch == epoch)
    }

    /// Reserve the epoch for the next mount
    pub fn next_epoch(&mut self) -> u64 {
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        epoch
    }

    /// Store a mounted page, replacing nothing
    pub fn insert(&mut self, slot: PageSlot) {
        let index = slot.index;
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }
        debug_assert!(self.slots[index].is_none());
        self.slots[index] = Some(slot);
    }

    /// Detach a page. The authoritative surface is cleared if it belonged to it.
    pub fn remove(&mut self, index: usize) -> Option<PageSlot> {
        let slot = self.slots.get_mut(index)?.take()?;
        if index == self.current_index {
            self.current_surface = None;
        }
        Some(slot)
    }

    /// Detach every page
    pub fn drain(&mut self) -> Vec<PageSlot> {
        self.current_surface = None;
        self.slots.drain(..).flatten().collect()
    }

    /// Mounted pages in index order
    pub fn mounted(&self) -> impl Iterator<Item = &PageSlot> {
        self.slots.iter().flatten()
    }

    pub fn mounted_indexes(&self) -> SmallVec<[usize; 8]> {
        self.mounted().map(|slot| slot.index).collect()
    }

    /// Surfaces of every mounted page except `index`
    pub fn others(&self, index: usize) -> SmallVec<[SurfaceHandle; 8]> {
        self.mounted()
            .filter(|slot| slot.index != index)
            .map(|slot| slot.surface.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimSurface;
    use nestpage_core::{Point, Size, SurfaceEvent};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn slot(registry: &mut PageRegistry, index: usize) -> PageSlot {
        let surface: SurfaceHandle = Rc::new(RefCell::new(SimSurface::new(
            Size::new(300.0, 600.0),
            Size::new(300.0, 1200.0),
        )));
        let subscription = surface.borrow_mut().subscribe(Box::new(|_: &SurfaceEvent| {}));
        PageSlot {
            index,
            surface,
            subscription,
            epoch: registry.next_epoch(),
            anchor: Rect::new(0.0, -140.0, 300.0, 140.0),
        }
    }

    #[test]
    fn test_insert_and_remove() {
        let mut registry = PageRegistry::new();
        let s = slot(&mut registry, 3);
        registry.insert(s);

        assert!(registry.is_mounted(3));
        assert!(!registry.is_mounted(0));
        assert!(!registry.is_mounted(10));
        assert_eq!(registry.mounted_indexes().as_slice(), &[3]);

        assert!(registry.remove(3).is_some());
        assert!(registry.remove(3).is_none());
        assert!(registry.mounted_indexes().is_empty());
    }

    #[test]
    fn test_epochs_distinguish_remounts() {
        let mut registry = PageRegistry::new();
        let first = slot(&mut registry, 0);
        let first_epoch = first.epoch;
        registry.insert(first);
        registry.remove(0);

        let second = slot(&mut registry, 0);
        let second_epoch = second.epoch;
        registry.insert(second);

        assert_ne!(first_epoch, second_epoch);
        assert!(!registry.epoch_matches(0, first_epoch));
        assert!(registry.epoch_matches(0, second_epoch));
    }

    #[test]
    fn test_promote_current() {
        let mut registry = PageRegistry::new();
        registry.set_current_index(1);
        assert!(!registry.promote_current());

        let s = slot(&mut registry, 1);
        registry.insert(s);
        assert!(registry.promote_current());
        assert!(registry.current_surface().is_some());

        registry.remove(1);
        assert!(registry.current_surface().is_none());
    }

    #[test]
    fn test_anchor_origin_tracks_offset() {
        let mut registry = PageRegistry::new();
        let s = slot(&mut registry, 0);
        s.surface
            .borrow_mut()
            .set_offset(Point::new(0.0, -140.0), false);
        registry.insert(s);

        // At rest the anchor sits at the surface top
        assert_eq!(registry.slot(0).unwrap().anchor_origin(), 0.0);

        registry
            .surface(0)
            .unwrap()
            .borrow_mut()
            .set_offset(Point::new(0.0, -40.0), false);
        assert_eq!(registry.slot(0).unwrap().anchor_origin(), -100.0);
    }

    #[test]
    fn test_others_excludes_index() {
        let mut registry = PageRegistry::new();
        for index in [0, 2, 4] {
            let s = slot(&mut registry, index);
            registry.insert(s);
        }
        assert_eq!(registry.others(2).len(), 2);
        assert_eq!(registry.others(7).len(), 3);
    }
}
