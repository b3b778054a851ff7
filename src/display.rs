//! Display sink seam: one visual element per live rig entry.
//!
//! The crate fills a display list the host renders however it likes (DOM
//! nodes, canvas, a terminal). Elements are created at rig build, placed
//! every display frame, and removed by lifecycle transitions.

use crate::api::types::ElementId;
use crate::text::glyph::Script;

/// Styling for one glyph element, fixed at build time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphStyle {
    pub ch: char,
    pub script: Script,
    pub font_size: f32,
    pub letter_spacing: f32,
}

/// Per-frame placement of an element: translation of the element's center
/// in viewport pixels plus rotation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

/// Where glyph elements go. Implementations must tolerate placement of an
/// element they no longer hold (return `false`, never fail) — lifecycle
/// transitions and the synchronizer interleave.
pub trait DisplaySink {
    /// Create an element for one glyph and return its id.
    fn create_element(&mut self, style: GlyphStyle) -> ElementId;

    /// Move/rotate an element. Returns `false` if the element is gone.
    fn set_placement(&mut self, id: ElementId, placement: Placement) -> bool;

    /// Remove an element from the display list. Removing twice is a no-op.
    fn remove_element(&mut self, id: ElementId);

    /// Number of live elements.
    fn element_count(&self) -> usize;
}

/// In-memory sink: a slot vector keyed by `ElementId`. Used by tests and
/// by headless hosts that read the display list back each frame.
#[derive(Debug, Default)]
pub struct BufferSink {
    slots: Vec<Option<SinkElement>>,
}

/// A live element in the buffer sink.
#[derive(Debug, Clone, Copy)]
pub struct SinkElement {
    pub style: GlyphStyle,
    pub placement: Placement,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an element back, `None` once removed.
    pub fn get(&self, id: ElementId) -> Option<&SinkElement> {
        self.slots.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    /// Iterate live elements.
    pub fn iter(&self) -> impl Iterator<Item = &SinkElement> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }
}

impl DisplaySink for BufferSink {
    fn create_element(&mut self, style: GlyphStyle) -> ElementId {
        let id = ElementId(self.slots.len() as u32);
        self.slots.push(Some(SinkElement {
            style,
            placement: Placement::default(),
        }));
        id
    }

    fn set_placement(&mut self, id: ElementId, placement: Placement) -> bool {
        match self.slots.get_mut(id.0 as usize).and_then(|s| s.as_mut()) {
            Some(element) => {
                element.placement = placement;
                true
            }
            None => false,
        }
    }

    fn remove_element(&mut self, id: ElementId) {
        if let Some(slot) = self.slots.get_mut(id.0 as usize) {
            *slot = None;
        }
    }

    fn element_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(ch: char) -> GlyphStyle {
        GlyphStyle {
            ch,
            script: Script::Latin,
            font_size: 80.0,
            letter_spacing: 4.8,
        }
    }

    #[test]
    fn create_place_remove() {
        let mut sink = BufferSink::new();
        let id = sink.create_element(style('a'));
        assert_eq!(sink.element_count(), 1);

        assert!(sink.set_placement(
            id,
            Placement {
                x: 10.0,
                y: 20.0,
                rotation: 0.5,
            }
        ));
        let e = sink.get(id).unwrap();
        assert_eq!(e.placement.x, 10.0);
        assert_eq!(e.style.ch, 'a');

        sink.remove_element(id);
        assert_eq!(sink.element_count(), 0);
        assert!(sink.get(id).is_none());
    }

    #[test]
    fn stale_placement_reports_false() {
        let mut sink = BufferSink::new();
        let id = sink.create_element(style('x'));
        sink.remove_element(id);
        assert!(!sink.set_placement(id, Placement::default()));
        // Double removal is fine.
        sink.remove_element(id);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut sink = BufferSink::new();
        let a = sink.create_element(style('a'));
        sink.remove_element(a);
        let b = sink.create_element(style('b'));
        assert_ne!(a, b);
    }
}
