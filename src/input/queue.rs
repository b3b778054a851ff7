/// Control events the stage understands: the four user actions, the
/// viewport-size signal, and raw pointer input. No game semantics beyond
/// that — the host UI decides what maps to what.
#[derive(Debug, Clone)]
pub enum ControlEvent {
    /// Build a new rig from this text, replacing the hanging one.
    SubmitText(String),
    /// Detach the hanging rig to the fallen pool.
    Pluck,
    /// Retire everything and rebuild the default rig.
    Reset,
    /// Toggle collision audio.
    ToggleMute,
    /// The viewport changed size (debounced by the stage).
    Resize { width: f32, height: f32 },
    /// Pointer pressed at viewport coordinates.
    PointerDown { x: f32, y: f32 },
    /// Pointer moved to viewport coordinates.
    PointerMove { x: f32, y: f32 },
    /// Pointer released.
    PointerUp,
}

/// A queue of control events.
/// The host writes events into the queue; the stage drains them each frame.
pub struct ControlQueue {
    events: Vec<ControlEvent>,
}

impl ControlQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    /// Push a new control event (called from the host UI).
    pub fn push(&mut self, event: ControlEvent) {
        self.events.push(event);
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<ControlEvent> {
        std::mem::take(&mut self.events)
    }

    /// Iterate over pending events without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &ControlEvent> {
        self.events.iter()
    }

    /// Check if there are pending events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for ControlQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_drain() {
        let mut q = ControlQueue::new();
        q.push(ControlEvent::SubmitText("hi".into()));
        q.push(ControlEvent::Pluck);
        assert_eq!(q.len(), 2);
        let events = q.drain();
        assert_eq!(events.len(), 2);
        assert!(q.is_empty());
    }

    #[test]
    fn resize_event_carries_dimensions() {
        let mut q = ControlQueue::new();
        q.push(ControlEvent::Resize {
            width: 1024.0,
            height: 768.0,
        });
        match q.drain()[0] {
            ControlEvent::Resize { width, height } => {
                assert_eq!(width, 1024.0);
                assert_eq!(height, 768.0);
            }
            _ => panic!("expected Resize event"),
        }
    }
}
