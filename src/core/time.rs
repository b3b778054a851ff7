/// Fixed timestep accumulator.
/// Drives the physics clock at a consistent rate regardless of how the
/// host's display frames arrive.
pub struct FixedTimestep {
    /// The fixed delta time per tick.
    dt: f32,
    /// Accumulated time from variable frame deltas.
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
        }
    }

    /// Add frame time to the accumulator. Returns the number of fixed steps to run.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt;
        // Cap to prevent spiral of death (max 10 steps per frame)
        self.accumulator = self.accumulator.min(self.dt * 10.0);
        let steps = (self.accumulator / self.dt) as u32;
        self.accumulator -= steps as f32 * self.dt;
        steps
    }

    /// The fixed delta time.
    pub fn dt(&self) -> f32 {
        self.dt
    }
}

/// Debounce timer for resize signals.
///
/// Each `signal` call replaces the pending payload and restarts the quiet
/// period; `tick` yields the payload only once no new signal has arrived
/// for the full window. Purely cooperative: the host drives it with its
/// frame delta, no wall clock involved.
pub struct Debounce<T> {
    window: f32,
    remaining: f32,
    pending: Option<T>,
}

impl<T> Debounce<T> {
    pub fn new(window: f32) -> Self {
        Self {
            window,
            remaining: 0.0,
            pending: None,
        }
    }

    /// Record a new signal, resetting the quiet-period timer.
    pub fn signal(&mut self, payload: T) {
        self.pending = Some(payload);
        self.remaining = self.window;
    }

    /// Advance by `dt` seconds. Returns the latest payload once the quiet
    /// period has elapsed, at most once per burst.
    pub fn tick(&mut self, dt: f32) -> Option<T> {
        if self.pending.is_none() {
            return None;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.pending.take()
        } else {
            None
        }
    }

    /// Whether a signal is waiting for its quiet period.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_step_exact() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        let steps = ts.accumulate(1.0 / 60.0);
        assert_eq!(steps, 1);
    }

    #[test]
    fn accumulates_partial() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        let steps = ts.accumulate(0.008); // half a frame
        assert_eq!(steps, 0);
        let steps = ts.accumulate(0.010); // over one frame total
        assert_eq!(steps, 1);
    }

    #[test]
    fn caps_at_ten_steps() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        let steps = ts.accumulate(1.0); // 60 frames worth, but capped at 10
        assert_eq!(steps, 10);
    }

    #[test]
    fn debounce_fires_after_quiet_period() {
        let mut d = Debounce::new(0.25);
        d.signal(1);
        assert_eq!(d.tick(0.1), None);
        assert_eq!(d.tick(0.1), None);
        assert_eq!(d.tick(0.1), Some(1));
        assert!(!d.is_pending());
        assert_eq!(d.tick(0.1), None);
    }

    #[test]
    fn debounce_keeps_only_last_signal_in_burst() {
        let mut d = Debounce::new(0.25);
        d.signal((100, 100));
        d.tick(0.2);
        // New signal inside the window resets the timer.
        d.signal((500, 400));
        assert_eq!(d.tick(0.2), None);
        assert_eq!(d.tick(0.1), Some((500, 400)));
    }
}
