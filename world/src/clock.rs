//! Discrete simulation time.

/// Monotonic tick counter advanced once per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameClock {
    tick: u64,
    tick_rate: u32,
}

impl FrameClock {
    /// Creates a clock at tick zero running at `tick_rate` ticks per second.
    ///
    /// A zero rate is clamped to one tick per second.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick: 0,
            tick_rate: tick_rate.max(1),
        }
    }

    /// Tick reached by the most recent advance.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Number of ticks per real-time second.
    #[must_use]
    pub const fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Advances by exactly one tick and returns the new tick.
    pub fn advance(&mut self) -> u64 {
        self.tick = self.tick.saturating_add(1);
        self.tick
    }

    /// Converts a real-time duration into the nearest number of ticks.
    #[must_use]
    pub fn ticks_for(&self, duration_ms: u64) -> u64 {
        let scaled = duration_ms.saturating_mul(u64::from(self.tick_rate));
        scaled.saturating_add(500) / 1_000
    }
}

/// Rate limiter deciding when the driving loop may run the next frame.
///
/// However long the loop stalls, at most one frame is granted per check; the
/// simulation never catches up on missed frames.
#[derive(Clone, Copy, Debug)]
pub struct FrameGate {
    min_interval_ms: f64,
    last_frame_ms: Option<u64>,
}

impl FrameGate {
    /// Creates a gate for the provided tick rate.
    ///
    /// The interval is shortened by one millisecond so timer jitter does not
    /// make the loop skip frames.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        Self {
            min_interval_ms: 1_000.0 / f64::from(tick_rate.max(1)) - 1.0,
            last_frame_ms: None,
        }
    }

    /// Minimum time that must pass between two frames.
    #[must_use]
    pub const fn min_interval_ms(&self) -> f64 {
        self.min_interval_ms
    }

    /// Reports whether a frame may start at `now_ms`, recording it if so.
    ///
    /// The first call always starts a frame.
    pub fn try_begin_frame(&mut self, now_ms: u64) -> bool {
        if let Some(last) = self.last_frame_ms {
            let since = now_ms.saturating_sub(last) as f64;
            if since < self.min_interval_ms {
                return false;
            }
        }
        self.last_frame_ms = Some(now_ms);
        true
    }
}
