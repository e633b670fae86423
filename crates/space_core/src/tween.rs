//! Ping-pong interpolation driven by frame delta.

/// A value in `[0, 1]` that runs forward, bounces, and runs back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PingPongTween {
    pub t: f32,
    /// +1 forward, -1 backward
    pub direction: f32,
    /// Seconds for one leg
    pub duration: f32,
}

impl Default for PingPongTween {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PingPongTween {
    pub fn new(duration: f32) -> Self {
        Self {
            t: 0.0,
            direction: 1.0,
            duration,
        }
    }

    /// Advance by `dt` seconds and return the new `t`.
    ///
    /// Reaching either end clamps `t` and reverses direction; the leftover
    /// time is dropped.
    pub fn advance(&mut self, dt: f32) -> f32 {
        if self.duration <= 0.0 {
            self.t = if self.direction >= 0.0 { 1.0 } else { 0.0 };
            self.direction = -self.direction;
            return self.t;
        }

        self.t += self.direction * dt / self.duration;
        if self.t >= 1.0 {
            self.t = 1.0;
            self.direction = -1.0;
        } else if self.t <= 0.0 {
            self.t = 0.0;
            self.direction = 1.0;
        }
        self.t
    }

    /// `t` remapped onto `[from, to]`.
    pub fn lerp(&self, from: f32, to: f32) -> f32 {
        from + (to - from) * self.t
    }
}
