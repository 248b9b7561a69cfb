//! Per-frame timing snapshot.
//!
//! The game loop produces one [`Time`] value per tick and hands it to every
//! subsystem and system. The value is immutable after construction; the next
//! frame gets a fresh one.

/// Timing for a single frame.
///
/// `fixed_timestep` is copied from the engine configuration at initialize
/// time and stays constant for the engine's lifetime. During fixed-step
/// catch-up the loop issues `Time` values whose `delta_seconds` equals
/// `fixed_timestep`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Time {
    delta_seconds: f32,
    elapsed_seconds: f64,
    frame_count: u64,
    fixed_timestep: f32,
}

impl Time {
    /// Build a snapshot. Called by the game loop; user code normally only
    /// reads these values.
    pub fn new(
        delta_seconds: f32,
        elapsed_seconds: f64,
        frame_count: u64,
        fixed_timestep: f32,
    ) -> Self {
        Self {
            delta_seconds,
            elapsed_seconds,
            frame_count,
            fixed_timestep,
        }
    }

    /// The snapshot before the first tick: everything zero except the
    /// configured fixed timestep.
    pub fn startup(fixed_timestep: f32) -> Self {
        Self::new(0.0, 0.0, 0, fixed_timestep)
    }

    /// Seconds elapsed since the previous tick (clamped by the loop).
    pub fn delta_seconds(&self) -> f32 {
        self.delta_seconds
    }

    /// Seconds elapsed since the loop started.
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    /// Number of ticks produced so far, counting this one.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The configured fixed simulation step, in seconds.
    pub fn fixed_timestep(&self) -> f32 {
        self.fixed_timestep
    }

    /// Instantaneous frames per second, or zero on the first frame.
    pub fn frames_per_second(&self) -> f32 {
        if self.delta_seconds > 0.0 {
            1.0 / self.delta_seconds
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_round_trip() {
        let time = Time::new(0.016, 1.5, 90, 1.0 / 60.0);
        assert_eq!(time.delta_seconds(), 0.016);
        assert_eq!(time.elapsed_seconds(), 1.5);
        assert_eq!(time.frame_count(), 90);
        assert_eq!(time.fixed_timestep(), 1.0 / 60.0);
    }

    #[test]
    fn startup_is_zeroed() {
        let time = Time::startup(0.02);
        assert_eq!(time.delta_seconds(), 0.0);
        assert_eq!(time.frame_count(), 0);
        assert_eq!(time.fixed_timestep(), 0.02);
        assert_eq!(time.frames_per_second(), 0.0);
    }

    #[test]
    fn fps_from_delta() {
        let time = Time::new(0.02, 0.02, 1, 1.0 / 60.0);
        assert!((time.frames_per_second() - 50.0).abs() < 1e-3);
    }
}
