//! The frame pump.
//!
//! `GameLoop` produces [`Time`] snapshots and drives callbacks; it knows
//! nothing about subsystems or worlds. Two running modes:
//!
//! - **Self-timed**: the loop measures wall-clock deltas itself and runs a
//!   fixed-timestep accumulator, emitting one `Update` per tick and as many
//!   `FixedUpdate`s as the accumulated time owes.
//! - **External**: a platform driver (display-refresh callback, native frame
//!   pump) supplies the cadence by calling `tick()`; each call emits
//!   `Update` and `FixedUpdate` exactly once, no catch-up, since the driver
//!   is assumed to already run at a stable rate.

use std::time::Instant;

use tracing::warn;
use vesper_core::Time;

use crate::error::EngineError;

/// Largest delta a single tick will simulate; anything longer (debugger
/// pause, machine sleep) is treated as a hitch and clamped.
pub const DEFAULT_MAX_DELTA: f32 = 0.25;

/// Fixed-step catch-up bound per tick. When a tick owes more steps than
/// this, the excess debt is dropped rather than snowballing into a loop
/// that can never catch up.
pub const DEFAULT_MAX_FIXED_STEPS: u32 = 8;

// Absorbs accumulated f32 rounding when counting owed steps: a delta worth
// exactly n steps must never undercount to n-1.
const ACCUMULATOR_EPSILON: f32 = 1e-6;

/// What the loop is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    /// Self-timed: internal clock poll plus fixed-step accumulator.
    SelfTimed,
    /// Externally driven: one-shot callbacks per host tick.
    External,
}

/// One callback invocation within a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    /// Per-tick update at display rate; carries the measured delta.
    Update(Time),
    /// Fixed-rate simulation step; in self-timed mode `delta_seconds`
    /// equals the configured fixed timestep.
    FixedUpdate(Time),
}

/// Fixed-timestep frame producer. See the module docs for the two modes.
pub struct GameLoop {
    state: LoopState,
    fixed_timestep: f32,
    max_delta: f32,
    max_fixed_steps: u32,
    accumulator: f32,
    elapsed: f64,
    frame_count: u64,
    last_tick: Option<Instant>,
}

impl GameLoop {
    pub fn new(fixed_timestep: f32) -> Self {
        Self {
            state: LoopState::Stopped,
            fixed_timestep,
            max_delta: DEFAULT_MAX_DELTA,
            max_fixed_steps: DEFAULT_MAX_FIXED_STEPS,
            accumulator: 0.0,
            elapsed: 0.0,
            frame_count: 0,
            last_tick: None,
        }
    }

    /// Replace the fixed timestep. Meaningful only while stopped; the engine
    /// calls this once when it copies its configuration at initialize.
    pub fn set_fixed_timestep(&mut self, fixed_timestep: f32) {
        self.fixed_timestep = fixed_timestep;
    }

    pub fn fixed_timestep(&self) -> f32 {
        self.fixed_timestep
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state != LoopState::Stopped
    }

    /// Fraction of a fixed step currently sitting in the accumulator, for
    /// interpolating render state between simulation steps.
    pub fn fixed_interpolation(&self) -> f32 {
        if self.fixed_timestep > 0.0 {
            self.accumulator / self.fixed_timestep
        } else {
            0.0
        }
    }

    /// Enter self-timed mode. The next `tick()` restarts delta measurement
    /// from that moment.
    pub fn start(&mut self) {
        self.state = LoopState::SelfTimed;
        self.accumulator = 0.0;
        self.last_tick = None;
    }

    /// Enter externally-driven mode: the host supplies the cadence through
    /// `tick()` calls.
    pub fn start_external(&mut self) {
        self.state = LoopState::External;
        self.accumulator = 0.0;
        self.last_tick = None;
    }

    /// Stop the loop. Idempotent; takes effect at the next tick boundary —
    /// a frame already in flight finishes its callbacks.
    pub fn stop(&mut self) {
        self.state = LoopState::Stopped;
        self.last_tick = None;
    }

    /// Advance one frame, measuring the delta since the previous `tick()`
    /// on this loop's own clock. No-op while stopped. Synchronous and
    /// bounded — safe to call from a display callback.
    pub fn tick<F>(&mut self, callback: F) -> Result<(), EngineError>
    where
        F: FnMut(Frame) -> Result<(), EngineError>,
    {
        if self.state == LoopState::Stopped {
            return Ok(());
        }
        let now = Instant::now();
        let delta = self
            .last_tick
            .map(|prev| now.duration_since(prev).as_secs_f32())
            .unwrap_or(0.0);
        self.last_tick = Some(now);
        self.advance(delta, callback)
    }

    /// Advance one frame with an explicit delta. `tick()` funnels through
    /// here; hosts with their own clocks (and tests) may call it directly.
    pub fn advance<F>(&mut self, delta: f32, mut callback: F) -> Result<(), EngineError>
    where
        F: FnMut(Frame) -> Result<(), EngineError>,
    {
        match self.state {
            LoopState::Stopped => Ok(()),
            LoopState::SelfTimed => {
                let delta = delta.min(self.max_delta);
                self.frame_count += 1;
                self.elapsed += delta as f64;
                callback(Frame::Update(Time::new(
                    delta,
                    self.elapsed,
                    self.frame_count,
                    self.fixed_timestep,
                )))?;

                self.accumulator += delta;
                let mut steps = 0;
                while self.accumulator + ACCUMULATOR_EPSILON >= self.fixed_timestep
                    && steps < self.max_fixed_steps
                {
                    self.accumulator -= self.fixed_timestep;
                    steps += 1;
                    callback(Frame::FixedUpdate(Time::new(
                        self.fixed_timestep,
                        self.elapsed,
                        self.frame_count,
                        self.fixed_timestep,
                    )))?;
                }
                if self.accumulator < 0.0 {
                    self.accumulator = 0.0;
                }
                if self.accumulator >= self.fixed_timestep {
                    warn!(
                        "fixed-step cap hit after {} steps, dropping {:.3}s of simulation debt",
                        steps, self.accumulator
                    );
                    self.accumulator = 0.0;
                }
                Ok(())
            }
            LoopState::External => {
                self.frame_count += 1;
                self.elapsed += delta as f64;
                let time = Time::new(delta, self.elapsed, self.frame_count, self.fixed_timestep);
                callback(Frame::Update(time))?;
                callback(Frame::FixedUpdate(time))?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: f32 = 1.0 / 60.0;

    struct Counts {
        updates: u32,
        fixed: u32,
        fixed_deltas: Vec<f32>,
    }

    fn drive(game_loop: &mut GameLoop, delta: f32) -> Counts {
        let mut counts = Counts {
            updates: 0,
            fixed: 0,
            fixed_deltas: Vec::new(),
        };
        game_loop
            .advance(delta, |frame| {
                match frame {
                    Frame::Update(_) => counts.updates += 1,
                    Frame::FixedUpdate(time) => {
                        counts.fixed += 1;
                        counts.fixed_deltas.push(time.delta_seconds());
                    }
                }
                Ok(())
            })
            .unwrap();
        counts
    }

    #[test]
    fn three_owed_steps_run_exactly_three_times() {
        let mut game_loop = GameLoop::new(STEP);
        game_loop.start();
        let counts = drive(&mut game_loop, 1.0 / 20.0);
        assert_eq!(counts.updates, 1);
        assert_eq!(counts.fixed, 3);
        // Remainder is a hair above zero, well under one step.
        assert!(game_loop.fixed_interpolation() < 0.01);
    }

    #[test]
    fn fixed_updates_carry_the_constant_timestep() {
        let mut game_loop = GameLoop::new(STEP);
        game_loop.start();
        let counts = drive(&mut game_loop, 0.1);
        assert!(counts.fixed > 0);
        assert!(counts.fixed_deltas.iter().all(|d| *d == STEP));
    }

    #[test]
    fn sub_step_deltas_accumulate_across_ticks() {
        let mut game_loop = GameLoop::new(STEP);
        game_loop.start();
        // Half a step per tick: fixed update fires every other tick.
        assert_eq!(drive(&mut game_loop, STEP / 2.0).fixed, 0);
        assert_eq!(drive(&mut game_loop, STEP / 2.0).fixed, 1);
        assert_eq!(drive(&mut game_loop, STEP / 2.0).fixed, 0);
        assert_eq!(drive(&mut game_loop, STEP / 2.0).fixed, 1);
    }

    #[test]
    fn external_mode_is_single_shot() {
        let mut game_loop = GameLoop::new(STEP);
        game_loop.start_external();
        // Three steps' worth of delta still yields exactly one of each.
        let counts = drive(&mut game_loop, 1.0 / 20.0);
        assert_eq!(counts.updates, 1);
        assert_eq!(counts.fixed, 1);
        assert_eq!(counts.fixed_deltas, vec![1.0 / 20.0]);
    }

    #[test]
    fn hitch_is_clamped_and_capped() {
        let mut game_loop = GameLoop::new(STEP);
        game_loop.start();
        // Ten seconds of stall: clamped to max_delta, then capped to
        // max_fixed_steps with the rest of the debt dropped.
        let counts = drive(&mut game_loop, 10.0);
        assert_eq!(counts.updates, 1);
        assert_eq!(counts.fixed, DEFAULT_MAX_FIXED_STEPS);
        assert_eq!(game_loop.fixed_interpolation(), 0.0);
    }

    #[test]
    fn stopped_loop_ignores_advance() {
        let mut game_loop = GameLoop::new(STEP);
        let counts = drive(&mut game_loop, 1.0);
        assert_eq!(counts.updates, 0);
        assert_eq!(counts.fixed, 0);

        game_loop.start();
        assert_eq!(drive(&mut game_loop, 0.1).updates, 1);
        game_loop.stop();
        game_loop.stop(); // idempotent
        let counts = drive(&mut game_loop, 0.1);
        assert_eq!(counts.updates, 0);
        assert_eq!(counts.fixed, 0);
    }

    #[test]
    fn restart_after_stop_resumes() {
        let mut game_loop = GameLoop::new(STEP);
        game_loop.start();
        drive(&mut game_loop, STEP);
        game_loop.stop();
        game_loop.start();
        let counts = drive(&mut game_loop, STEP);
        assert_eq!(counts.updates, 1);
        assert_eq!(counts.fixed, 1);
    }

    #[test]
    fn callback_error_aborts_remaining_phases() {
        let mut game_loop = GameLoop::new(STEP);
        game_loop.start();
        let mut fixed_calls = 0;
        let result = game_loop.advance(1.0 / 20.0, |frame| match frame {
            Frame::Update(_) => Err(EngineError::Subsystem {
                name: "test".into(),
                phase: "update",
                source: anyhow::anyhow!("boom"),
            }),
            Frame::FixedUpdate(_) => {
                fixed_calls += 1;
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(fixed_calls, 0);
    }

    #[test]
    fn frame_count_and_elapsed_are_monotonic() {
        let mut game_loop = GameLoop::new(STEP);
        game_loop.start();
        let mut last = None;
        for _ in 0..3 {
            game_loop
                .advance(STEP, |frame| {
                    if let Frame::Update(time) = frame {
                        last = Some((time.frame_count(), time.elapsed_seconds()));
                    }
                    Ok(())
                })
                .unwrap();
        }
        let (frames, elapsed) = last.unwrap();
        assert_eq!(frames, 3);
        assert!((elapsed - 3.0 * STEP as f64).abs() < 1e-6);
    }
}
