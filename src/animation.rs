//! Per-frame animation of the point cloud.
//!
//! The cloud's origin is pulled toward an attractor that traces a
//! Lissajous-like path, the whole cloud tumbles slowly around all three
//! axes, and a triangle-wave "pulse" is fed to the shader.
//!
//! All state lives in [`AnimationState`]. [`Animator::step`] is a pure
//! function of the previous state, the frame timestamp and the canvas size,
//! so the animation can be driven without a GPU:
//!
//! ```ignore
//! let animator = Animator::new(AnimationConfig::default(), session, 682);
//! let mut state = animator.initial_state();
//! for t in [16.0, 32.0, 48.0] {
//!     let (next, outcome) = animator.step(&state, t, CanvasSize::new(800, 600));
//!     state = next;
//! }
//! ```

use glam::{Mat4, Vec3};
use rand::Rng;

use crate::backend::{CanvasSize, DrawCommand};
use crate::uniforms::FrameUniforms;

/// Constants of the animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationConfig {
    /// Frames with a larger delta (ms) are skipped entirely.
    pub stall_threshold_ms: f64,
    /// Pulse change per millisecond.
    pub pulse_rate: f32,
    /// Gain applied to the body-to-attractor vector to get a velocity.
    pub attractor_power: f32,
    /// Time scale of the attractor path (per ms).
    pub attractor_speed: f64,
    /// Radius of the attractor path.
    pub attractor_amplitude: f32,
    /// Angular frequency multipliers for x, y and z.
    pub attractor_frequencies: [f64; 3],
    /// Scale from velocity × ms to distance.
    pub body_speed: f32,
    /// The x velocity is reflected once |x| reaches this value.
    pub wall: f32,
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// Camera position; it looks at the origin with +Y up.
    pub eye: Vec3,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            stall_threshold_ms: 300.0,
            pulse_rate: 0.0002,
            attractor_power: 3.0,
            attractor_speed: 0.00005,
            attractor_amplitude: 2.0,
            attractor_frequencies: [5.0, 6.0, 7.0],
            body_speed: 0.00001,
            wall: 0.9,
            fov_y_degrees: 45.0,
            z_near: 0.001,
            z_far: 100.0,
            eye: Vec3::new(0.0, 0.0, 2.0),
        }
    }
}

/// Values chosen once per session so that two runs look different.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionParams {
    /// Shift of the attractor clock in ms, within `[0, MAX_PHASE_OFFSET_MS)`.
    pub phase_offset_ms: f64,
    /// Rotation speed around x, y and z in radians per ms, each within
    /// `[-MAX_ROTATION_RATE, MAX_ROTATION_RATE)`.
    pub rotation_rates: Vec3,
}

impl SessionParams {
    pub const MAX_PHASE_OFFSET_MS: f64 = 10.0;
    pub const MAX_ROTATION_RATE: f32 = 0.0001;

    pub fn new(phase_offset_ms: f64, rotation_rates: Vec3) -> Self {
        Self {
            phase_offset_ms,
            rotation_rates,
        }
    }

    /// Draw session parameters uniformly from their valid ranges.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let rate = Self::MAX_ROTATION_RATE;
        Self {
            phase_offset_ms: rng.gen_range(0.0..Self::MAX_PHASE_OFFSET_MS),
            rotation_rates: Vec3::new(
                rng.gen_range(-rate..rate),
                rng.gen_range(-rate..rate),
                rng.gen_range(-rate..rate),
            ),
        }
    }

    /// Rotation angles (x, y, z) at the given timestamp.
    pub fn rotation_angles(&self, timestamp_ms: f64) -> Vec3 {
        let r = self.rotation_rates;
        Vec3::new(
            (timestamp_ms * r.x as f64) as f32,
            (timestamp_ms * r.y as f64) as f32,
            (timestamp_ms * r.z as f64) as f32,
        )
    }
}

impl Default for SessionParams {
    fn default() -> Self {
        Self::new(0.0, Vec3::ZERO)
    }
}

/// Current position of the attractor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AttractorState {
    pub position: Vec3,
}

impl AttractorState {
    /// Attractor position at `timestamp_ms`. Depends on nothing but time.
    pub fn at(timestamp_ms: f64, session: &SessionParams, config: &AnimationConfig) -> Self {
        let t = (timestamp_ms + session.phase_offset_ms) * config.attractor_speed;
        let [fx, fy, fz] = config.attractor_frequencies;
        let amplitude = config.attractor_amplitude;

        Self {
            position: Vec3::new(
                (fx * t).cos() as f32 * amplitude,
                (fy * t).sin() as f32 * amplitude,
                (fz * t).cos() as f32 * amplitude,
            ),
        }
    }
}

/// Position and velocity of the point cloud's origin.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BodyState {
    pub position: Vec3,
    pub velocity: Vec3,
}

impl BodyState {
    /// One explicit Euler step toward `attractor`.
    ///
    /// The velocity is recomputed from the pull, then the position is
    /// advanced. When x is at or past a wall the x velocity is negated;
    /// the position is not clamped.
    pub fn integrate(&self, attractor: Vec3, dt_ms: f32, config: &AnimationConfig) -> Self {
        let mut velocity = (attractor - self.position) * config.attractor_power;
        let position = self.position + velocity * dt_ms * config.body_speed;

        if position.x >= config.wall || position.x <= -config.wall {
            velocity.x = -velocity.x;
        }

        Self { position, velocity }
    }
}

/// Triangle-wave oscillator between 0 and 1.
///
/// Direction flips are decided from the value *before* the current step, so
/// the value overshoots either bound by at most one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PulseClock {
    pub value: f32,
    pub forward: bool,
}

impl PulseClock {
    pub fn advance(&self, dt_ms: f32, rate: f32) -> Self {
        let mut forward = self.forward;
        if self.value >= 1.0 && forward {
            forward = false;
        }
        if self.value < 0.0 {
            forward = true;
        }

        let step = dt_ms * rate;
        let value = if forward {
            self.value + step
        } else {
            self.value - step
        };

        Self { value, forward }
    }
}

impl Default for PulseClock {
    fn default() -> Self {
        Self {
            value: 0.0,
            forward: true,
        }
    }
}

/// Everything that evolves from frame to frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimationState {
    /// Timestamp of the previous frame, drawn or not.
    pub last_timestamp_ms: f64,
    pub attractor: AttractorState,
    pub body: BodyState,
    pub pulse: PulseClock,
}

/// Result of one frame step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameOutcome {
    /// The frame delta exceeded the stall threshold; nothing was updated
    /// except the timestamp bookkeeping, and nothing should be drawn.
    Stalled { dt_ms: f64 },
    /// Draw the point set with these parameters.
    Draw(DrawCommand),
}

impl FrameOutcome {
    pub fn draw_command(&self) -> Option<&DrawCommand> {
        match self {
            FrameOutcome::Draw(command) => Some(command),
            FrameOutcome::Stalled { .. } => None,
        }
    }
}

/// World transform: translate(position) · Rz · Ry · Rx.
pub fn world_transform(position: Vec3, angles: Vec3) -> Mat4 {
    Mat4::from_translation(position)
        * Mat4::from_rotation_z(angles.z)
        * Mat4::from_rotation_y(angles.y)
        * Mat4::from_rotation_x(angles.x)
}

/// View transform of a camera at `eye` looking at the origin, +Y up.
pub fn view_transform(eye: Vec3) -> Mat4 {
    Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y)
}

/// Perspective projection for the given aspect ratio.
pub fn projection(config: &AnimationConfig, aspect: f32) -> Mat4 {
    Mat4::perspective_rh(
        config.fov_y_degrees.to_radians(),
        aspect,
        config.z_near,
        config.z_far,
    )
}

/// Immutable animation parameters plus the pure frame step.
#[derive(Clone, Copy, Debug)]
pub struct Animator {
    config: AnimationConfig,
    session: SessionParams,
    vertex_count: u32,
}

impl Animator {
    pub fn new(config: AnimationConfig, session: SessionParams, vertex_count: u32) -> Self {
        Self {
            config,
            session,
            vertex_count,
        }
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionParams {
        &self.session
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// State at program start: everything at the origin, pulse rising.
    pub fn initial_state(&self) -> AnimationState {
        AnimationState::default()
    }

    /// Advance `state` to `timestamp_ms`.
    ///
    /// The canvas size is used as given for the projection; callers must
    /// pass the current size every frame.
    pub fn step(
        &self,
        state: &AnimationState,
        timestamp_ms: f64,
        canvas: CanvasSize,
    ) -> (AnimationState, FrameOutcome) {
        let dt_ms = timestamp_ms - state.last_timestamp_ms;
        let mut next = *state;
        next.last_timestamp_ms = timestamp_ms;

        if dt_ms > self.config.stall_threshold_ms {
            return (next, FrameOutcome::Stalled { dt_ms });
        }

        let dt = dt_ms as f32;
        next.attractor = AttractorState::at(timestamp_ms, &self.session, &self.config);
        next.pulse = state.pulse.advance(dt, self.config.pulse_rate);
        next.body = state
            .body
            .integrate(next.attractor.position, dt, &self.config);

        let angles = self.session.rotation_angles(timestamp_ms);
        let uniforms = FrameUniforms {
            time: next.pulse.value,
            resolution: canvas.resolution(),
            world: world_transform(next.body.position, angles),
            view: view_transform(self.config.eye),
            perspective: projection(&self.config, canvas.aspect()),
        };

        let command = DrawCommand {
            uniforms,
            vertex_count: self.vertex_count,
        };
        (next, FrameOutcome::Draw(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const CANVAS: CanvasSize = CanvasSize {
        width: 800,
        height: 600,
    };

    fn animator() -> Animator {
        Animator::new(AnimationConfig::default(), SessionParams::default(), 12)
    }

    #[test]
    fn test_session_random_ranges() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1000 {
            let s = SessionParams::random(&mut rng);
            assert!((0.0..SessionParams::MAX_PHASE_OFFSET_MS).contains(&s.phase_offset_ms));
            for r in s.rotation_rates.to_array() {
                assert!(r.abs() <= SessionParams::MAX_ROTATION_RATE);
            }
        }
    }

    #[test]
    fn test_attractor_at_time_zero() {
        let config = AnimationConfig::default();
        let a = AttractorState::at(0.0, &SessionParams::default(), &config);
        assert_eq!(a.position, Vec3::new(2.0, 0.0, 2.0));
    }

    #[test]
    fn test_attractor_phase_offset_shifts_clock() {
        let config = AnimationConfig::default();
        let shifted = SessionParams::new(5.0, Vec3::ZERO);
        let a = AttractorState::at(100.0, &shifted, &config);
        let b = AttractorState::at(105.0, &SessionParams::default(), &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_attractor_stays_on_amplitude_box() {
        let config = AnimationConfig::default();
        let session = SessionParams::default();
        for i in 0..500 {
            let a = AttractorState::at(i as f64 * 997.0, &session, &config);
            assert!(a.position.abs().max_element() <= config.attractor_amplitude);
        }
    }

    #[test]
    fn test_pulse_three_frames() {
        let mut pulse = PulseClock::default();
        for _ in 0..3 {
            pulse = pulse.advance(16.0, 0.0002);
        }
        assert!((pulse.value - 0.0096).abs() < 1e-6);
        assert!(pulse.forward);
    }

    #[test]
    fn test_pulse_flips_after_reaching_one() {
        let pulse = PulseClock {
            value: 0.999,
            forward: true,
        };
        // Still below 1 before the step: keeps rising past 1.
        let pulse = pulse.advance(16.0, 0.0002);
        assert!(pulse.forward);
        assert!(pulse.value > 1.0);

        // Now at/over 1: flips and falls.
        let next = pulse.advance(16.0, 0.0002);
        assert!(!next.forward);
        assert!(next.value < pulse.value);
    }

    #[test]
    fn test_pulse_flips_below_zero() {
        let pulse = PulseClock {
            value: -0.001,
            forward: false,
        };
        let next = pulse.advance(16.0, 0.0002);
        assert!(next.forward);
        assert!(next.value > pulse.value);
    }

    #[test]
    fn test_pulse_stays_near_unit_interval() {
        let rate = 0.0002;
        let max_dt = 300.0;
        let eps = max_dt * rate;
        let mut rng = StdRng::seed_from_u64(12);
        let mut pulse = PulseClock::default();
        let mut flips = 0;

        for _ in 0..20_000 {
            let dt = rng.gen_range(1.0..=max_dt);
            let next = pulse.advance(dt, rate);
            if next.forward != pulse.forward {
                flips += 1;
                if next.forward {
                    assert!(pulse.value < 0.0);
                } else {
                    assert!(pulse.value >= 1.0);
                }
            }
            pulse = next;
            assert!(pulse.value >= -eps - 1e-4 && pulse.value <= 1.0 + eps + 1e-4);
        }
        assert!(flips > 10);
    }

    #[test]
    fn test_body_moves_toward_attractor() {
        let config = AnimationConfig::default();
        let body = BodyState::default();
        let attractor = Vec3::new(0.0, 2.0, -2.0);
        let next = body.integrate(attractor, 16.0, &config);

        assert_eq!(next.velocity, attractor * 3.0);
        assert_eq!(next.position, attractor * 3.0 * 16.0 * 0.00001);
    }

    #[test]
    fn test_body_reflects_at_wall() {
        let config = AnimationConfig::default();
        let attractor = Vec3::new(2.0, 0.0, 0.0);

        let inside = BodyState {
            position: Vec3::new(0.5, 0.0, 0.0),
            velocity: Vec3::ZERO,
        }
        .integrate(attractor, 16.0, &config);
        assert!(inside.velocity.x > 0.0);

        let outside = BodyState {
            position: Vec3::new(0.95, 0.0, 0.0),
            velocity: Vec3::ZERO,
        }
        .integrate(attractor, 16.0, &config);
        assert!(outside.velocity.x < 0.0);
        // Soft bounce: no clamping.
        assert!(outside.position.x > 0.95);

        let negative = BodyState {
            position: Vec3::new(-0.95, 0.0, 0.0),
            velocity: Vec3::ZERO,
        }
        .integrate(-attractor, 16.0, &config);
        assert!(negative.velocity.x > 0.0);
    }

    #[test]
    fn test_world_transform_order() {
        let angles = Vec3::new(0.3, -0.2, 0.1);
        let position = Vec3::new(0.1, 0.2, 0.3);
        let world = world_transform(position, angles);
        let p = Vec3::new(0.5, 0.0, 0.5);

        let expected = position
            + glam::Quat::from_rotation_z(angles.z)
                * (glam::Quat::from_rotation_y(angles.y)
                    * (glam::Quat::from_rotation_x(angles.x) * p));
        assert!(world.transform_point3(p).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_view_places_origin_in_front() {
        let view = view_transform(Vec3::new(0.0, 0.0, 2.0));
        let origin = view.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-6));
    }

    #[test]
    fn test_step_three_frames() {
        let animator = animator();
        let mut state = animator.initial_state();
        let mut draws = 0;
        for t in [16.0, 32.0, 48.0] {
            let (next, outcome) = animator.step(&state, t, CANVAS);
            state = next;
            if let FrameOutcome::Draw(cmd) = outcome {
                assert_eq!(cmd.vertex_count, 12);
                assert_eq!(cmd.uniforms.time, state.pulse.value);
                draws += 1;
            }
        }
        assert_eq!(draws, 3);
        assert!((state.pulse.value - 0.0096).abs() < 1e-6);
        assert!(state.pulse.forward);
        assert_eq!(state.last_timestamp_ms, 48.0);
    }

    #[test]
    fn test_step_skips_stalled_frame() {
        let animator = animator();
        let (state, _) = animator.step(&animator.initial_state(), 16.0, CANVAS);
        let (next, outcome) = animator.step(&state, 1016.0, CANVAS);

        assert_eq!(outcome, FrameOutcome::Stalled { dt_ms: 1000.0 });
        assert!(outcome.draw_command().is_none());
        assert_eq!(next.body, state.body);
        assert_eq!(next.attractor, state.attractor);
        assert_eq!(next.pulse, state.pulse);
        assert_eq!(next.last_timestamp_ms, 1016.0);

        // The following frame measures its delta from the skipped one.
        let (_, outcome) = animator.step(&next, 1032.0, CANVAS);
        assert!(outcome.draw_command().is_some());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let animator = animator();
        let (_, outcome) = animator.step(&animator.initial_state(), 300.0, CANVAS);
        assert!(outcome.draw_command().is_some());
        let (_, outcome) = animator.step(&animator.initial_state(), 300.5, CANVAS);
        assert!(outcome.draw_command().is_none());
    }

    #[test]
    fn test_projection_follows_canvas() {
        let animator = animator();
        let state = animator.initial_state();
        let (_, wide) = animator.step(&state, 16.0, CanvasSize::new(1600, 400));
        let (_, tall) = animator.step(&state, 16.0, CanvasSize::new(400, 1600));

        let wide = wide.draw_command().unwrap().uniforms;
        let tall = tall.draw_command().unwrap().uniforms;
        assert_ne!(wide.perspective, tall.perspective);
        assert_eq!(wide.resolution, glam::Vec2::new(1600.0, 400.0));
        assert_eq!(
            wide.perspective,
            projection(&AnimationConfig::default(), 4.0)
        );
    }
}
