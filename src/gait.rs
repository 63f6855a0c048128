// Tripod gait sequencer
//
// A phase state machine over two tripod groups (A = legs 0/3/4, B = legs
// 1/2/5). Each half-step lifts the active group, swings it forward while
// the planted group retracts to propel the body, then plants it; the groups
// then swap. The sequencer emits one frame per sub-phase and the runtime
// plays frames back with a settle delay in between, polling for new
// commands at each boundary. This is an open-loop timed gait, not a
// sensor-closed one.

use std::time::Duration;

use tracing::{info, warn};

use crate::config;
use crate::kinematics::{
    self, BodyPose, FootTarget, HexGeometry, IkError, JointAngles, LEG_COUNT,
};
use crate::messages::{GaitCommand, ParseCommandError};

/// Gait phase of a tripod group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Planted,
    Lifting,
    Swinging,
    Planting,
}

/// The two tripod groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tripod {
    A,
    B,
}

impl Tripod {
    pub fn legs(self) -> [usize; 3] {
        match self {
            Tripod::A => [0, 3, 4],
            Tripod::B => [1, 2, 5],
        }
    }

    pub fn contains(self, leg: usize) -> bool {
        self.legs().contains(&leg)
    }

    fn other(self) -> Tripod {
        match self {
            Tripod::A => Tripod::B,
            Tripod::B => Tripod::A,
        }
    }
}

/// A commanded gait primitive
#[derive(Debug, Clone, Copy, PartialEq)]
enum Motion {
    /// Uniform coxa swing, dir +1 forward / -1 back
    Walk { dir: f32 },
    /// Differential swing signed by body side, dir +1 left / -1 right
    Turn { dir: f32 },
}

/// Runtime-tunable gait parameters. Adjustment commands scale
/// multiplicatively and clamp to the safe ranges in `config`.
#[derive(Debug, Clone, Copy)]
pub struct GaitParams {
    step_delay_ms: f32,
    stride_deg: f32,
    lift_mm: f32,
}

impl Default for GaitParams {
    fn default() -> Self {
        Self {
            step_delay_ms: config::STEP_DELAY_MS,
            stride_deg: config::STRIDE_DEG,
            lift_mm: config::LIFT_MM,
        }
    }
}

fn clamp_range(value: f32, (lo, hi): (f32, f32)) -> f32 {
    value.clamp(lo, hi)
}

impl GaitParams {
    pub fn step_delay(&self) -> Duration {
        Duration::from_secs_f32(self.step_delay_ms / 1000.0)
    }

    pub fn step_delay_ms(&self) -> f32 {
        self.step_delay_ms
    }

    pub fn stride_deg(&self) -> f32 {
        self.stride_deg
    }

    pub fn lift_mm(&self) -> f32 {
        self.lift_mm
    }

    fn faster(&mut self) {
        self.step_delay_ms =
            clamp_range(self.step_delay_ms / config::PARAM_SCALE, config::STEP_DELAY_RANGE_MS);
    }

    fn slower(&mut self) {
        self.step_delay_ms =
            clamp_range(self.step_delay_ms * config::PARAM_SCALE, config::STEP_DELAY_RANGE_MS);
    }

    fn more(&mut self) {
        self.stride_deg =
            clamp_range(self.stride_deg * config::PARAM_SCALE, config::STRIDE_RANGE_DEG);
    }

    fn less(&mut self) {
        self.stride_deg =
            clamp_range(self.stride_deg / config::PARAM_SCALE, config::STRIDE_RANGE_DEG);
    }

    fn higher(&mut self) {
        self.lift_mm = clamp_range(self.lift_mm * config::PARAM_SCALE, config::LIFT_RANGE_MM);
    }

    fn lower(&mut self) {
        self.lift_mm = clamp_range(self.lift_mm / config::PARAM_SCALE, config::LIFT_RANGE_MM);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GaitError {
    #[error(transparent)]
    Ik(#[from] IkError),
    #[error(transparent)]
    Parse(#[from] ParseCommandError),
}

/// One sub-phase worth of joint commands plus the settle delay to wait
/// before the next frame is issued.
#[derive(Debug, Clone)]
pub struct Frame {
    pub angles: [JointAngles; LEG_COUNT],
    pub settle: Duration,
    pub phase: Phase,
    pub group: Tripod,
}

/// The gait state machine. Owns pose, tunables and swing state; emits
/// frames through [`GaitSequencer::next_frame`].
pub struct GaitSequencer {
    geom: HexGeometry,
    params: GaitParams,
    pose: BodyPose,
    motion: Option<Motion>,
    queued: Option<(Motion, u32)>,
    half_steps_left: u32,
    stop_requested: bool,
    active: Tripod,
    phase: Phase,
    /// Per-leg coxa swing offset from neutral, degrees
    swing_deg: [f32; LEG_COUNT],
    /// Swing state at half-step start, restored on abort
    step_snapshot: [f32; LEG_COUNT],
    /// Angles before the frame in flight, restored on abort
    angles_snapshot: [JointAngles; LEG_COUNT],
    last_angles: [JointAngles; LEG_COUNT],
}

impl GaitSequencer {
    pub fn new(geom: HexGeometry) -> Self {
        Self {
            geom,
            params: GaitParams::default(),
            pose: BodyPose::default(),
            motion: None,
            queued: None,
            half_steps_left: 0,
            stop_requested: false,
            active: Tripod::A,
            phase: Phase::Planted,
            // Neutral stance is all-zero angles by construction
            swing_deg: [0.0; LEG_COUNT],
            step_snapshot: [0.0; LEG_COUNT],
            angles_snapshot: [JointAngles::default(); LEG_COUNT],
            last_angles: [JointAngles::default(); LEG_COUNT],
        }
    }

    /// Single text entry point over the command vocabulary
    pub fn apply_command(&mut self, command: &str) -> Result<(), GaitError> {
        let cmd: GaitCommand = command.parse()?;
        self.apply(cmd);
        Ok(())
    }

    pub fn apply(&mut self, cmd: GaitCommand) {
        match cmd {
            GaitCommand::Forward(n) => self.request(Motion::Walk { dir: 1.0 }, n),
            GaitCommand::Back(n) => self.request(Motion::Walk { dir: -1.0 }, n),
            GaitCommand::Left(n) => self.request(Motion::Turn { dir: 1.0 }, n),
            GaitCommand::Right(n) => self.request(Motion::Turn { dir: -1.0 }, n),
            GaitCommand::Faster => self.params.faster(),
            GaitCommand::Slower => self.params.slower(),
            GaitCommand::More => self.params.more(),
            GaitCommand::Less => self.params.less(),
            GaitCommand::Higher => self.params.higher(),
            GaitCommand::Lower => self.params.lower(),
            GaitCommand::Stop => self.stop_requested = true,
        }
        if matches!(
            cmd,
            GaitCommand::Faster
                | GaitCommand::Slower
                | GaitCommand::More
                | GaitCommand::Less
                | GaitCommand::Higher
                | GaitCommand::Lower
        ) {
            info!(
                "gait parameters: delay={:.0}ms stride={:.1}deg lift={:.0}mm",
                self.params.step_delay_ms, self.params.stride_deg, self.params.lift_mm
            );
        }
    }

    /// Queue a motion primitive. Newest command wins; it takes over at the
    /// next planted boundary.
    fn request(&mut self, motion: Motion, steps: u8) {
        self.stop_requested = false;
        // Two half-steps (one per tripod group) make one closed step
        self.queued = Some((motion, u32::from(steps.max(1)) * 2));
    }

    /// Advance the state machine and emit the next frame, or `Ok(None)`
    /// when the gait is idle with all legs planted.
    ///
    /// On an unreachable target the current step is aborted: swing state
    /// rolls back to the half-step start, the previously commanded angles
    /// stay in place, and the fault is returned.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, GaitError> {
        loop {
            match self.phase {
                Phase::Planted => {
                    if self.stop_requested {
                        self.stop_requested = false;
                        let had_motion = self.motion.take().is_some();
                        let had_queued = self.queued.take().is_some();
                        if had_motion || had_queued {
                            info!("gait stopped, legs planted");
                        }
                        self.half_steps_left = 0;
                    }
                    if let Some((motion, halves)) = self.queued.take() {
                        self.motion = Some(motion);
                        self.half_steps_left = halves;
                    }
                    if self.motion.is_none() || self.half_steps_left == 0 {
                        self.motion = None;
                        return Ok(None);
                    }
                    self.step_snapshot = self.swing_deg;
                    self.phase = Phase::Lifting;
                    return self.emit();
                }
                Phase::Lifting => {
                    if self.stop_requested {
                        // Plant where we are; no further coxa change for
                        // the lifted group until it is down
                        self.phase = Phase::Planting;
                    } else {
                        let motion = self.motion.expect("lifting without a motion");
                        let limit = config::SWING_LIMIT_DEG;
                        for leg in 0..LEG_COUNT {
                            let delta = self.swing_delta(motion, leg);
                            let delta = if self.active.contains(leg) { delta } else { -delta };
                            self.swing_deg[leg] =
                                (self.swing_deg[leg] + delta).clamp(-limit, limit);
                        }
                        self.phase = Phase::Swinging;
                    }
                    return self.emit();
                }
                Phase::Swinging => {
                    self.phase = Phase::Planting;
                    return self.emit();
                }
                Phase::Planting => {
                    self.phase = Phase::Planted;
                    self.active = self.active.other();
                    self.half_steps_left = self.half_steps_left.saturating_sub(1);
                    if self.half_steps_left == 0 {
                        self.motion = None;
                    }
                    // Fall through to the planted handler, which may start
                    // the next half-step immediately
                }
            }
        }
    }

    /// Abort the in-progress step without emitting anything further; the
    /// last successfully commanded angles are restored so the reported
    /// state never claims the rejected frame was taken. Used by the
    /// runtime when actuation rejects a frame.
    pub fn abort_step(&mut self) {
        self.swing_deg = self.step_snapshot;
        self.last_angles = self.angles_snapshot;
        self.motion = None;
        self.queued = None;
        self.half_steps_left = 0;
        self.phase = Phase::Planted;
        warn!("gait step aborted, holding last commanded stance");
    }

    /// Repose the body over the planted feet. Slightly out-of-range poses
    /// are clamped into the workspace rather than rejected.
    pub fn set_pose(&mut self, pose: BodyPose) -> Result<[JointAngles; LEG_COUNT], GaitError> {
        let targets = self.foot_targets(None);
        let angles = kinematics::solve_body_clamped(&self.geom, &pose, &targets)?;
        self.pose = pose;
        self.angles_snapshot = angles;
        self.last_angles = angles;
        Ok(angles)
    }

    pub fn params(&self) -> &GaitParams {
        &self.params
    }

    pub fn last_angles(&self) -> &[JointAngles; LEG_COUNT] {
        &self.last_angles
    }

    /// True while a motion is executing or queued
    pub fn is_active(&self) -> bool {
        self.motion.is_some() || self.queued.is_some() || self.phase != Phase::Planted
    }

    /// Per-leg coxa swing for one sub-phase of the given motion
    fn swing_delta(&self, motion: Motion, leg: usize) -> f32 {
        match motion {
            Motion::Walk { dir } => self.params.stride_deg * dir,
            Motion::Turn { dir } => {
                let side = if self.geom.leg(leg).offset_x >= 0.0 { 1.0 } else { -1.0 };
                self.params.stride_deg * dir * side
            }
        }
    }

    /// Foot targets for the current swing state; legs of `lifted` (if any)
    /// are raised by the lift height.
    fn foot_targets(&self, lifted: Option<Tripod>) -> [FootTarget; LEG_COUNT] {
        std::array::from_fn(|leg| {
            let g = self.geom.leg(leg);
            let bearing = (g.mount_deg + self.swing_deg[leg]).to_radians();
            let radius = self.geom.links.coxa + self.geom.links.femur;
            let mut z = self.geom.links.tibia;
            if lifted.is_some_and(|t| t.contains(leg)) {
                z -= self.params.lift_mm;
            }
            FootTarget::new(radius * bearing.cos(), radius * bearing.sin(), z)
        })
    }

    fn emit(&mut self) -> Result<Option<Frame>, GaitError> {
        // The frame about to go out may still be rejected by actuation;
        // hold the previous angles for rollback
        self.angles_snapshot = self.last_angles;
        let lifted = match self.phase {
            Phase::Lifting | Phase::Swinging => Some(self.active),
            Phase::Planting | Phase::Planted => None,
        };
        let targets = self.foot_targets(lifted);
        match kinematics::solve_body(&self.geom, &self.pose, &targets) {
            Ok(angles) => {
                self.last_angles = angles;
                Ok(Some(Frame {
                    angles,
                    settle: self.params.step_delay(),
                    phase: self.phase,
                    group: self.active,
                }))
            }
            Err(e) => {
                self.abort_step();
                Err(e.into())
            }
        }
    }
}

/// Folded parking stance (knees tucked under the body), commanded directly
/// in joint space because it sits outside the walking workspace.
pub fn park_stance() -> [JointAngles; LEG_COUNT] {
    [JointAngles {
        coxa: 0.0,
        femur: config::PARK_FEMUR_DEG,
        tibia: config::PARK_TIBIA_DEG,
    }; LEG_COUNT]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::LegLinks;

    fn sequencer() -> GaitSequencer {
        GaitSequencer::new(HexGeometry::standard())
    }

    fn drain(seq: &mut GaitSequencer) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(frame) = seq.next_frame().unwrap() {
            frames.push(frame);
            assert!(frames.len() < 100, "gait did not terminate");
        }
        frames
    }

    #[test]
    fn forward_cycle_is_closed() {
        let mut seq = sequencer();
        seq.apply(GaitCommand::Forward(1));
        let frames = drain(&mut seq);

        // Two half-steps, three sub-phases each
        assert_eq!(frames.len(), 6);
        let phases: Vec<Phase> = frames.iter().map(|f| f.phase).collect();
        assert_eq!(
            phases,
            [
                Phase::Lifting,
                Phase::Swinging,
                Phase::Planting,
                Phase::Lifting,
                Phase::Swinging,
                Phase::Planting,
            ]
        );
        // Each tripod group goes through the air exactly once
        assert_eq!(frames[0].group, Tripod::A);
        assert_eq!(frames[3].group, Tripod::B);

        // Closed stride: every coxa back at its pre-cycle value
        for leg in 0..LEG_COUNT {
            assert!(
                frames[5].angles[leg].coxa.abs() < 1e-2,
                "leg {leg} coxa {} not recentered",
                frames[5].angles[leg].coxa
            );
        }
        assert!(!seq.is_active());
    }

    #[test]
    fn swing_moves_groups_in_opposition() {
        let mut seq = sequencer();
        seq.apply(GaitCommand::Forward(1));
        seq.next_frame().unwrap(); // lift
        let swing = seq.next_frame().unwrap().unwrap();
        assert_eq!(swing.phase, Phase::Swinging);

        let stride = seq.params().stride_deg();
        for leg in 0..LEG_COUNT {
            let expected = if Tripod::A.contains(leg) { stride } else { -stride };
            assert!(
                (swing.angles[leg].coxa - expected).abs() < 0.1,
                "leg {leg}: {} vs {expected}",
                swing.angles[leg].coxa
            );
        }
    }

    #[test]
    fn lifted_legs_bend_on_lift_frames() {
        let mut seq = sequencer();
        seq.apply(GaitCommand::Forward(1));
        let lift = seq.next_frame().unwrap().unwrap();
        assert_eq!(lift.phase, Phase::Lifting);

        for leg in 0..LEG_COUNT {
            if Tripod::A.contains(leg) {
                // Raised foot pulls the femur up (negative) and bends the knee
                assert!(lift.angles[leg].femur < -5.0, "leg {leg} femur");
            } else {
                assert!(lift.angles[leg].femur.abs() < 0.2, "support leg {leg} femur");
            }
        }
    }

    #[test]
    fn turn_swings_sides_in_opposite_directions() {
        let mut seq = sequencer();
        seq.apply(GaitCommand::Left(1));
        seq.next_frame().unwrap(); // lift
        let swing = seq.next_frame().unwrap().unwrap();

        let stride = seq.params().stride_deg();
        // Aerial group A: legs 0 (x > 0) and 3, 4 (x < 0)
        assert!((swing.angles[0].coxa - stride).abs() < 0.1);
        assert!((swing.angles[3].coxa + stride).abs() < 0.1);
        assert!((swing.angles[4].coxa + stride).abs() < 0.1);
        // Support group B retracts with opposite signs per side
        assert!((swing.angles[1].coxa + stride).abs() < 0.1);
        assert!((swing.angles[2].coxa + stride).abs() < 0.1);
        assert!((swing.angles[5].coxa - stride).abs() < 0.1);
    }

    #[test]
    fn newest_command_wins_before_execution() {
        let mut seq = sequencer();
        seq.apply(GaitCommand::Forward(5));
        seq.apply(GaitCommand::Back(1));
        seq.next_frame().unwrap(); // lift
        let swing = seq.next_frame().unwrap().unwrap();
        // Back: aerial group swings negative
        assert!(swing.angles[0].coxa < 0.0);
        drain(&mut seq);
        assert!(!seq.is_active());
    }

    #[test]
    fn stop_mid_swing_plants_without_further_coxa_change() {
        let mut seq = sequencer();
        seq.apply(GaitCommand::Forward(10));
        seq.next_frame().unwrap(); // lift
        let swing = seq.next_frame().unwrap().unwrap();
        assert_eq!(swing.phase, Phase::Swinging);

        seq.apply(GaitCommand::Stop);
        let plant = seq.next_frame().unwrap().unwrap();
        assert_eq!(plant.phase, Phase::Planting);
        for leg in Tripod::A.legs() {
            assert_eq!(plant.angles[leg].coxa, swing.angles[leg].coxa, "leg {leg}");
        }

        // Once planted the gait is idle; the remaining steps are dropped
        assert!(seq.next_frame().unwrap().is_none());
        assert!(!seq.is_active());
    }

    #[test]
    fn stop_during_lift_skips_the_swing() {
        let mut seq = sequencer();
        seq.apply(GaitCommand::Forward(10));
        let lift = seq.next_frame().unwrap().unwrap();
        seq.apply(GaitCommand::Stop);
        let plant = seq.next_frame().unwrap().unwrap();
        assert_eq!(plant.phase, Phase::Planting);
        for leg in 0..LEG_COUNT {
            assert_eq!(plant.angles[leg].coxa, lift.angles[leg].coxa);
        }
        assert!(seq.next_frame().unwrap().is_none());
    }

    #[test]
    fn faster_compounds_instead_of_resetting() {
        let mut seq = sequencer();
        let before = seq.params().step_delay_ms();
        for _ in 0..3 {
            seq.apply(GaitCommand::Faster);
        }
        let expected = before / (config::PARAM_SCALE * config::PARAM_SCALE * config::PARAM_SCALE);
        assert!((seq.params().step_delay_ms() - expected).abs() < 1e-3);
    }

    #[test]
    fn parameters_clamp_to_safe_ranges() {
        let mut seq = sequencer();
        for _ in 0..60 {
            seq.apply(GaitCommand::More);
            seq.apply(GaitCommand::Slower);
            seq.apply(GaitCommand::Lower);
        }
        assert_eq!(seq.params().stride_deg(), config::STRIDE_RANGE_DEG.1);
        assert_eq!(seq.params().step_delay_ms(), config::STEP_DELAY_RANGE_MS.1);
        assert_eq!(seq.params().lift_mm(), config::LIFT_RANGE_MM.0);
    }

    #[test]
    fn unreachable_frame_aborts_fail_stationary() {
        // Stubby legs that cannot reach the commanded lift height
        let geom = HexGeometry::new(
            45.0,
            LegLinks {
                coxa: 35.0,
                femur: 20.0,
                tibia: 30.0,
            },
        );
        let mut seq = GaitSequencer::new(geom);
        seq.params.lift_mm = 100.0;

        let before = *seq.last_angles();
        seq.apply(GaitCommand::Forward(1));
        assert!(seq.next_frame().is_err());

        // Previous commanded angles still in place, gait idle, swing reset
        assert_eq!(*seq.last_angles(), before);
        assert!(!seq.is_active());
        assert!(seq.next_frame().unwrap().is_none());
        assert_eq!(seq.swing_deg, [0.0; LEG_COUNT]);
    }

    #[test]
    fn preempted_walks_keep_swing_inside_the_safe_band() {
        let mut seq = sequencer();
        seq.apply(GaitCommand::Forward(20));

        // Reverse direction at every half-step boundary; the inherited
        // offsets must stay inside the hard swing band
        let mut forward = true;
        let mut max_coxa: f32 = 0.0;
        for _ in 0..40 {
            let frame = seq.next_frame().unwrap().unwrap();
            for a in frame.angles {
                max_coxa = max_coxa.max(a.coxa.abs());
            }
            if frame.phase == Phase::Planting {
                forward = !forward;
                seq.apply(if forward {
                    GaitCommand::Forward(20)
                } else {
                    GaitCommand::Back(20)
                });
            }
        }
        assert!(
            max_coxa <= config::SWING_LIMIT_DEG + 0.1,
            "max |coxa| commanded: {max_coxa}"
        );
    }

    #[test]
    fn abort_mid_step_restores_the_last_good_frame() {
        let mut seq = sequencer();
        seq.apply(GaitCommand::Forward(1));
        let lift = seq.next_frame().unwrap().unwrap();
        let swing = seq.next_frame().unwrap().unwrap();
        assert!((swing.angles[0].coxa - lift.angles[0].coxa).abs() > 1.0);

        // Actuation rejected the swing frame: the lift frame is the last
        // stance actually taken, and that is what must be reported
        seq.abort_step();
        assert_eq!(*seq.last_angles(), lift.angles);
        assert!(!seq.is_active());
        assert_eq!(seq.swing_deg, [0.0; LEG_COUNT]);
    }

    #[test]
    fn set_pose_reposes_planted_stance() {
        let mut seq = sequencer();
        let angles = seq
            .set_pose(BodyPose {
                z: 15.0,
                ..Default::default()
            })
            .unwrap();
        for a in angles {
            assert!(a.femur > 0.0);
            assert!(a.coxa.abs() < 1e-2);
        }
        assert_eq!(*seq.last_angles(), angles);
    }

    #[test]
    fn apply_command_parses_and_rejects() {
        let mut seq = sequencer();
        seq.apply_command("forward 2").unwrap();
        assert!(seq.is_active());
        assert!(matches!(
            seq.apply_command("gallop"),
            Err(GaitError::Parse(_))
        ));
    }

    #[test]
    fn park_stance_folds_the_knees() {
        for a in park_stance() {
            assert_eq!(a.femur, config::PARK_FEMUR_DEG);
            assert_eq!(a.tibia, config::PARK_TIBIA_DEG);
            assert_eq!(a.coxa, 0.0);
        }
    }
}
