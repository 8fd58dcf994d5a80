//! The pinball table: walls, bumpers, flippers and the ball.

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use super::{
    BALL_RADIUS, BALL_RESTITUTION, CAPTURE_FRAME_TOP, FIELD_HEIGHT, FIELD_WIDTH,
    FLIPPER_LENGTH, FLIPPER_MOTOR_SPEED, FLIPPER_RESTITUTION, GAME_OVER_HEIGHT, GRAVITY,
    MAX_BALL_SPEED, SUBSTEPS,
};
use crate::{
    agent::{BallSnapshot, MAX_REWARD, MIN_REWARD, Vec2},
    ports::{Environment, FlipperControl, StepOutcome},
};

/// What a circular obstacle does to the ball.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BumperKind {
    /// Pays out a reward on every hit
    Pin { reward: f64 },
    /// Throws the ball away from its centre, no reward
    Kicker { impulse: f64 },
}

/// A circular obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bumper {
    pub center: Vec2,
    pub radius: f64,
    pub kind: BumperKind,
}

/// A motor-driven flipper pivoting around `pivot`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flipper {
    pub pivot: Vec2,
    pub length: f64,
    rest_angle: f64,
    active_angle: f64,
    angle: f64,
    angular_velocity: f64,
    enabled: bool,
}

impl Flipper {
    pub fn new(pivot: Vec2, length: f64, rest_angle: f64, active_angle: f64) -> Self {
        Self {
            pivot,
            length,
            rest_angle,
            active_angle,
            angle: rest_angle,
            angular_velocity: 0.0,
            enabled: false,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn tip(&self) -> Vec2 {
        self.pivot + Vec2::new(self.angle.cos(), self.angle.sin()) * self.length
    }

    /// Move towards the active angle while enabled, back to rest otherwise.
    fn advance(&mut self, dt: f64) {
        let target = if self.enabled {
            self.active_angle
        } else {
            self.rest_angle
        };
        let gap = target - self.angle;
        let max_turn = FLIPPER_MOTOR_SPEED * dt;
        let turn = gap.clamp(-max_turn, max_turn);
        self.angle += turn;
        self.angular_velocity = if dt > 0.0 { turn / dt } else { 0.0 };
    }

    /// Velocity of the flipper surface at `point`.
    fn surface_velocity(&self, point: Vec2) -> Vec2 {
        (point - self.pivot).perp() * self.angular_velocity
    }
}

/// Static geometry of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub walls: Vec<(Vec2, Vec2)>,
    pub bumpers: Vec<Bumper>,
    pub launch_position: Vec2,
}

impl Default for TableLayout {
    fn default() -> Self {
        let (w, h) = (FIELD_WIDTH, FIELD_HEIGHT);
        let inlane_top = 0.75 * h;
        let flipper_y = 0.875 * h;
        Self {
            walls: vec![
                (Vec2::new(0.0, 0.0), Vec2::new(w, 0.0)),
                (Vec2::new(0.0, 0.0), Vec2::new(0.0, inlane_top)),
                (Vec2::new(w, 0.0), Vec2::new(w, inlane_top)),
                (Vec2::new(0.0, inlane_top), Vec2::new(h / 8.0, flipper_y)),
                (Vec2::new(w, inlane_top), Vec2::new(3.0 * h / 8.0, flipper_y)),
            ],
            bumpers: vec![
                pin(0.15, 0.30, MAX_REWARD),
                pin(0.35, 0.30, MAX_REWARD),
                pin(0.25, 0.18, 0.8),
                pin(0.25, 0.42, 0.8),
                kicker(0.06, 0.62, 1.2),
                kicker(0.44, 0.62, 1.2),
            ],
            launch_position: Vec2::new(0.75 * w, h / 2.0),
        }
    }
}

fn pin(x: f64, y: f64, reward: f64) -> Bumper {
    Bumper {
        center: Vec2::new(x, y),
        radius: 0.02,
        kind: BumperKind::Pin { reward },
    }
}

fn kicker(x: f64, y: f64, impulse: f64) -> Bumper {
    Bumper {
        center: Vec2::new(x, y),
        radius: 0.02,
        kind: BumperKind::Kicker { impulse },
    }
}

/// The simulated machine.
#[derive(Debug, Clone)]
pub struct PinballTable {
    layout: TableLayout,
    left: Flipper,
    right: Flipper,
    position: Vec2,
    velocity: Vec2,
    drained: bool,
    rng: StdRng,
}

impl Default for PinballTable {
    fn default() -> Self {
        Self::new(TableLayout::default(), StdRng::from_rng(&mut rand::rng()))
    }
}

impl PinballTable {
    pub fn new(layout: TableLayout, rng: StdRng) -> Self {
        let h = FIELD_HEIGHT;
        let flipper_y = 0.875 * h;
        let mut table = Self {
            left: Flipper::new(Vec2::new(h / 8.0, flipper_y), FLIPPER_LENGTH, 0.5, -0.3),
            right: Flipper::new(
                Vec2::new(3.0 * h / 8.0, flipper_y),
                FLIPPER_LENGTH,
                std::f64::consts::PI - 0.5,
                std::f64::consts::PI + 0.3,
            ),
            position: layout.launch_position,
            velocity: Vec2::default(),
            drained: false,
            layout,
            rng,
        };
        table.respawn_ball();
        table
    }

    /// Default layout with a deterministic launch sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(TableLayout::default(), StdRng::seed_from_u64(seed))
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    pub fn left_flipper(&self) -> &Flipper {
        &self.left
    }

    pub fn right_flipper(&self) -> &Flipper {
        &self.right
    }

    /// Place the ball somewhere with a given velocity (mainly for tests).
    pub fn place_ball(&mut self, position: Vec2, velocity: Vec2) {
        self.position = position;
        self.velocity = velocity;
        self.drained = false;
    }

    fn substep(&mut self, dt: f64, outcome: &mut StepOutcome) {
        self.left.advance(dt);
        self.right.advance(dt);

        self.velocity.y += GRAVITY * dt;
        let speed = self.velocity.length();
        if speed > MAX_BALL_SPEED {
            self.velocity = self.velocity * (MAX_BALL_SPEED / speed);
        }
        self.position = self.position + self.velocity * dt;

        for i in 0..self.layout.walls.len() {
            let (a, b) = self.layout.walls[i];
            let contact = closest_point(self.position, a, b);
            self.collide(contact, Vec2::default(), BALL_RESTITUTION);
        }

        for flipper in [self.left, self.right] {
            let contact = closest_point(self.position, flipper.pivot, flipper.tip());
            self.collide(contact, flipper.surface_velocity(contact), FLIPPER_RESTITUTION);
        }

        for i in 0..self.layout.bumpers.len() {
            let bumper = self.layout.bumpers[i];
            let offset = self.position - bumper.center;
            let distance = offset.length();
            if distance <= f64::EPSILON || distance >= bumper.radius + BALL_RADIUS {
                continue;
            }
            let normal = offset * (1.0 / distance);
            let contact = bumper.center + normal * bumper.radius;
            if !self.collide(contact, Vec2::default(), BALL_RESTITUTION) {
                continue;
            }
            match bumper.kind {
                BumperKind::Pin { reward } => outcome.rewards.push(reward),
                BumperKind::Kicker { impulse } => self.velocity = self.velocity + normal * impulse,
            }
        }

        if self.position.y + BALL_RADIUS >= FIELD_HEIGHT - GAME_OVER_HEIGHT {
            self.drained = true;
            outcome.game_over = true;
            outcome.rewards.push(MIN_REWARD);
            debug!(x = self.position.x, "ball drained");
        }
    }

    /// Push the ball out of `contact` and reflect it if it was approaching.
    ///
    /// Returns whether an impact happened.
    fn collide(&mut self, contact: Vec2, surface_velocity: Vec2, restitution: f64) -> bool {
        let offset = self.position - contact;
        let distance = offset.length();
        if distance >= BALL_RADIUS || distance <= f64::EPSILON {
            return false;
        }
        let normal = offset * (1.0 / distance);
        self.position = contact + normal * BALL_RADIUS;

        let approach = (self.velocity - surface_velocity).dot(normal);
        if approach >= 0.0 {
            return false;
        }
        self.velocity = self.velocity - normal * ((1.0 + restitution) * approach);
        true
    }
}

fn closest_point(point: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let length_sq = ab.dot(ab);
    if length_sq <= f64::EPSILON {
        return a;
    }
    let t = ((point - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    a + ab * t
}

impl FlipperControl for PinballTable {
    fn set_left_flipper(&mut self, enabled: bool) {
        self.left.enabled = enabled;
    }

    fn set_right_flipper(&mut self, enabled: bool) {
        self.right.enabled = enabled;
    }
}

impl Environment for PinballTable {
    fn step(&mut self, dt: f64) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        if self.drained {
            return outcome;
        }
        let sub_dt = dt / f64::from(SUBSTEPS);
        for _ in 0..SUBSTEPS {
            self.substep(sub_dt, &mut outcome);
            if self.drained {
                break;
            }
        }
        outcome
    }

    fn snapshot(&self) -> BallSnapshot {
        BallSnapshot {
            position: self.position,
            velocity: self.velocity,
            left_flipper_active: self.left.enabled,
            right_flipper_active: self.right.enabled,
        }
    }

    fn respawn_ball(&mut self) {
        self.position = self.layout.launch_position;
        self.velocity = Vec2::new(self.rng.random_range(-0.5..0.5), 0.0);
        self.drained = false;
    }

    fn in_capture_frame(&self) -> bool {
        self.position.y >= CAPTURE_FRAME_TOP
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    #[test]
    fn test_ball_falls_under_gravity() {
        let mut table = PinballTable::with_seed(1);
        table.place_ball(Vec2::new(0.25, 0.1), Vec2::default());
        table.step(DT);
        let snapshot = table.snapshot();
        assert!(snapshot.position.y > 0.1);
        assert!(snapshot.velocity.y > 0.0);
    }

    #[test]
    fn test_ball_in_center_gap_drains() {
        let mut table = PinballTable::with_seed(2);
        table.place_ball(Vec2::new(0.25, 0.9), Vec2::new(0.0, 1.0));
        let mut drained = false;
        for _ in 0..120 {
            let outcome = table.step(DT);
            if outcome.game_over {
                assert_eq!(outcome.rewards.last(), Some(&MIN_REWARD));
                drained = true;
                break;
            }
        }
        assert!(drained);
        assert!(table.step(DT).rewards.is_empty());
    }

    #[test]
    fn test_pin_hit_pays_reward() {
        let mut table = PinballTable::with_seed(3);
        let pin = table.layout().bumpers[0];
        table.place_ball(pin.center - Vec2::new(0.0, 0.06), Vec2::new(0.0, 2.0));
        let mut rewards = Vec::new();
        for _ in 0..30 {
            rewards.extend(table.step(DT).rewards);
        }
        assert!(rewards.contains(&MAX_REWARD));
    }

    #[test]
    fn test_side_wall_keeps_ball_inside() {
        let mut table = PinballTable::with_seed(4);
        table.place_ball(Vec2::new(0.05, 0.1), Vec2::new(-3.0, 0.0));
        for _ in 0..20 {
            table.step(DT);
            assert!(table.snapshot().position.x >= 0.0);
        }
    }

    #[test]
    fn test_flipper_motor_raises_flipper() {
        let mut table = PinballTable::with_seed(5);
        let rest = table.left_flipper().angle();
        table.set_left_flipper(true);
        for _ in 0..10 {
            table.step(DT);
        }
        assert!(table.left_flipper().angle() < rest);
        assert!(table.snapshot().left_flipper_active);

        table.set_left_flipper(false);
        for _ in 0..30 {
            table.step(DT);
        }
        assert!((table.left_flipper().angle() - rest).abs() < 1e-9);
    }

    #[test]
    fn test_respawn_clears_drain() {
        let mut table = PinballTable::with_seed(6);
        table.place_ball(Vec2::new(0.25, 0.98), Vec2::new(0.0, 1.0));
        assert!(table.step(DT).game_over);
        table.respawn_ball();
        let snapshot = table.snapshot();
        assert_eq!(snapshot.position, table.layout().launch_position);
        assert!(!table.in_capture_frame());
    }
}
