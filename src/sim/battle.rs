//! Sumo battle simulator
//!
//! One player ball and a handful of bots on a round arena. Balls are pushed
//! by input or seek forces, knocked about by pairwise contacts, and
//! eliminated once they fall below the arena. The round ends in exactly one
//! victory or defeat.

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::GameEvent;
use crate::consts::COUNTDOWN_SECONDS;
use crate::tuning::BattleTuning;
use crate::{accepts_dt, from_planar, planar};

/// Battle state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattlePhase {
    /// No round loaded
    Waiting,
    /// Balls placed; simulation blocked until the count reaches zero
    Countdown,
    Active,
    Won,
    Lost,
}

impl BattlePhase {
    pub fn is_finished(self) -> bool {
        matches!(self, BattlePhase::Won | BattlePhase::Lost)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleBall {
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: f32,
    pub alive: bool,
    pub player_controlled: bool,
    /// Rolling angle around X and Z, cosmetic only
    pub rotation: Vec2,
    /// Unit planar direction the bot is currently pushing toward
    seek_dir: Vec2,
    /// Seconds until the bot refreshes `seek_dir`
    retarget_timer: f32,
}

impl BattleBall {
    fn new(position: Vec3, player_controlled: bool) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            mass: 1.0,
            alive: true,
            player_controlled,
            rotation: Vec2::ZERO,
            seek_dir: Vec2::ZERO,
            retarget_timer: 0.0,
        }
    }
}

/// Height slack when deciding whether a ball was resting on the arena
const GROUND_EPSILON: f32 = 1e-3;

type Callback = Box<dyn FnMut()>;

pub struct BattleSimulator {
    tuning: BattleTuning,
    phase: BattlePhase,
    /// Index 0 is the player once a round is started
    balls: Vec<BattleBall>,
    players_alive: u32,
    enemies_alive: u32,
    round_timer: f32,
    countdown_remaining: u32,
    countdown_timer: f32,
    bot_force: f32,
    player_input: Vec2,
    rng: Pcg32,
    events: Vec<GameEvent>,
    on_victory: Option<Callback>,
    on_defeat: Option<Callback>,
}

impl BattleSimulator {
    pub fn new(tuning: BattleTuning, seed: u64) -> Self {
        Self {
            tuning,
            phase: BattlePhase::Waiting,
            balls: Vec::new(),
            players_alive: 0,
            enemies_alive: 0,
            round_timer: 0.0,
            countdown_remaining: 0,
            countdown_timer: 0.0,
            bot_force: 0.0,
            player_input: Vec2::ZERO,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            on_victory: None,
            on_defeat: None,
        }
    }

    pub fn set_victory_callback(&mut self, f: impl FnMut() + 'static) {
        self.on_victory = Some(Box::new(f));
    }

    pub fn set_defeat_callback(&mut self, f: impl FnMut() + 'static) {
        self.on_defeat = Some(Box::new(f));
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn balls(&self) -> &[BattleBall] {
        &self.balls
    }

    /// `(players_alive, enemies_alive)`
    pub fn alive_counts(&self) -> (u32, u32) {
        (self.players_alive, self.enemies_alive)
    }

    pub fn round_timer(&self) -> f32 {
        self.round_timer
    }

    pub fn tuning(&self) -> &BattleTuning {
        &self.tuning
    }

    /// Stick direction for the player ball, clamped to unit length
    pub fn set_player_input(&mut self, dir: Vec2) {
        self.player_input = if dir.is_finite() {
            dir.clamp_length_max(1.0)
        } else {
            Vec2::ZERO
        };
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Place one player and `bot_count` bots and begin the countdown.
    /// Higher levels give the bots a stronger push.
    pub fn start_battle(&mut self, level: u32, bot_count: usize) {
        let bot_count = if bot_count == 0 {
            log::warn!("battle started with no bots, using one");
            1
        } else {
            bot_count
        };
        let level = level.max(1);
        self.bot_force =
            self.tuning.bot_base_force + self.tuning.bot_force_per_level * (level - 1) as f32;

        let r = self.tuning.ball_radius;
        let ring = self.tuning.arena_radius * 0.5;

        self.balls.clear();
        self.balls
            .push(BattleBall::new(Vec3::new(0.0, r, ring), true));
        for i in 0..bot_count {
            // Bots fan out over the far half of the arena
            let t = (i as f32 + 0.5) / bot_count as f32;
            let angle = std::f32::consts::PI * (1.0 + t);
            let jitter = Vec2::new(
                self.rng.random_range(-0.5..0.5),
                self.rng.random_range(-0.5..0.5),
            );
            let spot = Vec2::new(angle.cos(), angle.sin()) * ring + jitter;
            let mut bot = BattleBall::new(from_planar(spot, r), false);
            bot.retarget_timer = self.rng.random_range(0.0..=self.tuning.bot_retarget_interval);
            self.balls.push(bot);
        }

        self.players_alive = 1;
        self.enemies_alive = bot_count as u32;
        self.round_timer = 0.0;
        self.player_input = Vec2::ZERO;
        self.events.clear();

        self.countdown_remaining = COUNTDOWN_SECONDS;
        self.countdown_timer = 1.0;
        self.phase = BattlePhase::Countdown;
        self.events.push(GameEvent::Countdown {
            remaining: self.countdown_remaining,
        });
        log::info!("battle level {level} starting with {bot_count} bots");
    }

    /// Drop every ball and return to `Waiting`
    pub fn cleanup(&mut self) {
        self.balls.clear();
        self.players_alive = 0;
        self.enemies_alive = 0;
        self.round_timer = 0.0;
        self.countdown_remaining = 0;
        self.player_input = Vec2::ZERO;
        self.phase = BattlePhase::Waiting;
    }

    pub fn update(&mut self, dt: f32) {
        if !accepts_dt(dt) {
            log::warn!("battle update skipped: bad dt {dt}");
            return;
        }
        match self.phase {
            BattlePhase::Countdown => self.tick_countdown(dt),
            BattlePhase::Active => self.tick_active(dt),
            BattlePhase::Waiting | BattlePhase::Won | BattlePhase::Lost => {}
        }
    }

    fn tick_countdown(&mut self, dt: f32) {
        self.countdown_timer -= dt;
        while self.countdown_timer <= 0.0 && self.phase == BattlePhase::Countdown {
            self.countdown_remaining = self.countdown_remaining.saturating_sub(1);
            if self.countdown_remaining > 0 {
                self.countdown_timer += 1.0;
                self.events.push(GameEvent::Countdown {
                    remaining: self.countdown_remaining,
                });
            } else {
                self.phase = BattlePhase::Active;
                self.events.push(GameEvent::BattleStarted);
                log::info!("battle started");
            }
        }
    }

    fn tick_active(&mut self, dt: f32) {
        self.round_timer += dt;
        // A timed-out round is lost no matter what else happens this tick
        if self.round_timer >= self.tuning.max_round_time {
            self.finish(BattlePhase::Lost, true);
            return;
        }

        self.integrate(dt);
        self.resolve_contacts();
        self.eliminate_fallen();

        if self.players_alive == 0 {
            self.finish(BattlePhase::Lost, false);
        } else if self.enemies_alive == 0 {
            self.finish(BattlePhase::Won, false);
        }
    }

    fn integrate(&mut self, dt: f32) {
        let t = &self.tuning;
        let player_pos = self
            .balls
            .iter()
            .find(|b| b.player_controlled && b.alive)
            .map(|b| planar(b.position));
        let rim = t.arena_radius - t.ball_radius;

        for ball in self.balls.iter_mut().filter(|b| b.alive) {
            let force = if ball.player_controlled {
                self.player_input * t.player_force
            } else {
                ball.retarget_timer -= dt;
                if ball.retarget_timer <= 0.0 {
                    ball.retarget_timer = t.bot_retarget_interval;
                    ball.seek_dir = player_pos
                        .and_then(|p| (p - planar(ball.position)).try_normalize())
                        .unwrap_or(Vec2::ZERO);
                }
                ball.seek_dir * self.bot_force
            };

            let prev_y = ball.position.y;
            let accel = force / ball.mass;
            ball.velocity.x += accel.x * dt;
            ball.velocity.z += accel.y * dt;
            ball.velocity.y += t.gravity * dt;
            ball.velocity.x *= t.friction;
            ball.velocity.z *= t.friction;
            ball.position += ball.velocity * dt;

            // Only the arena disc holds a ball up, and only one that started
            // the tick on or above its surface
            let on_arena = planar(ball.position).length() <= t.arena_radius;
            let was_supported = prev_y >= t.ball_radius - GROUND_EPSILON;
            if on_arena && was_supported && ball.position.y <= t.ball_radius {
                ball.position.y = t.ball_radius;
                if ball.velocity.y < 0.0 {
                    ball.velocity.y = 0.0;
                }
            }

            ball.rotation.x += ball.velocity.z * dt / t.ball_radius;
            ball.rotation.y -= ball.velocity.x * dt / t.ball_radius;

            let offset = planar(ball.position);
            if offset.length() > rim {
                if let Some(inward) = (-offset).try_normalize() {
                    ball.velocity.x += inward.x * t.containment_impulse;
                    ball.velocity.z += inward.y * t.containment_impulse;
                }
            }
        }
    }

    /// Pair order: the player against each bot, then bot pairs `i < j`
    fn resolve_contacts(&mut self) {
        let n = self.balls.len();
        for j in 1..n {
            self.collide_pair(0, j);
        }
        for i in 1..n {
            for j in (i + 1)..n {
                self.collide_pair(i, j);
            }
        }
    }

    fn collide_pair(&mut self, i: usize, j: usize) {
        let (head, tail) = self.balls.split_at_mut(j);
        let a = &mut head[i];
        let b = &mut tail[0];
        if !a.alive || !b.alive {
            return;
        }

        let delta = b.position - a.position;
        let distance = delta.length();
        let min_distance = self.tuning.ball_radius * 2.0;
        if distance >= min_distance {
            return;
        }
        let normal = delta.try_normalize().unwrap_or(Vec3::X);

        let half_overlap = (min_distance - distance) * 0.5;
        a.position -= normal * half_overlap;
        b.position += normal * half_overlap;

        let impulse = (a.velocity - b.velocity).dot(normal) * self.tuning.bounce_force;
        a.velocity -= normal * (impulse / a.mass);
        b.velocity += normal * (impulse / b.mass);
        log::debug!("balls {i} and {j} collided, impulse {impulse:.2}");
    }

    fn eliminate_fallen(&mut self) {
        for (index, ball) in self.balls.iter_mut().enumerate() {
            if !ball.alive || ball.position.y >= self.tuning.fall_threshold {
                continue;
            }
            ball.alive = false;
            ball.velocity = Vec3::ZERO;
            if ball.player_controlled {
                self.players_alive = self.players_alive.saturating_sub(1);
            } else {
                self.enemies_alive = self.enemies_alive.saturating_sub(1);
            }
            log::info!("ball {index} eliminated");
            self.events.push(GameEvent::BallEliminated {
                index,
                player: ball.player_controlled,
            });
        }
    }

    fn finish(&mut self, phase: BattlePhase, timed_out: bool) {
        self.phase = phase;
        match phase {
            BattlePhase::Won => {
                log::info!("battle won after {:.1}s", self.round_timer);
                self.events.push(GameEvent::Victory);
                if let Some(cb) = self.on_victory.as_mut() {
                    cb();
                }
            }
            _ => {
                log::info!("battle lost after {:.1}s (timeout: {timed_out})", self.round_timer);
                self.events.push(GameEvent::Defeat { timed_out });
                if let Some(cb) = self.on_defeat.as_mut() {
                    cb();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use std::cell::Cell;
    use std::rc::Rc;

    fn quiet_tuning() -> BattleTuning {
        BattleTuning {
            bot_base_force: 0.0,
            bot_force_per_level: 0.0,
            ..Default::default()
        }
    }

    /// Simulator already in the active phase with the given balls
    fn active_with(tuning: BattleTuning, balls: Vec<BattleBall>) -> BattleSimulator {
        let mut sim = BattleSimulator::new(tuning, 7);
        sim.players_alive = balls.iter().filter(|b| b.player_controlled).count() as u32;
        sim.enemies_alive = balls.iter().filter(|b| !b.player_controlled).count() as u32;
        sim.balls = balls;
        sim.phase = BattlePhase::Active;
        sim
    }

    fn skip_countdown(sim: &mut BattleSimulator) {
        while sim.phase() == BattlePhase::Countdown {
            sim.update(0.5);
        }
        assert_eq!(sim.phase(), BattlePhase::Active);
    }

    #[test]
    fn test_head_on_collision_flips_x_velocity() {
        let mut a = BattleBall::new(Vec3::new(-2.0, 1.0, 0.0), true);
        a.velocity = Vec3::new(5.0, 0.0, 0.0);
        let mut b = BattleBall::new(Vec3::new(2.0, 1.0, 0.0), false);
        b.velocity = Vec3::new(-5.0, 0.0, 0.0);
        let mut sim = active_with(quiet_tuning(), vec![a, b]);

        let mut flipped = false;
        for _ in 0..60 {
            sim.update(SIM_DT);
            let (a, b) = (&sim.balls()[0], &sim.balls()[1]);
            if a.velocity.x < 0.0 {
                assert!(b.velocity.x > 0.0, "both flip on the same tick");
                assert!(a.position.distance(b.position) >= 2.0 - 1e-4);
                flipped = true;
                break;
            }
            assert!(b.velocity.x < 0.0);
        }
        assert!(flipped);
    }

    #[test]
    fn test_fallen_ball_eliminated_once() {
        let player = BattleBall::new(Vec3::new(0.0, 1.0, 5.0), true);
        let bot_a = BattleBall::new(Vec3::new(-5.0, 1.0, -5.0), false);
        let bot_b = BattleBall::new(Vec3::new(5.0, 1.0, -5.0), false);
        let mut sim = active_with(quiet_tuning(), vec![player, bot_a, bot_b]);

        sim.balls[1].position.y = -11.0;
        sim.update(SIM_DT);
        assert!(!sim.balls()[1].alive);
        assert_eq!(sim.alive_counts(), (1, 1));

        for _ in 0..30 {
            sim.update(SIM_DT);
        }
        assert_eq!(sim.alive_counts(), (1, 1));
        let eliminations = sim
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::BallEliminated { .. }))
            .count();
        assert_eq!(eliminations, 1);
        assert_eq!(sim.phase(), BattlePhase::Active);
    }

    #[test]
    fn test_last_bot_falling_wins() {
        let player = BattleBall::new(Vec3::new(0.0, 1.0, 5.0), true);
        let bot = BattleBall::new(Vec3::new(0.0, -11.0, 0.0), false);
        let mut sim = active_with(quiet_tuning(), vec![player, bot]);
        let wins = Rc::new(Cell::new(0));
        let seen = wins.clone();
        sim.set_victory_callback(move || seen.set(seen.get() + 1));

        sim.update(SIM_DT);
        sim.update(SIM_DT);
        assert_eq!(sim.phase(), BattlePhase::Won);
        assert_eq!(wins.get(), 1);
    }

    #[test]
    fn test_timeout_beats_victory_in_same_tick() {
        let player = BattleBall::new(Vec3::new(0.0, 1.0, 5.0), true);
        let bot = BattleBall::new(Vec3::new(0.0, -11.0, 0.0), false);
        let mut sim = active_with(quiet_tuning(), vec![player, bot]);
        let eps = 0.01;
        sim.round_timer = sim.tuning().max_round_time - eps;

        let wins = Rc::new(Cell::new(0));
        let losses = Rc::new(Cell::new(0));
        let (w, l) = (wins.clone(), losses.clone());
        sim.set_victory_callback(move || w.set(w.get() + 1));
        sim.set_defeat_callback(move || l.set(l.get() + 1));

        sim.update(2.0 * eps);
        assert_eq!(sim.phase(), BattlePhase::Lost);
        assert_eq!((wins.get(), losses.get()), (0, 1));
        assert!(sim.drain_events().contains(&GameEvent::Defeat { timed_out: true }));

        // Terminal: further ticks do nothing
        sim.update(SIM_DT);
        assert_eq!(losses.get(), 1);
    }

    #[test]
    fn test_countdown_blocks_simulation() {
        let mut sim = BattleSimulator::new(BattleTuning::default(), 1);
        sim.start_battle(1, 2);
        assert_eq!(sim.phase(), BattlePhase::Countdown);
        let before: Vec<Vec3> = sim.balls().iter().map(|b| b.position).collect();

        sim.update(0.5);
        sim.update(0.9);
        assert_eq!(sim.phase(), BattlePhase::Countdown);
        let after: Vec<Vec3> = sim.balls().iter().map(|b| b.position).collect();
        assert_eq!(before, after);

        sim.update(0.9);
        sim.update(0.9);
        assert_eq!(sim.phase(), BattlePhase::Active);
        assert_eq!(
            sim.drain_events(),
            vec![
                GameEvent::Countdown { remaining: 3 },
                GameEvent::Countdown { remaining: 2 },
                GameEvent::Countdown { remaining: 1 },
                GameEvent::BattleStarted,
            ]
        );
    }

    #[test]
    fn test_balls_rest_on_arena() {
        let mut sim = BattleSimulator::new(BattleTuning::default(), 3);
        sim.start_battle(1, 1);
        skip_countdown(&mut sim);
        for _ in 0..30 {
            sim.update(SIM_DT);
        }
        for ball in sim.balls() {
            assert!((ball.position.y - 1.0).abs() < 1e-4, "{:?}", ball.position);
            assert!(ball.alive);
        }
    }

    #[test]
    fn test_slow_frames_keep_balls_on_arena() {
        let mut sim = BattleSimulator::new(BattleTuning::default(), 3);
        sim.start_battle(1, 1);
        skip_countdown(&mut sim);
        for _ in 0..4 {
            sim.update(0.25);
            for ball in sim.balls() {
                assert!((ball.position.y - 1.0).abs() < 1e-4, "{:?}", ball.position);
                assert!(ball.alive);
            }
        }
        assert_eq!(sim.phase(), BattlePhase::Active);
        assert_eq!(sim.alive_counts(), (1, 1));
    }

    #[test]
    fn test_one_second_frame_keeps_balls_on_arena() {
        let mut sim = BattleSimulator::new(BattleTuning::default(), 4);
        sim.start_battle(1, 1);
        skip_countdown(&mut sim);
        sim.update(1.0);
        assert_eq!(sim.phase(), BattlePhase::Active);
        assert!(sim.balls().iter().all(|b| b.alive && (b.position.y - 1.0).abs() < 1e-4));
    }

    #[test]
    fn test_bad_dt_is_a_no_op() {
        let mut sim = BattleSimulator::new(BattleTuning::default(), 9);
        sim.start_battle(1, 2);
        skip_countdown(&mut sim);
        sim.set_player_input(Vec2::X);
        sim.update(SIM_DT);
        sim.drain_events();

        let phase = sim.phase();
        let timer = sim.round_timer();
        let snapshot: Vec<(Vec3, Vec3, bool)> = sim
            .balls()
            .iter()
            .map(|b| (b.position, b.velocity, b.alive))
            .collect();
        for dt in [0.0, -1.0, 2.0, f32::NAN, f32::INFINITY] {
            sim.update(dt);
        }
        assert_eq!(sim.phase(), phase);
        assert_eq!(sim.round_timer(), timer);
        let after: Vec<(Vec3, Vec3, bool)> = sim
            .balls()
            .iter()
            .map(|b| (b.position, b.velocity, b.alive))
            .collect();
        assert_eq!(snapshot, after);
        assert!(sim.drain_events().is_empty());
    }

    #[test]
    fn test_bad_dt_does_not_advance_countdown() {
        let mut sim = BattleSimulator::new(BattleTuning::default(), 9);
        sim.start_battle(1, 1);
        sim.update(2.0);
        sim.update(f32::NAN);
        assert_eq!(sim.phase(), BattlePhase::Countdown);
        assert_eq!(sim.drain_events(), vec![GameEvent::Countdown { remaining: 3 }]);
    }

    #[test]
    fn test_ball_past_rim_falls_and_is_nudged_inward() {
        let tuning = quiet_tuning();
        let edge = tuning.arena_radius + 0.5;
        let player = BattleBall::new(Vec3::new(0.0, 1.0, 0.0), true);
        let bot = BattleBall::new(Vec3::new(edge, 1.0, 0.0), false);
        let mut sim = active_with(tuning, vec![player, bot]);

        sim.update(SIM_DT);
        let bot = &sim.balls()[1];
        assert!(bot.position.y < 1.0, "no ground past the rim");
        assert!(bot.velocity.x < 0.0, "containment pushes inward");
    }

    #[test]
    fn test_bots_seek_player() {
        let tuning = BattleTuning::default();
        let player = BattleBall::new(Vec3::new(0.0, 1.0, 5.0), true);
        let bot = BattleBall::new(Vec3::new(0.0, 1.0, -5.0), false);
        let mut sim = active_with(tuning, vec![player, bot]);
        sim.bot_force = sim.tuning().bot_base_force;
        sim.update(SIM_DT);
        assert!(sim.balls()[1].velocity.z > 0.0);
    }

    #[test]
    fn test_same_seed_same_battle() {
        let run = |seed| {
            let mut sim = BattleSimulator::new(BattleTuning::default(), seed);
            sim.start_battle(2, 3);
            skip_countdown(&mut sim);
            sim.set_player_input(Vec2::new(0.3, -1.0));
            for _ in 0..120 {
                sim.update(SIM_DT);
            }
            sim.balls().iter().map(|b| b.position).collect::<Vec<_>>()
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn test_cleanup_returns_to_waiting() {
        let mut sim = BattleSimulator::new(BattleTuning::default(), 5);
        sim.start_battle(1, 0);
        assert_eq!(sim.alive_counts(), (1, 1));
        sim.cleanup();
        assert_eq!(sim.phase(), BattlePhase::Waiting);
        assert!(sim.balls().is_empty());
        sim.update(SIM_DT);
        assert_eq!(sim.phase(), BattlePhase::Waiting);
    }
}
