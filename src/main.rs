//! Roll Arena headless entry point
//!
//! Runs a scripted pacman level and a bot battle at the fixed timestep and
//! logs what happened. Usage: `roll-arena [easy|normal|hard] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Roll Arena (headless) starting...");

    let mut args = std::env::args().skip(1);
    let difficulty = args
        .next()
        .and_then(|s| roll_arena::Difficulty::from_str(&s))
        .unwrap_or_default();
    let settings = roll_arena::Settings::from_preset(difficulty);

    let tuning = match args.next() {
        Some(path) => match load_tuning(&path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        },
        None => roll_arena::Tuning::default(),
    };
    log::info!("difficulty: {}", difficulty.as_str());

    demo::run_level(&settings, &tuning);
    demo::run_battle(&settings, &tuning);
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn load_tuning(path: &str) -> Result<roll_arena::Tuning, String> {
    let json = std::fs::read_to_string(path).map_err(|e| format!("reading {path}: {e}"))?;
    roll_arena::Tuning::from_json(&json).map_err(|e| format!("{path}: {e}"))
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::{Vec2, Vec3};
    use roll_arena::consts::SIM_DT;
    use roll_arena::sim::{
        Aabb, BattlePhase, BattleSimulator, GameEvent, GameSession, GridCell, Level, LevelEntity,
        LevelMode, SessionPhase, TickInput,
    };
    use roll_arena::{Settings, Tuning, planar};

    /// Ten simulated seconds per scripted run
    const MAX_FRAMES: usize = 600;

    fn demo_level() -> Level {
        Level::new(LevelMode::Pacman, 10.0)
            .with_spawn(Vec3::new(-8.0, 0.5, 0.0))
            .with(LevelEntity::obstacle(Aabb::new(
                Vec3::new(-3.0, 0.0, 2.0),
                Vec3::new(-1.0, 3.0, 4.0),
            )))
            .with(LevelEntity::collectible(Vec3::new(-4.0, 0.5, 0.0)))
            .with(LevelEntity::collectible(Vec3::new(0.0, 0.5, 0.0)))
            .with(LevelEntity::collectible(Vec3::new(4.0, 0.5, 4.0)))
            .with(LevelEntity::Ghost {
                position: Vec3::new(4.0, 0.5, -6.0),
            })
            .with(LevelEntity::portal(Vec3::new(8.0, 0.0, -8.0), GridCell::new(0, 0)))
            .with(LevelEntity::exit(Vec3::new(8.0, 0.5, 8.0)))
    }

    /// Steer toward each waypoint in turn until the session leaves `Playing`
    pub fn run_level(settings: &Settings, tuning: &Tuning) {
        let route = [
            Vec2::new(-4.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(8.0, 8.0),
        ];
        let mut session = GameSession::new(
            demo_level(),
            settings.difficulty.starting_lives(),
            tuning.collision.clone(),
        );
        session.on_level_complete(|score| log::info!("level complete callback, score {score}"));
        session.on_game_over(|score| log::info!("game over callback, score {score}"));

        let mut next = 0;
        for frame in 0..MAX_FRAMES {
            let here = planar(session.avatar().position);
            if next < route.len() - 1 && here.distance(route[next]) < 0.5 {
                next += 1;
            }
            let velocity = planar(session.avatar().velocity);
            // Aim ahead of the drift so the ball does not orbit the waypoint
            let input = TickInput {
                move_dir: (route[next] - here - velocity * 0.5).normalize_or_zero(),
                jump: false,
            };
            session.update(SIM_DT, &input);

            for event in session.drain_events() {
                log::debug!("frame {frame}: {event:?}");
            }
            if session.phase() != SessionPhase::Playing {
                log::info!("level ended after {frame} frames: {:?}", session.phase());
                break;
            }
        }
        log::info!(
            "level score {}, lives {}, items left {}",
            session.score(),
            session.avatar().lives(),
            session.level().remaining_collectibles()
        );
    }

    pub fn run_battle(settings: &Settings, tuning: &Tuning) {
        let mut sim = BattleSimulator::new(tuning.battle.clone(), settings.seed);
        sim.set_victory_callback(|| log::info!("victory callback"));
        sim.set_defeat_callback(|| log::info!("defeat callback"));
        sim.start_battle(settings.difficulty.battle_level(), settings.bot_count());

        for frame in 0..(MAX_FRAMES * 7) {
            // Charge the nearest bot
            if let Some(player) = sim.balls().first().filter(|b| b.alive) {
                let me = planar(player.position);
                let target = sim
                    .balls()
                    .iter()
                    .skip(1)
                    .filter(|b| b.alive)
                    .map(|b| planar(b.position))
                    .min_by(|a, b| a.distance(me).total_cmp(&b.distance(me)));
                sim.set_player_input(target.map_or(Vec2::ZERO, |t| (t - me).normalize_or_zero()));
            }
            sim.update(SIM_DT);

            for event in sim.drain_events() {
                match event {
                    GameEvent::Victory | GameEvent::Defeat { .. } => {
                        log::info!("frame {frame}: {event:?}")
                    }
                    _ => log::debug!("frame {frame}: {event:?}"),
                }
            }
            if sim.phase().is_finished() {
                break;
            }
        }
        let (players, enemies) = sim.alive_counts();
        log::info!(
            "battle {:?} after {:.1}s, players {players}, bots {enemies}",
            sim.phase(),
            sim.round_timer()
        );
        if sim.phase() != BattlePhase::Waiting {
            sim.cleanup();
        }
    }
}
