//! Voxel sandbox world engine core.
//!
//! Owns chunk streaming, generation, persistence, physics, and the player
//! interaction surface. Rendering, audio, input capture, and asset loading
//! are external collaborators (§6) — this crate never opens a window.

pub mod block;
pub mod config;
pub mod constants;
pub mod coords;
pub mod effects;
pub mod error;
pub mod explosion;
pub mod noise;
pub mod persistence;
pub mod physics;
pub mod player;
pub mod worker;
pub mod world;

pub use block::{BlockId, BlockProperties, BlockRegistry};
pub use config::EngineConfig;
pub use coords::{ChunkPos, VoxelPos};
pub use error::{EngineError, EngineResult, ErrorContext};
pub use physics::{MovementInput, PlayerState};
pub use player::PlayerController;
pub use world::World;

use std::sync::Arc;
use std::time::Duration;

/// Initialize the `log` subscriber from the environment (`RUST_LOG`). A
/// host binary is expected to call this once at startup before
/// constructing an `Engine`, the same way the teacher's own binaries call
/// `env_logger::init()` from `main`; `try_init` is used instead so a host
/// that already installed its own subscriber doesn't get a panic.
pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// Top-level façade wiring the world, player, explosions, and effect pools
/// together. A host application (windowing + rendering + audio, all out of
/// scope here) owns one of these and calls `update` once per frame.
pub struct Engine {
    config: EngineConfig,
    registry: Arc<BlockRegistry>,
    world: World,
    player: PlayerController,
    explosions: explosion::ExplosionService,
    effects: effects::EffectPools,
    pending_chain: Vec<(world::BlockKey, Duration)>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let seed = config.resolved_seed();
        log::info!("[Engine::new] starting world with seed {seed}");

        let registry = Arc::new(BlockRegistry::with_defaults());
        let persistence = persistence::PersistenceService::open(&config.save_path);
        let world = World::new(seed, registry.clone(), persistence, config.render_distance as i32);

        let spawn = PlayerController::find_spawn(seed, &mut rand::thread_rng());
        let player = PlayerController::new(spawn);

        log::info!("[Engine::new] spawn selected at ({:.1}, {:.1}, {:.1})", spawn.x, spawn.y, spawn.z);

        Self {
            config,
            registry,
            world,
            player,
            explosions: explosion::ExplosionService::new(),
            effects: effects::EffectPools::new(),
            pending_chain: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    /// Drive one frame: chunk streaming, player movement, chest/effect
    /// ticking, and any due explosion chain reactions. Never blocks (§5).
    pub fn update(&mut self, input: MovementInput, mouse_delta: (f32, f32), dt: f32) {
        self.player.apply_mouse_delta(mouse_delta.0, mouse_delta.1);

        let focus = VoxelPos::from_f32(self.player.state.position.x, self.player.state.position.y, self.player.state.position.z);
        self.world.update(focus);

        self.player.tick_physics(input, &self.world, dt);
        self.player.tick_chests(dt);
        self.effects.tick(dt);

        let chain = self.explosions.poll_and_apply(&mut self.world);
        self.pending_chain.extend(chain);
        self.advance_due_chain_reactions(dt);
    }

    fn advance_due_chain_reactions(&mut self, dt: f32) {
        let dt = Duration::from_secs_f32(dt);
        let mut remaining = Vec::new();
        for (key, delay) in self.pending_chain.drain(..) {
            if delay <= dt {
                self.trigger_explosion(key, constants::explosion::DEFAULT_RADIUS);
            } else {
                remaining.push((key, delay - dt));
            }
        }
        self.pending_chain = remaining;
    }

    pub fn trigger_explosion(&mut self, center: world::BlockKey, radius: i32) {
        let eye = (center.0 as f32 + 0.5, center.1 as f32 + 0.5, center.2 as f32 + 0.5);
        self.explosions.trigger(&self.world, center, radius);
        self.effects.spawn_explosion_effect(cgmath::Point3::new(eye.0, eye.1, eye.2), radius as f32);
    }

    pub fn mine_at_crosshair(&mut self) {
        self.player.primary_interact(&mut self.world);
    }

    pub fn place_at_crosshair(&mut self) {
        self.player.secondary_interact(&mut self.world);
    }

    pub fn effects(&self) -> &effects::EffectPools {
        &self.effects
    }
}
