//! Particle, explosion-visual, and tracer pools (spec §3, §4.9). These are
//! frame-rate independent, fixed-capacity pools; saturating them is not an
//! error, it just drops the newest request (no unbounded growth on a busy
//! frame).

use crate::constants::effects::*;
use cgmath::{Point3, Vector3};

#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub position: Point3<f32>,
    pub velocity: Vector3<f32>,
    pub remaining: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct ExplosionSphere {
    pub center: Point3<f32>,
    pub radius: f32,
    pub max_radius: f32,
    pub remaining: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct ExplosionBillboard {
    pub position: Point3<f32>,
    pub remaining: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Tracer {
    pub start: Point3<f32>,
    pub end: Point3<f32>,
    pub remaining: f32,
}

/// A capacity-bounded pool of timed effects. Spawning past capacity
/// silently drops the new entry — the surest sign this ever matters in
/// practice is a log line, not a panic.
pub struct Pool<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> Pool<T> {
    pub fn new(capacity: usize) -> Self {
        Self { items: Vec::with_capacity(capacity), capacity }
    }

    pub fn spawn(&mut self, item: T) {
        if self.items.len() >= self.capacity {
            log::debug!("effect pool saturated at capacity {}", self.capacity);
            return;
        }
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    fn retain_mut(&mut self, mut keep: impl FnMut(&mut T) -> bool) {
        self.items.retain_mut(|item| keep(item));
    }
}

pub struct EffectPools {
    pub particles: Pool<Particle>,
    pub explosion_billboards: Pool<ExplosionBillboard>,
    pub explosion_spheres: Pool<ExplosionSphere>,
    pub tracers: Pool<Tracer>,
}

impl EffectPools {
    pub fn new() -> Self {
        Self {
            particles: Pool::new(DIG_POOL_SIZE),
            explosion_billboards: Pool::new(EXPLOSION_BILLBOARD_POOL_SIZE),
            explosion_spheres: Pool::new(EXPLOSION_SPHERE_POOL_SIZE),
            tracers: Pool::new(32),
        }
    }

    pub fn spawn_dig_effect(&mut self, position: Point3<f32>) {
        self.particles.spawn(Particle { position, velocity: Vector3::new(0.0, 2.0, 0.0), remaining: 0.5 });
    }

    pub fn spawn_explosion_effect(&mut self, center: Point3<f32>, max_radius: f32) {
        self.explosion_billboards.spawn(ExplosionBillboard { position: center, remaining: 0.4 });
        self.explosion_spheres.spawn(ExplosionSphere { center, radius: 0.0, max_radius, remaining: 0.6 });
    }

    pub fn spawn_tracer(&mut self, start: Point3<f32>, end: Point3<f32>) {
        self.tracers.spawn(Tracer { start, end, remaining: 0.15 });
    }

    /// Advance every pool by `dt` and drop anything whose lifetime expired.
    pub fn tick(&mut self, dt: f32) {
        self.particles.retain_mut(|p| {
            p.position += p.velocity * dt;
            p.velocity.y -= 9.0 * dt;
            p.remaining -= dt;
            p.remaining > 0.0
        });
        self.explosion_billboards.retain_mut(|b| {
            b.remaining -= dt;
            b.remaining > 0.0
        });
        self.explosion_spheres.retain_mut(|s| {
            s.remaining -= dt;
            let progress = 1.0 - (s.remaining / 0.6).clamp(0.0, 1.0);
            s.radius = s.max_radius * progress;
            s.remaining > 0.0
        });
        self.tracers.retain_mut(|t| {
            t.remaining -= dt;
            t.remaining > 0.0
        });
    }
}

impl Default for EffectPools {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_drops_spawns_past_capacity() {
        let mut pool: Pool<i32> = Pool::new(2);
        pool.spawn(1);
        pool.spawn(2);
        pool.spawn(3);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn tick_expires_particles_after_their_lifetime() {
        let mut pools = EffectPools::new();
        pools.spawn_dig_effect(Point3::new(0.0, 0.0, 0.0));
        assert_eq!(pools.particles.len(), 1);
        for _ in 0..60 {
            pools.tick(1.0 / 60.0);
        }
        assert_eq!(pools.particles.len(), 0);
    }

    #[test]
    fn explosion_sphere_radius_grows_toward_max() {
        let mut pools = EffectPools::new();
        pools.spawn_explosion_effect(Point3::new(0.0, 0.0, 0.0), 5.0);
        pools.tick(0.3);
        let sphere = pools.explosion_spheres.iter().next().unwrap();
        assert!(sphere.radius > 0.0 && sphere.radius < 5.0);
    }
}
