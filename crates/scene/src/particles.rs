//! CPU-simulated particle systems.
//!
//! Particles are point sprites simulated in emitter space; the owning
//! object's world matrix places them at draw time. Every frame each emitter
//! integrates, expires and spawns particles, then rebuilds its vertex array
//! for upload.
//!
//! A [`ParticleSystem`] pairs a primary emitter with an optional sub
//! emitter. The sub emitter draws first with standard alpha blending, the
//! primary after it with additive blending.

use ember_rhi::vertex::ParticleVertex;
use glam::{Vec3, Vec4};

use crate::graph::{MaterialHandle, ObjectId};

/// Small deterministic generator for spawn jitter.
struct Lcg(u32);

impl Lcg {
    fn new(seed: u32) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0
    }

    /// Uniform in `[0, 1)`.
    fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform in `[-1, 1)`.
    fn next_signed(&mut self) -> f32 {
        self.next_f32() * 2.0 - 1.0
    }
}

/// Tuning parameters of one emitter.
#[derive(Clone, Copy, Debug)]
pub struct EmitterParams {
    /// Particles spawned per second.
    pub spawn_rate: f32,
    /// Seconds a particle lives.
    pub lifetime: f32,
    /// Base velocity in emitter space.
    pub velocity: Vec3,
    /// Per-axis random velocity jitter amplitude.
    pub spread: Vec3,
    /// Sprite size at spawn.
    pub start_size: f32,
    /// Sprite size at death.
    pub end_size: f32,
    /// Sprite color at spawn.
    pub start_color: Vec4,
    /// Sprite color at death.
    pub end_color: Vec4,
    /// Atlas frame `(u0, v0, u1, v1)` the sprites sample.
    pub tex_rect: Vec4,
    /// Live-particle cap; bounds the vertex buffer.
    pub max_particles: usize,
}

impl Default for EmitterParams {
    fn default() -> Self {
        Self {
            spawn_rate: 48.0,
            lifetime: 1.5,
            velocity: Vec3::new(0.0, 1.5, 0.0),
            spread: Vec3::new(0.4, 0.2, 0.4),
            start_size: 0.8,
            end_size: 0.2,
            start_color: Vec4::new(1.0, 0.55, 0.15, 1.0),
            end_color: Vec4::new(0.4, 0.05, 0.0, 0.0),
            tex_rect: Vec4::new(0.0, 0.0, 1.0, 1.0),
            max_particles: 256,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Particle {
    position: Vec3,
    velocity: Vec3,
    age: f32,
}

/// One stream of point sprites.
pub struct ParticleEmitter {
    params: EmitterParams,
    particles: Vec<Particle>,
    vertices: Vec<ParticleVertex>,
    rng: Lcg,
    spawn_carry: f32,
}

impl ParticleEmitter {
    /// Creates an emitter; `seed` fixes the jitter sequence.
    pub fn new(params: EmitterParams, seed: u32) -> Self {
        Self {
            particles: Vec::with_capacity(params.max_particles),
            vertices: Vec::with_capacity(params.max_particles),
            params,
            rng: Lcg::new(seed),
            spawn_carry: 0.0,
        }
    }

    /// Steps the simulation by `dt` seconds and rebuilds the vertex array.
    pub fn advance(&mut self, dt: f32) {
        let lifetime = self.params.lifetime;

        for particle in &mut self.particles {
            particle.age += dt;
            particle.position += particle.velocity * dt;
        }
        self.particles.retain(|particle| particle.age < lifetime);

        self.spawn_carry += self.params.spawn_rate * dt;
        while self.spawn_carry >= 1.0 && self.particles.len() < self.params.max_particles {
            self.spawn_carry -= 1.0;
            let jitter = Vec3::new(
                self.rng.next_signed() * self.params.spread.x,
                self.rng.next_signed() * self.params.spread.y,
                self.rng.next_signed() * self.params.spread.z,
            );
            self.particles.push(Particle {
                position: Vec3::ZERO,
                velocity: self.params.velocity + jitter,
                age: 0.0,
            });
        }
        // At the cap the carry stops accumulating so deaths don't burst
        self.spawn_carry = self.spawn_carry.min(1.0);

        self.vertices.clear();
        for particle in &self.particles {
            let t = (particle.age / lifetime).clamp(0.0, 1.0);
            let size = self.params.start_size + (self.params.end_size - self.params.start_size) * t;
            self.vertices.push(ParticleVertex::new(
                particle.position,
                size,
                self.params.start_color.lerp(self.params.end_color, t),
                self.params.tex_rect,
            ));
        }
    }

    /// Returns the vertices of the current frame.
    #[inline]
    pub fn vertices(&self) -> &[ParticleVertex] {
        &self.vertices
    }

    /// Returns the number of live particles.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.particles.len()
    }

    /// Returns the live-particle cap.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.params.max_particles
    }
}

impl std::fmt::Debug for ParticleEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleEmitter")
            .field("live", &self.particles.len())
            .field("capacity", &self.params.max_particles)
            .finish_non_exhaustive()
    }
}

/// A primary emitter plus an optional sub emitter, bound to one object and
/// one material.
///
/// Both emitters sample the material's diffuse texture; the atlas frame in
/// [`EmitterParams::tex_rect`] picks each emitter's sprite.
#[derive(Debug)]
pub struct ParticleSystem {
    object: ObjectId,
    material: MaterialHandle,
    primary: ParticleEmitter,
    sub: Option<ParticleEmitter>,
}

impl ParticleSystem {
    /// Creates a system with only a primary emitter.
    pub fn new(object: ObjectId, material: MaterialHandle, primary: ParticleEmitter) -> Self {
        Self {
            object,
            material,
            primary,
            sub: None,
        }
    }

    /// Adds the alpha-blended sub emitter.
    pub fn with_sub(mut self, sub: ParticleEmitter) -> Self {
        self.sub = Some(sub);
        self
    }

    /// Steps both emitters.
    pub fn advance(&mut self, dt: f32) {
        self.primary.advance(dt);
        if let Some(sub) = &mut self.sub {
            sub.advance(dt);
        }
    }

    /// Returns the object whose world matrix places the sprites.
    #[inline]
    pub fn object(&self) -> ObjectId {
        self.object
    }

    /// Returns the material both emitters draw with.
    #[inline]
    pub fn material(&self) -> MaterialHandle {
        self.material
    }

    /// Returns the additive-blended primary emitter.
    #[inline]
    pub fn primary(&self) -> &ParticleEmitter {
        &self.primary
    }

    /// Returns the alpha-blended sub emitter, drawn before the primary.
    #[inline]
    pub fn sub(&self) -> Option<&ParticleEmitter> {
        self.sub.as_ref()
    }

    /// Returns the vertex-buffer capacity the system needs.
    pub fn max_vertices(&self) -> usize {
        self.primary.capacity() + self.sub.as_ref().map_or(0, ParticleEmitter::capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_params() -> EmitterParams {
        EmitterParams {
            spawn_rate: 10.0,
            lifetime: 1.0,
            spread: Vec3::ZERO,
            ..EmitterParams::default()
        }
    }

    #[test]
    fn test_spawn_rate_accumulates() {
        let mut emitter = ParticleEmitter::new(test_params(), 1);

        // 10/sec for 0.05s = 0.5 particles: nothing yet
        emitter.advance(0.05);
        assert_eq!(emitter.live_count(), 0);

        // Another 0.05s completes the first particle
        emitter.advance(0.05);
        assert_eq!(emitter.live_count(), 1);
    }

    #[test]
    fn test_lifetime_expiry() {
        let mut emitter = ParticleEmitter::new(test_params(), 1);
        emitter.advance(0.1);
        assert_eq!(emitter.live_count(), 1);

        // Age past the 1s lifetime; spawned replacements remain
        emitter.advance(1.05);
        assert!(emitter.particles.iter().all(|p| p.age < 1.0));
    }

    #[test]
    fn test_capacity_cap() {
        let params = EmitterParams {
            spawn_rate: 1000.0,
            max_particles: 8,
            ..test_params()
        };
        let mut emitter = ParticleEmitter::new(params, 3);

        emitter.advance(1.0);
        assert_eq!(emitter.live_count(), 8);
        assert_eq!(emitter.vertices().len(), 8);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let mut a = ParticleEmitter::new(EmitterParams::default(), 42);
        let mut b = ParticleEmitter::new(EmitterParams::default(), 42);

        for _ in 0..30 {
            a.advance(1.0 / 60.0);
            b.advance(1.0 / 60.0);
        }

        assert_eq!(a.live_count(), b.live_count());
        for (va, vb) in a.vertices().iter().zip(b.vertices()) {
            assert_eq!(va.position, vb.position);
            assert_eq!(va.size, vb.size);
        }
    }

    #[test]
    fn test_vertex_interpolation() {
        let params = EmitterParams {
            spawn_rate: 10.0,
            lifetime: 1.0,
            start_size: 1.0,
            end_size: 0.0,
            start_color: Vec4::ONE,
            end_color: Vec4::ZERO,
            spread: Vec3::ZERO,
            ..EmitterParams::default()
        };
        let mut emitter = ParticleEmitter::new(params, 9);

        emitter.advance(0.1); // spawn at age 0
        emitter.advance(0.4); // age 0.4
        let vertex = emitter.vertices()[0];

        assert!((vertex.size - 0.5).abs() < 0.11);
        assert!(vertex.color.w < 1.0 && vertex.color.w > 0.0);
    }

    #[test]
    fn test_system_layers() {
        let system = ParticleSystem::new(
            ObjectId(0),
            MaterialHandle(0),
            ParticleEmitter::new(EmitterParams::default(), 1),
        )
        .with_sub(ParticleEmitter::new(
            EmitterParams {
                max_particles: 64,
                ..EmitterParams::default()
            },
            2,
        ));

        assert!(system.sub().is_some());
        assert_eq!(system.max_vertices(), 256 + 64);
    }
}
