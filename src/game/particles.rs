//! Double-buffered particle simulation for the ball trail
//!
//! Two particle buffers play ping-pong: each advance reads the current
//! buffer, writes survivors into the other, then swaps roles. The swap is
//! the only state change a renderer mid-frame could observe, so reads always
//! see a fully advanced generation.

use glam::{Vec2, Vec4};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Trail particles emitted per second while the ball is flying
const EMIT_RATE: f32 = 90.0;
const PARTICLE_LIFE: f32 = 0.6;
const PARTICLE_SIZE: f32 = 0.012;

#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: Vec4,
    pub size: f32,
    pub life: f32,
}

impl Particle {
    /// Remaining life as an alpha factor in [0, 1]
    pub fn alpha(&self) -> f32 {
        (self.life / PARTICLE_LIFE).clamp(0.0, 1.0)
    }
}

/// Per-particle behavior, dispatched each advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleUpdater {
    /// Drift against the emitter's motion, shrink and fade out
    BallTrail,
}

impl ParticleUpdater {
    fn update(self, particle: &mut Particle, dt: f32) {
        match self {
            ParticleUpdater::BallTrail => {
                particle.position += particle.velocity * dt;
                particle.velocity *= 1.0 - 2.0 * dt;
                particle.size *= 1.0 - 1.5 * dt;
                particle.life -= dt;
            }
        }
    }
}

pub struct ParticleSystem {
    buffers: [Vec<Particle>; 2],
    /// Index of the buffer holding the latest generation
    current: usize,
    updater: ParticleUpdater,
    rng: Pcg32,
    /// Fractional emissions carried across frames
    emit_debt: f32,
}

impl ParticleSystem {
    pub fn new(updater: ParticleUpdater, seed: u64) -> Self {
        Self {
            buffers: [Vec::new(), Vec::new()],
            current: 0,
            updater,
            rng: Pcg32::seed_from_u64(seed),
            emit_debt: 0.0,
        }
    }

    /// The latest fully advanced generation
    pub fn particles(&self) -> &[Particle] {
        &self.buffers[self.current]
    }

    pub fn clear(&mut self) {
        self.buffers[0].clear();
        self.buffers[1].clear();
        self.emit_debt = 0.0;
    }

    /// Advance one generation: age the current buffer into the other, emit
    /// new particles at `emitter` if given, then swap.
    pub fn advance(&mut self, dt: f32, emitter: Option<Vec2>) {
        let next = 1 - self.current;
        let (read, write) = if self.current == 0 {
            let (a, b) = self.buffers.split_at_mut(1);
            (&a[0], &mut b[0])
        } else {
            let (a, b) = self.buffers.split_at_mut(1);
            (&b[0], &mut a[0])
        };

        write.clear();
        for particle in read {
            let mut particle = *particle;
            self.updater.update(&mut particle, dt);
            if particle.life > 0.0 {
                write.push(particle);
            }
        }

        if let Some(pos) = emitter {
            self.emit_debt += EMIT_RATE * dt;
            while self.emit_debt >= 1.0 {
                self.emit_debt -= 1.0;
                let jitter = Vec2::new(
                    self.rng.random_range(-0.008..0.008),
                    self.rng.random_range(-0.008..0.008),
                );
                let drift = Vec2::new(
                    self.rng.random_range(-0.05..0.05),
                    self.rng.random_range(-0.05..0.05),
                );
                write.push(Particle {
                    position: pos + jitter,
                    velocity: drift,
                    color: Vec4::new(1.0, 0.85, 0.4, 1.0),
                    size: PARTICLE_SIZE * self.rng.random_range(0.7..1.3),
                    life: PARTICLE_LIFE,
                });
            }
        }

        self.current = next;
    }
}
