//! Discretized view over another backend.
//!
//! The wrapped backend is sampled on a fixed time step, lazily and a chunk at a time.
//! Queries interpolate linearly between neighbouring samples, so repeated lookups in a
//! search loop hit the cache instead of the (possibly expensive) source.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pathfinder_core::vector::{Vector3, lerp};

use crate::{Ephemerides, EphemerisError, SharedEphemerides, StateVector, require_positive};

type Chunk = Arc<Vec<StateVector>>;

#[derive(Debug)]
pub struct SampledEphemeris {
    source: SharedEphemerides,
    step: f64,
    samples_per_chunk: usize,
    chunks: Mutex<HashMap<i64, Chunk>>,
}

impl SampledEphemeris {
    /// Sample `source` every `step` seconds, caching `chunk_size` seconds per chunk.
    pub fn new(source: SharedEphemerides, step: f64, chunk_size: f64) -> Result<Self, EphemerisError> {
        let step = require_positive("step", step)?;
        let chunk_size = require_positive("chunk_size", chunk_size)?;
        let samples_per_chunk = ((chunk_size / step).round() as usize).max(1);
        Ok(Self {
            source,
            step,
            samples_per_chunk,
            chunks: Mutex::new(HashMap::new()),
        })
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of chunks sampled so far.
    pub fn cached_chunks(&self) -> usize {
        self.lock_chunks().len()
    }

    fn lock_chunks(&self) -> std::sync::MutexGuard<'_, HashMap<i64, Chunk>> {
        // a poisoned cache only ever holds fully built chunks
        self.chunks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn chunk(&self, index: i64) -> Chunk {
        if let Some(chunk) = self.lock_chunks().get(&index) {
            return Arc::clone(chunk);
        }
        let first = index * self.samples_per_chunk as i64;
        let samples: Vec<StateVector> = (0..self.samples_per_chunk as i64)
            .map(|i| self.source.state((first + i) as f64 * self.step))
            .collect();
        tracing::trace!(chunk = index, samples = samples.len(), "sampled ephemeris chunk");
        let chunk = Arc::new(samples);
        self.lock_chunks()
            .entry(index)
            .or_insert_with(|| Arc::clone(&chunk))
            .clone()
    }

    fn sample(&self, index: i64) -> StateVector {
        let per_chunk = self.samples_per_chunk as i64;
        let chunk = self.chunk(index.div_euclid(per_chunk));
        chunk[index.rem_euclid(per_chunk) as usize]
    }

    fn interpolate(&self, t: f64) -> StateVector {
        let scaled = t / self.step;
        let index = scaled.floor();
        let fraction = scaled - index;
        let index = index as i64;
        let s0 = self.sample(index);
        if fraction == 0.0 {
            return s0;
        }
        let s1 = self.sample(index + 1);
        StateVector {
            position: lerp(&s0.position, &s1.position, fraction),
            velocity: lerp(&s0.velocity, &s1.velocity, fraction),
        }
    }
}

impl Ephemerides for SampledEphemeris {
    fn position(&self, t: f64) -> Vector3 {
        self.interpolate(t).position
    }

    fn velocity(&self, t: f64) -> Vector3 {
        self.interpolate(t).velocity
    }

    fn state(&self, t: f64) -> StateVector {
        self.interpolate(t)
    }

    fn gravitational_parameter(&self, t: f64) -> f64 {
        self.source.gravitational_parameter(t)
    }

    fn period(&self, t: f64) -> f64 {
        self.source.period(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CircularOrbit;
    use approx::assert_relative_eq;
    use pathfinder_core::vector::{norm, sub};

    fn earth_like() -> SharedEphemerides {
        Arc::new(CircularOrbit::new(3.986e14, 1.496e11, 3.156e7, 0.3).unwrap())
    }

    #[test]
    fn exact_on_sample_points() {
        let source = earth_like();
        let sampled = SampledEphemeris::new(Arc::clone(&source), 86_400.0, 86_400.0 * 30.0).unwrap();
        let t = 86_400.0 * 45.0;
        assert_eq!(sampled.position(t), source.position(t));
    }

    #[test]
    fn close_between_samples() {
        let source = earth_like();
        let sampled = SampledEphemeris::new(Arc::clone(&source), 3_600.0, 86_400.0).unwrap();
        let t = 1.0e6 + 1_234.5;
        let error = norm(&sub(&sampled.position(t), &source.position(t)));
        // sagitta of a one-hour chord on a one-year orbit is under 10 km
        assert!(error < 2.0e4, "interpolation error {error}");
    }

    #[test]
    fn caches_chunks_lazily() {
        let sampled = SampledEphemeris::new(earth_like(), 10.0, 100.0).unwrap();
        assert_eq!(sampled.cached_chunks(), 0);
        sampled.position(5.0);
        sampled.position(55.0);
        assert_eq!(sampled.cached_chunks(), 1);
        sampled.position(-5.0);
        assert_eq!(sampled.cached_chunks(), 2);
    }

    #[test]
    fn forwards_physical_constants() {
        let sampled = SampledEphemeris::new(earth_like(), 10.0, 100.0).unwrap();
        assert_relative_eq!(sampled.gravitational_parameter(0.0), 3.986e14);
        assert_relative_eq!(sampled.period(0.0), 3.156e7);
    }
}
