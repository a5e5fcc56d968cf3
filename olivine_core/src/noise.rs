// Copyright 2023 drey7925
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0


//! Two-dimensional gradient noise in the style of Perlin noise.
//!
//! Every integer lattice corner gets a pseudo-random unit gradient derived from a hash of its
//! coordinates. A sample is the smootherstep-weighted blend of the four corner ramps around
//! it. There is no hidden state, so a [GradientNoise] can be shared freely between readers.

use std::f64::consts::TAU;
use std::ops::BitXor;

use anyhow::{ensure, Result};
use cgmath::{vec2, InnerSpace, Vector2};

use crate::constants::height::HEIGHT_QUANTUM;
use crate::error::TerrainError;

/// Deterministic coherent noise generator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GradientNoise {
    seed: u32,
}

impl GradientNoise {
    pub const fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Samples the noise field at `position`, with lattice cells `period` world units wide.
    ///
    /// Fails with [TerrainError::InvalidPeriod] unless the period is positive and finite.
    pub fn sample(&self, position: Vector2<f64>, period: f64) -> Result<f64> {
        ensure!(
            period.is_finite() && period > 0.0,
            TerrainError::InvalidPeriod(period)
        );
        Ok(self.sample_unchecked(position, period))
    }

    /// Same as [GradientNoise::sample], for callers that have already validated the period.
    #[inline]
    pub(crate) fn sample_unchecked(&self, position: Vector2<f64>, period: f64) -> f64 {
        debug_assert!(period.is_finite() && period > 0.0);
        let input = position / period;
        let cell = vec2(input.x.floor(), input.y.floor());
        let fractional = input - cell;
        let (cx, cz) = (cell.x as i64, cell.y as i64);

        let s = self.ramp(cx, cz, input);
        let t = self.ramp(cx + 1, cz, input);
        let u = self.ramp(cx, cz + 1, input);
        let v = self.ramp(cx + 1, cz + 1, input);

        let sx = smootherstep(fractional.x);
        let a = s + sx * (t - s);
        let b = u + sx * (v - u);

        let sy = smootherstep(fractional.y);
        quantize_height(a + sy * (b - a))
    }

    /// Dot product of a corner's gradient with the vector from that corner to the sample.
    #[inline]
    fn ramp(&self, corner_x: i64, corner_z: i64, input: Vector2<f64>) -> f64 {
        let corner = vec2(corner_x as f64, corner_z as f64);
        self.gradient(corner_x, corner_z).dot(input - corner)
    }

    #[inline]
    fn gradient(&self, x: i64, z: i64) -> Vector2<f64> {
        let theta = self.corner_uniform(x, z) * TAU;
        let (sin, cos) = theta.sin_cos();
        vec2(cos, sin)
    }

    /// Uniform value in [0, 1] for a lattice corner. Both coordinates are folded in with
    /// rotate/xor/multiply rounds so that low-bit collisions between nearby corners don't
    /// show up as repeating gradients.
    #[inline]
    fn corner_uniform(&self, x: i64, z: i64) -> f64 {
        const K: u64 = 0x517cc1b727220a95;
        const M: u64 = 0x72c07af023017001;

        let mut hash = self.seed as u64;
        hash = hash
            .rotate_left(5)
            .bitxor((x as u64).wrapping_mul(M))
            .swap_bytes()
            .wrapping_mul(K);
        hash = hash
            .rotate_left(5)
            .bitxor((z as u64).wrapping_mul(M))
            .swap_bytes()
            .wrapping_mul(K);
        hash = hash
            .rotate_left(5)
            .bitxor((self.seed as u64).wrapping_mul(M))
            .swap_bytes()
            .wrapping_mul(K);
        (hash as f64) / (u64::MAX as f64)
    }
}

/// Samples the seed-0 noise field. See [GradientNoise::sample].
pub fn noise(position: Vector2<f64>, period: f64) -> Result<f64> {
    GradientNoise::default().sample(position, period)
}

/// Rounds to the nearest multiple of [HEIGHT_QUANTUM]. A camera can then stand exactly on
/// any generated height: `(h - feet) + feet == h` holds for any feet offset that is itself
/// a multiple of the quantum.
#[inline]
pub fn quantize_height(height: f64) -> f64 {
    (height / HEIGHT_QUANTUM).round() * HEIGHT_QUANTUM
}

/// Cubic ease `3t² - 2t³`; removes the creases a linear blend leaves along cell edges.
#[inline]
fn smootherstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}
