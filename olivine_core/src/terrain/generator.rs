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


use std::ops::Range;

use anyhow::{ensure, Result};
use cgmath::Vector2;
use serde::{Deserialize, Serialize};

use crate::constants::extent::DEFAULT_EXTENT;
use crate::constants::octaves::{
    DEFAULT_OCTAVE_AMPLITUDE, DEFAULT_OCTAVE_COUNT, DEFAULT_OCTAVE_PERIOD, MAX_OCTAVES,
    MIN_OCTAVE_PERIOD,
};
use crate::coordinates::{CellOffset, ChunkCoordinate};
use crate::error::TerrainError;
use crate::noise::{quantize_height, GradientNoise};

use super::store::{TerrainChunk, TerrainChunkStore};

/// One noise layer: a spatial period (world units per lattice cell) and a weight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(f64, f64)", into = "(f64, f64)")]
pub struct Octave {
    period: f64,
    amplitude: f64,
}
impl Octave {
    /// Periods below [MIN_OCTAVE_PERIOD] are clamped up to it.
    pub fn new(period: f64, amplitude: f64) -> Result<Octave> {
        ensure!(period.is_finite(), TerrainError::InvalidPeriod(period));
        ensure!(amplitude.is_finite(), TerrainError::InvalidAmplitude(amplitude));
        Ok(Octave {
            period: period.max(MIN_OCTAVE_PERIOD),
            amplitude,
        })
    }
    pub fn period(&self) -> f64 {
        self.period
    }
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }
}
impl TryFrom<(f64, f64)> for Octave {
    type Error = anyhow::Error;

    fn try_from(value: (f64, f64)) -> std::result::Result<Self, Self::Error> {
        Octave::new(value.0, value.1)
    }
}
impl From<Octave> for (f64, f64) {
    fn from(value: Octave) -> Self {
        (value.period, value.amplitude)
    }
}

/// Ordered list of octaves. Insertion order is summation order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Octave>", into = "Vec<Octave>")]
pub struct OctaveSet {
    octaves: Vec<Octave>,
}
impl OctaveSet {
    pub fn new() -> OctaveSet {
        OctaveSet { octaves: vec![] }
    }

    pub fn from_octaves(octaves: impl IntoIterator<Item = Octave>) -> Result<OctaveSet> {
        let octaves: Vec<Octave> = octaves.into_iter().collect();
        ensure!(
            octaves.len() <= MAX_OCTAVES,
            TerrainError::TooManyOctaves(MAX_OCTAVES)
        );
        Ok(OctaveSet { octaves })
    }

    pub fn push(&mut self, octave: Octave) -> Result<()> {
        ensure!(
            self.octaves.len() < MAX_OCTAVES,
            TerrainError::TooManyOctaves(MAX_OCTAVES)
        );
        self.octaves.push(octave);
        Ok(())
    }

    pub fn set(&mut self, index: usize, octave: Octave) -> Result<()> {
        let slot = self
            .octaves
            .get_mut(index)
            .ok_or(TerrainError::OctaveIndexOutOfRange(index))?;
        *slot = octave;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Octave> {
        ensure!(
            index < self.octaves.len(),
            TerrainError::OctaveIndexOutOfRange(index)
        );
        Ok(self.octaves.remove(index))
    }

    pub fn truncate(&mut self, len: usize) {
        self.octaves.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.octaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.octaves.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Octave> {
        self.octaves.iter()
    }

    /// Weighted sum of every octave at the given world position, rounded to
    /// [HEIGHT_QUANTUM](crate::constants::height::HEIGHT_QUANTUM).
    #[inline]
    pub fn height_at(&self, noise: &GradientNoise, world: Vector2<f64>) -> f64 {
        quantize_height(
            self.octaves
                .iter()
                .map(|o| o.amplitude * noise.sample_unchecked(world, o.period))
                .sum(),
        )
    }
}
impl Default for OctaveSet {
    fn default() -> Self {
        let octave = Octave {
            period: DEFAULT_OCTAVE_PERIOD,
            amplitude: DEFAULT_OCTAVE_AMPLITUDE,
        };
        OctaveSet {
            octaves: vec![octave; DEFAULT_OCTAVE_COUNT],
        }
    }
}
impl TryFrom<Vec<Octave>> for OctaveSet {
    type Error = anyhow::Error;

    fn try_from(value: Vec<Octave>) -> std::result::Result<Self, Self::Error> {
        OctaveSet::from_octaves(value)
    }
}
impl From<OctaveSet> for Vec<Octave> {
    fn from(value: OctaveSet) -> Self {
        value.octaves
    }
}

/// Width (x) and depth (z), in chunks, of the generated terrain window.
///
/// The window spans chunk x in `[-floor(width / 2), floor(width / 2))`, and likewise for z.
/// Note that an odd width therefore covers one chunk fewer than its nominal size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainExtent {
    pub width: u32,
    pub depth: u32,
}
impl TerrainExtent {
    pub const fn new(width: u32, depth: u32) -> TerrainExtent {
        TerrainExtent { width, depth }
    }

    pub fn x_range(&self) -> Range<i32> {
        half_range(self.width)
    }

    pub fn z_range(&self) -> Range<i32> {
        half_range(self.depth)
    }

    pub fn contains(&self, coord: ChunkCoordinate) -> bool {
        self.x_range().contains(&coord.x) && self.z_range().contains(&coord.z)
    }

    /// Every chunk coordinate in the window, x-major.
    pub fn chunks(&self) -> impl Iterator<Item = ChunkCoordinate> {
        let z_range = self.z_range();
        self.x_range()
            .flat_map(move |x| z_range.clone().map(move |z| ChunkCoordinate::new(x, z)))
    }

    /// Number of chunks actually covered by the window.
    pub fn chunk_count(&self) -> usize {
        self.x_range().len() * self.z_range().len()
    }

    /// The extent to request once `coord` has left this window: one chunk more than this
    /// window along every axis `coord` lies outside of, and `pending`'s size along the
    /// others. None if the window already contains `coord`.
    pub fn grown_toward(
        &self,
        coord: ChunkCoordinate,
        pending: TerrainExtent,
    ) -> Option<TerrainExtent> {
        let grow_x = !self.x_range().contains(&coord.x);
        let grow_z = !self.z_range().contains(&coord.z);
        if !grow_x && !grow_z {
            return None;
        }
        Some(TerrainExtent {
            width: if grow_x {
                self.width.saturating_add(1)
            } else {
                pending.width
            },
            depth: if grow_z {
                self.depth.saturating_add(1)
            } else {
                pending.depth
            },
        })
    }
}
impl Default for TerrainExtent {
    fn default() -> Self {
        TerrainExtent::new(DEFAULT_EXTENT.0, DEFAULT_EXTENT.1)
    }
}

fn half_range(size: u32) -> Range<i32> {
    let half = (size / 2).min(i32::MAX as u32) as i32;
    -half..half
}

/// Produces terrain heights for chunks.
pub trait HeightfieldGenerator: Send + Sync {
    /// Terrain height of the cell at the given world position.
    ///
    /// Implementations must be deterministic: regenerating the same extent must reproduce
    /// the same heights.
    fn height(&self, world: Vector2<f64>) -> f64;

    /// Writes every cell of `chunk`. By default, samples [HeightfieldGenerator::height]
    /// at each cell's world position.
    fn fill_chunk(&self, chunk: &mut TerrainChunk) {
        let position = chunk.position();
        for offset in CellOffset::all() {
            chunk.set_height(offset, self.height(position.with_offset(offset)));
        }
    }
}

/// Layered gradient noise: the sum of `amplitude * noise(world, period)` over all octaves.
#[derive(Clone, Debug, PartialEq)]
pub struct OctaveNoiseGenerator {
    noise: GradientNoise,
    octaves: OctaveSet,
}
impl OctaveNoiseGenerator {
    pub fn new(noise: GradientNoise, octaves: OctaveSet) -> OctaveNoiseGenerator {
        OctaveNoiseGenerator { noise, octaves }
    }
    pub fn noise(&self) -> &GradientNoise {
        &self.noise
    }
    pub fn octaves(&self) -> &OctaveSet {
        &self.octaves
    }
    pub fn set_octaves(&mut self, octaves: OctaveSet) {
        self.octaves = octaves;
    }
}
impl HeightfieldGenerator for OctaveNoiseGenerator {
    #[inline]
    fn height(&self, world: Vector2<f64>) -> f64 {
        self.octaves.height_at(&self.noise, world)
    }
}

/// Summary of one regeneration pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegenerationStats {
    pub generation: u64,
    pub chunks: usize,
}

/// Rebuilds the terrain window: advances the store generation once, then claims and fills
/// every chunk within `extent`. Chunks outside the extent are left unreachable, not erased.
pub fn regenerate(
    store: &mut TerrainChunkStore,
    extent: TerrainExtent,
    generator: &dyn HeightfieldGenerator,
) -> RegenerationStats {
    store.advance_generation();
    let mut chunks = 0;
    for coord in extent.chunks() {
        let mut chunk = store.get_or_create_slot(coord);
        generator.fill_chunk(&mut chunk);
        chunks += 1;
    }
    RegenerationStats {
        generation: store.generation(),
        chunks,
    }
}
