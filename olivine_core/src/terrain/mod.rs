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


//! The terrain window: a chunk table, the generator that fills it, and the extent that
//! decides which chunks are generated.

mod generator;
mod store;

use std::time::Instant;

use anyhow::{ensure, Result};
use cgmath::Vector2;
use serde::{Deserialize, Serialize};

use crate::coordinates::{CellOffset, ChunkCoordinate};
use crate::error::TerrainError;

pub use generator::{
    regenerate, HeightfieldGenerator, Octave, OctaveNoiseGenerator, OctaveSet,
    RegenerationStats, TerrainExtent,
};
pub use store::{ChunkRef, TerrainChunk, TerrainChunkStore};

/// What a height query returns for a chunk that no regeneration has written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutOfExtentPolicy {
    /// The chunk is claimed empty and every cell reads as 0.
    #[default]
    DefaultZero,
    /// The chunk is claimed and filled from the generator on first query.
    GenerateOnDemand,
}

pub struct Terrain {
    store: TerrainChunkStore,
    generator: OctaveNoiseGenerator,
    // Edited by users and by auto-growth; applied by the next regeneration
    requested_extent: TerrainExtent,
    current_extent: TerrainExtent,
    policy: OutOfExtentPolicy,
    regenerations: u64,
    // Out-of-extent chunks claimed by height queries since the last regeneration
    stray_chunks: usize,
    // Last growth target refused for size, so the warning is logged once
    refused_growth: Option<TerrainExtent>,
}
impl Terrain {
    /// Creates the terrain and generates the initial window.
    ///
    /// Fails with [TerrainError::ExtentTooLarge] if the extent would crowd the chunk table.
    pub fn new(
        store: TerrainChunkStore,
        generator: OctaveNoiseGenerator,
        extent: TerrainExtent,
        policy: OutOfExtentPolicy,
    ) -> Result<Terrain> {
        check_extent(&store, extent)?;
        let mut terrain = Terrain {
            store,
            generator,
            requested_extent: extent,
            current_extent: extent,
            policy,
            regenerations: 0,
            stray_chunks: 0,
            refused_growth: None,
        };
        terrain.regenerate();
        Ok(terrain)
    }

    /// Applies the requested extent and rewrites every chunk inside it.
    pub fn regenerate(&mut self) -> RegenerationStats {
        let start = Instant::now();
        self.current_extent = self.requested_extent;
        let stats = regenerate(&mut self.store, self.current_extent, &self.generator);
        self.regenerations += 1;
        self.stray_chunks = 0;
        log::info!(
            "Regenerated terrain {}x{} ({} chunks, generation {}) in {:?}",
            self.current_extent.width,
            self.current_extent.depth,
            stats.chunks,
            stats.generation,
            start.elapsed()
        );
        stats
    }

    /// Sets the extent the next regeneration will generate. User edits and auto-growth both
    /// go through here.
    ///
    /// Fails with [TerrainError::ExtentTooLarge], leaving the requested extent unchanged,
    /// if the extent covers more than [TerrainChunkStore::max_extent_chunks] chunks.
    pub fn set_extent(&mut self, extent: TerrainExtent) -> Result<()> {
        check_extent(&self.store, extent)?;
        if extent != self.requested_extent {
            log::debug!("Requested terrain extent {:?}", extent);
        }
        self.requested_extent = extent;
        Ok(())
    }

    /// Grows the window by one chunk along each axis on which `coord` falls outside the
    /// current extent, and regenerates. Axes that don't need to grow keep their requested
    /// size. Returns true if that happened.
    ///
    /// Growth that would exceed the chunk table's limit is refused with a warning.
    pub fn grow_to_include(&mut self, coord: ChunkCoordinate) -> bool {
        let Some(grown) = self
            .current_extent
            .grown_toward(coord, self.requested_extent)
        else {
            return false;
        };
        if let Err(e) = self.set_extent(grown) {
            if self.refused_growth != Some(grown) {
                log::warn!("Not growing the terrain window toward {:?}: {}", coord, e);
                self.refused_growth = Some(grown);
            }
            return false;
        }
        self.refused_growth = None;
        log::info!(
            "{:?} is outside the terrain window, growing {:?} -> {:?}",
            coord,
            self.current_extent,
            grown
        );
        self.regenerate();
        true
    }

    /// Replaces the octave list used by subsequent regenerations.
    pub fn set_octaves(&mut self, octaves: OctaveSet) {
        self.generator.set_octaves(octaves);
    }

    /// Replaces the generator (seed and octaves) used by subsequent regenerations.
    pub fn set_generator(&mut self, generator: OctaveNoiseGenerator) {
        self.generator = generator;
    }

    pub fn octaves(&self) -> &OctaveSet {
        self.generator.octaves()
    }

    pub fn generator(&self) -> &OctaveNoiseGenerator {
        &self.generator
    }

    pub fn set_policy(&mut self, policy: OutOfExtentPolicy) {
        self.policy = policy;
    }

    pub fn policy(&self) -> OutOfExtentPolicy {
        self.policy
    }

    pub fn requested_extent(&self) -> TerrainExtent {
        self.requested_extent
    }

    pub fn current_extent(&self) -> TerrainExtent {
        self.current_extent
    }

    pub fn regenerations(&self) -> u64 {
        self.regenerations
    }

    pub fn store(&self) -> &TerrainChunkStore {
        &self.store
    }

    /// Height of the cell containing the world-space (x, z) position. Heights are constant
    /// per cell; there is no interpolation.
    ///
    /// A chunk no regeneration has written is handled per [OutOfExtentPolicy]. Such chunks
    /// are claimed in the table until it runs out of headroom; after that they are read
    /// without being stored.
    pub fn height_at(&mut self, world_xz: Vector2<f64>) -> Result<f64> {
        let coord = ChunkCoordinate::containing(world_xz)?;
        let offset = CellOffset::containing(world_xz, coord);
        if let Some(chunk) = self.store.get(coord) {
            return Ok(chunk.height(offset));
        }

        if self.stray_chunks >= self.stray_budget() {
            return Ok(match self.policy {
                OutOfExtentPolicy::DefaultZero => 0.0,
                OutOfExtentPolicy::GenerateOnDemand => {
                    self.generator.height(coord.with_offset(offset))
                }
            });
        }
        self.stray_chunks += 1;
        let mut chunk = self.store.get_or_create_slot(coord);
        if self.policy == OutOfExtentPolicy::GenerateOnDemand {
            log::debug!("Generating {:?} on demand", coord);
            self.generator.fill_chunk(&mut chunk);
        }
        Ok(chunk.height(offset))
    }

    // Keeps at least one slot free beyond the largest allowed extent
    fn stray_budget(&self) -> usize {
        (self.store.capacity() - self.store.max_extent_chunks()).saturating_sub(1)
    }

    /// The generated chunks of the current window, in x-major order.
    pub fn active_chunks(&self) -> impl Iterator<Item = &TerrainChunk> + '_ {
        self.current_extent
            .chunks()
            .filter_map(|coord| self.store.get(coord))
    }
}

fn check_extent(store: &TerrainChunkStore, extent: TerrainExtent) -> Result<()> {
    let chunks = extent.chunk_count();
    let limit = store.max_extent_chunks();
    ensure!(
        chunks <= limit,
        TerrainError::ExtentTooLarge {
            width: extent.width,
            depth: extent.depth,
            chunks,
            limit,
        }
    );
    Ok(())
}
