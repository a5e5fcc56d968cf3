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


//! Fixed-capacity chunk table with generation-tagged slot reuse.
//!
//! Slots are never freed. Bumping the table's generation makes every chunk written under an
//! older generation logically absent, and such stale slots are reclaimed in place by later
//! lookups.

use std::ops::{Deref, DerefMut};

use crate::constants::{
    chunk_table::{DEFAULT_CAPACITY, MAX_EXTENT_LOAD},
    CHUNK_AREA,
};
use crate::coordinates::{CellOffset, ChunkCoordinate};

/// One square tile of the heightfield.
pub struct TerrainChunk {
    position: ChunkCoordinate,
    generation: u64,
    heights: Box<[f64; CHUNK_AREA]>,
}
impl TerrainChunk {
    fn empty() -> TerrainChunk {
        TerrainChunk {
            position: ChunkCoordinate::new(0, 0),
            generation: 0,
            heights: Box::new([0.0; CHUNK_AREA]),
        }
    }

    pub fn position(&self) -> ChunkCoordinate {
        self.position
    }
    /// The table generation under which this chunk was last written.
    pub fn generation(&self) -> u64 {
        self.generation
    }
    #[inline]
    pub fn height(&self, offset: CellOffset) -> f64 {
        self.heights[offset.as_index()]
    }
    #[inline]
    pub fn set_height(&mut self, offset: CellOffset, height: f64) {
        self.heights[offset.as_index()] = height;
    }
    pub fn heights(&self) -> &[f64; CHUNK_AREA] {
        &self.heights
    }
    /// Iterates (cell, height) pairs in storage order.
    pub fn cells(&self) -> impl Iterator<Item = (CellOffset, f64)> + '_ {
        self.heights
            .iter()
            .enumerate()
            .map(|(i, h)| (CellOffset::from_index(i), *h))
    }
}
impl std::fmt::Debug for TerrainChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrainChunk")
            .field("position", &self.position)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Mutable handle to a live chunk, as returned by [TerrainChunkStore::get_or_create_slot].
pub struct ChunkRef<'a> {
    chunk: &'a mut TerrainChunk,
    fresh: bool,
}
impl ChunkRef<'_> {
    /// True if the slot was claimed by this lookup, i.e. the chunk holds no terrain yet and
    /// all of its heights are zero.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }
}
impl Deref for ChunkRef<'_> {
    type Target = TerrainChunk;
    fn deref(&self) -> &Self::Target {
        self.chunk
    }
}
impl DerefMut for ChunkRef<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.chunk
    }
}

pub struct TerrainChunkStore {
    slots: Vec<TerrainChunk>,
    generation: u64,
}
impl TerrainChunkStore {
    pub fn new() -> TerrainChunkStore {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> TerrainChunkStore {
        assert!(capacity > 0, "chunk table needs at least one slot");
        TerrainChunkStore {
            slots: (0..capacity).map(|_| TerrainChunk::empty()).collect(),
            // Slots start out at generation 0, so every one of them is stale.
            generation: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Most chunks a terrain extent may keep live in this table.
    pub fn max_extent_chunks(&self) -> usize {
        self.slots.len() / MAX_EXTENT_LOAD
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Makes every chunk written so far invisible, without touching the slots.
    pub fn advance_generation(&mut self) {
        self.generation += 1;
    }

    /// Finds the live chunk at `coord`, or claims the first stale slot along its probe
    /// sequence, zeroing it and tagging it with the current generation.
    ///
    /// Panics if every slot holds a live chunk for some other coordinate. The table is sized
    /// so that this indicates a bug, not a runtime condition.
    pub fn get_or_create_slot(&mut self, coord: ChunkCoordinate) -> ChunkRef<'_> {
        let capacity = self.slots.len();
        let start = coord.slot_hash(capacity);
        let mut index = start;
        loop {
            let slot = &self.slots[index];
            if slot.generation != self.generation || slot.position == coord {
                break;
            }
            index = (index + 1) % capacity;
            if index == start {
                panic!(
                    "Chunk table full: probed all {} slots looking for {:?} in generation {}",
                    capacity, coord, self.generation
                );
            }
        }

        let generation = self.generation;
        let slot = &mut self.slots[index];
        let fresh = slot.generation != generation;
        if fresh {
            slot.position = coord;
            slot.generation = generation;
            slot.heights.fill(0.0);
        } else {
            debug_assert_eq!(slot.position, coord);
        }
        ChunkRef { chunk: slot, fresh }
    }

    /// Read-only lookup. Never claims a slot.
    pub fn get(&self, coord: ChunkCoordinate) -> Option<&TerrainChunk> {
        let capacity = self.slots.len();
        let start = coord.slot_hash(capacity);
        let mut index = start;
        loop {
            let slot = &self.slots[index];
            if slot.generation != self.generation {
                return None;
            }
            if slot.position == coord {
                return Some(slot);
            }
            index = (index + 1) % capacity;
            if index == start {
                return None;
            }
        }
    }

    /// All chunks written under the current generation, in slot order.
    pub fn live_chunks(&self) -> impl Iterator<Item = &TerrainChunk> + '_ {
        let generation = self.generation;
        self.slots.iter().filter(move |c| c.generation == generation)
    }

    pub fn live_count(&self) -> usize {
        self.live_chunks().count()
    }
}
impl Default for TerrainChunkStore {
    fn default() -> Self {
        Self::new()
    }
}
