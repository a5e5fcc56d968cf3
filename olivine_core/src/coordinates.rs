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


use std::fmt::Debug;

use anyhow::{ensure, Result};
use cgmath::{vec2, Vector2};

use crate::constants::{chunk_table::HASH_MODULUS, CHUNK_AREA, CHUNK_SIZE};
use crate::error::TerrainError;

/// Represents the location of a terrain chunk on the horizontal plane.
///
/// Each coordinate spans CHUNK_SIZE cells, covering the range
/// [chunk.x * CHUNK_SIZE, chunk.x * CHUNK_SIZE + CHUNK_SIZE - 1] in world x (and likewise for z).
#[derive(PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct ChunkCoordinate {
    pub x: i32,
    pub z: i32,
}
impl ChunkCoordinate {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Returns the chunk containing the given world-space (x, z) position.
    pub fn containing(world_xz: Vector2<f64>) -> Result<ChunkCoordinate> {
        ensure!(
            world_xz.x.is_finite() && world_xz.y.is_finite(),
            TerrainError::NonFiniteCoordinate
        );
        let size = CHUNK_SIZE as f64;
        Ok(ChunkCoordinate {
            x: try_convert((world_xz.x / size).floor())?,
            z: try_convert((world_xz.y / size).floor())?,
        })
    }

    /// World-space position of the chunk's (0, 0) cell.
    #[inline]
    pub fn origin(&self) -> Vector2<f64> {
        vec2(
            self.x as f64 * CHUNK_SIZE as f64,
            self.z as f64 * CHUNK_SIZE as f64,
        )
    }

    /// Returns the world-space position of the given cell within this chunk.
    #[inline]
    pub fn with_offset(&self, offset: CellOffset) -> Vector2<f64> {
        offset.debug_check();
        self.origin() + vec2(offset.x as f64, offset.z as f64)
    }

    /// Base slot in a chunk table with the given capacity.
    ///
    /// Both components are folded into one word with shift-xor steps, so that neighbouring
    /// chunks land far apart; the word is then reduced by a prime and by the capacity.
    #[inline]
    pub fn slot_hash(&self, capacity: usize) -> usize {
        debug_assert!(capacity > 0);
        let mut hash: u32 = 0;
        hash = ((hash << 5) ^ (hash >> 27)) ^ (self.x as u32);
        hash = ((hash << 7) ^ (hash >> 25)) ^ (self.z as u32);
        (hash % HASH_MODULUS) as usize % capacity
    }
}
impl Debug for ChunkCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("chunk[{}, {}]", self.x, self.z))
    }
}

impl From<ChunkCoordinate> for Vector2<f64> {
    fn from(val: ChunkCoordinate) -> Self {
        vec2(val.x as f64, val.z as f64)
    }
}

impl TryFrom<Vector2<f64>> for ChunkCoordinate {
    type Error = anyhow::Error;

    /// Components must represent exact integers; a fractional part is rejected.
    fn try_from(value: Vector2<f64>) -> std::result::Result<Self, Self::Error> {
        ensure!(
            value.x.fract() == 0.0 && value.y.fract() == 0.0,
            TerrainError::FractionalChunkCoordinate(value.x, value.y)
        );
        Ok(ChunkCoordinate {
            x: try_convert(value.x)?,
            z: try_convert(value.y)?,
        })
    }
}

#[inline]
fn try_convert(value: f64) -> Result<i32> {
    ensure!(value.is_finite(), TerrainError::NonFiniteCoordinate);
    ensure!(
        value <= (i32::MAX as f64) && value >= (i32::MIN as f64),
        TerrainError::CoordinateOutOfRange
    );
    Ok(value as i32)
}

/// Represents the offset of a cell within a chunk.
#[derive(PartialEq, Eq, Hash, Clone, Copy)]
pub struct CellOffset {
    pub x: u8,
    pub z: u8,
}
impl CellOffset {
    pub const fn new(x: u8, z: u8) -> Self {
        Self { x, z }
    }

    /// Returns the cell of `chunk` that the world position falls in.
    ///
    /// Truncates rather than interpolates. Float rounding right below a chunk boundary can
    /// put the local offset at exactly CHUNK_SIZE, so the result is clamped into the chunk.
    pub fn containing(world_xz: Vector2<f64>, chunk: ChunkCoordinate) -> CellOffset {
        let local = world_xz - chunk.origin();
        let max = (CHUNK_SIZE - 1) as f64;
        CellOffset {
            x: local.x.floor().clamp(0.0, max) as u8,
            z: local.y.floor().clamp(0.0, max) as u8,
        }
    }

    #[cfg(debug_assertions)]
    #[inline(always)]
    fn debug_check(&self) {
        debug_assert!((self.x as i32) < CHUNK_SIZE);
        debug_assert!((self.z as i32) < CHUNK_SIZE);
    }

    #[cfg(not(debug_assertions))]
    #[inline(always)]
    fn debug_check(&self) {}

    #[inline]
    pub fn as_index(&self) -> usize {
        self.debug_check();
        (self.z as usize) * (CHUNK_SIZE as usize) + (self.x as usize)
    }
    #[inline]
    pub fn from_index(index: usize) -> CellOffset {
        assert!(index < CHUNK_AREA);
        CellOffset {
            x: (index % CHUNK_SIZE as usize) as u8,
            z: (index / CHUNK_SIZE as usize) as u8,
        }
    }

    /// Iterates every cell of a chunk in storage order.
    pub fn all() -> impl Iterator<Item = CellOffset> {
        (0..CHUNK_AREA).map(CellOffset::from_index)
    }
}
impl Debug for CellOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("Δ({}, {})", self.x, self.z))
    }
}
