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


/// Edge length of a square terrain chunk, in cells.
pub const CHUNK_SIZE: i32 = 16;
/// Number of cells in a single chunk.
pub const CHUNK_AREA: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;

pub mod chunk_table {
    /// Number of slots in the chunk table. Sized far above the number of chunks any
    /// reasonable extent keeps live at once.
    pub const DEFAULT_CAPACITY: usize = 4096;
    /// The slot hash is reduced by this prime before being reduced by the table capacity,
    /// which spreads neighbouring coordinates apart.
    pub const HASH_MODULUS: u32 = 3203;
    /// A terrain extent may cover at most `capacity / MAX_EXTENT_LOAD` chunks. The rest of
    /// the table is left for out-of-extent height queries and keeps lookups short.
    pub const MAX_EXTENT_LOAD: usize = 2;
}

pub mod octaves {
    /// Maximum number of noise layers summed into a terrain height.
    pub const MAX_OCTAVES: usize = 16;
    /// Periods below this are clamped when an octave is built.
    pub const MIN_OCTAVE_PERIOD: f64 = 1.0;
    /// Octave count used by a fresh configuration.
    pub const DEFAULT_OCTAVE_COUNT: usize = 15;
    pub const DEFAULT_OCTAVE_PERIOD: f64 = 16.0;
    pub const DEFAULT_OCTAVE_AMPLITUDE: f64 = 1.0;
}

pub mod height {
    /// Generated heights are rounded to multiples of this (2^-32). Sums and differences of
    /// such values below 2^20 in magnitude are exact in f64.
    pub const HEIGHT_QUANTUM: f64 = 1.0 / 4_294_967_296.0;
}

pub mod extent {
    /// Width and depth, in chunks, of a fresh terrain window.
    pub const DEFAULT_EXTENT: (u32, u32) = (5, 5);
}
