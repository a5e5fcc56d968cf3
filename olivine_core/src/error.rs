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


use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TerrainError {
    #[error("Noise period must be positive and finite, got {0}")]
    InvalidPeriod(f64),
    #[error("Octave amplitude must be finite, got {0}")]
    InvalidAmplitude(f64),
    #[error("At most {0} octaves may be configured")]
    TooManyOctaves(usize),
    #[error("Octave index {0} is out of range")]
    OctaveIndexOutOfRange(usize),
    #[error("Chunk coordinate ({0}, {1}) has a fractional part")]
    FractionalChunkCoordinate(f64, f64),
    #[error("Coordinate contained NaN or inf")]
    NonFiniteCoordinate,
    #[error("Coordinate is out of bounds as i32")]
    CoordinateOutOfRange,
    #[error("Terrain extent {width}x{depth} covers {chunks} chunks, but the chunk table allows at most {limit}")]
    ExtentTooLarge {
        width: u32,
        depth: u32,
        chunks: usize,
        limit: usize,
    },
}
