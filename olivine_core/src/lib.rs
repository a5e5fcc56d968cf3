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


//! Terrain core shared by every host: coherent noise, the chunked heightfield store,
//! terrain generation and height queries.

pub mod constants;
pub mod coordinates;
pub mod error;
pub mod noise;
pub mod terrain;

pub use coordinates::{CellOffset, ChunkCoordinate};
pub use error::TerrainError;
pub use terrain::Terrain;
