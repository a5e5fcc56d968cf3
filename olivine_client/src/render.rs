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

//! What the renderer is handed each frame. Building GPU resources from it is the
//! renderer's business.

use std::f64::consts::TAU;

use anyhow::Result;
use cgmath::{vec2, vec3, Deg, InnerSpace, Matrix4, Vector3};
use olivine_core::{terrain::TerrainExtent, CellOffset, ChunkCoordinate, Terrain};
use serde::{Deserialize, Serialize};
use tracy_client::span;

use crate::game_state::{
    physics::CameraPose,
    settings::{BounceSettings, CameraSettings, RenderSettings},
};

pub const PROJ_NEAR: f64 = 0.1;
pub const PROJ_FAR: f64 = 100000.;
// Cube meshes span [-1, 1]; this makes them unit cubes
const CUBE_SCALE: f64 = 0.5;

/// How a cube's place in its chunk shifts the phase of its bounce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SineOffsetType {
    /// Phase grows along the x = z diagonal
    Diagonal,
    /// Phase grows with distance from the chunk corner
    #[default]
    Concentric,
}

/// Vertical bounce of the cube at `offset`, `elapsed` seconds into the run. The phase
/// offset divides the cell's place in its chunk by the terrain extent, in chunks.
pub fn bounce_offset(
    settings: &BounceSettings,
    offset: CellOffset,
    extent: TerrainExtent,
    elapsed: f64,
) -> f64 {
    if settings.bounce_height == 0.0 {
        return 0.0;
    }
    let dims = vec2(extent.width.max(1) as f64, extent.depth.max(1) as f64);
    let local = vec2(offset.x as f64, offset.z as f64);
    let phase = match settings.offset_type {
        SineOffsetType::Diagonal => local.x / dims.x + local.y / dims.y,
        SineOffsetType::Concentric => local.magnitude() / (0.5 * dims.magnitude()),
    } * settings.oscillation_frequency
        * TAU;
    (elapsed * settings.bounces_per_second * TAU + phase).sin() * settings.bounce_height
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubeInstance {
    /// Cube center: the cell's integer (x, z) at the cell's height, plus any bounce
    pub position: Vector3<f64>,
}
impl CubeInstance {
    pub fn model_matrix(&self) -> Matrix4<f64> {
        Matrix4::from_translation(self.position) * Matrix4::from_scale(CUBE_SCALE)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub regenerations: u64,
    pub live_chunks: usize,
    pub cubes: usize,
}

#[derive(Clone, Debug)]
pub struct SceneState {
    pub camera: CameraPose,
    pub fov: Deg<f64>,
    pub aspect_ratio: f64,
    /// Terrain rotation; cube instances are in terrain space
    pub world: Matrix4<f64>,
    pub view: Matrix4<f64>,
    pub projection: Matrix4<f64>,
    pub light_position: Vector3<f32>,
    pub light_color: [f32; 3],
    pub ambient_color: [f32; 3],
    pub chunks: Vec<ChunkCoordinate>,
    pub cubes: Vec<CubeInstance>,
    pub stats: SceneStats,
}
impl SceneState {
    /// Flattens the terrain window into one cube per cell and resolves the camera
    /// transforms for a viewport of the given aspect ratio.
    pub fn build(
        camera: CameraPose,
        camera_settings: &CameraSettings,
        render_settings: &RenderSettings,
        terrain: &Terrain,
        aspect_ratio: f64,
        elapsed: f64,
    ) -> SceneState {
        let _span = span!("build_scene");
        let fov = Deg(camera_settings.fov_degrees);
        let projection = cgmath::perspective(fov, aspect_ratio, PROJ_NEAR, PROJ_FAR);

        let [rx, ry, rz] = render_settings.terrain_rotation;
        let world = Matrix4::from_angle_y(Deg(ry))
            * Matrix4::from_angle_x(Deg(rx))
            * Matrix4::from_angle_z(Deg(rz));

        let extent = terrain.current_extent();
        let mut chunks = Vec::with_capacity(extent.chunk_count());
        let mut cubes = Vec::new();
        for chunk in terrain.active_chunks() {
            chunks.push(chunk.position());
            cubes.extend(chunk.cells().map(|(offset, height)| {
                let xz = chunk.position().with_offset(offset);
                let bounce = bounce_offset(&render_settings.bounce, offset, extent, elapsed);
                CubeInstance {
                    position: vec3(xz.x, height + bounce, xz.y),
                }
            }));
        }
        let stats = SceneStats {
            regenerations: terrain.regenerations(),
            live_chunks: chunks.len(),
            cubes: cubes.len(),
        };

        SceneState {
            camera,
            fov,
            aspect_ratio,
            world,
            view: camera.view_matrix(),
            projection,
            light_position: render_settings.light_position.into(),
            light_color: render_settings.light_color,
            ambient_color: render_settings.ambient_color,
            chunks,
            cubes,
            stats,
        }
    }

    pub fn view_proj(&self) -> Matrix4<f64> {
        self.projection * self.view
    }

    /// Takes terrain-space points, such as cube instance positions, to clip space.
    pub fn world_view_proj(&self) -> Matrix4<f64> {
        self.projection * self.view * self.world
    }
}

/// Consumes one scene per frame.
pub trait Renderer {
    fn draw(&mut self, scene: &SceneState) -> Result<()>;
}
