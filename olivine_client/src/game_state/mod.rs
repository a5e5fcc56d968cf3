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

pub mod input;
pub mod physics;
pub mod settings;
pub mod timekeeper;

use std::time::Instant;

use anyhow::{Context, Result};
use olivine_core::{
    noise::GradientNoise,
    terrain::{OctaveNoiseGenerator, RegenerationStats, TerrainChunkStore, TerrainExtent},
    Terrain,
};
use tracy_client::span;

use crate::render::SceneState;

use self::{
    input::{BoundAction, InputState},
    physics::{PhysicsState, PhysicsStep},
    settings::GameSettings,
    timekeeper::{FrameGovernor, FrameTiming},
};

const FOV_SCROLL_STEP: f64 = 2.0;
const FOV_RANGE: (f64, f64) = (10.0, 120.0);

/// Everything one frame reads and mutates. Frames run strictly in sequence on one thread:
/// input, then physics (which may grow and regenerate the terrain), then the scene handed
/// to the renderer.
pub struct GameState {
    settings: GameSettings,
    input: InputState,
    physics: PhysicsState,
    terrain: Terrain,
    governor: FrameGovernor,
    start_time: Instant,
    last_step: PhysicsStep,
}

impl GameState {
    /// Fails if the configured terrain extent doesn't fit the chunk table.
    pub fn new(settings: GameSettings) -> Result<GameState> {
        let terrain = Terrain::new(
            TerrainChunkStore::new(),
            Self::make_generator(&settings),
            settings.terrain.extent,
            settings.terrain.out_of_extent,
        )
        .context("Invalid terrain settings")?;
        Ok(GameState {
            input: InputState::new(settings.input.clone()),
            physics: PhysicsState::new(&settings.camera),
            terrain,
            governor: FrameGovernor::new(settings.render.target_fps),
            start_time: Instant::now(),
            last_step: PhysicsStep::default(),
            settings,
        })
    }

    fn make_generator(settings: &GameSettings) -> OctaveNoiseGenerator {
        OctaveNoiseGenerator::new(
            GradientNoise::new(settings.terrain.seed),
            settings.terrain.octaves.clone(),
        )
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Where the host feeds keyboard and mouse events.
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn physics(&self) -> &PhysicsState {
        &self.physics
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn governor(&self) -> &FrameGovernor {
        &self.governor
    }

    pub fn last_step(&self) -> PhysicsStep {
        self.last_step
    }

    /// The one place the terrain extent is changed from outside the terrain. Takes effect at
    /// the next regeneration. An extent too large for the chunk table is rejected and the
    /// settings keep their previous value.
    pub fn set_terrain_extent(&mut self, extent: TerrainExtent) -> Result<()> {
        self.terrain.set_extent(extent)?;
        self.settings.terrain.extent = extent;
        Ok(())
    }

    pub fn regenerate_terrain(&mut self) -> RegenerationStats {
        self.terrain.regenerate()
    }

    /// Applies settings edited while running. Terrain changes wait for the next regeneration.
    /// If the terrain extent is rejected, nothing is applied.
    pub fn apply_settings(&mut self, settings: GameSettings) -> Result<()> {
        self.terrain.set_extent(settings.terrain.extent)?;
        self.input.set_keybinds(settings.input.clone());
        if settings.terrain.seed != self.settings.terrain.seed
            || settings.terrain.octaves != self.settings.terrain.octaves
        {
            self.terrain.set_generator(Self::make_generator(&settings));
        }
        self.terrain.set_policy(settings.terrain.out_of_extent);
        if settings.camera.debug_camera != self.settings.camera.debug_camera {
            self.physics.set_debug_camera(settings.camera.debug_camera);
        }
        self.governor.set_target_fps(settings.render.target_fps);
        self.settings = settings;
        Ok(())
    }

    /// Runs input handling and physics for one frame and returns the scene to draw.
    /// `viewport` is the drawable size in pixels.
    pub fn advance_frame(&mut self, viewport: (u32, u32)) -> Result<SceneState> {
        let _span = span!("advance_frame");
        let delta = self.governor.last_frame_total();

        if self.input.take_just_pressed(BoundAction::RegenerateTerrain) {
            self.regenerate_terrain();
        }
        if self.input.take_just_pressed(BoundAction::TopDownView) {
            log::info!("Switching to top-down view");
            self.physics.top_down_view();
        }
        let scroll = self.input.take_scroll();
        if scroll != 0.0 {
            self.settings.camera.fov_degrees = (self.settings.camera.fov_degrees
                - scroll * FOV_SCROLL_STEP)
                .clamp(FOV_RANGE.0, FOV_RANGE.1);
        }

        let step = self.physics.update(
            &mut self.input,
            &mut self.terrain,
            &self.settings.camera,
            delta,
        )?;
        if step.extent_grown {
            self.settings.terrain.extent = self.terrain.requested_extent();
        }
        self.settings.camera.debug_camera = self.physics.is_debug_camera();
        self.last_step = step;
        self.input.end_frame();

        let aspect_ratio = viewport.0 as f64 / viewport.1.max(1) as f64;
        let scene = SceneState::build(
            self.physics.pose(),
            &self.settings.camera,
            &self.settings.render,
            &self.terrain,
            aspect_ratio,
            self.start_time.elapsed().as_secs_f64(),
        );

        let interval = self.settings.debug.log_stats_interval;
        if interval > 0 && self.governor.frames() % u64::from(interval) == 0 {
            log::info!(
                "frame {}: work {:?}, total {:?}, {} chunks, {} cubes, {} regenerations",
                self.governor.frames(),
                self.governor.last_frame_work(),
                self.governor.last_frame_total(),
                scene.stats.live_chunks,
                scene.stats.cubes,
                scene.stats.regenerations
            );
        }
        if self.settings.debug.log_camera_position {
            log::debug!("camera at {:?}, {:?}", self.physics.pos(), step);
        }
        Ok(scene)
    }

    /// Sleeps off the rest of the frame budget.
    pub fn finish_frame(&mut self) -> FrameTiming {
        self.governor.finish_frame()
    }

    /// Tears the game state down, handing back the settings as they stand so the host can
    /// persist them.
    pub fn shutdown(self) -> GameSettings {
        log::info!(
            "Shutting down after {} frames and {} terrain regenerations",
            self.governor.frames(),
            self.terrain.regenerations()
        );
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::input::Keybind;
    use cgmath::vec3;
    use olivine_core::terrain::OctaveSet;

    fn small_settings() -> GameSettings {
        let mut settings = GameSettings::default();
        settings.terrain.extent = TerrainExtent::new(2, 2);
        settings.terrain.octaves = OctaveSet::new();
        settings.render.target_fps = 1000;
        settings
    }

    fn press(state: &mut GameState, action: BoundAction) {
        let key: Keybind = state.settings().input.get(action);
        state.input_mut().key_pressed(key);
    }

    fn release(state: &mut GameState, action: BoundAction) {
        let key: Keybind = state.settings().input.get(action);
        state.input_mut().key_released(key);
    }

    #[test]
    fn frame_produces_scene() {
        let mut state = GameState::new(small_settings()).unwrap();
        let scene = state.advance_frame((800, 600)).unwrap();
        assert_eq!(scene.chunks.len(), 4);
        assert_eq!(scene.aspect_ratio, 800.0 / 600.0);
        state.finish_frame();
        assert_eq!(state.governor().frames(), 1);
    }

    #[test]
    fn regenerate_key_applies_requested_extent() {
        let mut state = GameState::new(small_settings()).unwrap();
        state.set_terrain_extent(TerrainExtent::new(4, 4)).unwrap();
        assert_eq!(state.terrain().current_extent(), TerrainExtent::new(2, 2));
        assert_eq!(state.advance_frame((1, 1)).unwrap().chunks.len(), 4);

        press(&mut state, BoundAction::RegenerateTerrain);
        let scene = state.advance_frame((1, 1)).unwrap();
        assert_eq!(scene.chunks.len(), 16);
        assert_eq!(state.terrain().regenerations(), 2);

        // Holding the key doesn't regenerate every frame
        state.advance_frame((1, 1)).unwrap();
        assert_eq!(state.terrain().regenerations(), 2);
        release(&mut state, BoundAction::RegenerateTerrain);
    }

    #[test]
    fn top_down_key() {
        let mut state = GameState::new(small_settings()).unwrap();
        press(&mut state, BoundAction::TopDownView);
        state.advance_frame((1, 1)).unwrap();
        assert!(state.physics().is_debug_camera());
        assert!(state.settings().camera.debug_camera);
        assert_eq!(state.physics().pos(), vec3(0.0, 20.0, 0.0));
    }

    #[test]
    fn growth_is_reflected_in_settings() {
        let mut settings = small_settings();
        settings.camera.debug_camera = true;
        settings.camera.initial_position = [20.0, 5.0, 0.0];
        let mut state = GameState::new(settings).unwrap();
        state.advance_frame((1, 1)).unwrap();
        assert!(state.last_step().extent_grown);
        assert_eq!(state.settings().terrain.extent, TerrainExtent::new(3, 2));
        assert_eq!(state.terrain().current_extent(), TerrainExtent::new(3, 2));
    }

    #[test]
    fn applied_settings_wait_for_regeneration() {
        let mut state = GameState::new(small_settings()).unwrap();
        let mut edited = state.settings().clone();
        edited.terrain.extent = TerrainExtent::new(4, 2);
        edited.terrain.seed = 5;
        edited.camera.debug_camera = true;
        state.apply_settings(edited).unwrap();

        assert!(state.physics().is_debug_camera());
        assert_eq!(state.terrain().requested_extent(), TerrainExtent::new(4, 2));
        assert_eq!(state.terrain().current_extent(), TerrainExtent::new(2, 2));
        assert_eq!(state.terrain().generator().noise().seed(), 5);

        state.regenerate_terrain();
        assert_eq!(state.terrain().current_extent(), TerrainExtent::new(4, 2));
    }

    #[test]
    fn oversized_extent_is_rejected_everywhere() {
        let mut settings = small_settings();
        settings.terrain.extent = TerrainExtent::new(70, 70);
        assert!(GameState::new(settings.clone()).is_err());

        let mut state = GameState::new(small_settings()).unwrap();
        assert!(state.set_terrain_extent(TerrainExtent::new(70, 70)).is_err());
        assert_eq!(state.settings().terrain.extent, TerrainExtent::new(2, 2));
        assert_eq!(state.terrain().requested_extent(), TerrainExtent::new(2, 2));

        settings.terrain.seed = 12;
        assert!(state.apply_settings(settings).is_err());
        assert_eq!(state.settings().terrain.seed, small_settings().terrain.seed);
        assert_eq!(state.terrain().generator().noise().seed(), small_settings().terrain.seed);
    }

    #[test]
    fn growth_keeps_pending_extent_edit() {
        let mut settings = small_settings();
        settings.camera.debug_camera = true;
        settings.camera.initial_position = [20.0, 5.0, 0.0];
        let mut state = GameState::new(settings).unwrap();
        // Edited on the panel, not yet regenerated
        state.set_terrain_extent(TerrainExtent::new(2, 6)).unwrap();
        state.advance_frame((1, 1)).unwrap();
        assert!(state.last_step().extent_grown);
        assert_eq!(state.terrain().current_extent(), TerrainExtent::new(3, 6));
        assert_eq!(state.settings().terrain.extent, TerrainExtent::new(3, 6));
    }

    #[test]
    fn scroll_zooms() {
        let mut state = GameState::new(small_settings()).unwrap();
        state.input_mut().scroll(5.0);
        state.advance_frame((1, 1)).unwrap();
        assert_eq!(state.settings().camera.fov_degrees, 35.0);
        state.input_mut().scroll(-1000.0);
        state.advance_frame((1, 1)).unwrap();
        assert_eq!(state.settings().camera.fov_degrees, 120.0);
    }

    #[test]
    fn shutdown_returns_settings() {
        let mut state = GameState::new(small_settings()).unwrap();
        state.set_terrain_extent(TerrainExtent::new(6, 6)).unwrap();
        let settings = state.shutdown();
        assert_eq!(settings.terrain.extent, TerrainExtent::new(6, 6));
    }
}
