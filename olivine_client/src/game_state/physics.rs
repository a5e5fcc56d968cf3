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

use std::{
    f64::consts::{FRAC_PI_2, TAU},
    time::Duration,
};

use anyhow::Result;
use cgmath::{vec2, vec3, InnerSpace, Matrix3, Matrix4, Rad, Vector2, Vector3, Zero};
use olivine_core::{ChunkCoordinate, Terrain};
use tracy_client::{plot, span};

use super::{
    input::{BoundAction, InputState},
    settings::CameraSettings,
};

// All per-frame factors below are defined against this frame length and rescaled to the
// measured delta.
const REFERENCE_DELTA: f64 = 1.0 / 60.0;
const LINEAR_DAMPING: f64 = 0.8;
const ANGULAR_DAMPING: f64 = 0.8;

const GRAVITY_ACCEL: f64 = 9.8;
const JUMP_VELOCITY: f64 = 6.0;
// rad/s^2 while a look key is held
const LOOK_KEY_ACCEL: f64 = 30.0;
const FAST_MOVE_RATIO: f64 = 3.0;
// Feet within this distance of the ground count as standing on it
const GROUND_EPS: f64 = 0.000001;
// How far from `ground - feet`, in ulps, the clamp looks for an exact standing height
const STANDING_SEARCH_ULPS: usize = 4;

const TOP_DOWN_POSITION: Vector3<f64> = vec3(0.0, 20.0, 0.0);

/// `factor` is the per-reference-frame decay; returns the decay for a frame of `dt` seconds.
pub(crate) fn damping_factor(factor: f64, dt: f64) -> f64 {
    factor.powf(dt / REFERENCE_DELTA)
}

/// The adjacent f64 toward +inf (`up`) or -inf.
fn next_float(value: f64, up: bool) -> f64 {
    let limit = if up { f64::INFINITY } else { f64::NEG_INFINITY };
    if value.is_nan() || value == limit {
        return value;
    }
    if value == 0.0 {
        let smallest = f64::from_bits(1);
        return if up { smallest } else { -smallest };
    }
    let bits = value.to_bits();
    if (value > 0.0) == up {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

/// Camera height that puts the feet on `ground`: a `y` with `y + feet == ground` when one
/// exists near `ground - feet`, which is always the case for quantized terrain heights and
/// a feet offset on the same grid. Otherwise the lowest nearby `y` that keeps the feet
/// above the ground.
pub(crate) fn standing_height(ground: f64, feet: f64) -> f64 {
    let nearest = ground - feet;
    let mut candidate = nearest;
    for _ in 0..STANDING_SEARCH_ULPS {
        candidate = next_float(candidate, false);
    }
    let mut above = None;
    for _ in 0..=2 * STANDING_SEARCH_ULPS {
        let standing = candidate + feet;
        if standing == ground {
            return candidate;
        }
        if standing > ground && above.is_none() {
            above = Some(candidate);
        }
        candidate = next_float(candidate, true);
    }
    above.unwrap_or(nearest)
}

/// Camera position and orientation. Pitch is positive looking down; yaw is positive
/// turning right, and zero looks along -z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vector3<f64>,
    pub pitch: Rad<f64>,
    pub yaw: Rad<f64>,
}
impl CameraPose {
    pub fn view_matrix(&self) -> Matrix4<f64> {
        Matrix4::from_angle_x(self.pitch)
            * Matrix4::from_angle_y(self.yaw)
            * Matrix4::from_translation(-self.position)
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vector3<f64> {
        Matrix3::from_angle_y(-self.yaw) * Matrix3::from_angle_x(-self.pitch) * vec3(0., 0., -1.)
    }
}

/// What happened during one physics step, for the frame loop and the debug overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PhysicsStep {
    /// Ground height under the camera after the step; None with the debug camera
    pub ground_height: Option<f64>,
    pub grounded: bool,
    pub jumped: bool,
    pub extent_grown: bool,
}

pub struct PhysicsState {
    pos: Vector3<f64>,
    velocity: Vector3<f64>,
    pitch: Rad<f64>,
    yaw: Rad<f64>,
    // (pitch, yaw), rad/s
    angular_velocity: Vector2<f64>,
    debug_camera: bool,
    grounded: bool,
}

impl PhysicsState {
    /// Places the camera at the configured position, facing the origin.
    pub fn new(settings: &CameraSettings) -> Self {
        let pos = Vector3::from(settings.initial_position);
        let horizontal = vec2(pos.x, pos.z).magnitude();
        Self {
            pos,
            velocity: Vector3::zero(),
            pitch: Rad(pos.y.atan2(horizontal)),
            yaw: Rad((-pos.x).atan2(pos.z).rem_euclid(TAU)),
            angular_velocity: Vector2::zero(),
            debug_camera: settings.debug_camera,
            grounded: false,
        }
    }

    /// Advances the camera by `delta`. Queries the terrain for ground contact unless the
    /// debug camera is on, and grows the terrain window if the camera has left it.
    pub fn update(
        &mut self,
        input: &mut InputState,
        terrain: &mut Terrain,
        settings: &CameraSettings,
        delta: Duration,
    ) -> Result<PhysicsStep> {
        let _span = span!("physics_update");
        let dt = delta.as_secs_f64();
        let mut step = PhysicsStep::default();

        if input.take_just_pressed(BoundAction::ToggleDebugCamera) {
            self.set_debug_camera(!self.debug_camera);
        }
        self.update_angles(input, dt);

        let mut accel = self.movement_acceleration(input, settings);
        if !self.debug_camera {
            let ground = terrain.height_at(self.xz())?;
            let feet = self.pos.y + settings.player_feet;
            if feet > ground + GROUND_EPS {
                if settings.gravity {
                    accel.y -= GRAVITY_ACCEL;
                }
            } else if input.is_pressed(BoundAction::Jump) {
                self.velocity.y = JUMP_VELOCITY;
                step.jumped = true;
            }
        }

        self.velocity += accel * dt;
        let damping = damping_factor(LINEAR_DAMPING, dt);
        self.velocity.x *= damping;
        self.velocity.z *= damping;
        if self.debug_camera || !settings.gravity {
            self.velocity.y *= damping;
        }

        let previous = self.pos;
        self.pos += self.velocity * dt;
        if !(self.pos.x.is_finite() && self.pos.y.is_finite() && self.pos.z.is_finite()) {
            log::warn!(
                "Camera integrated to {:?} (velocity {:?}, dt {}), reverting",
                self.pos,
                self.velocity,
                dt
            );
            self.pos = previous;
            self.velocity = Vector3::zero();
        }

        if self.debug_camera {
            self.grounded = false;
        } else {
            let ground = terrain.height_at(self.xz())?;
            if self.pos.y + settings.player_feet < ground {
                self.pos.y = standing_height(ground, settings.player_feet);
                self.velocity.y = 0.0;
            }
            self.grounded = self.pos.y + settings.player_feet <= ground + GROUND_EPS;
            step.ground_height = Some(ground);
        }
        step.grounded = self.grounded;
        plot!("camera_speed", self.velocity.magnitude());

        step.extent_grown = terrain.grow_to_include(ChunkCoordinate::containing(self.xz())?);
        Ok(step)
    }

    fn update_angles(&mut self, input: &mut InputState, dt: f64) {
        let (yaw_delta, pitch_delta) = input.take_mouse_delta();

        let mut angular_accel = Vector2::zero();
        if input.is_pressed(BoundAction::LookUp) {
            angular_accel.x -= LOOK_KEY_ACCEL;
        }
        if input.is_pressed(BoundAction::LookDown) {
            angular_accel.x += LOOK_KEY_ACCEL;
        }
        if input.is_pressed(BoundAction::LookLeft) {
            angular_accel.y -= LOOK_KEY_ACCEL;
        }
        if input.is_pressed(BoundAction::LookRight) {
            angular_accel.y += LOOK_KEY_ACCEL;
        }
        self.angular_velocity += angular_accel * dt;
        self.angular_velocity *= damping_factor(ANGULAR_DAMPING, dt);

        let pitch = self.pitch.0 + pitch_delta + self.angular_velocity.x * dt;
        let clamped = pitch.clamp(-FRAC_PI_2, FRAC_PI_2);
        if clamped != pitch {
            self.angular_velocity.x = 0.0;
        }
        self.pitch = Rad(clamped);
        self.yaw = Rad((self.yaw.0 + yaw_delta + self.angular_velocity.y * dt).rem_euclid(TAU));
    }

    /// World-space acceleration from the movement keys. Scaled so that holding a key settles
    /// at the configured speed under linear damping.
    fn movement_acceleration(
        &self,
        input: &InputState,
        settings: &CameraSettings,
    ) -> Vector3<f64> {
        let mut speed = settings.player_speed;
        if input.is_pressed(BoundAction::FastMove) {
            speed *= FAST_MOVE_RATIO;
        }

        let mut horizontal = Vector2::zero();
        if input.is_pressed(BoundAction::MoveForward) {
            horizontal.y -= 1.0;
        }
        if input.is_pressed(BoundAction::MoveBackward) {
            horizontal.y += 1.0;
        }
        if input.is_pressed(BoundAction::MoveLeft) {
            horizontal.x -= 1.0;
        }
        if input.is_pressed(BoundAction::MoveRight) {
            horizontal.x += 1.0;
        }
        if horizontal.magnitude2() > 0.0 {
            horizontal = horizontal.normalize();
        }

        let mut vertical = 0.0;
        if self.debug_camera {
            if input.is_pressed(BoundAction::Jump) {
                vertical += 1.0;
            }
            if input.is_pressed(BoundAction::Descend) {
                vertical -= 1.0;
            }
        }

        let local = vec3(horizontal.x, vertical, horizontal.y) * speed;
        let settle_scale = (1.0 - LINEAR_DAMPING) / (LINEAR_DAMPING * REFERENCE_DELTA);
        Matrix3::from_angle_y(-self.yaw) * local * settle_scale
    }

    /// Looks straight down at the terrain from above, in free flight.
    pub fn top_down_view(&mut self) {
        self.pos = TOP_DOWN_POSITION;
        self.pitch = Rad(FRAC_PI_2);
        self.yaw = Rad(0.0);
        self.velocity = Vector3::zero();
        self.angular_velocity = Vector2::zero();
        self.set_debug_camera(true);
    }

    pub fn set_debug_camera(&mut self, enabled: bool) {
        if enabled != self.debug_camera {
            log::info!("Debug camera {}", if enabled { "on" } else { "off" });
        }
        self.debug_camera = enabled;
    }

    pub fn is_debug_camera(&self) -> bool {
        self.debug_camera
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn pos(&self) -> Vector3<f64> {
        self.pos
    }

    pub fn set_position(&mut self, pos: Vector3<f64>) {
        self.pos = pos;
    }

    pub fn velocity(&self) -> Vector3<f64> {
        self.velocity
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.pos,
            pitch: self.pitch,
            yaw: self.yaw,
        }
    }

    fn xz(&self) -> Vector2<f64> {
        vec2(self.pos.x, self.pos.z)
    }
}
