use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum BoundAction {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    Jump,
    Descend,
    FastMove,
    LookUp,
    LookDown,
    LookLeft,
    LookRight,
    ToggleDebugCamera,
    MouseCapture,
    RegenerateTerrain,
    TopDownView,
}
impl BoundAction {
    pub const ALL: [BoundAction; 15] = [
        BoundAction::MoveForward,
        BoundAction::MoveBackward,
        BoundAction::MoveLeft,
        BoundAction::MoveRight,
        BoundAction::Jump,
        BoundAction::Descend,
        BoundAction::FastMove,
        BoundAction::LookUp,
        BoundAction::LookDown,
        BoundAction::LookLeft,
        BoundAction::LookRight,
        BoundAction::ToggleDebugCamera,
        BoundAction::MouseCapture,
        BoundAction::RegenerateTerrain,
        BoundAction::TopDownView,
    ];
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct KeybindSettings {
    /// Radians of camera rotation per pixel of mouse motion
    pub camera_sensitivity: f64,
    pub invert_mouse_y: bool,

    pub move_forward: Keybind,
    pub move_backward: Keybind,
    pub move_left: Keybind,
    pub move_right: Keybind,
    pub jump: Keybind,
    pub descend: Keybind,
    pub fast_move: Keybind,

    pub look_up: Keybind,
    pub look_down: Keybind,
    pub look_left: Keybind,
    pub look_right: Keybind,

    pub toggle_debug_camera: Keybind,
    pub mouse_capture: Keybind,
    pub regenerate_terrain: Keybind,
    pub top_down_view: Keybind,
}
impl KeybindSettings {
    pub fn get(&self, action: BoundAction) -> Keybind {
        match action {
            BoundAction::MoveForward => self.move_forward,
            BoundAction::MoveBackward => self.move_backward,
            BoundAction::MoveLeft => self.move_left,
            BoundAction::MoveRight => self.move_right,
            BoundAction::Jump => self.jump,
            BoundAction::Descend => self.descend,
            BoundAction::FastMove => self.fast_move,
            BoundAction::LookUp => self.look_up,
            BoundAction::LookDown => self.look_down,
            BoundAction::LookLeft => self.look_left,
            BoundAction::LookRight => self.look_right,
            BoundAction::ToggleDebugCamera => self.toggle_debug_camera,
            BoundAction::MouseCapture => self.mouse_capture,
            BoundAction::RegenerateTerrain => self.regenerate_terrain,
            BoundAction::TopDownView => self.top_down_view,
        }
    }
}
impl Default for KeybindSettings {
    fn default() -> Self {
        use Keybind::*;
        Self {
            camera_sensitivity: 0.005,
            invert_mouse_y: false,
            move_forward: ScanCode(0x11),
            move_backward: ScanCode(0x1f),
            move_left: ScanCode(0x1e),
            move_right: ScanCode(0x20),
            jump: ScanCode(0x39),
            descend: ScanCode(0x21),
            fast_move: ScanCode(0x2a),
            look_up: ScanCode(0xe048),
            look_down: ScanCode(0xe050),
            look_left: ScanCode(0xe04b),
            look_right: ScanCode(0xe04d),
            toggle_debug_camera: ScanCode(0x12),
            mouse_capture: ScanCode(0x10),
            regenerate_terrain: ScanCode(0x13),
            top_down_view: ScanCode(0x14),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum Keybind {
    ScanCode(u32),
    MouseButton(u16),
}

/// Accumulates raw input between frames. The frame loop drains it through the `take_*`
/// methods.
pub struct InputState {
    keybinds: KeybindSettings,

    active_keybinds: FxHashSet<Keybind>,
    new_presses: FxHashSet<Keybind>,

    // Already scaled to radians
    pending_camera_delta: (f64, f64),
    pending_scroll: f64,

    mouse_captured: bool,
    // If true, the UI overlay wants the keyboard and mouse, and nothing else should
    // act on them.
    modal_active: bool,
}
impl InputState {
    pub fn new(keybinds: KeybindSettings) -> InputState {
        InputState {
            keybinds,
            active_keybinds: FxHashSet::default(),
            new_presses: FxHashSet::default(),
            pending_camera_delta: (0.0, 0.0),
            pending_scroll: 0.0,
            mouse_captured: true,
            modal_active: false,
        }
    }

    pub fn keybinds(&self) -> &KeybindSettings {
        &self.keybinds
    }

    pub fn set_keybinds(&mut self, keybinds: KeybindSettings) {
        self.keybinds = keybinds;
    }

    pub fn key_pressed(&mut self, key: Keybind) {
        // Key repeat shows up as repeated presses; only the first counts
        if self.active_keybinds.insert(key) {
            self.new_presses.insert(key);
            if key == self.keybinds.mouse_capture && !self.modal_active {
                self.mouse_captured = !self.mouse_captured;
                log::info!("Mouse capture {}", if self.mouse_captured { "on" } else { "off" });
            }
        }
    }

    pub fn key_released(&mut self, key: Keybind) {
        self.active_keybinds.remove(&key);
    }

    /// Relative pointer motion, in pixels.
    pub fn mouse_motion(&mut self, dx: f64, dy: f64) {
        if !self.mouse_captured {
            return;
        }
        let sensitivity = self.keybinds.camera_sensitivity;
        let dy = if self.keybinds.invert_mouse_y { -dy } else { dy };
        self.pending_camera_delta.0 += dx * sensitivity;
        self.pending_camera_delta.1 += dy * sensitivity;
    }

    pub fn scroll(&mut self, lines: f64) {
        self.pending_scroll += lines;
    }

    pub fn set_modal_active(&mut self, active: bool) {
        if active {
            self.active_keybinds.clear();
            self.new_presses.clear();
        }
        self.modal_active = active;
    }

    pub fn is_modal_active(&self) -> bool {
        self.modal_active
    }

    pub fn is_pressed(&self, action: BoundAction) -> bool {
        if self.modal_active {
            return false;
        }
        self.active_keybinds.contains(&self.keybinds.get(action))
    }

    pub fn take_just_pressed(&mut self, action: BoundAction) -> bool {
        if self.modal_active {
            return false;
        }
        self.new_presses.remove(&self.keybinds.get(action))
    }

    /// Returns the (yaw, pitch) change in radians since the last call.
    pub fn take_mouse_delta(&mut self) -> (f64, f64) {
        let delta = self.pending_camera_delta;
        self.pending_camera_delta = (0., 0.);
        if self.modal_active {
            (0., 0.)
        } else {
            delta
        }
    }

    pub fn take_scroll(&mut self) -> f64 {
        let delta = self.pending_scroll;
        self.pending_scroll = 0.;
        if self.modal_active {
            0.
        } else {
            delta
        }
    }

    pub fn is_mouse_captured(&self) -> bool {
        self.mouse_captured && !self.modal_active
    }

    /// Drops presses nobody consumed this frame.
    pub fn end_frame(&mut self) {
        self.new_presses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::assert_relative_eq;

    fn key(action: BoundAction) -> Keybind {
        KeybindSettings::default().get(action)
    }

    #[test]
    fn default_keybinds_are_distinct() {
        let settings = KeybindSettings::default();
        let bound: FxHashSet<Keybind> =
            BoundAction::ALL.iter().map(|a| settings.get(*a)).collect();
        assert_eq!(bound.len(), BoundAction::ALL.len());
    }

    #[test]
    fn held_and_just_pressed() {
        let mut input = InputState::new(KeybindSettings::default());
        input.key_pressed(key(BoundAction::MoveForward));
        assert!(input.is_pressed(BoundAction::MoveForward));
        assert!(input.take_just_pressed(BoundAction::MoveForward));
        assert!(!input.take_just_pressed(BoundAction::MoveForward));
        // Repeat events don't produce another press
        input.key_pressed(key(BoundAction::MoveForward));
        assert!(!input.take_just_pressed(BoundAction::MoveForward));
        input.key_released(key(BoundAction::MoveForward));
        assert!(!input.is_pressed(BoundAction::MoveForward));
    }

    #[test]
    fn unconsumed_presses_expire() {
        let mut input = InputState::new(KeybindSettings::default());
        input.key_pressed(key(BoundAction::RegenerateTerrain));
        input.end_frame();
        assert!(!input.take_just_pressed(BoundAction::RegenerateTerrain));
        assert!(input.is_pressed(BoundAction::RegenerateTerrain));
    }

    #[test]
    fn mouse_delta_is_scaled_and_drained() {
        let mut input = InputState::new(KeybindSettings {
            camera_sensitivity: 0.01,
            ..Default::default()
        });
        input.mouse_motion(10.0, -20.0);
        input.mouse_motion(5.0, 0.0);
        let (yaw, pitch) = input.take_mouse_delta();
        assert_relative_eq!(yaw, 0.15);
        assert_relative_eq!(pitch, -0.2);
        assert_eq!(input.take_mouse_delta(), (0., 0.));
    }

    #[test]
    fn mouse_capture_toggle_gates_motion() {
        let mut input = InputState::new(KeybindSettings::default());
        assert!(input.is_mouse_captured());
        input.key_pressed(key(BoundAction::MouseCapture));
        assert!(!input.is_mouse_captured());
        input.mouse_motion(100.0, 100.0);
        assert_eq!(input.take_mouse_delta(), (0., 0.));
        input.key_released(key(BoundAction::MouseCapture));
        input.key_pressed(key(BoundAction::MouseCapture));
        assert!(input.is_mouse_captured());
    }

    #[test]
    fn modal_suppresses_everything() {
        let mut input = InputState::new(KeybindSettings::default());
        input.key_pressed(key(BoundAction::Jump));
        input.mouse_motion(3.0, 4.0);
        input.scroll(2.0);
        input.set_modal_active(true);
        assert!(!input.is_pressed(BoundAction::Jump));
        assert!(!input.take_just_pressed(BoundAction::Jump));
        assert_eq!(input.take_mouse_delta(), (0., 0.));
        assert_eq!(input.take_scroll(), 0.);
        assert!(!input.is_mouse_captured());

        // The held key was forgotten, not just hidden
        input.set_modal_active(false);
        assert!(!input.is_pressed(BoundAction::Jump));
    }

    #[test]
    fn inverted_mouse() {
        let mut input = InputState::new(KeybindSettings {
            camera_sensitivity: 1.0,
            invert_mouse_y: true,
            ..Default::default()
        });
        input.mouse_motion(0.0, 2.0);
        assert_eq!(input.take_mouse_delta(), (0.0, -2.0));
    }
}
