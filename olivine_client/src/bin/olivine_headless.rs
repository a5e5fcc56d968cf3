use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use olivine_client::{
    game_state::{
        input::{BoundAction, InputState},
        settings::{default_settings_path, GameSettings},
        GameState,
    },
    render::{Renderer, SceneState},
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug, Clone)]
#[command(about = "Runs the terrain frame loop without a window")]
struct HeadlessArgs {
    /// Number of frames to run before shutting down
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Overrides the target frame rate from the settings file
    #[arg(long)]
    fps: Option<u32>,

    /// Settings file to use instead of the one in the config directory
    #[arg(long, value_name = "SETTINGS_FILE")]
    settings: Option<PathBuf>,

    /// Write the settings back when shutting down
    #[arg(long)]
    save_settings: bool,

    /// Feed scripted movement input instead of leaving the camera alone
    #[arg(long)]
    walk: bool,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,
}

/// Walks forward, turns, jumps now and then, and regenerates the terrain once.
struct ScriptedWalk {
    frame: u64,
}
impl ScriptedWalk {
    const TURN_EVERY: u64 = 240;
    const JUMP_EVERY: u64 = 90;
    const REGENERATE_AT: u64 = 300;

    fn feed(&mut self, input: &mut InputState) {
        let keybinds = input.keybinds().clone();
        if self.frame == 0 {
            input.key_pressed(keybinds.get(BoundAction::MoveForward));
        }
        if self.frame % Self::TURN_EVERY == Self::TURN_EVERY / 2 {
            input.mouse_motion(120.0, 0.0);
        }
        let jump = keybinds.get(BoundAction::Jump);
        if self.frame % Self::JUMP_EVERY == 0 {
            input.key_pressed(jump);
        } else if self.frame % Self::JUMP_EVERY == 10 {
            input.key_released(jump);
        }
        let regenerate = keybinds.get(BoundAction::RegenerateTerrain);
        if self.frame == Self::REGENERATE_AT {
            input.key_pressed(regenerate);
        } else if self.frame == Self::REGENERATE_AT + 1 {
            input.key_released(regenerate);
        }
        self.frame += 1;
    }
}

/// Stands in for a GPU renderer; records what it would have drawn.
#[derive(Default)]
struct LoggingRenderer {
    frames: u64,
    cubes_drawn: u64,
}
impl Renderer for LoggingRenderer {
    fn draw(&mut self, scene: &SceneState) -> Result<()> {
        self.frames += 1;
        self.cubes_drawn += scene.cubes.len() as u64;
        log::trace!(
            "draw {}: {} chunks, {} cubes, camera {:?}",
            self.frames,
            scene.chunks.len(),
            scene.cubes.len(),
            scene.camera
        );
        Ok(())
    }
}

fn main() -> Result<()> {
    let _tracy_client = tracy_client::Client::start();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = HeadlessArgs::parse();

    let settings_path = match &args.settings {
        Some(path) => path.clone(),
        None => default_settings_path()?,
    };
    let mut settings = GameSettings::load_from_path(&settings_path)?;
    if let Some(fps) = args.fps {
        settings.render.target_fps = fps;
    }

    let mut game = GameState::new(settings)?;
    let mut renderer = LoggingRenderer::default();
    let mut walk = args.walk.then_some(ScriptedWalk { frame: 0 });

    for _ in 0..args.frames {
        if let Some(walk) = walk.as_mut() {
            walk.feed(game.input_mut());
        }
        let scene = game.advance_frame((args.width, args.height))?;
        renderer.draw(&scene)?;
        game.finish_frame();
    }

    log::info!(
        "Drew {} frames ({} cubes); camera ended at {:?}",
        renderer.frames,
        renderer.cubes_drawn,
        game.physics().pos()
    );
    let settings = game.shutdown();
    if args.save_settings {
        settings
            .save_to_path(&settings_path)
            .context("Failed to save settings")?;
    }
    Ok(())
}
