//! # sandbox
//!
//! Runs the sample scene headless: a scripted camera flies past a row of
//! cubes while a logging renderer reports what it would draw.
//!
//! ```text
//! RUST_LOG=sandbox=debug,neo_system=debug sandbox --frames 120 --editor
//! ```

mod scene;
mod systems;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use neo_system::{Engine, EngineConfig};
use systems::{CameraControllerSystem, LogRenderer, RenderSystem, SineMovementSystem};

#[derive(Parser)]
#[command(name = "sandbox", about = "Neo engine sample scene")]
struct Args {
    /// Path to a JSON engine config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many frames (overrides the config; 0 runs until stopped)
    #[arg(short, long)]
    frames: Option<u64>,

    /// Run the editor inspection pass and print the final snapshot
    #[arg(short, long)]
    editor: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sandbox=info".parse()?))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            EngineConfig::from_file(path)?
        }
        None => EngineConfig::default().with_app_name("sandbox").with_max_frames(300),
    };
    if let Some(frames) = args.frames {
        config = config.with_max_frames(frames);
    }
    if args.editor {
        config = config.with_editor(true);
    }

    let mut engine = Engine::new(config);
    let camera = scene::populate(engine.store_mut())?;
    info!(%camera, "main camera ready");

    let controller = engine.add_system(CameraControllerSystem::demo());
    engine.add_system(SineMovementSystem);
    let render = engine.add_system(RenderSystem::new(LogRenderer::default()));

    let frames = engine.run()?;

    if let Some(system) = engine.systems().system::<CameraControllerSystem>(controller) {
        info!(moved_frames = system.moved_frames(), "camera summary");
    }
    if let Some(system) = engine.systems().system::<RenderSystem<LogRenderer>>(render) {
        let renderer = system.renderer();
        info!(
            rendered = renderer.frames(),
            skipped = system.skipped_frames(),
            last_draws = renderer.draws(),
            last_visible = renderer.visible(),
            aspect = system.aspect(),
            "render summary"
        );
    }

    if let Some(snapshot) = engine.editor_snapshot() {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
    }

    engine.shutdown();
    info!(frames, "sandbox finished");
    Ok(())
}
