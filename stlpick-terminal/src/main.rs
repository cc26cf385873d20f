//! stlpick - terminal STL viewer with face picking
//!
//! # Usage
//!
//! ```bash
//! stlpick-terminal model.stl
//! stlpick-terminal model.stl --config viewer.toml
//! RUST_LOG=debug stlpick-terminal model.stl 2> stlpick.log
//! ```
//!
//! Without a file a cube is shown.
//!
//! # Controls
//!
//! - WASD / Arrow keys / left drag: Orbit
//! - +/- / mouse wheel: Zoom
//! - Click: Pick a face, Ctrl+Click: toggle a face in the selection
//! - B: Rebase the model onto the first selected face
//! - G: Grow the selection, C: Clear it
//! - P: Toggle projection, R: Reset the view
//! - Q/ESC: Quit

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use stlpick_core::{Mesh, Scene, ViewerConfig};
use stlpick_terminal::TerminalApp;

#[derive(Parser)]
#[command(name = "stlpick-terminal")]
#[command(author, version, about = "Terminal STL viewer with face picking and rebasing")]
struct Args {
    /// STL file to open (ASCII or binary); a cube is shown when omitted
    path: Option<PathBuf>,

    /// Viewer configuration file (TOML)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    let scene = match &args.path {
        Some(path) => Scene::load(path, config)
            .with_context(|| format!("failed to open {}", path.display()))?,
        None => {
            tracing::info!("no STL file given, showing a cube");
            Scene::new(Mesh::cube(2.0), config)?
        }
    };

    let mut app = TerminalApp::new(scene).context("failed to query the terminal size")?;
    app.run().context("terminal error")?;
    Ok(())
}
