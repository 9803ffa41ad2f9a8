//! Meadow demo
//!
//! ```bash
//! MEADOW_GRASS_COUNT=20000 RUST_LOG=debug cargo run --release
//! ```

use anyhow::Context;

use meadow::{config::AppConfig, MeadowApp};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info,wgpu_core=warn,wgpu_hal=warn,naga=warn"),
    )
    .init();

    let config = AppConfig::from_env().context("Invalid MEADOW_* environment configuration")?;
    log::info!(
        "Starting meadow: {} grass blades, shadow map {}px, vsync {}",
        config.scene.grass_count,
        config.shadow.resolution,
        config.window.vsync
    );

    MeadowApp::new(config).run().context("Renderer stopped with an error")?;
    Ok(())
}
