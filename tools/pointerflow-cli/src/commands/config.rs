//! Print, write or check a Pointerflow configuration file.

use std::path::PathBuf;

use anyhow::Context;

use pointerflow_common::config::PointerflowConfig;

pub fn run(output: Option<PathBuf>, check: Option<PathBuf>) -> anyhow::Result<()> {
    if let Some(path) = check {
        println!("Checking configuration at: {}", path.display());
        let config = PointerflowConfig::load_from(&path)
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;
        println!("  Pan threshold: {}", config.pan.threshold);
        println!("  Pan direction mode: {:?}", config.pan.direction_mode);
        println!(
            "  Pinch pointers: {} (max {})",
            config.pinch.pointers, config.pinch.max_pointers
        );
        println!(
            "  Tap limits: {} units, {} ms (chain {} units, {} ms)",
            config.tap.movement_threshold,
            config.tap.duration_threshold,
            config.tap.chain_movement(),
            config.tap.chain_interval()
        );
        println!("\nConfiguration is valid.");
        return Ok(());
    }

    let config = PointerflowConfig::default();
    match output {
        Some(path) => {
            config
                .save_to(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote default configuration to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}
