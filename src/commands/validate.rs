//! Validate command implementation

use anyhow::Result;
use tracing::info;

use controller_advisor::{Config, ControllerConfig};

pub fn run(config_path: String) -> Result<()> {
    let config = Config::from_file(&config_path)?;
    info!("Loaded configuration from: {}", config_path);

    let controller = &config.controller;
    let id = match controller {
        ControllerConfig::GridStrike(cfg) if !cfg.id.is_empty() => cfg.id.clone(),
        ControllerConfig::PmmMister(cfg) if !cfg.id.is_empty() => cfg.id.clone(),
        other => other.generate_id(std::iter::empty()),
    };

    match controller.validate() {
        Ok(()) => {
            println!("OK    {} ({})", id, controller.controller_name());
            Ok(())
        }
        Err(e) => {
            println!("FAIL  {} ({}): {}", id, controller.controller_name(), e);
            let required: Vec<&str> = controller
                .fields()
                .iter()
                .filter(|f| f.required)
                .map(|f| f.name)
                .collect();
            info!("Required fields: {}", required.join(", "));
            Err(e.into())
        }
    }
}
