use anyhow::{Context, Result};
use casegate_core::config::GateConfig;
use casegate_infrastructure::ConfigService;

pub fn show(config: &GateConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render config as TOML")?;
    print!("{}", rendered);
    Ok(())
}

pub fn path(service: &ConfigService) {
    println!("{}", service.path().display());
}
