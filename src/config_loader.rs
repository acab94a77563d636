use crate::config::FabricConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load, parse and validate a fabric configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<FabricConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration {:?}", config_path))?;

    let config: FabricConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration {:?}", config_path))?;

    config.validate()?;

    info!(
        "Configuration describes {} switches and {} hosts",
        config.fabric.switches.len(),
        config.fabric.hosts.len()
    );

    Ok(config)
}

/// Parse and validate a fabric configuration held in memory
pub fn parse_config(yaml: &str) -> Result<FabricConfig> {
    let config: FabricConfig = serde_yaml::from_str(yaml)?;
    config.validate()?;
    Ok(config)
}

/// Load `config_path` when given, otherwise the built-in three-switch ring
pub fn load_or_default(config_path: Option<&Path>) -> Result<FabricConfig> {
    match config_path {
        Some(path) => load_config(path),
        None => {
            info!("No configuration file given, using the built-in three-switch ring");
            parse_config(DEFAULT_RING_CONFIG)
        }
    }
}

/// The three-switch ring with one host on the first and one on the last
/// switch, used when no configuration file is given.
pub const DEFAULT_RING_CONFIG: &str = r#"
general:
  log_level: info
controller:
  kind: Learning
fabric:
  template: Ring
  switches:
    - name: s0
    - name: s1
    - name: s2
  hosts:
    - name: h0
      switch: s0
    - name: h1
      switch: s2
"#;
