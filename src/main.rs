use color_eyre::Result;
use env_logger::Env;
use log::{info, LevelFilter};
use std::path::PathBuf;

use openflow_fabric::config_loader::load_or_default;
use openflow_fabric::orchestrator::build_fabric;
use openflow_fabric::report::{write_report, FabricReport};

/// YAML fabric description to build; the built-in three-switch ring when unset
const CONFIG_ENV: &str = "OPENFLOW_FABRIC_CONFIG";
/// Where to write the JSON report; stdout when unset
const REPORT_ENV: &str = "OPENFLOW_FABRIC_REPORT";

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Without RUST_LOG the level starts at info and follows general.log_level
    // once the configuration is loaded
    let level_from_config = std::env::var_os("RUST_LOG").is_none();
    env_logger::Builder::from_env(Env::default().default_filter_or("trace")).init();
    if level_from_config {
        log::set_max_level(LevelFilter::Info);
    }

    let config_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let config = load_or_default(config_path.as_deref())?;

    if level_from_config {
        if let Some(level) = &config.general.log_level {
            log::set_max_level(level.parse::<LevelFilter>()?);
        }
    }

    let built = build_fabric(&config)?;
    let report = FabricReport::collect(&built)?;
    info!("Built {} switches", report.switches.len());

    match std::env::var_os(REPORT_ENV) {
        Some(path) => write_report(&report, &PathBuf::from(path))?,
        None => println!("{}", report.to_json()?),
    }

    Ok(())
}
