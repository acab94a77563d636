use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::controller::PathPolicy;
use crate::net::DeviceConfig;
use crate::topology::Topology;

/// Flow idle timeouts are 16-bit second counts on the wire.
const MAX_IDLE_TIMEOUT_SECS: u64 = u16::MAX as u64;

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Top-level configuration that mirrors the YAML file
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FabricConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    pub fabric: FabricSpec,
}

impl FabricConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(level) = &self.general.log_level {
            if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(ValidationError::InvalidGeneral(format!(
                    "unknown log_level '{}'",
                    level
                )));
            }
        }

        self.controller.validate()?;
        self.fabric.validate()?;

        Ok(())
    }

    /// All switch-to-switch links: template links first, then explicit ones.
    pub fn switch_links(&self) -> Vec<(String, String)> {
        let mut links = Vec::new();
        if let Some(template) = &self.fabric.template {
            let names: Vec<&str> = self.fabric.switches.iter().map(|s| s.name.as_str()).collect();
            for (a, b) in crate::topology::generate_switch_links(template, names.len()) {
                links.push((names[a].to_string(), names[b].to_string()));
            }
        }
        links.extend(self.fabric.links.iter().cloned());
        links
    }
}

/// Shared general configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GeneralConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Which controller implementation drives the fabric
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerKind {
    /// Computes per-switch forwarding tables
    #[default]
    Learning,
    /// Installs no forwarding state
    Drop,
}

/// Controller session configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct ControllerConfig {
    #[serde(default)]
    pub kind: ControllerKind,
    /// Idle timeout of learned flow entries. Zero disables expiration.
    #[serde(default, with = "humantime_serde")]
    pub expiration_timeout: Duration,
}

impl ControllerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.expiration_timeout.as_secs() > MAX_IDLE_TIMEOUT_SECS {
            return Err(ValidationError::InvalidController(format!(
                "expiration_timeout {:?} exceeds the flow idle timeout limit of {}s",
                self.expiration_timeout, MAX_IDLE_TIMEOUT_SECS
            )));
        }
        if self.kind == ControllerKind::Drop && !self.expiration_timeout.is_zero() {
            log::warn!(
                "expiration_timeout {:?} has no effect with the Drop controller",
                self.expiration_timeout
            );
        }
        Ok(())
    }
}

/// Fabric description: switches, hosts and switch links
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FabricSpec {
    /// Generate switch links from a template, in switch declaration order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<Topology>,
    /// Device-factory defaults for every switch
    #[serde(default)]
    pub device: DeviceConfig,
    pub switches: Vec<SwitchConfig>,
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
    /// Extra switch links, created after the template links
    #[serde(default)]
    pub links: Vec<(String, String)>,
}

impl FabricSpec {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.switches.is_empty() {
            return Err(ValidationError::InvalidFabric(
                "at least one switch is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        let switch_names: HashSet<&str> = self.switches.iter().map(|s| s.name.as_str()).collect();
        let all_names = self
            .switches
            .iter()
            .map(|s| &s.name)
            .chain(self.hosts.iter().map(|h| &h.name));
        for name in all_names {
            if name.trim().is_empty() {
                return Err(ValidationError::InvalidFabric(
                    "names cannot be empty".to_string(),
                ));
            }
            if !names.insert(name.as_str()) {
                return Err(ValidationError::InvalidFabric(format!(
                    "name '{}' is used more than once",
                    name
                )));
            }
        }

        for host in &self.hosts {
            if !switch_names.contains(host.switch.as_str()) {
                return Err(ValidationError::InvalidFabric(format!(
                    "host '{}' references unknown switch '{}'",
                    host.name, host.switch
                )));
            }
        }

        for (a, b) in &self.links {
            for end in [a, b] {
                if !switch_names.contains(end.as_str()) {
                    return Err(ValidationError::InvalidFabric(format!(
                        "link {} - {} references unknown switch '{}'",
                        a, b, end
                    )));
                }
            }
            if a == b {
                return Err(ValidationError::InvalidFabric(format!(
                    "switch '{}' cannot link to itself",
                    a
                )));
            }
        }

        if self.device.max_ports == 0 {
            return Err(ValidationError::InvalidFabric(
                "device.max_ports must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// One switch of the fabric
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SwitchConfig {
    pub name: String,
    #[serde(default)]
    pub path_policy: PathPolicy,
}

/// One host and the switch it hangs off
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HostConfig {
    pub name: String,
    pub switch: String,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid controller configuration: {0}")]
    InvalidController(String),
    #[error("Invalid fabric configuration: {0}")]
    InvalidFabric(String),
}
