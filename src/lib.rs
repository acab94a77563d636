//! # openflow-fabric - OpenFlow switch installation and controller sessions
//!
//! This library turns ordinary simulated nodes into OpenFlow switches and
//! binds them to a shared controller session.
//!
//! ## Overview
//!
//! Before a switch is installed, its installer records the neighbors behind
//! each of the switch's ports, split into switch neighbors and host
//! neighbors. Installing then creates the switch device, binds the ports,
//! registers the device with the controller under the node's identity
//! address and asks the controller for path computation over the recorded
//! neighbor map.
//!
//! ## Architecture
//!
//! - `net`: nodes, net devices, point-to-point links and OpenFlow switch devices
//! - `topology`: per-switch neighbor maps, link templates and two-phase fabric plans
//! - `controller`: the controller trait, its session registry and the Learning/Drop controllers
//! - `installer`: the per-switch installer that ties the above together
//! - `config` / `config_loader`: YAML fabric description and its validation
//! - `orchestrator`: builds a fabric from a configuration
//! - `report`: JSON snapshot of a built fabric
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use openflow_fabric::{config_loader, orchestrator, report::FabricReport};
//! use std::path::Path;
//!
//! let config = config_loader::load_config(Path::new("fabric.yaml"))?;
//! let built = orchestrator::build_fabric(&config)?;
//! println!("{}", FabricReport::collect(&built)?.to_json()?);
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! general:
//!   log_level: info
//!
//! controller:
//!   kind: Learning            # Learning/Drop
//!   expiration_timeout: "30s"
//!
//! fabric:
//!   template: Ring            # Ring/Line/Star/Mesh
//!   switches:
//!     - name: s0
//!     - name: s1
//!       path_policy: HighThroughput
//!     - name: s2
//!   hosts:
//!     - name: h0
//!       switch: s0
//! ```
//!
//! ## Error Handling
//!
//! Each layer reports typed `thiserror` errors; the configuration and
//! orchestration entry points wrap them with `color_eyre` context.

pub mod config;
pub mod config_loader;
pub mod controller;
pub mod installer;
pub mod net;
pub mod orchestrator;
pub mod report;
pub mod topology;
