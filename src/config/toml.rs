//! TOML build manifest parsing.
//!
//! Defines the structure of the manifest with serde.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::render::{DocumentKind, Features};

use super::ConfigError;

/// Root manifest structure.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Version and directory settings
    #[serde(default)]
    pub build: BuildSection,

    /// Where the installed version is recorded
    #[serde(default)]
    pub upgrade: UpgradeSection,

    /// Which parameters are tracked
    #[serde(default)]
    pub params: ParamsSection,

    /// Template tokens (`{name}` placeholders)
    #[serde(default)]
    pub tokens: BTreeMap<String, toml::Value>,

    /// Hardware and add-on switches
    #[serde(default)]
    pub features: FeaturesSection,

    /// Files to build
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetSection>,
}

/// Build settings section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Schema version being installed
    pub version: Option<String>,

    /// Directory templates are read from
    pub template_dir: Option<String>,

    /// Directory outputs are written to
    pub output_dir: Option<String>,

    /// Directory holding the previously installed files
    pub previous_dir: Option<String>,

    /// Maximum number of concurrent builds
    pub jobs: Option<usize>,

    /// Keep template values instead of carrying over previous ones
    #[serde(default)]
    pub skip_retain: bool,

    /// Token holding the gate count
    pub gates_token: Option<String>,
}

/// Version parameter section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpgradeSection {
    /// Section holding the installed version
    pub version_section: Option<String>,

    /// Key holding the installed version
    pub version_key: Option<String>,
}

/// Parameter allow-list section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamsSection {
    /// Key prefixes to track (empty with no patterns = all keys)
    #[serde(default)]
    pub prefixes: Vec<String>,

    /// Key regex patterns to track
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Section supplemental options are re-inserted into
    pub parameters_section: Option<String>,

    /// Replaces the built-in supplemental option list
    pub supplemental: Option<Vec<String>>,
}

/// Feature switches section. Unset switches keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeaturesSection {
    /// Encoder fitted
    pub encoder: Option<bool>,
    /// Selector servo fitted
    pub selector_servo: Option<bool>,
    /// Pre-gate sensors fitted
    pub gate_sensors: Option<bool>,
    /// Post-gear sensors fitted
    pub gear_sensors: Option<bool>,
    /// One gear stepper per gate
    pub multi_gear: Option<bool>,
    /// LED chain fitted
    pub leds: Option<bool>,
    /// Blobifier add-on installed
    pub blobifier: Option<bool>,
    /// EREC cutter add-on installed
    pub erec_cutter: Option<bool>,
}

impl FeaturesSection {
    /// Overlays the switches that are set onto `base`.
    #[must_use]
    pub fn apply(&self, base: Features) -> Features {
        Features {
            encoder: self.encoder.unwrap_or(base.encoder),
            selector_servo: self.selector_servo.unwrap_or(base.selector_servo),
            gate_sensors: self.gate_sensors.unwrap_or(base.gate_sensors),
            gear_sensors: self.gear_sensors.unwrap_or(base.gear_sensors),
            multi_gear: self.multi_gear.unwrap_or(base.multi_gear),
            leds: self.leds.unwrap_or(base.leds),
            blobifier: self.blobifier.unwrap_or(base.blobifier),
            erec_cutter: self.erec_cutter.unwrap_or(base.erec_cutter),
        }
    }
}

/// One `[[target]]` entry.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSection {
    /// Name used by `--target` (default: template file name)
    pub name: Option<String>,

    /// Template path, relative to `build.template_dir`
    pub template: Option<String>,

    /// Output path, relative to `build.output_dir` (default: template path)
    pub output: Option<String>,

    /// Structural edits to apply
    #[serde(default)]
    pub kind: DocumentKind,

    /// Previous-install path, relative to `build.previous_dir` (default: output path)
    pub previous: Option<String>,
}

impl TomlConfig {
    /// Loads the manifest from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses the manifest from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default manifest with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# mmu-cfg build manifest

[build]
# Schema version being installed (required, can be overridden by --target-version)
version = "3.20"

# Directory templates are read from (default: ".")
# template_dir = "config/base"

# Directory outputs are written to (default: ".", can be overridden by --output-dir)
# output_dir = "~/printer_data/config/mmu/base"

# Directory holding the previously installed files (default: output_dir)
# previous_dir = "~/printer_data/config/mmu/base"

# Maximum number of concurrent builds (default: available CPUs, at most 8)
# jobs = 4

# Keep template values instead of carrying over previous ones
# skip_retain = false

# Token holding the gate count used by per-gate duplication (default: "num_gates")
# gates_token = "num_gates"

[upgrade]
# Where the installed version is recorded
# version_section = "mmu"
# version_key = "happy_hare_version"

[params]
# Keys tracked across installs (both empty = every key)
# prefixes = ["variable_", "servo_", "gear_"]
# patterns = ['^sync_\w+$']

# Section supplemental options are re-inserted into (default: "mmu")
# parameters_section = "mmu"

# Replaces the built-in supplemental option list
# supplemental = ["encoder_move_step_size", "gear_buzz_accel"]

[tokens]
# Values for {name} placeholders; booleans become 1 or 0
num_gates = 4
# mmu_vendor = "ERCF"
# mmu_version = "2.0"

[features]
# encoder = true
# selector_servo = true
# gate_sensors = false
# gear_sensors = false
# multi_gear = false
# leds = false
# blobifier = false
# erec_cutter = false

[[target]]
template = "mmu_parameters.cfg"
kind = "parameters"

[[target]]
template = "mmu_hardware.cfg"
kind = "hardware"

[[target]]
template = "mmu_macro_vars.cfg"
kind = "macro_vars"

# [[target]]
# name = "espooler"
# template = "addons/mmu_espooler.cfg"
# output = "mmu_espooler.cfg"
# previous = "mmu_espooler.cfg"
# kind = "espooler"
"#
    .to_string()
}
