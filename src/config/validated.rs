//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::build::{BuildContext, BuildTarget};
use crate::parser::{ConfigParser, KeyFilter};
use crate::render::{Features, Renderer, SupplementalOptions, TokenTable};
use crate::upgrade::{DEFAULT_VERSION_KEY, DEFAULT_VERSION_SECTION, UpgradeRegistry, Version};

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::{ParamsSection, TargetSection, TomlConfig};

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Schema version being installed (required)
    pub target_version: Version,

    /// Targets to build, after `--target` filtering
    pub targets: Vec<BuildTarget>,

    /// Previous-install files of every manifest target, filtered or not
    pub all_previous: Vec<PathBuf>,

    /// Settings shared by every build
    pub context: BuildContext,

    /// Maximum number of concurrent builds
    pub jobs: usize,

    /// Path of the JSON report, if requested
    pub report: Option<PathBuf>,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report_str = self
            .report
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string());

        write!(
            f,
            "Config {{ version: {}, targets: {}, jobs: {}, skip_retain: {}, dry_run: {}, report: {} }}",
            self.target_version,
            self.targets.len(),
            self.jobs,
            self.context.skip_retain,
            self.context.dry_run,
            report_str,
        )
    }
}

/// Base directories target paths are resolved against.
struct Directories {
    template: PathBuf,
    output: PathBuf,
    previous: PathBuf,
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The target version is missing or malformed
    /// - No targets are defined, or `--target` names an unknown one
    /// - Two targets share an output path
    /// - Regex patterns or token values are invalid
    /// - `jobs` is zero
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let target_version = Self::resolve_version(cli, toml)?;
        let jobs = Self::resolve_jobs(cli, toml)?;
        let (targets, all_previous) = Self::resolve_targets(cli, toml)?;

        let (version_section, version_key) = resolve_version_parameter(toml);
        let registry = UpgradeRegistry::builtin()?.with_version_parameter(version_section, version_key);
        let renderer = Self::build_renderer(toml, target_version, version_key)?;

        let mut context = BuildContext::new(target_version, renderer, registry);
        context.parser = ConfigParser::new(Self::build_filter(toml, version_key)?);
        // Flags only enable
        context.skip_retain = cli.skip_retain || toml.is_some_and(|t| t.build.skip_retain);
        context.dry_run = cli.dry_run;

        Ok(Self {
            target_version,
            targets,
            all_previous,
            context,
            jobs,
            report: cli.report.clone(),
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and the manifest.
    ///
    /// Reads `cli.config` if set, otherwise [`defaults::CONFIG_FILE`] when it
    /// exists in the working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The manifest cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let path = cli.config.clone().or_else(|| {
            let default = PathBuf::from(defaults::CONFIG_FILE);
            default.is_file().then_some(default)
        });
        let toml = match path {
            Some(path) => Some(TomlConfig::load(&path)?),
            None => None,
        };

        Self::from_raw(cli, toml.as_ref())
    }

    /// Previous-install files of every manifest target.
    ///
    /// `--target` does not narrow this set.
    pub fn previous_paths(&self) -> impl Iterator<Item = &Path> {
        self.all_previous.iter().map(PathBuf::as_path)
    }

    fn resolve_version(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Version, ConfigError> {
        let value = cli
            .target_version
            .as_deref()
            .or_else(|| toml.and_then(|t| t.build.version.as_deref()))
            .ok_or_else(|| {
                ConfigError::missing(
                    field::VERSION,
                    "Use --target-version or set build.version in config file",
                )
            })?;

        value.parse::<Version>().map_err(|_| ConfigError::InvalidVersion {
            field: field::VERSION,
            value: value.to_string(),
        })
    }

    fn resolve_jobs(cli: &Cli, toml: Option<&TomlConfig>) -> Result<usize, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let jobs = cli
            .jobs
            .or_else(|| toml.and_then(|t| t.build.jobs))
            .unwrap_or_else(defaults::jobs);

        if jobs == 0 {
            return Err(ConfigError::InvalidJobs(jobs));
        }
        Ok(jobs)
    }

    fn resolve_directories(cli: &Cli, toml: Option<&TomlConfig>) -> Directories {
        let build = toml.map(|t| &t.build);

        let template = build
            .and_then(|b| b.template_dir.as_deref())
            .map_or_else(|| PathBuf::from(defaults::TEMPLATE_DIR), expand_tilde);

        let output = cli.output_dir.clone().unwrap_or_else(|| {
            build
                .and_then(|b| b.output_dir.as_deref())
                .map_or_else(|| PathBuf::from(defaults::OUTPUT_DIR), expand_tilde)
        });

        // Without a previous_dir the install is upgraded in place
        let previous = cli.previous_dir.clone().unwrap_or_else(|| {
            build
                .and_then(|b| b.previous_dir.as_deref())
                .map_or_else(|| output.clone(), expand_tilde)
        });

        Directories {
            template,
            output,
            previous,
        }
    }

    fn resolve_targets(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<(Vec<BuildTarget>, Vec<PathBuf>), ConfigError> {
        let sections = toml.map_or(&[][..], |t| t.targets.as_slice());
        if sections.is_empty() {
            return Err(ConfigError::NoTargets);
        }

        let dirs = Self::resolve_directories(cli, toml);
        let targets = sections
            .iter()
            .map(|section| resolve_target(section, &dirs))
            .collect::<Result<Vec<_>, _>>()?;
        check_unique_outputs(&targets)?;

        if let Some(name) = cli
            .targets
            .iter()
            .find(|name| !targets.iter().any(|t| &t.name == *name))
        {
            return Err(ConfigError::UnknownTarget { name: name.clone() });
        }

        let all_previous = targets.iter().filter_map(|t| t.previous.clone()).collect();
        if cli.targets.is_empty() {
            return Ok((targets, all_previous));
        }
        let selected = targets
            .into_iter()
            .filter(|t| cli.targets.contains(&t.name))
            .collect();
        Ok((selected, all_previous))
    }

    fn build_filter(toml: Option<&TomlConfig>, version_key: &str) -> Result<KeyFilter, ConfigError> {
        let Some(params) = toml.map(|t| &t.params) else {
            return Ok(KeyFilter::all());
        };
        if params.prefixes.is_empty() && params.patterns.is_empty() {
            return Ok(KeyFilter::all());
        }

        let mut filter = KeyFilter::with_prefixes(params.prefixes.iter().cloned());
        for pattern in &params.patterns {
            filter = filter
                .with_pattern(pattern)
                .map_err(|e| ConfigError::InvalidRegex {
                    pattern: pattern.clone(),
                    source: e,
                })?;
        }

        // The installed version must always be captured
        let version_pattern = format!("^{}$", regex::escape(version_key));
        filter
            .with_pattern(&version_pattern)
            .map_err(|e| ConfigError::InvalidRegex {
                pattern: version_pattern.clone(),
                source: e,
            })
    }

    fn build_renderer(
        toml: Option<&TomlConfig>,
        version: Version,
        version_key: &str,
    ) -> Result<Renderer, ConfigError> {
        let mut tokens = TokenTable::new();
        if let Some(toml) = toml {
            for (name, value) in &toml.tokens {
                tokens.insert(name.clone(), token_value(name, value)?);
            }
        }
        tokens.insert(version_key.to_string(), version.to_string());

        let features = toml.map_or_else(Features::default, |t| {
            t.features.apply(Features::default())
        });

        let mut renderer = Renderer::new(tokens, features);
        if let Some(token) = toml.and_then(|t| t.build.gates_token.as_deref()) {
            renderer = renderer.with_gates_token(token);
        }
        if let Some(params) = toml.map(|t| &t.params) {
            renderer = renderer.with_supplemental(supplemental_options(params));
        }
        Ok(renderer)
    }
}

/// Writes the default manifest to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

fn resolve_version_parameter(toml: Option<&TomlConfig>) -> (&str, &str) {
    let upgrade = toml.map(|t| &t.upgrade);
    let section = upgrade
        .and_then(|u| u.version_section.as_deref())
        .unwrap_or(DEFAULT_VERSION_SECTION);
    let key = upgrade
        .and_then(|u| u.version_key.as_deref())
        .unwrap_or(DEFAULT_VERSION_KEY);
    (section, key)
}

fn resolve_target(section: &TargetSection, dirs: &Directories) -> Result<BuildTarget, ConfigError> {
    let template = section.template.as_deref().ok_or_else(|| {
        ConfigError::missing(field::TEMPLATE, "Every [[target]] needs a template path")
    })?;
    let output = section.output.as_deref().unwrap_or(template);
    let previous = section.previous.as_deref().unwrap_or(output);

    let name = section.name.clone().unwrap_or_else(|| {
        Path::new(template)
            .file_name()
            .map_or_else(|| template.to_string(), |n| n.to_string_lossy().into_owned())
    });

    Ok(BuildTarget {
        name,
        template: dirs.template.join(expand_tilde(template)),
        output: dirs.output.join(expand_tilde(output)),
        previous: Some(dirs.previous.join(expand_tilde(previous))),
        kind: section.kind,
    })
}

fn check_unique_outputs(targets: &[BuildTarget]) -> Result<(), ConfigError> {
    let mut seen: HashMap<&Path, &str> = HashMap::new();
    for target in targets {
        if let Some(first) = seen.insert(target.output.as_path(), target.name.as_str()) {
            return Err(ConfigError::DuplicateOutput {
                first: first.to_string(),
                second: target.name.clone(),
                path: target.output.clone(),
            });
        }
    }
    Ok(())
}

fn supplemental_options(params: &ParamsSection) -> SupplementalOptions {
    let default = SupplementalOptions::default();
    let section = params
        .parameters_section
        .as_deref()
        .unwrap_or(default.section());

    params.supplemental.as_ref().map_or_else(
        || SupplementalOptions::new(section, default.keys().iter().cloned()),
        |keys| SupplementalOptions::new(section, keys.iter().cloned()),
    )
}

fn token_value(name: &str, value: &toml::Value) -> Result<String, ConfigError> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(if *b { "1" } else { "0" }.to_string()),
        other => Err(ConfigError::InvalidToken {
            name: name.to_string(),
            kind: other.type_str(),
        }),
    }
}

/// Expands a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    let Some(rest) = path.strip_prefix('~') else {
        return PathBuf::from(path);
    };
    if !rest.is_empty() && !rest.starts_with(['/', '\\']) {
        // ~user is not supported
        return PathBuf::from(path);
    }
    dirs::home_dir().map_or_else(
        || PathBuf::from(path),
        |home| home.join(rest.trim_start_matches(['/', '\\'])),
    )
}
