// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool configuration for regtriage.
//!
//! The tool config is read from `.config/regtriage.toml` under the regression root, or from the
//! file passed in with `--config-file`, and layered on top of [`TriageConfig::DEFAULT_CONFIG`].
//! Signatures are not part of the tool config: they live in the signature file it points to.

use crate::errors::{ConfigurationError, ToolConfigErrorKind};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Overall configuration for regtriage.
#[derive(Clone, Debug)]
pub struct TriageConfig {
    config_file: Utf8PathBuf,
    signature_file: Utf8PathBuf,
    discovery: DiscoveryConfig,
    report: ReportConfig,
}

impl TriageConfig {
    /// The default location of the config within the regression root.
    pub const CONFIG_PATH: &'static str = ".config/regtriage.toml";

    /// Contains the default config as a TOML file.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config from `config_file`, or if not specified from `.config/regtriage.toml`
    /// under `root`.
    ///
    /// An explicitly specified config file must exist. The default config file is optional.
    pub fn from_sources(
        root: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigurationError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };
        debug!("reading tool config from {config_file}");

        let builder = Self::make_default_config().add_source(source);
        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|err| ConfigurationError::tool_config(&config_file, err))?;

        if !unknown.is_empty() {
            warn_unknown_keys(&config_file, root, &unknown);
        }

        config.into_config(config_file)
    }

    /// Returns the config file this config was read from. The file may not exist.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the path to the signature file.
    pub fn signature_file(&self) -> &Utf8Path {
        &self.signature_file
    }

    /// Returns the discovery config.
    pub fn discovery(&self) -> &DiscoveryConfig {
        &self.discovery
    }

    /// Returns the report config.
    pub fn report(&self) -> &ReportConfig {
        &self.report
    }

    /// Overrides the signature file, e.g. from the command line.
    pub fn set_signature_file(&mut self, signature_file: impl Into<Utf8PathBuf>) {
        self.signature_file = signature_file.into();
    }

    /// Returns a mutable reference to the report config.
    pub fn report_mut(&mut self) -> &mut ReportConfig {
        &mut self.report
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(TriageConfigDeserialize, BTreeSet<String>), ToolConfigErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ToolConfigErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: TriageConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                let path = error.path().clone();
                let error = match error.into_inner() {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ToolConfigErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

fn warn_unknown_keys(config_file: &Utf8Path, root: &Utf8Path, unknown: &BTreeSet<String>) {
    let mut unknown_str = String::new();
    if let (1, Some(key)) = (unknown.len(), unknown.first()) {
        unknown_str.push_str("key: ");
        unknown_str.push_str(key);
    } else {
        unknown_str.push_str("keys:\n");
        for key in unknown {
            unknown_str.push_str("\n  - ");
            unknown_str.push_str(key);
        }
    }

    warn!(
        "in config file {}, ignoring unknown configuration {unknown_str}",
        config_file.strip_prefix(root).unwrap_or(config_file),
    );
}

/// Configuration for discovering test directories.
#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    directory_pattern: Regex,
    follow_symlinks: bool,
}

impl DiscoveryConfig {
    /// Creates a new discovery config, compiling `directory_pattern` case-insensitively.
    pub fn new(directory_pattern: &str, follow_symlinks: bool) -> Result<Self, ConfigurationError> {
        let directory_pattern = RegexBuilder::new(directory_pattern)
            .case_insensitive(true)
            .build()
            .map_err(|err| ConfigurationError::InvalidDirectoryPattern {
                pattern: directory_pattern.to_owned(),
                err: Box::new(err),
            })?;
        Ok(Self {
            directory_pattern,
            follow_symlinks,
        })
    }

    /// Returns the pattern matched against directory base names.
    pub fn directory_pattern(&self) -> &Regex {
        &self.directory_pattern
    }

    /// Returns true if symbolic links are followed while walking the root.
    pub fn follow_symlinks(&self) -> bool {
        self.follow_symlinks
    }
}

/// Configuration for stored reports.
#[derive(Clone, Debug, Default)]
pub struct ReportConfig {
    /// If set, a JSON summary is stored under this directory.
    pub dir: Option<Utf8PathBuf>,

    /// If set, a JUnit XML report is written to this path.
    pub junit: Option<Utf8PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TriageConfigDeserialize {
    signature_file: Utf8PathBuf,
    discovery: DiscoveryConfigDeserialize,
    #[serde(default)]
    report: ReportConfigDeserialize,
}

impl TriageConfigDeserialize {
    fn into_config(self, config_file: Utf8PathBuf) -> Result<TriageConfig, ConfigurationError> {
        let discovery = DiscoveryConfig::new(
            &self.discovery.directory_pattern,
            self.discovery.follow_symlinks,
        )?;
        Ok(TriageConfig {
            config_file,
            signature_file: self.signature_file,
            discovery,
            report: ReportConfig {
                dir: self.report.dir,
                junit: self.report.junit,
            },
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DiscoveryConfigDeserialize {
    directory_pattern: String,
    follow_symlinks: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReportConfigDeserialize {
    #[serde(default)]
    dir: Option<Utf8PathBuf>,
    #[serde(default)]
    junit: Option<Utf8PathBuf>,
}
