// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ExpectedError, Result},
    output::{OutputContext, OutputOpts, OutputWriter, clap_styles},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use regtriage_metadata::RegtriageExitCode;
use regtriage_runner::{
    classify::ClassificationEngine,
    config::TriageConfig,
    discovery::discover_test_dirs,
    reporter::{
        TriageDisplayer,
        junit::write_junit,
        structured::{JsonFormat, store_summary, write_json},
    },
    signature::SignatureSet,
};
use std::io::Write;
use tracing::info;

/// Classifies the logs of a hardware regression run.
///
/// Each test directory under the regression root is sorted into outcome buckets (compilation
/// failure, boot error, hang, completed simulation, missing logs), and known error signatures are
/// tallied across all simulation logs.
#[derive(Debug, Parser)]
#[command(version, styles = clap_styles::style())]
pub struct RegtriageApp {
    #[command(flatten)]
    output: OutputOpts,

    #[command(subcommand)]
    command: Command,
}

impl RegtriageApp {
    /// Initializes logging and color output.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.command {
            Command::Run(opts) => opts.exec(output, output_writer),
            Command::List(opts) => opts.exec(output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify test directories and report the results
    Run(RunOpts),

    /// List the test directories that would be classified
    List(ListOpts),
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Regression root to search for test directories
    #[arg(value_name = "ROOT", default_value = ".")]
    root: Utf8PathBuf,

    /// Config file [default: ROOT/.config/regtriage.toml]
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn make_config(&self) -> Result<TriageConfig> {
        Ok(TriageConfig::from_sources(
            &self.root,
            self.config_file.as_deref(),
        )?)
    }

    fn discover(&self, config: &TriageConfig) -> Result<Vec<Utf8PathBuf>> {
        let dirs = discover_test_dirs(&self.root, config.discovery())?;
        info!(
            "found {} test {} under {}",
            dirs.len(),
            if dirs.len() == 1 {
                "directory"
            } else {
                "directories"
            },
            self.root,
        );
        Ok(dirs)
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum MessageFormat {
    /// A human-readable summary
    #[default]
    Human,

    /// JSON on a single line
    Json,

    /// Indented JSON
    JsonPretty,
}

#[derive(Debug, Args)]
struct RunOpts {
    #[command(flatten)]
    config_opts: ConfigOpts,

    /// Signature file [default: signature-file from the config]
    #[arg(long, value_name = "PATH")]
    signatures: Option<Utf8PathBuf>,

    /// Output format for the summary
    #[arg(long, short = 'T', value_enum, default_value_t, value_name = "FMT")]
    message_format: MessageFormat,

    /// Also write a JUnit XML report to this path
    #[arg(long, value_name = "PATH")]
    junit: Option<Utf8PathBuf>,

    /// Store the JSON summary in a date-stamped directory under DIR
    #[arg(long, value_name = "DIR")]
    report_dir: Option<Utf8PathBuf>,
}

impl RunOpts {
    fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let root = &self.config_opts.root;
        let mut config = self.config_opts.make_config()?;
        if let Some(signatures) = self.signatures {
            config.set_signature_file(signatures);
        }
        if let Some(junit) = self.junit {
            config.report_mut().junit = Some(junit);
        }
        if let Some(report_dir) = self.report_dir {
            config.report_mut().dir = Some(report_dir);
        }

        let signatures = SignatureSet::from_file(config.signature_file())?;
        let dirs = self.config_opts.discover(&config)?;
        let classification = ClassificationEngine::new(&signatures).run(&dirs);
        let summary = classification.to_summary(root, &signatures);
        let now = chrono::Local::now();

        let mut writer = output_writer.stdout_writer();
        match self.message_format {
            MessageFormat::Human => {
                let mut displayer = TriageDisplayer::new();
                if output.colorize_stdout() {
                    displayer.colorize();
                }
                displayer
                    .write_summary(root, &classification, &signatures, &mut writer)
                    .map_err(ExpectedError::write_output)?;
            }
            MessageFormat::Json => write_json(&summary, JsonFormat::Compact, &mut writer)?,
            MessageFormat::JsonPretty => write_json(&summary, JsonFormat::Pretty, &mut writer)?,
        }
        writer.flush().map_err(ExpectedError::write_output)?;

        if let Some(report_dir) = &config.report().dir {
            let path = store_summary(&summary, report_dir, &now)?;
            info!("stored triage report at {}", output.stderr_path_link(&path));
        }

        if let Some(junit) = &config.report().junit {
            write_junit(junit, &run_name(root), &classification, now.fixed_offset())?;
            info!("wrote JUnit report to {junit}");
        }

        Ok(RegtriageExitCode::OK)
    }
}

#[derive(Debug, Args)]
struct ListOpts {
    #[command(flatten)]
    config_opts: ConfigOpts,
}

impl ListOpts {
    fn exec(self, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = self.config_opts.make_config()?;
        let dirs = self.config_opts.discover(&config)?;

        let mut writer = output_writer.stdout_writer();
        for dir in &dirs {
            writeln!(writer, "{dir}").map_err(ExpectedError::write_output)?;
        }
        writer.flush().map_err(ExpectedError::write_output)?;

        Ok(RegtriageExitCode::OK)
    }
}

/// The name of a run: the base name of the root, if it has one.
fn run_name(root: &Utf8Path) -> String {
    root.canonicalize_utf8()
        .ok()
        .and_then(|root| root.file_name().map(str::to_owned))
        .unwrap_or_else(|| "regtriage".to_owned())
}
