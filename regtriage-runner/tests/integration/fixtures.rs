// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use indoc::indoc;
use regtriage_runner::{
    classify::{Classification, ClassificationEngine},
    config::TriageConfig,
    discovery::discover_test_dirs,
    signature::SignatureSet,
};
use std::sync::Once;

pub(crate) const SIGNATURES: &str = indoc! {r#"
    # Signatures for the nightly regression.
    TEST_START_SIGNATURE = "Running test"
    COMPILATION_SUCCESSFUL_SIGNATURE = "Build successful"
    SIMULATION_FINISH_SIGNATURE = "\$finish"
    TEST_PASS = "TEST PASSED"
    TEST_FAIL = "TEST FAILED"
    SIMULATION_LOG_FILE_NAME = "sim.log"
    COMPILATION_LOG_FILE_NAME = "compile.log"
"#};

pub(crate) fn test_init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        color_eyre::install().expect("color-eyre installed once");
    });
}

/// A regression tree in a temporary directory.
pub(crate) struct RegressionTree {
    dir: Utf8TempDir,
}

impl RegressionTree {
    pub(crate) fn new() -> Self {
        let dir = camino_tempfile::Builder::new()
            .prefix("regtriage-")
            .tempdir()
            .expect("created temp dir");
        std::fs::write(dir.path().join("input_error.log"), SIGNATURES)
            .expect("wrote signature file");
        Self { dir }
    }

    pub(crate) fn root(&self) -> &Utf8Path {
        self.dir.path()
    }

    pub(crate) fn signature_file(&self) -> Utf8PathBuf {
        self.root().join("input_error.log")
    }

    /// Adds a test directory at `rel_path` with the given logs.
    pub(crate) fn add_test(
        &self,
        rel_path: &str,
        compilation: Option<&str>,
        simulation: Option<&str>,
    ) -> &Self {
        let dir = self.root().join(rel_path);
        std::fs::create_dir_all(&dir).expect("created test directory");
        if let Some(contents) = compilation {
            std::fs::write(dir.join("compile.log"), contents).expect("wrote compile.log");
        }
        if let Some(contents) = simulation {
            std::fs::write(dir.join("sim.log"), contents).expect("wrote sim.log");
        }
        self
    }

    pub(crate) fn write_config(&self, contents: &str) -> &Self {
        let config_file = self.root().join(TriageConfig::CONFIG_PATH);
        std::fs::create_dir_all(config_file.parent().expect("config file has a parent"))
            .expect("created .config");
        std::fs::write(config_file, contents).expect("wrote config file");
        self
    }

    /// Runs discovery and classification the way `regtriage run` does.
    pub(crate) fn triage(&self) -> (SignatureSet, Classification) {
        let config = TriageConfig::from_sources(self.root(), None).expect("config is valid");
        let signatures =
            SignatureSet::from_file(&self.signature_file()).expect("signatures are valid");
        let dirs = discover_test_dirs(self.root(), config.discovery()).expect("found test dirs");
        let classification = ClassificationEngine::new(&signatures).run(&dirs);
        (signatures, classification)
    }
}
