// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    classify::{Classification, NO_ERROR_LOG, representative_error},
    signature::SignatureSet,
    tally::ErrorTally,
};
use camino::Utf8Path;
use owo_colors::{OwoColorize, Style};
use regtriage_metadata::OutcomeBucket;
use std::io::{self, Write};

/// Renders a human-readable summary of a [`Classification`].
#[derive(Clone, Debug, Default)]
pub struct TriageDisplayer {
    styles: Styles,
}

impl TriageDisplayer {
    /// Creates a new displayer with no colors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Colorizes output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Writes the summary of `classification` to `writer`.
    pub fn write_summary(
        &self,
        root: &Utf8Path,
        classification: &Classification,
        signatures: &SignatureSet,
        mut writer: impl Write,
    ) -> io::Result<()> {
        let styles = &self.styles;
        let test_count = classification.test_cases().len();
        writeln!(
            writer,
            "{:>12} {} test {} under {}",
            "Triaged".style(styles.heading),
            test_count.style(styles.count),
            plural(test_count, "case", "cases"),
            root,
        )?;

        for bucket in OutcomeBucket::ALL {
            let len = classification.bucket_len(bucket);
            let style = if len == 0 {
                styles.muted
            } else {
                styles.bucket_style(bucket)
            };
            writeln!(
                writer,
                "{:>22}: {}",
                bucket.heading().style(style),
                len.style(styles.count),
            )?;
        }

        for bucket in OutcomeBucket::ALL {
            if classification.bucket_len(bucket) == 0 {
                continue;
            }
            writeln!(writer)?;
            writeln!(
                writer,
                "--- {} ({}) ---",
                bucket.heading().style(styles.bucket_style(bucket)),
                classification.bucket_len(bucket).style(styles.count),
            )?;
            for test_case in classification.bucket(bucket) {
                let error = representative_error(bucket, test_case);
                writeln!(
                    writer,
                    "  {}: {}",
                    test_case.name().style(styles.test_name),
                    error.unwrap_or(NO_ERROR_LOG).style(match error {
                        Some(_) => styles.error_line,
                        None => styles.muted,
                    }),
                )?;
            }
        }

        self.write_tally("error signatures", classification.tally(), signatures, &mut writer)?;
        if !classification.compilation_tally().is_empty() {
            self.write_tally(
                "compilation error signatures",
                classification.compilation_tally(),
                signatures,
                &mut writer,
            )?;
        }

        Ok(())
    }

    fn write_tally(
        &self,
        heading: &str,
        tally: &ErrorTally,
        signatures: &SignatureSet,
        mut writer: impl Write,
    ) -> io::Result<()> {
        let styles = &self.styles;
        writeln!(writer)?;
        writeln!(writer, "--- {} ---", heading.style(styles.heading))?;

        let width = signatures
            .known_errors()
            .iter()
            .map(|signature| signature.name().len())
            .max()
            .unwrap_or(0);
        for (index, signature) in signatures.known_errors().iter().enumerate() {
            let Some(entry) = tally.signature(index) else {
                continue;
            };
            let tests = entry.tests_affected();
            write!(
                writer,
                "  {:<width$}  {} {} in {} {}",
                signature.name().style(styles.signature),
                entry.total_occurrences().style(styles.count),
                plural(entry.total_occurrences(), "occurrence", "occurrences"),
                tests.len().style(styles.count),
                plural(tests.len(), "test", "tests"),
            )?;
            if !tests.is_empty() {
                write!(writer, ": ")?;
                write_list(&mut writer, tests.iter().map(|name| name.as_str()), styles)?;
            }
            writeln!(writer)?;
        }

        for (line, tests) in tally.wildcard_lines() {
            write!(
                writer,
                "  {}  {} {}: ",
                line.style(styles.error_line),
                tests.len().style(styles.count),
                plural(tests.len(), "occurrence", "occurrences"),
            )?;
            write_list(&mut writer, tests.iter().map(|name| name.as_str()), styles)?;
            writeln!(writer)?;
        }

        Ok(())
    }
}

fn write_list<'a>(
    mut writer: impl Write,
    names: impl Iterator<Item = &'a str>,
    styles: &Styles,
) -> io::Result<()> {
    for (i, name) in names.enumerate() {
        if i > 0 {
            write!(writer, ", ")?;
        }
        write!(writer, "{}", name.style(styles.test_name))?;
    }
    Ok(())
}

fn plural<N>(n: N, singular: &'static str, plural: &'static str) -> &'static str
where
    N: PartialEq + From<u8>,
{
    if n == N::from(1) { singular } else { plural }
}

#[derive(Clone, Debug, Default)]
struct Styles {
    heading: Style,
    count: Style,
    test_name: Style,
    signature: Style,
    error_line: Style,
    muted: Style,
    fail: Style,
    warn: Style,
    pass: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.heading = Style::new().bold();
        self.count = Style::new().bold();
        self.test_name = Style::new().blue().bold();
        self.signature = Style::new().magenta().bold();
        self.error_line = Style::new().red();
        self.muted = Style::new().dimmed();
        self.fail = Style::new().red().bold();
        self.warn = Style::new().yellow().bold();
        self.pass = Style::new().green().bold();
    }

    fn bucket_style(&self, bucket: OutcomeBucket) -> Style {
        match bucket {
            OutcomeBucket::CompilationFailed | OutcomeBucket::BootError => self.fail,
            OutcomeBucket::Hung | OutcomeBucket::MissingLogs => self.warn,
            OutcomeBucket::SimulationCompleted => self.pass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassificationEngine;
    use indoc::{formatdoc, indoc};

    #[test]
    fn write_summary_without_colors() {
        let root = camino_tempfile::tempdir().expect("created temp dir");
        let signatures = SignatureSet::parse(indoc! {r#"
            TEST_START_SIGNATURE = "Running test"
            COMPILATION_SUCCESSFUL_SIGNATURE = "Build successful"
            TEST_PASS = "TEST PASSED"
            TEST_FAIL = "TEST FAILED"
            SIMULATION_LOG_FILE_NAME = "sim.log"
            COMPILATION_LOG_FILE_NAME = "compile.log"
            KNOWN_ERROR_UVM = "UVM_ERROR @"
        "#})
        .expect("signatures are valid");

        let t1 = root.path().join("t1");
        std::fs::create_dir(&t1).expect("created t1");
        std::fs::write(t1.join("compile.log"), "Build successful\n").expect("wrote log");
        std::fs::write(t1.join("sim.log"), "boot\n*Error: rom\nUVM_ERROR @ 10: bad\n")
            .expect("wrote log");
        let t2 = root.path().join("t2");
        std::fs::create_dir(&t2).expect("created t2");

        let classification = ClassificationEngine::new(&signatures).run([&t1, &t2]);
        let mut out = Vec::new();
        TriageDisplayer::new()
            .write_summary(root.path(), &classification, &signatures, &mut out)
            .expect("wrote summary");
        let out = String::from_utf8(out).expect("output is UTF-8");

        let expected = formatdoc! {"
                     Triaged 2 test cases under {}
                     compilation error: 0
                            boot error: 1
                             test hung: 0
                          no test logs: 1
                  simulation completed: 0

                --- boot error (1) ---
                  t1: UVM_ERROR @ 10: bad

                --- no test logs (1) ---
                  t2: No error log

                --- error signatures ---
                  UVM_ERROR  1 occurrence in 1 test: t1
                  *Error: rom  1 occurrence: t1
            ",
            root.path()
        };
        assert_eq!(out, expected);
    }
}
