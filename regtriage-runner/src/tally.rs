// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error signature occurrence counts.

use crate::signature::Signature;
use indexmap::IndexMap;
use regtriage_metadata::{ErrorTallySummary, SignatureTallySummary, WildcardTallySummary};
use std::collections::BTreeSet;

/// Occurrences of a single named signature.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SignatureTally {
    total_occurrences: u64,
    tests_affected: BTreeSet<String>,
}

impl SignatureTally {
    /// Returns the number of matching lines.
    pub fn total_occurrences(&self) -> u64 {
        self.total_occurrences
    }

    /// Returns the names of the test cases with at least one matching line.
    pub fn tests_affected(&self) -> &BTreeSet<String> {
        &self.tests_affected
    }
}

/// Accumulates occurrences of named error signatures and of wildcard error lines.
///
/// A tally is produced for each scanned test case, and per-test tallies are combined with
/// [`merge`](Self::merge) in traversal order. Merging adds counts, unions affected-test sets and
/// appends wildcard test lists, so the result doesn't depend on how the merges are grouped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ErrorTally {
    // Indexed like `SignatureSet::known_errors`.
    signatures: Vec<SignatureTally>,
    wildcard: IndexMap<String, Vec<String>>,
}

impl ErrorTally {
    /// Creates an empty tally for `signature_count` named signatures.
    pub fn new(signature_count: usize) -> Self {
        Self {
            signatures: vec![SignatureTally::default(); signature_count],
            wildcard: IndexMap::new(),
        }
    }

    /// Records a line matching the named signature at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range for this tally.
    pub fn record_signature(&mut self, index: usize, test_name: &str) {
        let entry = &mut self.signatures[index];
        entry.total_occurrences += 1;
        if !entry.tests_affected.contains(test_name) {
            entry.tests_affected.insert(test_name.to_owned());
        }
    }

    /// Records a line matching the generic error marker.
    pub fn record_wildcard(&mut self, line: &str, test_name: &str) {
        match self.wildcard.get_mut(line) {
            Some(tests) => tests.push(test_name.to_owned()),
            None => {
                self.wildcard
                    .insert(line.to_owned(), vec![test_name.to_owned()]);
            }
        }
    }

    /// Merges `other` into `self`.
    ///
    /// # Panics
    ///
    /// Panics if the tallies were created for different numbers of signatures.
    pub fn merge(&mut self, other: ErrorTally) {
        assert_eq!(
            self.signatures.len(),
            other.signatures.len(),
            "tallies must track the same signatures"
        );
        for (ours, theirs) in self.signatures.iter_mut().zip(other.signatures) {
            ours.total_occurrences += theirs.total_occurrences;
            ours.tests_affected.extend(theirs.tests_affected);
        }
        for (line, tests) in other.wildcard {
            self.wildcard.entry(line).or_default().extend(tests);
        }
    }

    /// Returns the tally for the named signature at `index`.
    pub fn signature(&self, index: usize) -> Option<&SignatureTally> {
        self.signatures.get(index)
    }

    /// Returns the test names recorded for a wildcard line, in first-seen order.
    pub fn wildcard(&self, line: &str) -> Option<&[String]> {
        self.wildcard.get(line).map(|tests| tests.as_slice())
    }

    /// Iterates over wildcard lines and their test names, in first-seen order.
    pub fn wildcard_lines(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.wildcard
            .iter()
            .map(|(line, tests)| (line.as_str(), tests.as_slice()))
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.wildcard.is_empty()
            && self
                .signatures
                .iter()
                .all(|entry| entry.total_occurrences == 0)
    }

    /// Converts this tally into its serializable form.
    ///
    /// `signatures` must be the signatures this tally was created for, in the same order.
    pub fn to_summary(&self, signatures: &[Signature]) -> ErrorTallySummary {
        let signatures = signatures
            .iter()
            .zip(&self.signatures)
            .map(|(signature, tally)| {
                SignatureTallySummary::new(
                    signature.name(),
                    signature.pattern(),
                    tally.total_occurrences,
                    tally.tests_affected.clone(),
                )
            })
            .collect();
        let wildcard = self
            .wildcard
            .iter()
            .map(|(line, tests)| WildcardTallySummary::new(line.clone(), tests.clone()))
            .collect();
        ErrorTallySummary::new(signatures, wildcard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreeset;
    use pretty_assertions::assert_eq;

    fn tally_for(test_name: &str, signatures: &[usize], wildcard: &[&str]) -> ErrorTally {
        let mut tally = ErrorTally::new(3);
        for &index in signatures {
            tally.record_signature(index, test_name);
        }
        for line in wildcard {
            tally.record_wildcard(line, test_name);
        }
        tally
    }

    #[test]
    fn record_signature_counts_lines_and_tests_once() {
        let tally = tally_for("t1", &[1, 1, 2], &[]);
        let entry = tally.signature(1).expect("index is valid");
        assert_eq!(entry.total_occurrences(), 2);
        assert_eq!(entry.tests_affected(), &btreeset! {"t1".to_owned()});
        assert_eq!(tally.signature(0), Some(&SignatureTally::default()));
    }

    #[test]
    fn wildcard_keeps_every_occurrence() {
        let mut tally = tally_for("t1", &[], &["*Error: x", "*Error: x"]);
        tally.merge(tally_for("t2", &[], &["*Error: x", "*Error: y"]));
        assert_eq!(
            tally.wildcard("*Error: x"),
            Some(&["t1".to_owned(), "t1".to_owned(), "t2".to_owned()][..])
        );
        let lines: Vec<_> = tally.wildcard_lines().map(|(line, _)| line).collect();
        assert_eq!(lines, ["*Error: x", "*Error: y"]);
    }

    #[test]
    fn merge_is_associative() {
        let a = tally_for("a", &[0, 1], &["*Error: 1"]);
        let b = tally_for("b", &[1], &["*Error: 1", "*Error: 2"]);
        let c = tally_for("c", &[2, 2], &["*Error: 2"]);

        let mut left = a.clone();
        left.merge(b.clone());
        left.merge(c.clone());

        let mut bc = b;
        bc.merge(c);
        let mut right = a;
        right.merge(bc);

        assert_eq!(left, right);
    }

    #[test]
    fn merge_is_set_idempotent() {
        let mut tally = tally_for("t1", &[0], &[]);
        tally.merge(tally_for("t1", &[0], &[]));
        let entry = tally.signature(0).expect("index is valid");
        assert_eq!(entry.total_occurrences(), 2);
        assert_eq!(entry.tests_affected().len(), 1);
    }

    #[test]
    fn empty_tally() {
        assert!(ErrorTally::new(2).is_empty());
        assert!(!tally_for("t1", &[], &["*Error"]).is_empty());
    }

    #[test]
    fn to_summary() {
        let signatures = vec![
            Signature::known_error("UVM_ERROR @").expect("valid pattern"),
            Signature::known_error("UVM_FATAL @").expect("valid pattern"),
        ];
        let mut tally = ErrorTally::new(2);
        tally.record_signature(0, "t1");
        tally.record_wildcard("*Error: boom", "t1");

        let summary = tally.to_summary(&signatures);
        assert_eq!(summary.signatures.len(), 2);
        assert_eq!(summary.signatures[0].name, "UVM_ERROR");
        assert_eq!(summary.signatures[0].pattern, "UVM_ERROR @");
        assert_eq!(summary.signatures[0].total_occurrences, 1);
        assert_eq!(summary.signatures[1].total_occurrences, 0);
        assert_eq!(summary.wildcard[0].line, "*Error: boom");
        assert_eq!(summary.wildcard[0].occurrence_count, 1);
    }
}
