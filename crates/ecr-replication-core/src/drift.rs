//! Drift comparison between declared and observed configuration.
//!
//! Rules form a set: a declared rule is satisfied by any equal observed
//! rule, wherever it sits. Inside a rule, destinations and repository
//! filters are sequences and position matters.
//!
//! Every difference is collected; comparison never stops at the first one.

use std::fmt;

use serde::Serialize;

use crate::model::{
    destination_path, filter_path, rule_path, ReplicationConfiguration, ReplicationDestination,
    ReplicationRule, RepositoryFilter,
};

/// One differing path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Difference {
    /// Path of the differing element, e.g. `rule[0].destination[1].region`.
    pub path: String,
    /// Declared value, `None` when the element is not declared.
    pub declared: Option<String>,
    /// Observed value, `None` when the element is not present remotely.
    pub actual: Option<String>,
}

impl Difference {
    fn new(path: impl Into<String>, declared: Option<String>, actual: Option<String>) -> Self {
        Self {
            path: path.into(),
            declared,
            actual,
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: declared {}, actual {}",
            self.path,
            self.declared.as_deref().unwrap_or("absent"),
            self.actual.as_deref().unwrap_or("absent")
        )
    }
}

/// All differences between a declared and an observed configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    differences: Vec<Difference>,
}

impl DriftReport {
    /// Returns true if declared and observed state agree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    /// Number of differing paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.differences.len()
    }

    /// Iterates over the differences in path order.
    pub fn iter(&self) -> impl Iterator<Item = &Difference> {
        self.differences.iter()
    }

    /// Returns the difference recorded for `path`, if any.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Difference> {
        self.differences.iter().find(|d| d.path == path)
    }

    fn push(&mut self, difference: Difference) {
        self.differences.push(difference);
    }
}

impl fmt::Display for DriftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.differences.is_empty() {
            return write!(f, "no drift");
        }
        write!(f, "{} difference(s): ", self.differences.len())?;
        for (i, difference) in self.differences.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{difference}")?;
        }
        Ok(())
    }
}

/// Compares `declared` against `actual`.
///
/// The read-only `registry_id` is not compared.
#[must_use]
pub fn compare(
    declared: &ReplicationConfiguration,
    actual: &ReplicationConfiguration,
) -> DriftReport {
    let mut report = DriftReport::default();

    let mut matched = vec![false; actual.rules.len()];
    let mut unmatched_declared = Vec::new();

    for (index, rule) in declared.rules.iter().enumerate() {
        let found = actual
            .rules
            .iter()
            .enumerate()
            .find(|(j, candidate)| !matched[*j] && *candidate == rule)
            .map(|(j, _)| j);

        match found {
            Some(j) => matched[j] = true,
            None => unmatched_declared.push(index),
        }
    }

    let unmatched_actual: Vec<usize> = matched
        .iter()
        .enumerate()
        .filter(|(_, m)| !**m)
        .map(|(j, _)| j)
        .collect();

    // Pair leftovers in order so a changed rule reports field-level paths
    // instead of one removal plus one addition.
    let paired = unmatched_declared.len().min(unmatched_actual.len());
    for (&d, &a) in unmatched_declared.iter().zip(&unmatched_actual) {
        compare_rule(d, &declared.rules[d], &actual.rules[a], &mut report);
    }
    for &d in &unmatched_declared[paired..] {
        report.push(Difference::new(
            rule_path(d),
            Some(describe_rule(&declared.rules[d])),
            None,
        ));
    }
    for &a in &unmatched_actual[paired..] {
        report.push(Difference::new(
            rule_path(a),
            None,
            Some(describe_rule(&actual.rules[a])),
        ));
    }

    report
}

/// Confirms that `actual` satisfies `declared`.
///
/// # Errors
///
/// Returns the full [`DriftReport`] when any path differs.
pub fn confirm(
    declared: &ReplicationConfiguration,
    actual: &ReplicationConfiguration,
) -> Result<(), DriftReport> {
    let report = compare(declared, actual);
    if report.is_empty() {
        Ok(())
    } else {
        Err(report)
    }
}

fn describe_rule(rule: &ReplicationRule) -> String {
    let destinations: Vec<String> = rule.destinations.iter().map(ToString::to_string).collect();
    format!(
        "rule with destinations [{}] and {} repository filter(s)",
        destinations.join(", "),
        rule.repository_filters.len()
    )
}

fn compare_rule(
    index: usize,
    declared: &ReplicationRule,
    actual: &ReplicationRule,
    report: &mut DriftReport,
) {
    let count = declared.destinations.len().max(actual.destinations.len());
    for position in 0..count {
        compare_destination(
            &destination_path(index, position),
            declared.destinations.get(position),
            actual.destinations.get(position),
            report,
        );
    }

    let count = declared
        .repository_filters
        .len()
        .max(actual.repository_filters.len());
    for position in 0..count {
        compare_filter(
            &filter_path(index, position),
            declared.repository_filters.get(position),
            actual.repository_filters.get(position),
            report,
        );
    }
}

fn compare_field(
    path: String,
    declared: Option<&str>,
    actual: Option<&str>,
    report: &mut DriftReport,
) {
    if declared != actual {
        report.push(Difference::new(
            path,
            declared.map(ToString::to_string),
            actual.map(ToString::to_string),
        ));
    }
}

fn compare_destination(
    path: &str,
    declared: Option<&ReplicationDestination>,
    actual: Option<&ReplicationDestination>,
    report: &mut DriftReport,
) {
    compare_field(
        format!("{path}.region"),
        declared.map(|d| d.region.as_str()),
        actual.map(|d| d.region.as_str()),
        report,
    );
    compare_field(
        format!("{path}.registry_id"),
        declared.map(|d| d.registry_id.as_str()),
        actual.map(|d| d.registry_id.as_str()),
        report,
    );
}

fn compare_filter(
    path: &str,
    declared: Option<&RepositoryFilter>,
    actual: Option<&RepositoryFilter>,
    report: &mut DriftReport,
) {
    compare_field(
        format!("{path}.filter"),
        declared.map(|f| f.filter.as_str()),
        actual.map(|f| f.filter.as_str()),
        report,
    );
    compare_field(
        format!("{path}.filter_type"),
        declared.map(|f| f.filter_type.as_str()),
        actual.map(|f| f.filter_type.as_str()),
        report,
    );
}
