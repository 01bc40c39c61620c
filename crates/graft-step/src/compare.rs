// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Label-by-label comparison of two exchange texts.
//!
//! A copy made with kept labels must reproduce every line it contains
//! exactly as it appears in the source file. Geometry primitives are shared
//! and freely reordered by most authoring tools, so their types are usually
//! excluded from the comparison.
use std::collections::BTreeMap;

use graft_core::EntityLabel;

use crate::error::StepError;

/// Types skipped by default when comparing.
pub const DEFAULT_IGNORED_TYPES: [&str; 3] = [
    "IFCCARTESIANPOINT",
    "IFCDIRECTION",
    "IFCGEOMETRICREPRESENTATIONCONTEXT",
];

/// A label present in both texts whose entity text differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMismatch {
    /// Shared label.
    pub label: EntityLabel,
    /// Text in the inserted file.
    pub inserted: String,
    /// Text in the original file.
    pub original: String,
}

/// Outcome of [`compare_entity_lines`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    /// Number of inserted lines found in the original.
    pub checked: usize,
    /// Lines that differ.
    pub mismatches: Vec<LineMismatch>,
    /// Inserted labels with no line in the original.
    pub missing: Vec<EntityLabel>,
}

impl Comparison {
    /// `true` when every inserted line matched.
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty() && self.missing.is_empty()
    }
}

/// Collects the entity lines of `text` keyed by label.
///
/// Lines not starting with `#` are ignored, as are entities whose text
/// (the part after `=`) starts with one of `ignore`.
pub fn entity_lines(text: &str, ignore: &[&str]) -> Result<BTreeMap<u64, String>, StepError> {
    let mut lines = BTreeMap::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        let Some(rest) = line.strip_prefix('#') else {
            continue;
        };
        let Some((label, entity)) = rest.split_once('=') else {
            return Err(StepError::Syntax {
                line: index + 1,
                message: "entity line without '='".into(),
            });
        };
        let label: u64 = label.trim().parse().map_err(|_| StepError::Syntax {
            line: index + 1,
            message: format!("invalid entity label '{}'", label.trim()),
        })?;
        let entity = entity.trim();
        if ignore.iter().any(|name| entity.starts_with(name)) {
            continue;
        }
        if lines.insert(label, entity.to_owned()).is_some() {
            return Err(StepError::DuplicateLabel {
                line: index + 1,
                label: EntityLabel::from_raw(label),
            });
        }
    }
    Ok(lines)
}

/// Checks every entity line of `inserted` against the line with the same
/// label in `original`.
pub fn compare_entity_lines(
    inserted: &str,
    original: &str,
    ignore: &[&str],
) -> Result<Comparison, StepError> {
    let inserted = entity_lines(inserted, ignore)?;
    let original = entity_lines(original, ignore)?;
    let mut comparison = Comparison::default();
    for (label, text) in inserted {
        let label_id = EntityLabel::from_raw(label);
        match original.get(&label) {
            None => comparison.missing.push(label_id),
            Some(expected) => {
                comparison.checked += 1;
                if *expected != text {
                    comparison.mismatches.push(LineMismatch {
                        label: label_id,
                        inserted: text,
                        original: expected.clone(),
                    });
                }
            }
        }
    }
    Ok(comparison)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const ORIGINAL: &str = "DATA;\n#1=IFCWALL('a',#2);\n#2=IFCCARTESIANPOINT((0.,0.,0.));\n#3=IFCSLAB('b');\nENDSEC;\n";

    #[test]
    fn skips_ignored_types_and_non_entity_lines() {
        let lines = entity_lines(ORIGINAL, &DEFAULT_IGNORED_TYPES).unwrap();
        assert_eq!(lines.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(lines[&1], "IFCWALL('a',#2);");
    }

    #[test]
    fn reports_mismatch_and_missing_labels() {
        let inserted = "#1=IFCWALL('x',#2);\n#3=IFCSLAB('b');\n#9=IFCSLAB('c');\n";
        let result = compare_entity_lines(inserted, ORIGINAL, &DEFAULT_IGNORED_TYPES).unwrap();
        assert_eq!(result.checked, 2);
        assert_eq!(result.mismatches.len(), 1);
        assert_eq!(result.mismatches[0].label, EntityLabel::from_raw(1));
        assert_eq!(result.missing, vec![EntityLabel::from_raw(9)]);
        assert!(!result.is_match());
    }

    #[test]
    fn subset_of_original_matches() {
        let result =
            compare_entity_lines("#3=IFCSLAB('b');\n", ORIGINAL, &DEFAULT_IGNORED_TYPES).unwrap();
        assert!(result.is_match());
        assert_eq!(result.checked, 1);
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let err = entity_lines("#1=A();\n#1=B();\n", &[]).unwrap_err();
        assert!(matches!(err, StepError::DuplicateLabel { line: 2, .. }));
    }
}
