//! Class label to subject matching between the attendance and marks exports.
//!
//! Marks rows carry both a `Class` and a `Subject`; attendance rows only carry
//! a `Class`, and the two systems do not always spell class codes the same way.
//! Labels are resolved by exact lookup first and then by the smallest
//! Levenshtein distance to a known class label.

use std::collections::HashMap;

use crate::models::{AttendanceRecord, MarksRecord};

/// Character-level edit distance (insertions, deletions, substitutions).
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Closest { distance: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub subject: &'a str,
    pub kind: MatchKind,
}

/// Class label to subject lookup built from the marks table.
///
/// Entries keep the position of the first row that introduced the class; a
/// later row for the same class replaces the subject in place.
#[derive(Debug, Clone, Default)]
pub struct SubjectMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
    max_distance: Option<usize>,
}

impl SubjectMap {
    pub fn from_marks(marks: &[MarksRecord]) -> Self {
        let mut map = Self::default();
        for record in marks {
            map.insert(record.class.trim(), record.subject.trim());
        }
        map
    }

    pub fn with_max_distance(mut self, max_distance: Option<usize>) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn insert(&mut self, class: &str, subject: &str) {
        if class.is_empty() || subject.is_empty() {
            return;
        }
        match self.index.get(class) {
            Some(&position) => self.entries[position].1 = subject.to_string(),
            None => {
                self.index.insert(class.to_string(), self.entries.len());
                self.entries.push((class.to_string(), subject.to_string()));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, class: &str) -> Option<Resolution<'_>> {
        let class = class.trim();
        if class.is_empty() {
            return None;
        }
        if let Some(&position) = self.index.get(class) {
            return Some(Resolution {
                subject: &self.entries[position].1,
                kind: MatchKind::Exact,
            });
        }

        let mut best: Option<(usize, &str)> = None;
        for (pattern, subject) in &self.entries {
            let distance = levenshtein(pattern, class);
            // strict comparison: the first entry wins an exact tie
            if best.map_or(true, |(closest, _)| distance < closest) {
                best = Some((distance, subject));
            }
        }

        let (distance, subject) = best?;
        if self.max_distance.is_some_and(|limit| distance > limit) {
            return None;
        }
        Some(Resolution {
            subject,
            kind: MatchKind::Closest { distance },
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub matched: Vec<(AttendanceRecord, String)>,
    /// Distinct class labels that could not be resolved, in first-seen order.
    pub unmapped_classes: Vec<String>,
    pub fallback_matches: usize,
}

/// Tags every attendance row with its subject, dropping rows that cannot be resolved.
pub fn reconcile(attendance: Vec<AttendanceRecord>, map: &SubjectMap) -> Reconciliation {
    let mut result = Reconciliation::default();

    for record in attendance {
        match map.resolve(&record.class) {
            Some(resolution) => {
                if matches!(resolution.kind, MatchKind::Closest { .. }) {
                    result.fallback_matches += 1;
                }
                let subject = resolution.subject.to_string();
                result.matched.push((record, subject));
            }
            None => {
                if !result.unmapped_classes.contains(&record.class) {
                    result.unmapped_classes.push(record.class.clone());
                }
            }
        }
    }

    result
}
