//! Score extraction results, run history, and threshold evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scores extracted from the Grammarly detection panel.
///
/// A `None` percent means the corresponding feature was unavailable or
/// unobservable on the page — it is never coerced to zero, and it never
/// satisfies a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GrammarlyScores {
    /// AI-detection percentage (0-100), when the panel exposed one.
    pub ai_detection_percent: Option<f64>,

    /// Plagiarism percentage (0-100), when the panel exposed one.
    pub plagiarism_percent: Option<f64>,

    /// Overall writing score (0-100), informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,

    /// Free-form extraction notes (panel state, fallback markers).
    #[serde(default)]
    pub notes: String,
}

impl GrammarlyScores {
    /// Scores with nothing observed; used when extraction yields no fields.
    pub fn unavailable(notes: impl Into<String>) -> Self {
        Self {
            ai_detection_percent: None,
            plagiarism_percent: None,
            overall_score: None,
            notes: notes.into(),
        }
    }
}

/// One ledger row per scoring pass. Iteration 0 is always the baseline
/// computed on the unmodified input text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HistoryEntry {
    pub iteration: u32,
    pub ai_detection_percent: Option<f64>,
    pub plagiarism_percent: Option<f64>,
    pub note: String,
    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn from_scores(iteration: u32, scores: &GrammarlyScores, note: impl Into<String>) -> Self {
        Self {
            iteration,
            ai_detection_percent: scores.ai_detection_percent,
            plagiarism_percent: scores.plagiarism_percent,
            note: note.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Terminal artifact of one optimizer invocation. Immutable once returned;
/// field names are the tool-boundary contract (snake_case).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OptimizeResult {
    pub final_text: String,
    pub ai_detection_percent: Option<f64>,
    pub plagiarism_percent: Option<f64>,
    pub iterations_used: u32,
    pub thresholds_met: bool,
    pub history: Vec<HistoryEntry>,
    pub notes: String,
}

/// Caller-configured maxima that terminate the loop early once met.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Thresholds {
    pub max_ai_percent: f64,
    pub max_plagiarism_percent: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_ai_percent: 10.0,
            max_plagiarism_percent: 5.0,
        }
    }
}

impl Thresholds {
    /// Whether the given scores satisfy the thresholds.
    ///
    /// True only if at least one percent field is present AND every present
    /// field is at or below its maximum. Two absent fields never pass:
    /// unverifiable scores are treated as not met, a deliberately
    /// conservative policy.
    pub fn met_by(&self, scores: &GrammarlyScores) -> bool {
        let ai_ok = scores
            .ai_detection_percent
            .map(|ai| ai <= self.max_ai_percent);
        let plag_ok = scores
            .plagiarism_percent
            .map(|p| p <= self.max_plagiarism_percent);

        match (ai_ok, plag_ok) {
            (None, None) => false,
            (a, b) => a.unwrap_or(true) && b.unwrap_or(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scores(ai: Option<f64>, plag: Option<f64>) -> GrammarlyScores {
        GrammarlyScores {
            ai_detection_percent: ai,
            plagiarism_percent: plag,
            overall_score: None,
            notes: String::new(),
        }
    }

    #[test]
    fn test_both_fields_under_max_pass() {
        let t = Thresholds::default();
        assert!(t.met_by(&scores(Some(8.0), Some(2.0))));
    }

    #[test]
    fn test_one_field_over_max_fails() {
        let t = Thresholds::default();
        assert!(!t.met_by(&scores(Some(15.0), Some(2.0))));
        assert!(!t.met_by(&scores(Some(8.0), Some(9.0))));
    }

    #[test]
    fn test_single_present_field_decides() {
        let t = Thresholds::default();
        assert!(t.met_by(&scores(Some(10.0), None)));
        assert!(!t.met_by(&scores(Some(10.1), None)));
        assert!(t.met_by(&scores(None, Some(5.0))));
        assert!(!t.met_by(&scores(None, Some(5.1))));
    }

    #[test]
    fn test_both_fields_absent_never_pass() {
        let t = Thresholds {
            max_ai_percent: 100.0,
            max_plagiarism_percent: 100.0,
        };
        assert!(!t.met_by(&scores(None, None)));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let t = Thresholds::default();
        assert!(t.met_by(&scores(Some(10.0), Some(5.0))));
    }

    #[test]
    fn test_history_entry_copies_score_fields() {
        let s = scores(Some(42.5), None);
        let entry = HistoryEntry::from_scores(3, &s, "after rewrite");
        assert_eq!(entry.iteration, 3);
        assert_eq!(entry.ai_detection_percent, Some(42.5));
        assert_eq!(entry.plagiarism_percent, None);
        assert_eq!(entry.note, "after rewrite");
    }

    #[test]
    fn test_scores_serialize_null_not_zero() {
        let s = scores(None, Some(3.0));
        let json = serde_json::to_value(&s).unwrap();
        assert!(json["ai_detection_percent"].is_null());
        assert_eq!(json["plagiarism_percent"], 3.0);
    }

    proptest! {
        #[test]
        fn prop_met_by_is_monotone_in_thresholds(
            ai in proptest::option::of(0.0f64..100.0),
            plag in proptest::option::of(0.0f64..100.0),
            max_ai in 0.0f64..100.0,
            ai_slack in 0.0f64..50.0,
            max_plag in 0.0f64..100.0,
            plag_slack in 0.0f64..50.0,
        ) {
            let tight = Thresholds {
                max_ai_percent: max_ai,
                max_plagiarism_percent: max_plag,
            };
            let loose = Thresholds {
                max_ai_percent: max_ai + ai_slack,
                max_plagiarism_percent: max_plag + plag_slack,
            };
            let s = scores(ai, plag);
            // Raising either maximum can only keep or gain passing scores.
            if tight.met_by(&s) {
                prop_assert!(loose.met_by(&s));
            }
        }
    }
}
