//! Top-level controller for one optimizer invocation.
//!
//! Owns the session lifecycle: create, baseline, mode dispatch, and an
//! unconditional best-effort teardown that never masks the flow's actual
//! result or error.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::{Error, Result};
use crate::domain::models::{
    GrammarlyScores, HistoryEntry, Mode, OptimizeRequest, OptimizeResult,
};
use crate::domain::ports::{BrowserDriver, BrowserSession, RewriteRequest, RewriteService};
use crate::services::{ScoringOptions, ScoringTaskRunner};

/// Progress callback. Values are percentages keyed to the iteration
/// index, monotonically non-decreasing; exact intermediate values are not
/// part of the contract.
pub type ProgressFn = dyn Fn(u8) + Send + Sync;

/// History notes longer than this are trimmed; the full reasoning lives
/// only in the rewrite outcome.
const MAX_NOTE_LEN: usize = 200;

pub struct OptimizationLoop {
    driver: Arc<dyn BrowserDriver>,
    rewriter: Arc<dyn RewriteService>,
    runner: ScoringTaskRunner,
    profile: String,
    progress: Option<Arc<ProgressFn>>,
}

impl OptimizationLoop {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        rewriter: Arc<dyn RewriteService>,
        runner: ScoringTaskRunner,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            rewriter,
            runner,
            profile: profile.into(),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Arc<ProgressFn>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run one request to completion.
    pub async fn run(&self, request: &OptimizeRequest) -> Result<OptimizeResult> {
        request.validate().map_err(Error::InvalidRequest)?;

        let run_id = Uuid::new_v4();
        let session = self.driver.create_session(&self.profile).await?;
        info!(%run_id, session = %session.id, mode = ?request.mode, "session created");

        let outcome = self.run_in_session(&session, request).await;

        // Teardown happens-after the flow resolves, succeeds or not, and
        // its own failures are logged rather than propagated.
        if let Err(err) = self.driver.close_session(&session).await {
            warn!(session = %session.id, error = %err, "session teardown failed");
        }

        outcome
    }

    async fn run_in_session(
        &self,
        session: &BrowserSession,
        request: &OptimizeRequest,
    ) -> Result<OptimizeResult> {
        let thresholds = request.thresholds();

        self.report(0);
        let baseline = self
            .runner
            .score(session, &request.text, &ScoringOptions {
                iteration: 0,
                debug_url: None,
            })
            .await?;
        let mut history = vec![HistoryEntry::from_scores(0, &baseline, "baseline")];

        match request.mode {
            Mode::ScoreOnly => {
                self.report(100);
                Ok(build_result(
                    request.text.clone(),
                    &baseline,
                    0,
                    thresholds.met_by(&baseline),
                    history,
                    baseline.notes.clone(),
                ))
            }
            Mode::Analyze => {
                let narrative = self.rewriter.analyze(&request.text, &baseline).await?;
                self.report(100);
                Ok(build_result(
                    request.text.clone(),
                    &baseline,
                    0,
                    thresholds.met_by(&baseline),
                    history,
                    narrative,
                ))
            }
            Mode::Optimize => {
                let mut current_text = request.text.clone();
                let mut latest = baseline;
                let mut iterations_used = 0;
                let mut met = thresholds.met_by(&latest);

                if !met {
                    for iteration in 1..=request.max_iterations {
                        let outcome = self
                            .rewriter
                            .rewrite(&RewriteRequest {
                                text: current_text.clone(),
                                last_scores: Some(latest.clone()),
                                targets: thresholds,
                                tone: request.tone.clone(),
                                domain_hint: request.domain_hint.clone(),
                                custom_instructions: request.custom_instructions.clone(),
                                iteration,
                            })
                            .await?;
                        current_text = outcome.rewritten_text;

                        latest = self
                            .runner
                            .score(session, &current_text, &ScoringOptions {
                                iteration,
                                debug_url: None,
                            })
                            .await?;
                        history.push(HistoryEntry::from_scores(
                            iteration,
                            &latest,
                            iteration_note(iteration, &outcome.reasoning),
                        ));
                        iterations_used = iteration;
                        self.report(progress_percent(iteration, request.max_iterations));

                        if thresholds.met_by(&latest) {
                            info!(iteration, "thresholds met, stopping early");
                            met = true;
                            break;
                        }
                    }
                }

                let notes = self.rewriter.summarize(&history, &latest).await?;
                self.report(100);
                Ok(build_result(
                    current_text,
                    &latest,
                    iterations_used,
                    met,
                    history,
                    notes,
                ))
            }
        }
    }

    fn report(&self, percent: u8) {
        if let Some(progress) = &self.progress {
            progress(percent);
        }
    }
}

fn build_result(
    final_text: String,
    scores: &GrammarlyScores,
    iterations_used: u32,
    thresholds_met: bool,
    history: Vec<HistoryEntry>,
    notes: String,
) -> OptimizeResult {
    OptimizeResult {
        final_text,
        ai_detection_percent: scores.ai_detection_percent,
        plagiarism_percent: scores.plagiarism_percent,
        iterations_used,
        thresholds_met,
        history,
        notes,
    }
}

/// Linear interpolation across the iteration budget, clamped to 100.
/// Deterministic and independent of wall-clock time; only monotonic
/// non-decrease is contractual.
fn progress_percent(iteration: u32, max_iterations: u32) -> u8 {
    if max_iterations == 0 {
        return 100;
    }
    ((iteration * 100) / max_iterations).min(100) as u8
}

fn iteration_note(iteration: u32, reasoning: &str) -> String {
    let reasoning = reasoning.trim();
    if reasoning.is_empty() {
        return format!("rewrite iteration {iteration}");
    }
    let mut note: String = reasoning.chars().take(MAX_NOTE_LEN).collect();
    if reasoning.chars().count() > MAX_NOTE_LEN {
        note.push('…');
    }
    note
}
