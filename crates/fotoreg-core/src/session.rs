//! Per-user session state
//!
//! A [`Session`] owns the draft being edited, the issues from the last
//! validation and the draft's [`DraftPhase`]. The save action is only
//! available once a clean validation has been previewed.

use crate::api::{AppendReceipt, ObservationRow, RowSink};
use crate::error::SessionError;
use crate::phase::{self, DraftPhase};
use crate::preview::{render_preview, PreviewLine};
use crate::types::Draft;
use crate::validation::{self, ValidationIssue};
use chrono::{DateTime, FixedOffset};

/// Outcome of a successful save
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    /// Row that was appended
    pub row: ObservationRow,
    /// What the destination reported
    pub append: AppendReceipt,
}

/// Form state for one user
#[derive(Debug, Clone)]
pub struct Session {
    draft: Draft,
    issues: Vec<ValidationIssue>,
    phase: DraftPhase,
    submitted: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Fresh session with an empty draft
    #[must_use]
    pub fn new() -> Self {
        Self {
            draft: Draft::new(),
            issues: Vec::new(),
            phase: DraftPhase::Empty,
            submitted: false,
        }
    }

    /// Draft as currently entered
    #[must_use]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Issues from the last validation
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> DraftPhase {
        self.phase
    }

    /// Whether the last action saved a row
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Replace the draft with newly entered values
    pub fn update(&mut self, draft: Draft) -> Result<(), SessionError> {
        let draft = draft.normalized();
        if self.phase == DraftPhase::Empty && draft.is_empty() {
            return Ok(());
        }
        self.enter_editing()?;
        self.draft = draft;
        Ok(())
    }

    /// Run every rule against the draft
    ///
    /// Always clears the submitted flag. The returned slice is empty when
    /// the draft may be previewed.
    pub fn validate(&mut self, expected_token: &str) -> Result<&[ValidationIssue], SessionError> {
        self.submitted = false;
        self.enter_editing()?;

        self.issues = validation::validate(&self.draft, expected_token);
        let next = if self.issues.is_empty() {
            DraftPhase::Clean
        } else {
            DraftPhase::Rejected
        };
        self.transition(next)?;

        tracing::debug!(issues = self.issues.len(), phase = ?self.phase, "Validated draft");
        Ok(&self.issues)
    }

    /// Preview lines for a clean draft; unlocks the save action
    pub fn preview(&mut self) -> Result<Vec<PreviewLine>, SessionError> {
        match self.phase {
            DraftPhase::Clean => self.transition(DraftPhase::Previewed)?,
            DraftPhase::Previewed => {}
            other => return Err(SessionError::NotValidated(other)),
        }
        Ok(render_preview(&self.draft))
    }

    /// Append the previewed draft and start over with an empty one
    ///
    /// On failure the draft, its issues and its phase are left untouched so
    /// the user can try again.
    pub async fn submit<S>(
        &mut self,
        sink: &S,
        now: DateTime<FixedOffset>,
    ) -> Result<SubmitReceipt, SessionError>
    where
        S: RowSink + ?Sized,
    {
        if !self.phase.can_submit() {
            return Err(SessionError::SubmitUnavailable(self.phase));
        }

        let row = ObservationRow::from_draft(&self.draft, now)?;
        let worksheet = row.worksheet();

        let append = match sink.append_row(worksheet, &row).await {
            Ok(append) => append,
            Err(e) => {
                tracing::error!(worksheet, error = %e, "Append failed");
                return Err(e.into());
            }
        };

        self.transition(DraftPhase::Submitted)?;
        self.submitted = true;
        tracing::info!(
            worksheet,
            range = append.updated_range.as_deref().unwrap_or("-"),
            "Appended observation row"
        );

        self.draft = Draft::new();
        self.issues.clear();
        self.transition(DraftPhase::Empty)?;

        Ok(SubmitReceipt { row, append })
    }

    fn enter_editing(&mut self) -> Result<(), SessionError> {
        match self.phase {
            DraftPhase::Editing => Ok(()),
            _ => self.transition(DraftPhase::Editing),
        }
    }

    fn transition(&mut self, to: DraftPhase) -> Result<(), SessionError> {
        phase::validate_transition(self.phase, to)?;
        self.phase = to;
        Ok(())
    }
}
