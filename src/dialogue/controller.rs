//! Per-session dialogue controller.
//!
//! The controller owns the current [`State`] and the [`FieldMap`] for one
//! user. It performs no I/O: the conversation handler feeds it input, reads
//! back the prompt, and drives generation through the hooks at the bottom of
//! this file.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::{FieldError, FieldMap, InputError, State};
use crate::config::{TemplateKind, TransitionPolicy};
use crate::publish::{HostingMethod, HostingUrls};

/// How a transition was admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Listed in the transition table.
    Allowed,
    /// Entered through a force state.
    Forced,
    /// Not in the table, let through by the permissive policy.
    Irregular,
}

/// Errors from a dialogue step. None of them change the current state.
#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("{0}")]
    Input(#[from] InputError),

    #[error("Can't handle {action} while {state}")]
    InvalidState { state: State, action: &'static str },

    #[error("Transition from {from} to {to} is not allowed")]
    IllegalTransition { from: State, to: State },

    #[error("Missing required field '{field}' in {state}")]
    MissingField { state: State, field: &'static str },

    #[error("Invalid field update: {0}")]
    Field(#[from] FieldError),

    #[error("Unknown field to edit: '{0}'")]
    UnknownEditField(String),
}

/// Everything the generator needs to render and publish one page.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub artifact_id: String,
    pub kind: TemplateKind,
    /// Collected fields, flattened to dotted keys.
    pub fields: BTreeMap<String, Value>,
    pub hosting_method: HostingMethod,
    pub custom_domain: Option<String>,
}

/// Field groups reachable from the edit menu, as (name, first state, last state).
const EDIT_GROUPS: [(&str, State, State); 11] = [
    ("name", State::AwaitingName, State::AwaitingName),
    ("slogan", State::AwaitingSlogan, State::AwaitingSlogan),
    ("description", State::AwaitingDescription, State::AwaitingDescription),
    ("logo", State::AwaitingLogo, State::AwaitingLogo),
    ("theme", State::AwaitingTheme, State::AwaitingTheme),
    ("colors", State::AwaitingColorScheme, State::AwaitingColorScheme),
    ("socials", State::AwaitingTelegram, State::AwaitingCustomSocial),
    ("tokenomics", State::AwaitingSupply, State::AwaitingDistribution),
    ("roadmap", State::AwaitingRoadmap, State::AwaitingRoadmap),
    ("sections", State::AwaitingSectionsOrder, State::AwaitingSectionsOrder),
    ("hosting", State::AwaitingHostingChoice, State::AwaitingDomain),
];

/// Comma separated names accepted by [`DialogueController::begin_edit`].
#[must_use]
pub fn edit_group_names() -> String {
    EDIT_GROUPS
        .iter()
        .map(|(name, _, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// State machine and field accumulator for one conversation.
#[derive(Clone)]
pub struct DialogueController {
    state: State,
    fields: FieldMap,
    last_error: Option<String>,
    policy: TransitionPolicy,

    /// Last state of the group being edited. Leaving it returns to confirmation.
    edit_return: Option<State>,
}

impl Default for DialogueController {
    fn default() -> Self {
        Self::new(TransitionPolicy::default())
    }
}

impl DialogueController {
    #[must_use]
    pub fn new(policy: TransitionPolicy) -> Self {
        Self {
            state: State::Idle,
            fields: FieldMap::defaults(),
            last_error: None,
            policy,
            edit_return: None,
        }
    }

    #[must_use]
    pub const fn current_state(&self) -> State {
        self.state
    }

    #[must_use]
    pub const fn fields(&self) -> &FieldMap {
        &self.fields
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub const fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Whether an edit group is in progress.
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.edit_return.is_some()
    }

    #[must_use]
    pub const fn prompt(&self) -> &'static str {
        self.state.prompt()
    }

    /// Moves to `next`, subject to the transition table and policy.
    pub fn transition_to(&mut self, next: State) -> Result<Transition, DialogueError> {
        let from = self.state;
        let outcome = if from.allowed_next().contains(&next) {
            Transition::Allowed
        } else if next.is_forced() {
            Transition::Forced
        } else {
            match self.policy {
                TransitionPolicy::Strict => {
                    return Err(DialogueError::IllegalTransition { from, to: next });
                }
                TransitionPolicy::Permissive => {
                    warn!("Irregular transition {} -> {}", from, next);
                    self.last_error = Some(format!("Irregular transition from {from} to {next}"));
                    Transition::Irregular
                }
            }
        };

        debug!("Transition {} -> {} ({:?})", from, next, outcome);
        self.state = next;
        Ok(outcome)
    }

    pub fn update_field(&mut self, path: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        self.fields.set(path, value)
    }

    pub(crate) fn push_field(&mut self, path: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        self.fields.push(path, value)
    }

    /// Required fields of `state` that hold no value yet.
    #[must_use]
    pub fn missing_fields(&self, state: State) -> Vec<&'static str> {
        state
            .required_fields()
            .iter()
            .copied()
            .filter(|path| !self.fields.is_present(path))
            .collect()
    }

    /// Checks the fields `state` requires. Records the first gap in `last_error`.
    pub fn validate_required_fields(&mut self, state: State) -> bool {
        match self.missing_fields(state).first() {
            Some(field) => {
                self.last_error = Some(format!("Missing required field: {field}"));
                false
            }
            None => true,
        }
    }

    /// A forward move out of the current input state.
    ///
    /// Checks the state's required fields first. While an edit group is open,
    /// leaving its last state returns to confirmation instead of `next`.
    pub fn advance(&mut self, next: State) -> Result<Transition, DialogueError> {
        let current = self.state;
        if !self.validate_required_fields(current) {
            let field = self.missing_fields(current).first().copied().unwrap_or_default();
            match self.policy {
                TransitionPolicy::Strict => {
                    return Err(DialogueError::MissingField {
                        state: current,
                        field,
                    });
                }
                TransitionPolicy::Permissive => {
                    warn!("Leaving {} without required field {}", current, field);
                }
            }
        } else {
            self.last_error = None;
        }

        let target = if self.edit_return == Some(current) {
            State::AwaitingConfirmation
        } else {
            next
        };
        let outcome = self.transition_to(target)?;
        if target == State::AwaitingConfirmation {
            self.edit_return = None;
        }
        Ok(outcome)
    }

    /// Opens the edit group called `field` and moves to its first state.
    pub fn begin_edit(&mut self, field: &str) -> Result<State, DialogueError> {
        let wanted = field.trim().to_ascii_lowercase();
        let (_, first, last) = EDIT_GROUPS
            .iter()
            .copied()
            .find(|(name, _, _)| *name == wanted || name.trim_end_matches('s') == wanted)
            .ok_or_else(|| DialogueError::UnknownEditField(field.trim().to_owned()))?;

        if self.state == State::AwaitingConfirmation {
            self.transition_to(State::AwaitingEditChoice)?;
        }
        if self.state != State::AwaitingEditChoice {
            return Err(DialogueError::InvalidState {
                state: self.state,
                action: "edit",
            });
        }

        self.transition_to(first)?;
        self.edit_return = Some(last);
        debug!("Editing {} ({} .. {})", wanted, first, last);
        Ok(first)
    }

    /// Stretches an edit group that ends in the current state on to `state`.
    pub(crate) fn extend_edit(&mut self, state: State) {
        if self.edit_return == Some(self.state) {
            self.edit_return = Some(state);
        }
    }

    /// Back to `Idle` with default fields.
    pub fn reset(&mut self) {
        debug!("Resetting dialogue from {}", self.state);
        self.state = State::Idle;
        self.fields = FieldMap::defaults();
        self.last_error = None;
        self.edit_return = None;
    }

    /// Marks the session as timed out. Bypasses the transition table.
    pub fn expire(&mut self) {
        debug!("Dialogue expired in {}", self.state);
        self.state = State::Timeout;
        self.edit_return = None;
    }

    /// Enters `Generating` and fixes the artifact id for this run.
    pub fn begin_generation(&mut self, artifact_id: &str) -> Result<GenerationRequest, DialogueError> {
        if self.state == State::Generating {
            return Err(DialogueError::InvalidState {
                state: self.state,
                action: "generation",
            });
        }
        if self.state != State::Ready {
            self.transition_to(State::Ready)?;
        }
        self.transition_to(State::Generating)?;
        self.edit_return = None;
        self.update_field("site_hash", artifact_id)?;

        let kind = self
            .fields
            .get_str("template_id")
            .and_then(|id| id.parse().ok())
            .unwrap_or_else(|| {
                warn!("No template chosen, defaulting to memecoin");
                TemplateKind::Memecoin
            });
        let hosting_method = self
            .fields
            .get_str("hosting.method")
            .and_then(|m| m.parse().ok())
            .unwrap_or_default();

        Ok(GenerationRequest {
            artifact_id: artifact_id.to_owned(),
            kind,
            fields: self.fields.flatten(),
            hosting_method,
            custom_domain: self.fields.get_str("hosting.custom_domain").map(str::to_owned),
        })
    }

    /// Stores the published URLs and finishes the dialogue.
    pub fn complete_generation(&mut self, urls: &HostingUrls) -> Result<(), DialogueError> {
        self.update_field("urls.raw_url", urls.download_url.as_str())?;
        self.update_field("urls.preview_url", urls.preview_url.as_str())?;
        self.update_field("urls.repo_url", urls.repo_url.clone())?;
        self.last_error = None;
        self.transition_to(State::Completed)?;
        Ok(())
    }

    /// Records a generation failure. Collected fields are kept for a retry.
    pub fn fail_generation(&mut self, message: &str) -> Result<(), DialogueError> {
        self.last_error = Some(message.to_owned());
        self.transition_to(State::Error)?;
        Ok(())
    }

    /// Returns from `Error` to `Ready` so generation can run again.
    pub fn retry(&mut self) -> Result<Transition, DialogueError> {
        if self.state != State::Error {
            return Err(DialogueError::InvalidState {
                state: self.state,
                action: "retry",
            });
        }
        self.last_error = None;
        self.transition_to(State::Ready)
    }
}

impl fmt::Debug for DialogueController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogueController")
            .field("state", &self.state)
            .field("policy", &self.policy)
            .field("last_error", &self.last_error)
            .field("edit_return", &self.edit_return)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict() -> DialogueController {
        DialogueController::new(TransitionPolicy::Strict)
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut controller = DialogueController::default();
        controller.transition_to(State::AwaitingTemplate).unwrap();
        controller.update_field("coin_name", "Moon").unwrap();
        controller.reset();
        assert_eq!(controller.current_state(), State::Idle);
        assert_eq!(controller.fields(), &FieldMap::defaults());
        assert!(controller.last_error().is_none());
    }

    #[test]
    fn test_update_field_nested() {
        let mut controller = DialogueController::default();
        controller.update_field("a.b.c", "v").unwrap();
        assert_eq!(controller.fields().get_str("a.b.c"), Some("v"));
    }

    #[test]
    fn test_transition_outcomes() {
        let mut controller = strict();
        assert_eq!(
            controller.transition_to(State::AwaitingTemplate).unwrap(),
            Transition::Allowed
        );
        assert_eq!(controller.transition_to(State::Ready).unwrap(), Transition::Forced);
        assert!(matches!(
            controller.transition_to(State::AwaitingDomain),
            Err(DialogueError::IllegalTransition {
                from: State::Ready,
                to: State::AwaitingDomain
            })
        ));
        assert_eq!(controller.current_state(), State::Ready);
    }

    #[test]
    fn test_permissive_records_irregular_move() {
        let mut controller = DialogueController::new(TransitionPolicy::Permissive);
        assert_eq!(
            controller.transition_to(State::AwaitingRoadmap).unwrap(),
            Transition::Irregular
        );
        assert_eq!(controller.current_state(), State::AwaitingRoadmap);
        assert!(controller.last_error().unwrap().contains("Irregular"));
    }

    #[test]
    fn test_strict_advance_requires_fields() {
        let mut controller = strict();
        controller.transition_to(State::AwaitingTemplate).unwrap();
        assert!(matches!(
            controller.advance(State::AwaitingName),
            Err(DialogueError::MissingField {
                field: "template_id",
                ..
            })
        ));
        assert_eq!(controller.current_state(), State::AwaitingTemplate);
        assert_eq!(controller.last_error(), Some("Missing required field: template_id"));

        controller.update_field("template_id", "memecoin").unwrap();
        controller.advance(State::AwaitingName).unwrap();
        assert_eq!(controller.current_state(), State::AwaitingName);
    }

    #[test]
    fn test_permissive_advance_past_missing_field() {
        let mut controller = DialogueController::new(TransitionPolicy::Permissive);
        controller.transition_to(State::AwaitingTemplate).unwrap();

        let outcome = controller.advance(State::AwaitingName).unwrap();
        assert_eq!(outcome, Transition::Allowed);
        assert_eq!(controller.current_state(), State::AwaitingName);
        assert_eq!(
            controller.last_error(),
            Some("Missing required field: template_id")
        );

        controller.update_field("coin_name", "Pepe").unwrap();
        controller.update_field("formatted_name", "Pepe").unwrap();
        controller.update_field("symbol", "PEPE").unwrap();
        controller.advance(State::AwaitingSlogan).unwrap();
        assert_eq!(controller.current_state(), State::AwaitingSlogan);
        assert_eq!(controller.last_error(), None);
    }

    #[test]
    fn test_edit_group_returns_to_confirmation() {
        let mut controller = strict();
        controller.transition_to(State::AwaitingTemplate).unwrap();
        controller.transition_to(State::Ready).unwrap();
        controller.transition_to(State::AwaitingConfirmation).unwrap();

        assert_eq!(controller.begin_edit("socials").unwrap(), State::AwaitingTelegram);
        assert!(controller.is_editing());
        controller.advance(State::AwaitingTwitter).unwrap();
        for next in [
            State::AwaitingDiscord,
            State::AwaitingMedium,
            State::AwaitingGithub,
            State::AwaitingCustomSocial,
        ] {
            controller.advance(next).unwrap();
        }
        controller.advance(State::AwaitingSupply).unwrap();
        assert_eq!(controller.current_state(), State::AwaitingConfirmation);
        assert!(!controller.is_editing());
    }

    #[test]
    fn test_begin_edit_rejects_unknown_and_wrong_state() {
        let mut controller = strict();
        assert!(matches!(
            controller.begin_edit("price"),
            Err(DialogueError::UnknownEditField(_))
        ));
        assert!(matches!(
            controller.begin_edit("name"),
            Err(DialogueError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_generation_hooks() {
        let mut controller = strict();
        controller.update_field("template_id", "nft").unwrap();
        controller.update_field("hosting.method", "github").unwrap();

        let request = controller.begin_generation("0123456789").unwrap();
        assert_eq!(controller.current_state(), State::Generating);
        assert_eq!(request.kind, TemplateKind::Nft);
        assert_eq!(request.hosting_method, HostingMethod::Github);
        assert_eq!(request.fields["site_hash"], "0123456789");
        assert!(controller.begin_generation("again").is_err());

        controller.fail_generation("network down").unwrap();
        assert_eq!(controller.current_state(), State::Error);
        assert_eq!(controller.last_error(), Some("network down"));
        assert_eq!(controller.fields().get_str("template_id"), Some("nft"));

        assert_eq!(controller.retry().unwrap(), Transition::Forced);
        controller.begin_generation("0123456789").unwrap();
        controller
            .complete_generation(&HostingUrls {
                download_url: "http://x/raw".to_owned(),
                preview_url: "http://x/page".to_owned(),
                repo_url: None,
            })
            .unwrap();
        assert_eq!(controller.current_state(), State::Completed);
        assert_eq!(controller.fields().get_str("urls.preview_url"), Some("http://x/page"));
    }

    #[test]
    fn test_retry_only_from_error() {
        let mut controller = strict();
        assert!(matches!(
            controller.retry(),
            Err(DialogueError::InvalidState { action: "retry", .. })
        ));
    }

    #[test]
    fn test_expire_sets_timeout() {
        let mut controller = strict();
        controller.transition_to(State::AwaitingTemplate).unwrap();
        controller.expire();
        assert_eq!(controller.current_state(), State::Timeout);
        assert!(controller.current_state().is_terminal());
    }
}
