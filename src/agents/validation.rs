//! Custom agent form and its local validation rules

use crate::error::{ChatmateError, FieldError};
use crate::models::{Agent, AgentCategory};
use chrono::Utc;
use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::OnceLock;
use uuid::Uuid;

/// Allowed agent name length, in characters
pub const NAME_LEN: RangeInclusive<usize> = 2..=50;
/// Allowed description length, in characters
pub const DESCRIPTION_LEN: RangeInclusive<usize> = 10..=200;
/// Allowed system prompt length, in characters
pub const SYSTEM_PROMPT_LEN: RangeInclusive<usize> = 20..=4000;

fn control_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\p{Cc}&&[^\n\t]]").expect("static regex"))
}

/// User-authored fields for a new custom agent
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDraft {
    /// Display name
    pub name: String,
    /// One-line description
    pub description: String,
    /// Listing category
    pub category: AgentCategory,
    /// Icon name or emoji
    pub icon: String,
    /// System instruction
    pub system_prompt: String,
}

impl AgentDraft {
    /// Check every field and return all failures.
    ///
    /// An empty vector means the draft is valid. Lengths are measured on the
    /// trimmed value in characters, not bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatmate::agents::AgentDraft;
    /// use chatmate::models::AgentCategory;
    ///
    /// let draft = AgentDraft {
    ///     name: "X".to_string(),
    ///     description: "Too short".to_string(),
    ///     category: AgentCategory::Custom,
    ///     icon: "star".to_string(),
    ///     system_prompt: "You are a pirate who answers in rhymes.".to_string(),
    /// };
    /// let errors = draft.validate();
    /// assert_eq!(errors.len(), 2);
    /// ```
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        check_length(&mut errors, "name", &self.name, &NAME_LEN);
        if control_chars().is_match(&self.name) {
            errors.push(FieldError::new(
                "name",
                "must not contain control characters",
            ));
        }
        check_length(
            &mut errors,
            "description",
            &self.description,
            &DESCRIPTION_LEN,
        );
        check_length(
            &mut errors,
            "system_prompt",
            &self.system_prompt,
            &SYSTEM_PROMPT_LEN,
        );
        if self.icon.trim().is_empty() {
            errors.push(FieldError::new("icon", "is required"));
        }

        errors
    }

    /// Validate the draft and build a custom agent from it
    ///
    /// # Errors
    ///
    /// Returns `ChatmateError::Validation` listing every failing field
    pub fn into_agent(self) -> Result<Agent, ChatmateError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(ChatmateError::Validation(errors));
        }

        Ok(Agent {
            id: format!("custom-{}", Uuid::new_v4()),
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category,
            icon: self.icon.trim().to_string(),
            system_prompt: self.system_prompt.trim().to_string(),
            is_custom: true,
            created_at: Some(Utc::now()),
        })
    }
}

fn check_length(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    bounds: &RangeInclusive<usize>,
) {
    let len = value.trim().chars().count();
    if len < *bounds.start() {
        errors.push(FieldError::new(
            field,
            format!("must be at least {} characters", bounds.start()),
        ));
    } else if len > *bounds.end() {
        errors.push(FieldError::new(
            field,
            format!("must be at most {} characters", bounds.end()),
        ));
    }
}
