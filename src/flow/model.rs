//! Form model — the fixed, ordered set of fields a session collects.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::FlowError;

/// Collected answers keyed by field identifier.
pub type FormValues = BTreeMap<String, Option<String>>;

/// One entry of a predefined option list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoiceOption {
    /// Text shown to the customer and stored as the answer.
    pub title: String,
    /// Short machine identifier, e.g. "CA".
    pub identifier: String,
}

/// How a field expects to be answered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Pick one of a numbered list, by number or by name.
    Choice { options: Vec<ChoiceOption> },
}

/// A single field in a form model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldSpec {
    pub id: String,
    pub label: String,
    pub prompt: String,
    pub required: bool,
    pub kind: FieldKind,
}

impl FieldSpec {
    /// A required free-text field.
    pub fn text(id: &str, label: &str, prompt: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            prompt: prompt.to_string(),
            required: true,
            kind: FieldKind::Text,
        }
    }

    /// A required choice field; `options` are `(title, identifier)` pairs.
    pub fn choice(id: &str, label: &str, prompt: &str, options: &[(&str, &str)]) -> Self {
        Self {
            kind: FieldKind::Choice {
                options: options
                    .iter()
                    .map(|(title, identifier)| ChoiceOption {
                        title: title.to_string(),
                        identifier: identifier.to_string(),
                    })
                    .collect(),
            },
            ..Self::text(id, label, prompt)
        }
    }

    /// Mark the field as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Options of a choice field, `None` for free text.
    pub fn options(&self) -> Option<&[ChoiceOption]> {
        match &self.kind {
            FieldKind::Choice { options } => Some(options),
            FieldKind::Text => None,
        }
    }
}

/// Ordered, immutable list of fields.
///
/// Identifiers are unique and the order is fixed once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormModel {
    fields: Vec<FieldSpec>,
}

impl FormModel {
    /// Build a model, rejecting empty models and duplicate identifiers.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, FlowError> {
        if fields.is_empty() {
            return Err(FlowError::EmptyModel);
        }
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.id.as_str()) {
                return Err(FlowError::DuplicateField {
                    field: field.id.clone(),
                });
            }
        }
        Ok(Self { fields })
    }

    /// The customer information form: name, company, country, email.
    pub fn customer_info() -> Self {
        Self {
            fields: vec![
                FieldSpec::text("name", "Name", "What is your full name?"),
                FieldSpec::text("company", "Company", "What is your company name?"),
                FieldSpec::choice(
                    "country",
                    "Country",
                    "Please choose your country (reply with the number):",
                    &[
                        ("United States", "US"),
                        ("Canada", "CA"),
                        ("United Kingdom", "UK"),
                        ("Australia", "AU"),
                        ("Germany", "DE"),
                        ("France", "FR"),
                        ("Japan", "JP"),
                        ("Other", "OTHER"),
                    ],
                ),
                FieldSpec::text("email", "Email", "What is your email address?"),
            ],
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field_at(&self, index: usize) -> Option<&FieldSpec> {
        self.fields.get(index)
    }

    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.id == id)
    }

    /// A value map with every field present and empty.
    pub fn empty_values(&self) -> FormValues {
        self.fields.iter().map(|f| (f.id.clone(), None)).collect()
    }

    /// Whether every required field holds a non-empty value.
    ///
    /// Decided from `values` alone, never from a cursor.
    pub fn is_complete(&self, values: &FormValues) -> bool {
        self.fields
            .iter()
            .filter(|f| f.required)
            .all(|f| is_filled(values, &f.id))
    }
}

/// Whether `field` holds a non-empty value.
pub fn is_filled(values: &FormValues, field: &str) -> bool {
    matches!(values.get(field), Some(Some(v)) if !v.trim().is_empty())
}
