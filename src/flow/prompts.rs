//! Outbound text for each step of the intake conversation.

use super::model::{FieldSpec, FormModel};
use super::summary::FlowSummary;

/// Reply for sessions that have not started the form.
pub const GREETING: &str = "\
Hello! 👋

I can help you with:
• Fill out a form (type 'form')
• Get assistance

How can I help you today?";

/// Reply while the customer waits for a human agent.
pub const WAITING_NOTICE: &str = "Thank you for your patience. An agent will respond shortly.";

/// Reply when the form is being filled but nothing is left to ask.
pub const NOTHING_LEFT: &str = "Thank you for your information!";

/// Prompt for a field; choice fields list their options by number.
pub fn field_prompt(field: &FieldSpec) -> String {
    match field.options() {
        Some(options) => {
            let list = options
                .iter()
                .enumerate()
                .map(|(i, o)| format!("{}. {}", i + 1, o.title))
                .collect::<Vec<_>>()
                .join("\n");
            format!("{}\n{}", field.prompt, list)
        }
        None => field.prompt.clone(),
    }
}

/// Prompt for a field id that may not be in the model.
pub fn prompt_for(model: &FormModel, field_id: &str) -> String {
    match model.field(field_id) {
        Some(field) => field_prompt(field),
        None => format!("Please provide your {field_id}:"),
    }
}

/// Reply for an answer that matches none of a choice field's options.
pub fn invalid_choice(field: &FieldSpec) -> String {
    let count = field.options().map_or(0, <[_]>::len);
    let label = field.label.to_lowercase();
    format!("Please select a valid {label} option (1-{count}) or type the {label} name.")
}

/// Confirmation listing everything collected.
pub fn completion_summary(model: &FormModel, summary: &FlowSummary) -> String {
    let lines = model
        .fields()
        .iter()
        .map(|f| format!("• {}: {}", f.label, summary.value(&f.id).unwrap_or("-")))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "✅ Thank you! I've received your information:\n\n\
         📋 **Customer Information:**\n\
         {lines}\n\n\
         An agent will be with you shortly to assist you further."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_field_prompt() {
        let model = FormModel::customer_info();
        assert_eq!(prompt_for(&model, "name"), "What is your full name?");
        assert_eq!(prompt_for(&model, "email"), "What is your email address?");
    }

    #[test]
    fn choice_field_prompt_lists_options() {
        let model = FormModel::customer_info();
        let prompt = prompt_for(&model, "country");
        assert!(prompt.starts_with("Please choose your country"));
        assert!(prompt.contains("1. United States"));
        assert!(prompt.contains("8. Other"));
    }

    #[test]
    fn unknown_field_prompt() {
        let model = FormModel::customer_info();
        assert_eq!(prompt_for(&model, "phone"), "Please provide your phone:");
    }

    #[test]
    fn invalid_choice_mentions_range() {
        let model = FormModel::customer_info();
        let text = invalid_choice(model.field("country").unwrap());
        assert_eq!(
            text,
            "Please select a valid country option (1-8) or type the country name."
        );
    }
}
