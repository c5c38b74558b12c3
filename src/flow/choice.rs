//! Choice resolution for fields with a predefined option list.

use super::model::ChoiceOption;

/// Map a reply onto one of `options`.
///
/// A 1-based option number selects that option. Otherwise the first option
/// whose title appears in the reply (case-insensitive) wins.
pub fn resolve_choice<'a>(options: &'a [ChoiceOption], reply: &str) -> Option<&'a ChoiceOption> {
    let reply = reply.trim();
    if reply.is_empty() {
        return None;
    }

    if let Ok(n) = reply.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| options.get(i));
    }

    let lowered = reply.to_lowercase();
    options
        .iter()
        .find(|o| lowered.contains(&o.title.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::model::FormModel;

    fn countries() -> Vec<ChoiceOption> {
        FormModel::customer_info()
            .field("country")
            .and_then(|f| f.options())
            .unwrap()
            .to_vec()
    }

    #[test]
    fn by_number() {
        let options = countries();
        assert_eq!(resolve_choice(&options, "2").unwrap().title, "Canada");
        assert_eq!(resolve_choice(&options, " 8 ").unwrap().title, "Other");
    }

    #[test]
    fn out_of_range_numbers() {
        let options = countries();
        assert!(resolve_choice(&options, "0").is_none());
        assert!(resolve_choice(&options, "9").is_none());
    }

    #[test]
    fn by_name() {
        let options = countries();
        assert_eq!(resolve_choice(&options, "japan").unwrap().identifier, "JP");
        assert_eq!(
            resolve_choice(&options, "I live in the United Kingdom").unwrap().identifier,
            "UK"
        );
    }

    #[test]
    fn no_match() {
        let options = countries();
        assert!(resolve_choice(&options, "Atlantis").is_none());
        assert!(resolve_choice(&options, "   ").is_none());
    }
}
