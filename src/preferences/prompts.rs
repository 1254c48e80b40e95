//! Prompt text for the preference extraction conversation.

use super::schema::PreferenceSchema;

/// Greeting shown at the top of every new conversation.
pub const WELCOME_MESSAGE: &str =
    "Welcome to the Orchestra Search Demo! Please enter some information about your job search.";

/// Example input shown in the empty message box.
pub const INPUT_PLACEHOLDER: &str = "I am a violinist from Minneapolis, looking for an assistant \
concertmaster position anywhere in the US. I'm also looking for side gigs in regional orchestras.";

const PREAMBLE: &str = "I will give you my job preference. Give response along with the specified \
format. Return empty string for missing fields.";

/// Build the extraction prompt for one user message.
pub fn build_prompt(schema: &PreferenceSchema, user_text: &str) -> String {
    format!(
        "{PREAMBLE}\n{instructions}\n{user_text}",
        instructions = schema.format_instructions()
    )
}

/// Bot follow-up asking for the fields still missing.
pub fn follow_up_message(missing: &[String]) -> String {
    format!(
        "Could you also provide information for: {}?",
        missing.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_preamble_instructions_and_input() {
        let schema = PreferenceSchema::orchestra();
        let prompt = build_prompt(&schema, "I play the bassoon in Boston.");

        assert!(prompt.starts_with("I will give you my job preference."));
        assert!(prompt.contains("Return empty string for missing fields."));
        assert!(prompt.contains(&schema.format_instructions()));
        assert!(prompt.ends_with("I play the bassoon in Boston."));
    }

    #[test]
    fn prompt_is_deterministic() {
        let schema = PreferenceSchema::orchestra();
        assert_eq!(build_prompt(&schema, "x"), build_prompt(&schema, "x"));
    }

    #[test]
    fn follow_up_lists_fields_in_order() {
        let missing = vec!["position".to_string(), "side_gigs".to_string()];
        assert_eq!(
            follow_up_message(&missing),
            "Could you also provide information for: position, side_gigs?"
        );
    }
}
