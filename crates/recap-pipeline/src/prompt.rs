/// Bumped whenever the output contract below changes
pub const PROMPT_VERSION: &str = "meeting-summary-v1";

pub const SYSTEM_PROMPT: &str = r#"You summarize recorded project meetings for a project manager.

Return exactly one JSON object and nothing else, with these five keys:
{
  "overview": "2-4 sentence summary of the meeting",
  "sections": [{"title": "topic", "content": "what was discussed"}],
  "actionItems": [{"title": "task", "description": "details", "dueDate": "YYYY-MM-DD or null", "priority": "high|medium|low"}],
  "decisions": [{"title": "decision", "context": "why or null"}],
  "risks": [{"title": "risk", "description": "impact", "severity": "high|medium|low"}]
}

Rules:
- Use only information present in the provided context. Do not invent owners, dates or numbers.
- Use empty arrays when a category has no entries.
- JSON keys stay in English. All values are written in the language spoken in the meeting."#;

/// System message, pinned to the meeting's language when known
pub fn system_prompt(language: &str) -> String {
    format!(
        "{}\n- The meeting language is \"{}\"; write every value in that language.",
        SYSTEM_PROMPT, language
    )
}

pub fn user_prompt(context: &str) -> String {
    format!("Summarize the following meeting.\n\n{}", context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_every_key_and_language() {
        let prompt = system_prompt("pt");
        for key in ["overview", "sections", "actionItems", "decisions", "risks"] {
            assert!(prompt.contains(key), "missing {key}");
        }
        assert!(prompt.contains("\"pt\""));
    }
}
