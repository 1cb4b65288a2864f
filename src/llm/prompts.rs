use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Instruction used once at startup to condense the interviewee introduction
pub const REFINEMENT_SYSTEM_PROMPT: &str = r#"You prepare background notes for an editor who will revise an interview transcript.

Rewrite the self-introduction you are given into a short, factual profile:
- who the person is, their role and organization
- topics, products, names and technical terms they are likely to mention
- any spelling of names or terms that a speech recognizer might get wrong

Do not invent facts. Output only the profile."#;

/// Instruction for the initial revision of a chunk
pub const TRANSCRIPT_SYSTEM_PROMPT: &str = r#"You are revising a raw, speech-recognized interview transcript into clean written form.

The interviewee is {interviewee_name}. Background:
{interviewee_introduction}

Rules:
1. Keep every speaker label exactly as given and keep the "speaker: content" layout, one turn per paragraph, separated by a blank line.
2. Remove filler words, false starts and repetitions; fix recognition errors using the background above.
3. Preserve every fact, number, name, example and opinion. Do not summarize, do not add content.
4. Keep the speaker's own voice and first-person perspective.

Output only the revised transcript."#;

/// Instruction for comparing the unrevised and revised text
pub const CHECK_DIFFERENCE_SYSTEM_PROMPT: &str = r#"You audit revisions of interview transcripts for completeness.

Compare the text before revision with the text after revision. List every piece of information present before revision that is missing, altered or weakened after revision: facts, numbers, names, examples, reasons, opinions, qualifications.

Ignore removed filler words and purely stylistic changes. If nothing is missing, answer "No missing information."
Output a concise bulleted list."#;

/// User message for the difference check
pub const CHECK_DIFFERENCE_USER_PROMPT: &str = r#"Text before revision:
{unrevised_text}

Text after revision:
{revised_text}"#;

/// Instruction for restoring information the revision dropped
pub const SUPPLY_MISSING_INFORMATION_SYSTEM_PROMPT: &str = r#"You correct revised interview transcripts.

You receive the original text, its revision, and a list of information the revision dropped or altered. Produce a new revision that restores all listed information in the right speaker's turn, in the same clean written style, without adding anything that is not in the original.

Keep the "speaker: content" layout with one turn per paragraph, separated by a blank line. Output only the corrected transcript."#;

/// User message for the supply-missing-information step
pub const SUPPLY_MISSING_INFORMATION_USER_PROMPT: &str = r#"Original text:
{unrevised_text}

Current revision:
{revised_text}

Missing or altered information:
{difference_information}"#;

/// Instruction for the optional style polish
pub const POLISH_SYSTEM_PROMPT: &str = r#"You are a magazine editor polishing an interview for publication.

Improve flow, sentence rhythm and word choice so each turn reads naturally. Keep every speaker label, the "speaker: content" layout and the paragraph breaks. Do not remove or add information.

Output only the polished transcript."#;

/// Named instruction templates with `{placeholder}` substitution.
///
/// Any key missing from a prompts file falls back to the built-in text.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub refinement_system_prompt: String,
    pub transcript_system_prompt: String,
    pub check_difference_system_prompt: String,
    pub check_difference_user_prompt: String,
    pub supply_missing_information_system_prompt: String,
    pub supply_missing_information_user_prompt: String,
    pub polish_system_prompt: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            refinement_system_prompt: REFINEMENT_SYSTEM_PROMPT.to_string(),
            transcript_system_prompt: TRANSCRIPT_SYSTEM_PROMPT.to_string(),
            check_difference_system_prompt: CHECK_DIFFERENCE_SYSTEM_PROMPT.to_string(),
            check_difference_user_prompt: CHECK_DIFFERENCE_USER_PROMPT.to_string(),
            supply_missing_information_system_prompt: SUPPLY_MISSING_INFORMATION_SYSTEM_PROMPT
                .to_string(),
            supply_missing_information_user_prompt: SUPPLY_MISSING_INFORMATION_USER_PROMPT
                .to_string(),
            polish_system_prompt: POLISH_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Load templates from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompts file: {:?}", path))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse prompts YAML")
    }

    /// System instruction for the revise step
    pub fn transcript_system(&self, interviewee_name: &str, introduction: &str) -> String {
        render(
            &self.transcript_system_prompt,
            &[
                ("interviewee_name", interviewee_name),
                ("interviewee_introduction", introduction),
            ],
        )
    }

    /// User message for the check-difference step
    pub fn check_difference_user(&self, unrevised_text: &str, revised_text: &str) -> String {
        render(
            &self.check_difference_user_prompt,
            &[
                ("unrevised_text", unrevised_text),
                ("revised_text", revised_text),
            ],
        )
    }

    /// User message for the supply-missing-information step
    pub fn supply_missing_information_user(
        &self,
        unrevised_text: &str,
        revised_text: &str,
        difference_information: &str,
    ) -> String {
        render(
            &self.supply_missing_information_user_prompt,
            &[
                ("unrevised_text", unrevised_text),
                ("revised_text", revised_text),
                ("difference_information", difference_information),
            ],
        )
    }
}

/// Substitute `{key}` placeholders in a single pass.
///
/// Substituted values are never rescanned, so text containing braces
/// passes through untouched. Unknown placeholders are left verbatim.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let replacement = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });

        match replacement {
            Some((value, close)) => {
                output.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                output.push('{');
                rest = after;
            }
        }
    }

    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_known_keys() {
        let out = render("Hi {name}, see {missing}.", &[("name", "Alice")]);
        assert_eq!(out, "Hi Alice, see {missing}.");
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let out = render(
            "{a} and {b}",
            &[("a", "literal {b} in value"), ("b", "second")],
        );
        assert_eq!(out, "literal {b} in value and second");
    }

    #[test]
    fn test_render_unbalanced_braces() {
        assert_eq!(render("open { only", &[("x", "y")]), "open { only");
        assert_eq!(render("{", &[]), "{");
        assert_eq!(render("}{x}", &[("x", "1")]), "}1");
    }

    #[test]
    fn test_default_transcript_prompt_mentions_interviewee() {
        let templates = PromptTemplates::default();
        let system = templates.transcript_system("Alice", "Runs a bakery.");
        assert!(system.contains("The interviewee is Alice."));
        assert!(system.contains("Runs a bakery."));
        assert!(!system.contains("{interviewee_name}"));
    }

    #[test]
    fn test_supply_user_prompt() {
        let templates = PromptTemplates::default();
        let user = templates.supply_missing_information_user("raw", "rev", "- lost the year");
        assert!(user.contains("Original text:\nraw"));
        assert!(user.contains("Current revision:\nrev"));
        assert!(user.ends_with("- lost the year"));
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let yaml = "polish_system_prompt: Make it shine.\n";
        let templates = PromptTemplates::from_yaml_str(yaml).unwrap();
        assert_eq!(templates.polish_system_prompt, "Make it shine.");
        assert_eq!(
            templates.check_difference_system_prompt,
            CHECK_DIFFERENCE_SYSTEM_PROMPT
        );
    }
}
