//! Instruction block and message sequence assembly.

use edbot_knowledge::ScoredDocument;
use edbot_llm::Message;

use crate::config::Variant;

/// Fixed EdBot persona and conversation policy.
pub const PERSONA: &str = include_str!("../prompts/persona.md");

/// Opening assistant turn for persona and retrieval sessions.
pub const GREETING: &str = include_str!("../prompts/greeting.md");

/// About and contact blurb shown beside the chat.
pub const ABOUT: &str = include_str!("../prompts/about.md");

const KNOWLEDGE_HEADER: &str = "RELEVANT INFORMATION FROM EDSTELLAR'S KNOWLEDGE BASE:";
const DOCUMENT_SEPARATOR: &str = "\n\n---\n\n";
const CITATION_RULE: &str = "Use the information above to answer accurately. When you \
recommend a course or refer to a page, cite it as a markdown link in the form \
[Title](URL) using the URLs given above. If the information above does not cover \
the question, say so and suggest contacting Edstellar.";

/// Join retrieved document texts with the knowledge-base separator.
#[must_use]
pub fn format_context(hits: &[ScoredDocument]) -> String {
    hits.iter()
        .map(|h| h.document.text.as_str())
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}

/// System instruction for `variant`, or `None` for plain chat.
#[must_use]
pub fn build_instruction(variant: Variant, hits: &[ScoredDocument]) -> Option<String> {
    match variant {
        Variant::Plain => None,
        Variant::Persona => Some(PERSONA.to_owned()),
        Variant::Retrieval => Some(format!(
            "{}\n\n{KNOWLEDGE_HEADER}\n\n{}\n\n{CITATION_RULE}",
            PERSONA.trim_end(),
            format_context(hits)
        )),
    }
}

/// `[instruction] + history + current`, history oldest first.
#[must_use]
pub fn assemble_messages(
    instruction: Option<String>,
    history: Vec<Message>,
    current: &str,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if let Some(instruction) = instruction {
        messages.push(Message::system(instruction));
    }
    messages.extend(history);
    messages.push(Message::user(current));
    messages
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use edbot_knowledge::Document;
    use edbot_llm::Role;

    use super::*;

    fn hit(text: &str) -> ScoredDocument {
        ScoredDocument {
            score: 0.5,
            document: Document {
                id: "d".into(),
                text: text.into(),
                metadata: BTreeMap::new(),
            },
        }
    }

    #[test]
    fn prompts_are_embedded() {
        assert!(PERSONA.contains("EdBot"));
        assert!(GREETING.contains("EdBot"));
        assert!(ABOUT.contains("info@edstellar.com"));
    }

    #[test]
    fn plain_has_no_instruction() {
        assert!(build_instruction(Variant::Plain, &[hit("x")]).is_none());
    }

    #[test]
    fn persona_instruction_ignores_hits() {
        let instruction = build_instruction(Variant::Persona, &[hit("Agile")]).unwrap();
        assert_eq!(instruction, PERSONA);
    }

    #[test]
    fn retrieval_instruction_appends_context() {
        let instruction =
            build_instruction(Variant::Retrieval, &[hit("Course: Agile"), hit("About us")])
                .unwrap();
        assert!(instruction.starts_with(PERSONA.trim_end()));
        assert!(instruction.contains(KNOWLEDGE_HEADER));
        assert!(instruction.contains("Course: Agile\n\n---\n\nAbout us"));
        assert!(instruction.contains("[Title](URL)"));
    }

    #[test]
    fn messages_are_ordered() {
        let history = vec![Message::assistant("hi"), Message::user("q1"), Message::assistant("a1")];
        let messages = assemble_messages(Some("sys".into()), history, "q2");
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [Role::System, Role::Assistant, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(messages.last().unwrap().content, "q2");
    }

    #[test]
    fn plain_messages_have_no_system_entry() {
        let messages = assemble_messages(None, Vec::new(), "hello");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
    }
}
