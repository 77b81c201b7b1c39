// Prompt text for the interviewer persona. The headers here must match
// `formatter::markers::Section::header` so well-behaved replies pass through
// the formatter untouched.

use crate::conversation::models::ConversationSeed;

/// First assistant message of every session.
pub const OPENING_GREETING: &str = "Let's start! Tell me about yourself.";

/// Topic value that adds no focus block.
pub const GENERAL_TOPIC: &str = "General";

/// Base system instruction. Rebuilt with context blocks on every turn.
pub const INTERVIEWER_SYSTEM: &str = "You are a technical interviewer preparing B.Tech CSE students for internships.

CRITICAL: You MUST respond using EXACTLY this structure. Copy this format exactly:

### \u{2705} What's Good
[2-3 bullet points about what the student did well]

### \u{26A0}\u{FE0F} Areas for Improvement
[2-3 bullet points about what could be improved]

### \u{1F4DD} Model Answer
[A complete, detailed, professional answer that a candidate would give in an interview. \
This must be comprehensive with multiple paragraphs, examples, and detailed explanations. \
This section should be SIGNIFICANTLY longer than the evaluation sections - at least 3-5 paragraphs.]

### \u{2753} Follow-up Question
[Ask the next interview question]

IMPORTANT RULES:
1. ALWAYS start with '### \u{2705} What's Good' (exactly this text)
2. ALWAYS include '### \u{26A0}\u{FE0F} Areas for Improvement' (exactly this text)
3. ALWAYS include '### \u{1F4DD} Model Answer' (exactly this text)
4. ALWAYS end with '### \u{2753} Follow-up Question' (exactly this text)
5. Use these exact headers with the emojis and markdown formatting
6. Do NOT write in paragraphs without headers
7. Do NOT use numbered lists like '1. What's good'
8. Do NOT combine sections
9. The Model Answer must be a complete answer, not a summary

Tailor questions for B.Tech CSE level.
";

/// Appended once the candidate has answered at least one question; models
/// drift from the template as conversations grow.
pub const FORMAT_REMINDER: &str = "
CRITICAL FORMAT REMINDER
You MUST respond using EXACTLY these headers (copy them exactly):
### \u{2705} What's Good
### \u{26A0}\u{FE0F} Areas for Improvement
### \u{1F4DD} Model Answer
### \u{2753} Follow-up Question

Do NOT use:
- Numbered lists like '1. What's good:'
- Paragraphs without headers
- Combined sections
- Any other format

You MUST use the exact headers shown above with the emojis and markdown formatting.
";

/// Per-turn inputs that shape the system instruction.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub topic: &'a str,
    pub resume_text: Option<&'a str>,
    pub include_format_reminder: bool,
}

pub fn build_system_prompt(ctx: PromptContext<'_>) -> String {
    let mut prompt = String::from(INTERVIEWER_SYSTEM);

    if ctx.include_format_reminder {
        prompt.push_str(FORMAT_REMINDER);
    }

    if let Some(resume) = ctx.resume_text.filter(|r| !r.trim().is_empty()) {
        prompt.push_str("\nHere is the candidate's resume:\n");
        prompt.push_str(resume);
        prompt.push('\n');
    }

    let topic = ctx.topic.trim();
    if !topic.is_empty() && topic != GENERAL_TOPIC {
        prompt.push_str("\nFocus questions on: ");
        prompt.push_str(topic);
        prompt.push('\n');
    }

    prompt
}

/// Seed for new sessions: base instruction plus the opening greeting.
pub fn default_seed() -> ConversationSeed {
    ConversationSeed {
        system_prompt: INTERVIEWER_SYSTEM.to_string(),
        greeting: OPENING_GREETING.to_string(),
    }
}
