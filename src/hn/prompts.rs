use crate::types::ChatMessage;

pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that writes creative HN (Hacker News) story titles";

pub fn stories_prompt(count: usize) -> String {
    format!(
        "give me {count} hacker news (HN) stories.
Follow the following instructions accurately:
- Make the titles as realistic as possible.
- If the story is in the first person and showing some work, prefix it with Show HN:
- If the story is a question, prefix it with Ask HN:
- If the story is about hiring, use the HN format for example '{{Company}} (YC {{Season}}) is hiring {{Role}}'. Replace the {{}} variables with creative values
- Most titles should not be in the first person, and should not be prefixed.
- NEVER include a prefix like \"Prefix:\" for jobs and hiring titles
- Only include at most 1 show, 1 ask and 1 hiring title"
    )
}

pub fn comments_prompt(title: &str) -> String {
    format!(
        "Generate a hacker news comment tree with 100+ comments, replies and usernames for the topic: {title}. Make the comments as realistic and comprehensive as possible"
    )
}

/// System instruction followed by the user prompt.
pub fn conversation(prompt: impl Into<String>) -> Vec<ChatMessage> {
    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)]
}
