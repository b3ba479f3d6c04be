//! Hacker News flavoured records, schemas and prompts.

pub mod models;
pub mod prompts;

pub use models::{
    Comment, CommentsPayload, StoriesPayload, Story, StoryType, comments_schema, stories_schema,
};
pub use prompts::{SYSTEM_PROMPT, comments_prompt, conversation, stories_prompt};
