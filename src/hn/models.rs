//! Story and comment records and the schemas the model must follow.
//!
//! Fields are optional because snapshots arrive before records are complete;
//! the final snapshot of a sequence is checked against the full schema, where
//! every field except `reply_to_id` is required.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

use crate::types::OutputSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryType {
    Show,
    Jobs,
    Ask,
    Story,
}

impl StoryType {
    pub const ALL: [Self; 4] = [Self::Show, Self::Jobs, Self::Ask, Self::Story];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Jobs => "jobs",
            Self::Ask => "ask",
            Self::Story => "story",
        }
    }
}

impl std::fmt::Display for StoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fabricated front-page listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub title: Option<String>,
    pub username: Option<String>,
    pub domain: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<StoryType>,
    #[serde(default, deserialize_with = "whole_number")]
    pub points: Option<i64>,
    /// Position in the story list, assigned when the list is stored.
    #[serde(skip_deserializing)]
    pub id: String,
}

impl Story {
    /// The title, once it has fully arrived and is non-blank.
    pub fn ready_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Accepts `120.0` as well as `120`: both are integers to JSON Schema.
fn whole_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(n) = number.as_i64() {
        return Ok(Some(n));
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(Some(f as i64))
        }
        _ => Err(D::Error::custom(format!(
            "expected a whole number, got {number}"
        ))),
    }
}

/// One fabricated reply in a comment tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Option<String>,
    pub reply_to_id: Option<String>,
    pub username: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StoriesPayload {
    #[serde(default)]
    pub stories: Vec<Story>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommentsPayload {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

pub fn stories_schema() -> OutputSchema {
    let story_types: Vec<Value> = StoryType::ALL
        .iter()
        .map(|t| Value::from(t.as_str()))
        .collect();

    OutputSchema::new(
        "hn_stories",
        json!({
            "type": "object",
            "properties": {
                "stories": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": {
                                "type": "string",
                                "description": "The title of the HN story. If it's a hiring story, it should be in the classic HN format"
                            },
                            "username": {
                                "type": "string",
                                "description": "The username of the author"
                            },
                            "domain": {
                                "type": "string",
                                "description": "The domain of the story"
                            },
                            "type": {
                                "type": "string",
                                "enum": story_types,
                                "description": "The type of story"
                            },
                            "points": {
                                "type": "integer",
                                "description": "The score of the story"
                            }
                        },
                        "required": ["title", "username", "domain", "type", "points"]
                    }
                }
            },
            "required": ["stories"]
        }),
    )
    .with_description("A list of Hacker News front page stories")
}

pub fn comments_schema() -> OutputSchema {
    OutputSchema::new(
        "hn_comments",
        json!({
            "type": "object",
            "properties": {
                "comments": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "string",
                                "description": "The numeric comment id. It should be numeric"
                            },
                            "reply_to_id": {
                                "type": "string",
                                "description": "The numeric id of the comment id this replies to"
                            },
                            "username": {
                                "type": "string",
                                "description": "The username of the author"
                            },
                            "comment": {
                                "type": "string",
                                "description": "The comment text"
                            }
                        },
                        "required": ["id", "username", "comment"]
                    }
                }
            },
            "required": ["comments"]
        }),
    )
    .with_description("A Hacker News comment tree")
}
