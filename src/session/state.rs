//! Session state and the updates that mutate it.

use std::collections::BTreeMap;

use crate::hn::{Comment, Story};

/// A region of [`SessionState`] written by exactly one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Stories,
    /// The comment tree of the story at this list position
    Comments(usize),
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stories => f.write_str("stories"),
            Self::Comments(story) => write!(f, "comments[{story}]"),
        }
    }
}

/// Whole-slot replacement carrying the latest cumulative snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotUpdate {
    Stories(Vec<Story>),
    Comments { story: usize, comments: Vec<Comment> },
}

impl SlotUpdate {
    pub const fn slot(&self) -> Slot {
        match self {
            Self::Stories(_) => Slot::Stories,
            Self::Comments { story, .. } => Slot::Comments(*story),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub stories: Vec<Story>,
    /// Comment trees keyed by story position. A story without an entry has
    /// not produced any comments yet (or its fetch failed before the first).
    pub comments: BTreeMap<usize, Vec<Comment>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot named by `update`; other slots are left untouched.
    pub fn apply(&mut self, update: SlotUpdate) {
        match update {
            SlotUpdate::Stories(mut stories) => {
                for (index, story) in stories.iter_mut().enumerate() {
                    story.id = index.to_string();
                }
                self.stories = stories;
            }
            SlotUpdate::Comments { story, comments } => {
                self.comments.insert(story, comments);
            }
        }
    }

    pub fn comment_count(&self) -> usize {
        self.comments.values().map(Vec::len).sum()
    }
}
