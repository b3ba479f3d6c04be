use std::collections::HashSet;

use crate::hn::Story;

/// Decides which stories need their comment tree fetched.
///
/// Every story position is returned at most once, the first time it is seen
/// with a complete title. Several positions can become ready in the same
/// snapshot; all of them are returned, in list order.
#[derive(Debug, Default)]
pub struct FetchTrigger {
    seen: HashSet<usize>,
}

impl FetchTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, stories: &[Story]) -> Vec<usize> {
        stories
            .iter()
            .enumerate()
            .filter(|(_, story)| story.ready_title().is_some())
            .filter_map(|(index, _)| self.seen.insert(index).then_some(index))
            .collect()
    }

    pub fn launched(&self) -> usize {
        self.seen.len()
    }
}
