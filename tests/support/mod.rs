//! Shared helpers: a scripted chat backend and a recording renderer.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use hn_stream::error::LlmError;
use hn_stream::render::Renderer;
use hn_stream::retry::RetryPolicy;
use hn_stream::session::{SessionOptions, SessionState};
use hn_stream::stream::{ChatStream, ChatStreamEvent};
use hn_stream::traits::ChatCapability;
use hn_stream::types::{ChatRequest, FinishReason, MessageRole};

/// Events (or the request error) returned for one backend call.
pub type Script = Result<Vec<Result<ChatStreamEvent, LlmError>>, LlmError>;

const TOPIC_MARKER: &str = "for the topic: ";
const TOPIC_END: &str = ". Make the comments";

/// Backend answering story requests from a queue (one script per call) and
/// comment requests by story title (the same script for every call).
#[derive(Default)]
pub struct ScriptedBackend {
    stories: Mutex<VecDeque<Script>>,
    comments: Mutex<HashMap<String, Script>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stories(self, script: Script) -> Self {
        self.stories.lock().unwrap().push_back(script);
        self
    }

    pub fn with_comments(self, title: &str, script: Script) -> Self {
        self.comments
            .lock()
            .unwrap()
            .insert(title.to_string(), script);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn story_requests(&self) -> usize {
        self.requests_for("hn_stories").len()
    }

    /// Titles of every comment request, in request order
    pub fn comment_topics(&self) -> Vec<String> {
        self.requests_for("hn_comments")
            .iter()
            .filter_map(topic_of)
            .collect()
    }

    fn requests_for(&self, schema: &str) -> Vec<ChatRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.output.as_ref().map(|o| o.name.as_str()) == Some(schema))
            .collect()
    }
}

fn topic_of(request: &ChatRequest) -> Option<String> {
    let prompt = request
        .messages
        .iter()
        .find(|m| m.role == MessageRole::User)?;
    let start = prompt.content.find(TOPIC_MARKER)? + TOPIC_MARKER.len();
    let end = prompt.content.find(TOPIC_END)?;
    Some(prompt.content[start..end].to_string())
}

#[async_trait]
impl ChatCapability for ScriptedBackend {
    async fn chat_stream_request(&self, request: ChatRequest) -> Result<ChatStream, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let schema = request
            .output
            .as_ref()
            .map(|o| o.name.clone())
            .unwrap_or_default();

        let script = match schema.as_str() {
            "hn_stories" => self
                .stories
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::InternalError("no stories script left".into()))),
            "hn_comments" => {
                let title = topic_of(&request).unwrap_or_default();
                let scripted = self.comments.lock().unwrap().get(&title).cloned();
                scripted.unwrap_or_else(default_comments)
            }
            other => Err(LlmError::InvalidInput(format!("unexpected schema {other}"))),
        };

        let events = script?;
        Ok(Box::pin(async_stream::stream! {
            for event in events {
                // Give other tasks a chance to run between chunks.
                tokio::task::yield_now().await;
                yield event;
            }
        }))
    }
}

/// Stream `chunks` as tool-call argument fragments.
pub fn tool_args(chunks: &[String]) -> Script {
    let mut events: Vec<Result<ChatStreamEvent, LlmError>> = chunks
        .iter()
        .map(|chunk| {
            Ok(ChatStreamEvent::ToolCallDelta {
                index: 0,
                id: None,
                function_name: None,
                arguments_delta: Some(chunk.clone()),
            })
        })
        .collect();
    events.push(Ok(ChatStreamEvent::StreamEnd {
        finish_reason: Some(FinishReason::ToolCalls),
    }));
    Ok(events)
}

/// Stream `chunks`, then fail with `error`.
pub fn tool_args_then_fail(chunks: &[String], error: LlmError) -> Script {
    let mut events = tool_args(chunks)?;
    events.pop();
    events.push(Err(error));
    Ok(events)
}

pub fn story_title(index: usize) -> String {
    format!("Story number {index}")
}

pub fn story_json(index: usize, kind: &str) -> String {
    json!({
        "title": story_title(index),
        "username": format!("user{index}"),
        "domain": "example.com",
        "type": kind,
        "points": 10 + index,
    })
    .to_string()
}

/// Argument chunks for a story list that grows to each cumulative count in
/// `counts`, one snapshot per chunk. Every story is complete within its chunk.
pub fn growing_stories(counts: &[usize]) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut written = 0;
    for (n, &count) in counts.iter().enumerate() {
        let stories: Vec<String> = (written..count).map(|i| story_json(i, "story")).collect();
        let mut chunk = if n == 0 {
            String::from(r#"{"stories":["#)
        } else {
            String::from(",")
        };
        chunk.push_str(&stories.join(","));
        if n + 1 == counts.len() {
            chunk.push_str("]}");
        }
        chunks.push(chunk);
        written = count;
    }
    chunks
}

pub fn comments_json(story: usize, count: usize) -> String {
    let comments: Vec<_> = (0..count)
        .map(|i| {
            let mut comment = json!({
                "id": format!("{}", story * 100 + i + 1),
                "username": format!("commenter{i}"),
                "comment": format!("Comment {i} on story {story}"),
            });
            if i > 0 {
                comment["reply_to_id"] = json!(format!("{}", story * 100 + 1));
            }
            comment
        })
        .collect();
    json!({ "comments": comments }).to_string()
}

fn default_comments() -> Script {
    tool_args(&[comments_json(0, 1)])
}

pub fn options(story_count: usize) -> SessionOptions {
    SessionOptions {
        story_count,
        retry: RetryPolicy::immediate(3),
        ..Default::default()
    }
}

/// Keeps a copy of every rendered state.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    frames: Arc<Mutex<Vec<SessionState>>>,
}

impl RecordingRenderer {
    pub fn frames(&self) -> Vec<SessionState> {
        self.frames.lock().unwrap().clone()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, state: &SessionState) -> io::Result<()> {
        self.frames.lock().unwrap().push(state.clone());
        Ok(())
    }
}

/// Fails every render.
pub struct BrokenRenderer;

impl Renderer for BrokenRenderer {
    fn render(&mut self, _state: &SessionState) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal went away"))
    }
}
