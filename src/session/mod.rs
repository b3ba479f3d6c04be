//! Streaming session
//!
//! One task streams the story list. Each story, once its title is known, gets
//! its own task streaming its comment tree. Tasks never touch the state
//! directly: they send [`SessionEvent`]s to a single owner, which applies
//! whole-slot replacements and renders after each one. Each task writes a
//! different slot, and since only the owner mutates state, renders never
//! interleave.
//!
//! The session ends when every task has dropped its sender, i.e. when the
//! story stream and every comment stream it launched have completed or
//! failed. A failure only ends the stream that produced it.

pub mod aggregator;
pub mod state;
pub mod trigger;

pub use aggregator::Aggregator;
pub use state::{SessionState, Slot, SlotUpdate};
pub use trigger::FetchTrigger;

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::error::LlmError;
use crate::highlevel::{StreamObjectOptions, stream_object};
use crate::hn::{
    CommentsPayload, StoriesPayload, comments_prompt, comments_schema, conversation,
    stories_prompt, stories_schema,
};
use crate::render::Renderer;
use crate::retry::RetryPolicy;
use crate::traits::ChatCapability;
use crate::types::{GenerateMode, OutputSchema};

/// Messages from stream tasks to the state owner.
#[derive(Debug)]
pub enum SessionEvent {
    Update(SlotUpdate),
    /// A comment-tree fetch was started for this story position
    FetchLaunched { story: usize },
    StreamFailed { slot: Slot, error: LlmError },
    StreamCompleted { slot: Slot, updates: usize },
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub story_count: usize,
    pub mode: GenerateMode,
    pub retry: RetryPolicy,
    /// Overrides the backend client's default model
    pub model: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            story_count: 5,
            mode: GenerateMode::default(),
            retry: RetryPolicy::default(),
            model: None,
        }
    }
}

impl SessionOptions {
    fn object_options(&self, schema: OutputSchema) -> StreamObjectOptions {
        let opts = StreamObjectOptions::new(schema)
            .with_mode(self.mode)
            .with_retry(self.retry.clone());
        match &self.model {
            Some(model) => opts.with_model(model.clone()),
            None => opts,
        }
    }
}

/// What happened during a session, returned once it ends.
#[derive(Debug, Default)]
pub struct SessionReport {
    pub state: SessionState,
    /// Story positions whose comment fetch was launched, in launch order
    pub launched: Vec<usize>,
    pub completed: Vec<Slot>,
    pub failures: Vec<(Slot, LlmError)>,
    pub renders: usize,
    /// Set when the session was cancelled before every stream finished
    pub interrupted: bool,
}

/// Applies events to the state and renders.
struct StateOwner<'r, R: Renderer + ?Sized> {
    renderer: &'r mut R,
    report: SessionReport,
}

impl<'r, R: Renderer + ?Sized> StateOwner<'r, R> {
    fn new(renderer: &'r mut R) -> Self {
        Self {
            renderer,
            report: SessionReport::default(),
        }
    }

    fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Update(update) => {
                self.report.state.apply(update);
                self.render();
            }
            SessionEvent::FetchLaunched { story } => self.report.launched.push(story),
            SessionEvent::StreamFailed { slot, error } => self.report.failures.push((slot, error)),
            SessionEvent::StreamCompleted { slot, updates } => {
                tracing::debug!(%slot, updates, "stream completed");
                self.report.completed.push(slot);
            }
        }
    }

    fn render(&mut self) {
        if let Err(e) = self.renderer.render(&self.report.state) {
            tracing::warn!("render failed: {}", e);
        }
        self.report.renders += 1;
    }
}

/// A story-and-comments streaming session against one chat backend.
pub struct Session<M: ChatCapability + ?Sized> {
    model: Arc<M>,
    options: SessionOptions,
}

impl<M: ChatCapability + ?Sized + 'static> Session<M> {
    pub fn new(model: Arc<M>, options: SessionOptions) -> Self {
        Self { model, options }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Run until every stream has finished.
    pub async fn run<R: Renderer + ?Sized>(&self, renderer: &mut R) -> SessionReport {
        self.run_until_cancelled(renderer, CancellationToken::new())
            .await
    }

    /// Run until every stream has finished or `shutdown` is cancelled.
    ///
    /// Streams still in flight at cancellation are left to the runtime; no
    /// further updates are applied or rendered.
    pub async fn run_until_cancelled<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        shutdown: CancellationToken,
    ) -> SessionReport {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tracing::info!(
            stories = self.options.story_count,
            mode = ?self.options.mode,
            "session started"
        );
        tokio::spawn(stream_stories(self.model.clone(), self.options.clone(), tx));

        let mut owner = StateOwner::new(renderer);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!("session interrupted");
                    owner.report.interrupted = true;
                    break;
                }
                event = rx.recv() => match event {
                    Some(event) => owner.handle(event),
                    None => break,
                },
            }
        }

        let report = owner.report;
        tracing::info!(
            stories = report.state.stories.len(),
            comments = report.state.comment_count(),
            failures = report.failures.len(),
            "session finished"
        );
        report
    }
}

async fn stream_stories<M: ChatCapability + ?Sized + 'static>(
    model: Arc<M>,
    options: SessionOptions,
    events: UnboundedSender<SessionEvent>,
) {
    let messages = conversation(stories_prompt(options.story_count));
    let updates = stream_object::<StoriesPayload, M>(
        model.clone(),
        messages,
        options.object_options(stories_schema()),
    )
    .map(|item| item.map(|payload| SlotUpdate::Stories(payload.stories)));

    let mut trigger = FetchTrigger::new();
    let launcher = events.clone();
    Aggregator::new(Slot::Stories, events)
        .run(updates, |update| {
            let SlotUpdate::Stories(stories) = update else {
                return;
            };
            for index in trigger.observe(stories) {
                // Indices returned by the trigger always have a title.
                let Some(title) = stories[index].ready_title() else {
                    continue;
                };
                launch_comments(&model, &options, index, title, &launcher);
            }
        })
        .await;
}

fn launch_comments<M: ChatCapability + ?Sized + 'static>(
    model: &Arc<M>,
    options: &SessionOptions,
    story: usize,
    title: &str,
    events: &UnboundedSender<SessionEvent>,
) {
    tracing::info!(story, title, "launching comment fetch");
    if events.send(SessionEvent::FetchLaunched { story }).is_err() {
        return;
    }

    let updates = stream_object::<CommentsPayload, M>(
        model.clone(),
        conversation(comments_prompt(title)),
        options.object_options(comments_schema()),
    )
    .map(move |item| {
        item.map(|payload| SlotUpdate::Comments {
            story,
            comments: payload.comments,
        })
    });

    let aggregator = Aggregator::new(Slot::Comments(story), events.clone());
    tokio::spawn(async move {
        aggregator.run(updates, |_| {}).await;
    });
}
