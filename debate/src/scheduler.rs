//! Session scheduler: drives the phase machine turn by turn.
//!
//! One scheduler can run many sessions; each session owns its event channel
//! and runs as a spawned task. The scheduler holds its own copy of the
//! session config, so callers mutating their config after spawn never affect
//! a running session.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

use crate::agent::{AgentReply, DebateAgent, GenerateRequest, ToolExecutor, TurnKind};
use crate::config::DebateConfig;
use crate::context::ContextWindow;
use crate::error::{DebateError, StoreError};
use crate::protocol::{EventSink, Message, Speaker, StreamEvent};
use crate::state::{DebatePhase, DebateSession};
use crate::store::{Conversation, ConversationStore};
use crate::turn::TurnRunner;

/// Title used when title generation fails.
pub const FALLBACK_TITLE: &str = "New Debate";

/// Orchestrates debate sessions against the collaborator boundaries.
#[derive(Clone)]
pub struct DebateScheduler {
    agent: Arc<dyn DebateAgent>,
    tools: Arc<dyn ToolExecutor>,
    store: Arc<dyn ConversationStore>,
    config: DebateConfig,
}

impl DebateScheduler {
    pub fn new(
        agent: Arc<dyn DebateAgent>,
        tools: Arc<dyn ToolExecutor>,
        store: Arc<dyn ConversationStore>,
        config: DebateConfig,
    ) -> Result<Self, DebateError> {
        config.validate()?;
        Ok(Self {
            agent,
            tools,
            store,
            config,
        })
    }

    /// Start a session as a background task. Returns the conversation id and
    /// the receiving end of its event stream.
    pub fn spawn(
        &self,
        motion: String,
        conversation_id: Option<String>,
    ) -> (String, mpsc::Receiver<StreamEvent>) {
        let (sink, rx) = EventSink::channel();
        let id = conversation_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let scheduler = self.clone();
        let task_id = id.clone();
        tokio::spawn(async move {
            scheduler.run_session(&task_id, &motion, sink).await;
        });
        (id, rx)
    }

    /// Run one session to completion, reporting terminal failures as a
    /// single `error` event. A closed stream means the client cancelled; the
    /// session stops quietly and nothing more is emitted or persisted.
    pub async fn run_session(&self, conversation_id: &str, motion: &str, sink: EventSink) {
        let mut session = DebateSession::new(conversation_id, motion, self.config.max_rounds);
        match self.drive(&mut session, motion, &sink).await {
            Ok(()) => {
                tracing::info!(conversation = conversation_id, "session complete");
            }
            Err(err) if err.is_reportable() => {
                tracing::error!(conversation = conversation_id, %err, "session failed");
                let _ = session.fail(&err.to_string());
                let _ = sink
                    .emit(StreamEvent::Error {
                        message: err.to_string(),
                    })
                    .await;
            }
            Err(_) => {
                tracing::info!(conversation = conversation_id, "session cancelled by client");
                let _ = session.fail("client cancelled");
            }
        }
    }

    async fn drive(
        &self,
        session: &mut DebateSession,
        motion: &str,
        sink: &EventSink,
    ) -> Result<(), DebateError> {
        let conversation_id = session.conversation_id.clone();
        let conversation = self.load_or_create(&conversation_id).await?;
        let first_message = conversation.messages.is_empty();

        let mut window = ContextWindow::new(motion, self.config.context_window);
        for message in conversation
            .messages
            .iter()
            .rev()
            .take(self.config.context_window)
            .rev()
        {
            window.push(message.clone());
        }

        let user_message = Message::user(motion);
        self.store
            .append_message(&conversation_id, &user_message)
            .await?;
        window.push(user_message);

        if first_message {
            let title = self.resolve_title(motion).await;
            self.store.set_title(&conversation_id, &title).await?;
            sink.emit(StreamEvent::Title { title }).await?;
        }

        let runner = TurnRunner::new(&*self.agent, &*self.tools, sink, &self.config);

        session.transition(DebatePhase::Opening, "session start")?;
        sink.emit(StreamEvent::Status {
            detail: "The Moderator is framing the motion".to_string(),
        })
        .await?;
        let opening = runner
            .run(Speaker::Moderator, TurnKind::Opening, &window)
            .await?;
        self.persist_turn(&conversation_id, &opening, &mut window)
            .await?;

        loop {
            session.transition(DebatePhase::ProponentTurn, "proponent argues")?;
            sink.emit(StreamEvent::Status {
                detail: format!(
                    "Round {}: the Proponent speaks",
                    session.rounds_completed + 1
                ),
            })
            .await?;
            let statement = runner
                .run(Speaker::Proponent, TurnKind::Argument, &window)
                .await?;
            self.persist_turn(&conversation_id, &statement, &mut window)
                .await?;

            session.transition(DebatePhase::CriticTurn, "critic rebuts")?;
            sink.emit(StreamEvent::Status {
                detail: format!("Round {}: the Critic rebuts", session.rounds_completed + 1),
            })
            .await?;
            let rebuttal = runner
                .run(Speaker::Critic, TurnKind::Argument, &window)
                .await?;
            self.persist_turn(&conversation_id, &rebuttal, &mut window)
                .await?;

            // The round counter increments on the next transition out of
            // CriticTurn; decide on the round just finished.
            let finished_rounds = session.rounds_completed + 1;
            if finished_rounds >= self.config.max_rounds {
                session.transition(DebatePhase::Closing, "max rounds reached")?;
                break;
            }

            if self.config.enable_tools {
                session.transition(DebatePhase::Interlude, "moderator steering")?;
                sink.emit(StreamEvent::Status {
                    detail: "The Moderator is steering the debate".to_string(),
                })
                .await?;
                let steering = runner
                    .run(Speaker::Moderator, TurnKind::Steering, &window)
                    .await?;
                window.set_summary(steering.content.clone());
                self.persist_turn(&conversation_id, &steering, &mut window)
                    .await?;
            }
        }

        sink.emit(StreamEvent::Status {
            detail: "The Moderator is preparing closing remarks".to_string(),
        })
        .await?;
        let closing = runner
            .run(Speaker::Moderator, TurnKind::Closing, &window)
            .await?;
        self.persist_turn(&conversation_id, &closing, &mut window)
            .await?;

        session.transition(DebatePhase::Complete, "closing delivered")?;
        sink.emit(StreamEvent::Complete).await?;
        Ok(())
    }

    async fn load_or_create(&self, id: &str) -> Result<Conversation, DebateError> {
        match self.store.get(id).await {
            Ok(conversation) => Ok(conversation),
            Err(StoreError::NotFound(_)) => {
                let conversation = Conversation::new(id);
                self.store.create(&conversation).await?;
                Ok(conversation)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn persist_turn(
        &self,
        conversation_id: &str,
        message: &Message,
        window: &mut ContextWindow,
    ) -> Result<(), DebateError> {
        self.store.append_message(conversation_id, message).await?;
        window.push(message.clone());
        Ok(())
    }

    /// Ask the moderator model for a short title. Any failure degrades to
    /// the fallback title; title trouble never fails a session.
    async fn resolve_title(&self, motion: &str) -> String {
        let request = GenerateRequest {
            speaker: Speaker::Moderator,
            kind: TurnKind::Title,
            model: self.config.model_for(Speaker::Moderator).to_string(),
            window: ContextWindow::new(motion, 1),
            tools: Vec::new(),
            exchanges: Vec::new(),
        };

        match timeout(self.config.turn_timeout(), self.agent.generate(&request)).await {
            Ok(Ok(AgentReply::Statement(text))) => {
                let title = text.trim().trim_matches('"').trim();
                if title.is_empty() {
                    tracing::warn!("empty title reply, using fallback");
                    FALLBACK_TITLE.to_string()
                } else {
                    title.to_string()
                }
            }
            Ok(Ok(AgentReply::ToolRequests(_))) => {
                tracing::warn!("title turn requested tools, using fallback");
                FALLBACK_TITLE.to_string()
            }
            Ok(Err(err)) => {
                tracing::warn!(%err, "title generation failed, using fallback");
                FALLBACK_TITLE.to_string()
            }
            Err(_) => {
                tracing::warn!("title generation timed out, using fallback");
                FALLBACK_TITLE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ToolSpec;
    use crate::error::{AgentError, ToolError};
    use crate::protocol::MessageRole;
    use crate::transcript::TranscriptState;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::store::JsonFileStore;

    /// Agent producing distinct numbered statements per invocation.
    struct CountingAgent {
        counter: AtomicUsize,
        fail_on_critic: bool,
    }

    impl CountingAgent {
        fn new() -> Self {
            Self {
                counter: AtomicUsize::new(0),
                fail_on_critic: false,
            }
        }

        fn failing_on_critic() -> Self {
            Self {
                counter: AtomicUsize::new(0),
                fail_on_critic: true,
            }
        }
    }

    #[async_trait]
    impl DebateAgent for CountingAgent {
        async fn generate(&self, request: &GenerateRequest) -> Result<AgentReply, AgentError> {
            if request.kind == TurnKind::Title {
                return Ok(AgentReply::Statement("Scripted Debate".to_string()));
            }
            if self.fail_on_critic && request.speaker == Speaker::Critic {
                return Err(AgentError::RequestFailed("upstream 500".to_string()));
            }
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(AgentReply::Statement(format!(
                "{} statement {n}",
                request.speaker
            )))
        }
    }

    struct NoTools;

    #[async_trait]
    impl ToolExecutor for NoTools {
        fn specs(&self) -> Vec<ToolSpec> {
            Vec::new()
        }

        async fn invoke(
            &self,
            name: &str,
            _args: &serde_json::Value,
        ) -> Result<String, ToolError> {
            Err(ToolError::UnknownTool(name.to_string()))
        }
    }

    fn scheduler_with(
        agent: CountingAgent,
        config: DebateConfig,
    ) -> (tempfile::TempDir, Arc<DebateScheduler>) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        let scheduler = DebateScheduler::new(
            Arc::new(agent),
            Arc::new(NoTools),
            Arc::new(store),
            config,
        )
        .unwrap();
        (dir, Arc::new(scheduler))
    }

    async fn collect(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            let terminal = event.is_terminal();
            events.push(event);
            if terminal {
                break;
            }
        }
        events
    }

    fn speakers_of(events: &[StreamEvent]) -> Vec<Speaker> {
        events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Message { name, .. } => *name,
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_full_session_turn_order_tools_off() {
        let mut config = DebateConfig::default();
        config.enable_tools = false;
        config.max_rounds = 3;
        let (_dir, scheduler) = scheduler_with(CountingAgent::new(), config);

        let (id, rx) = scheduler.spawn("Ban single-use plastics".to_string(), None);
        let events = collect(rx).await;

        // Moderator opens, three Pro/Critic rounds, Moderator closes.
        assert_eq!(
            speakers_of(&events),
            vec![
                Speaker::Moderator,
                Speaker::Proponent,
                Speaker::Critic,
                Speaker::Proponent,
                Speaker::Critic,
                Speaker::Proponent,
                Speaker::Critic,
                Speaker::Moderator,
            ]
        );
        assert_eq!(events.last().unwrap().event_type(), "complete");

        // Title announced before any turn message.
        assert_eq!(events[0].event_type(), "title");

        // Everything persisted: user motion plus eight turns.
        let store = scheduler.store.clone();
        let conversation = store.get(&id).await.unwrap();
        assert_eq!(conversation.messages.len(), 9);
        assert_eq!(conversation.messages[0].role, MessageRole::User);
        assert_eq!(conversation.title.as_deref(), Some("Scripted Debate"));
    }

    #[tokio::test]
    async fn test_interludes_between_rounds_when_tools_on() {
        let mut config = DebateConfig::default();
        config.max_rounds = 2;
        let (_dir, scheduler) = scheduler_with(CountingAgent::new(), config);

        let (_id, rx) = scheduler.spawn("motion".to_string(), None);
        let events = collect(rx).await;

        // One interlude between the two rounds, none after the last.
        assert_eq!(
            speakers_of(&events),
            vec![
                Speaker::Moderator,
                Speaker::Proponent,
                Speaker::Critic,
                Speaker::Moderator,
                Speaker::Proponent,
                Speaker::Critic,
                Speaker::Moderator,
            ]
        );
        assert_eq!(events.last().unwrap().event_type(), "complete");
    }

    #[tokio::test]
    async fn test_transcript_assembles_from_stream() {
        let mut config = DebateConfig::default();
        config.enable_tools = false;
        config.max_rounds = 1;
        let (_dir, scheduler) = scheduler_with(CountingAgent::new(), config);

        let (_id, mut rx) = scheduler.spawn("motion".to_string(), None);
        let mut state = TranscriptState::new();
        while let Some(event) = rx.recv().await {
            let terminal = event.is_terminal();
            state = state.apply(&event);
            if terminal {
                break;
            }
        }

        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.title.as_deref(), Some("Scripted Debate"));
        // Opening, one Pro/Critic round, closing.
        assert_eq!(state.messages.len(), 4);
        assert!(!state.has_open_placeholder());
    }

    #[tokio::test]
    async fn test_agent_failure_emits_single_error() {
        let mut config = DebateConfig::default();
        config.enable_tools = false;
        let (_dir, scheduler) = scheduler_with(CountingAgent::failing_on_critic(), config);

        let (_id, rx) = scheduler.spawn("motion".to_string(), None);
        let events = collect(rx).await;

        let last = events.last().unwrap();
        assert_eq!(last.event_type(), "error");
        match last {
            StreamEvent::Error { message } => {
                assert!(message.contains("Critic"));
                assert!(message.contains("upstream 500"));
            }
            _ => unreachable!(),
        }
        // No complete after error, and exactly one error.
        let errors = events.iter().filter(|e| e.event_type() == "error").count();
        assert_eq!(errors, 1);
        assert!(!events.iter().any(|e| e.event_type() == "complete"));
        // Moderator opening and Proponent turn landed before the failure.
        assert_eq!(
            speakers_of(&events),
            vec![Speaker::Moderator, Speaker::Proponent]
        );
    }

    #[tokio::test]
    async fn test_cancellation_stops_quietly() {
        let mut config = DebateConfig::default();
        config.enable_tools = false;
        config.max_rounds = 1;
        let (_dir, scheduler) = scheduler_with(CountingAgent::new(), config);

        let (sink, rx) = EventSink::channel();
        drop(rx);
        // Returns without panicking; only the user motion was persisted
        // before the first emit failed.
        scheduler.run_session("conv-cancelled", "motion", sink).await;

        let conversation = scheduler.store.get("conv-cancelled").await.unwrap();
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].role, MessageRole::User);
    }

    #[tokio::test]
    async fn test_config_validated_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        let mut config = DebateConfig::default();
        config.max_rounds = 0;

        let result = DebateScheduler::new(
            Arc::new(CountingAgent::new()),
            Arc::new(NoTools),
            Arc::new(store),
            config,
        );
        assert!(matches!(result, Err(DebateError::Config(_))));
    }

    #[tokio::test]
    async fn test_config_isolation_after_spawn() {
        let mut config = DebateConfig::default();
        config.enable_tools = false;
        config.max_rounds = 1;
        let (_dir, scheduler) = scheduler_with(CountingAgent::new(), config.clone());

        // Caller keeps mutating its copy; the running session is unaffected.
        config.max_rounds = 9;

        let (_id, rx) = scheduler.spawn("motion".to_string(), None);
        let events = collect(rx).await;
        // One round only: opening, Pro, Critic, closing.
        assert_eq!(speakers_of(&events).len(), 4);
    }

    #[tokio::test]
    async fn test_resumed_conversation_keeps_existing_title() {
        let mut config = DebateConfig::default();
        config.enable_tools = false;
        config.max_rounds = 1;
        let (_dir, scheduler) = scheduler_with(CountingAgent::new(), config);

        let (id, rx) = scheduler.spawn("first motion".to_string(), None);
        collect(rx).await;

        let (_id, rx) = scheduler.spawn("second motion".to_string(), Some(id.clone()));
        let events = collect(rx).await;

        // No second title event for an existing conversation.
        assert!(!events.iter().any(|e| e.event_type() == "title"));
        let conversation = scheduler.store.get(&id).await.unwrap();
        // Two motions, two sessions of four messages each.
        assert_eq!(conversation.messages.len(), 10);
    }
}
