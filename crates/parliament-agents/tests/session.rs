//! Full session against a mocked model: real scheduler, real tool registry
//! (no search key, so the search tool reports itself disabled), real file
//! store, mock agent.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;

use debate::{
    AgentError, AgentReply, ConversationStore, DebateAgent, DebateConfig, DebateScheduler,
    GenerateRequest, JsonFileStore, MessageRole, Speaker, StreamEvent, ToolInvocation,
    TranscriptState, TurnKind,
};
use parliament_agents::{AppConfig, ToolRegistry};

mock! {
    Agent {}

    #[async_trait]
    impl DebateAgent for Agent {
        async fn generate(&self, request: &GenerateRequest) -> Result<AgentReply, AgentError>;
    }
}

/// One round, tools enabled. The Proponent researches before finalizing;
/// everyone else answers directly.
fn scripted_agent() -> MockAgent {
    let mut agent = MockAgent::new();
    agent.expect_generate().returning(|request| {
        Ok(match request.kind {
            TurnKind::Title => AgentReply::Statement("Mock Debate".to_string()),
            TurnKind::Opening => AgentReply::Statement("Welcome to the debate.".to_string()),
            TurnKind::Closing => {
                AgentReply::Statement("| Point | Proponent | Critic |".to_string())
            }
            TurnKind::Steering => AgentReply::Statement("Stay on the motion.".to_string()),
            TurnKind::Argument => match request.speaker {
                Speaker::Proponent if request.exchanges.is_empty() => {
                    assert!(
                        !request.tools.is_empty(),
                        "first argument pass should offer tools"
                    );
                    AgentReply::ToolRequests(vec![ToolInvocation {
                        provider_id: Some("call_pro_1".to_string()),
                        name: "search_web".to_string(),
                        args: serde_json::json!({"query": "evidence"}),
                    }])
                }
                Speaker::Proponent => {
                    // The disabled-search notice came back as tool output.
                    let output = &request.exchanges[0].output;
                    assert_eq!(output.call_id, "call_pro_1");
                    assert!(output.content.contains("disabled"));
                    AgentReply::Statement("The evidence favors the motion.".to_string())
                }
                _ => AgentReply::Statement("The motion overreaches.".to_string()),
            },
        })
    });
    agent
}

#[tokio::test]
async fn test_full_session_with_tool_pass() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()).unwrap());

    let mut app_config = AppConfig::default();
    app_config.brave_api_key = None;
    let tools = Arc::new(ToolRegistry::new(&app_config).unwrap());

    let mut session_config = DebateConfig::default();
    session_config.max_rounds = 1;

    let scheduler = Arc::new(
        DebateScheduler::new(
            Arc::new(scripted_agent()),
            tools,
            store.clone(),
            session_config,
        )
        .unwrap(),
    );

    let (id, mut rx) = scheduler.spawn("This house would ban advertising".to_string(), None);

    let mut events = Vec::new();
    let mut transcript = TranscriptState::new();
    while let Some(event) = rx.recv().await {
        let terminal = event.is_terminal();
        transcript = transcript.apply(&event);
        events.push(event);
        if terminal {
            break;
        }
    }

    // Stream shape: title first, tool_call answered before the finalizing
    // message, complete last.
    assert_eq!(events[0].event_type(), "title");
    assert_eq!(events.last().unwrap().event_type(), "complete");
    let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
    let tool_call_at = types.iter().position(|t| *t == "tool_call").unwrap();
    assert_eq!(types[tool_call_at + 1], "tool_output");

    // Assembled transcript: opening, proponent, critic, closing.
    assert!(!transcript.loading);
    assert!(transcript.error.is_none());
    assert_eq!(transcript.title.as_deref(), Some("Mock Debate"));
    assert_eq!(transcript.messages.len(), 4);

    let proponent = &transcript.messages[1];
    assert_eq!(proponent.name, Some(Speaker::Proponent));
    assert_eq!(proponent.content, "The evidence favors the motion.");
    assert_eq!(proponent.tool_calls.len(), 1);
    assert_eq!(proponent.tool_calls[0].id, "call_pro_1");
    assert_eq!(proponent.tool_outputs.len(), 1);
    assert!(!proponent.is_thinking);

    // Persisted conversation matches: user motion plus the four turns.
    let conversation = store.get(&id).await.unwrap();
    assert_eq!(conversation.title.as_deref(), Some("Mock Debate"));
    assert_eq!(conversation.messages.len(), 5);
    assert_eq!(conversation.messages[0].role, MessageRole::User);
    assert_eq!(conversation.messages[2].tool_calls.len(), 1);
}

#[tokio::test]
async fn test_agent_failure_surfaces_as_error_event() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()).unwrap());
    let tools = Arc::new(ToolRegistry::new(&AppConfig::default()).unwrap());

    let mut agent = MockAgent::new();
    agent.expect_generate().returning(|request| {
        match request.kind {
            TurnKind::Title => Ok(AgentReply::Statement("Doomed Debate".to_string())),
            TurnKind::Opening => Ok(AgentReply::Statement("Welcome.".to_string())),
            _ => Err(AgentError::RequestFailed("model offline".to_string())),
        }
    });

    let scheduler = Arc::new(
        DebateScheduler::new(Arc::new(agent), tools, store, DebateConfig::default()).unwrap(),
    );

    let (_id, mut rx) = scheduler.spawn("motion".to_string(), None);
    let mut last = None;
    while let Some(event) = rx.recv().await {
        let terminal = event.is_terminal();
        last = Some(event);
        if terminal {
            break;
        }
    }

    match last {
        Some(StreamEvent::Error { message }) => {
            assert!(message.contains("Proponent"));
            assert!(message.contains("model offline"));
        }
        other => panic!("expected terminal error event, got {other:?}"),
    }
}
