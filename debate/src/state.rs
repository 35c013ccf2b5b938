//! Debate phase machine: explicit states, legal transition guards, and
//! session tracking.
//!
//! The turn cycle is modeled as a finite-state machine with a bounded round
//! counter rather than roles invoking each other, so termination is
//! structurally guaranteed regardless of any single role's behavior.
//!
//! ```text
//! Idle → Opening → ProponentTurn → CriticTurn ─┬→ ProponentTurn
//!                        ▲                     ├→ Interlude → ProponentTurn
//!                        └─────────────────────┤
//!                                              └→ Closing → Complete
//! any non-terminal phase → Failed
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Phase of a debate session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebatePhase {
    /// Session created but not started.
    Idle,
    /// Moderator is framing the motion.
    Opening,
    /// Proponent is arguing for the motion.
    ProponentTurn,
    /// Critic is arguing against the motion.
    CriticTurn,
    /// Moderator is injecting a steering statement between rounds.
    Interlude,
    /// Moderator is producing the final synthesis.
    Closing,
    /// Session finished normally. Terminal.
    Complete,
    /// Unrecoverable failure. Terminal.
    Failed,
}

impl DebatePhase {
    /// Whether this is a terminal phase (no further transitions allowed).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Valid transitions from this phase.
    pub fn valid_transitions(self) -> &'static [DebatePhase] {
        match self {
            Self::Idle => &[Self::Opening],
            Self::Opening => &[Self::ProponentTurn],
            Self::ProponentTurn => &[Self::CriticTurn],
            Self::CriticTurn => &[Self::ProponentTurn, Self::Interlude, Self::Closing],
            Self::Interlude => &[Self::ProponentTurn],
            Self::Closing => &[Self::Complete],
            Self::Complete | Self::Failed => &[],
        }
    }
}

impl std::fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Opening => write!(f, "opening"),
            Self::ProponentTurn => write!(f, "proponent_turn"),
            Self::CriticTurn => write!(f, "critic_turn"),
            Self::Interlude => write!(f, "interlude"),
            Self::Closing => write!(f, "closing"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A recorded phase transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: DebatePhase,
    pub to: DebatePhase,
    /// Completed rounds at the time of transition.
    pub round: u32,
    pub timestamp: DateTime<Utc>,
    /// Why this transition happened.
    pub reason: String,
}

/// Error for illegal phase transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition {from} → {to} (allowed: {allowed:?})")]
pub struct TransitionError {
    pub from: DebatePhase,
    pub to: DebatePhase,
    pub allowed: &'static [DebatePhase],
}

/// A debate session: phase, bounded round counter, transition history.
///
/// One round = one Proponent turn + one Critic turn; the counter increments
/// when a Critic turn completes. Moderator turns never consume a round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateSession {
    /// Conversation this session is bound to.
    pub conversation_id: String,
    /// The motion under debate.
    pub motion: String,
    pub phase: DebatePhase,
    /// Completed Proponent+Critic rounds.
    pub rounds_completed: u32,
    pub max_rounds: u32,
    pub transitions: Vec<PhaseTransition>,
    pub created_at: DateTime<Utc>,
}

impl DebateSession {
    pub fn new(conversation_id: &str, motion: &str, max_rounds: u32) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            motion: motion.to_string(),
            phase: DebatePhase::Idle,
            rounds_completed: 0,
            max_rounds,
            transitions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Transition to a new phase, recording the edge.
    ///
    /// Leaving `CriticTurn` marks a completed round.
    pub fn transition(&mut self, to: DebatePhase, reason: &str) -> Result<(), TransitionError> {
        if to == DebatePhase::Failed {
            // Always legal from non-terminal phases.
            if self.phase.is_terminal() {
                return Err(TransitionError {
                    from: self.phase,
                    to,
                    allowed: self.phase.valid_transitions(),
                });
            }
        } else if !self.phase.valid_transitions().contains(&to) {
            return Err(TransitionError {
                from: self.phase,
                to,
                allowed: self.phase.valid_transitions(),
            });
        }

        if self.phase == DebatePhase::CriticTurn {
            self.rounds_completed += 1;
        }

        tracing::debug!(
            conversation = %self.conversation_id,
            from = %self.phase,
            to = %to,
            round = self.rounds_completed,
            reason,
            "phase transition"
        );

        self.transitions.push(PhaseTransition {
            from: self.phase,
            to,
            round: self.rounds_completed,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = to;
        Ok(())
    }

    /// Transition to `Failed` from any non-terminal phase.
    pub fn fail(&mut self, reason: &str) -> Result<(), TransitionError> {
        self.transition(DebatePhase::Failed, reason)
    }

    /// Whether the session has ended.
    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Whether another Proponent+Critic round is allowed.
    pub fn has_rounds_remaining(&self) -> bool {
        self.rounds_completed < self.max_rounds
    }

    /// Compact status line for diagnostics.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] round {}/{} | conversation={}",
            self.phase, self.rounds_completed, self.max_rounds, self.conversation_id
        )
    }
}
