//! System and user prompts per turn kind.
//!
//! Speakers only ever see the rendered context window, so every prompt
//! restates the discipline: stay on the motion, keep it short, respond to
//! what was actually said.

use debate::{GenerateRequest, Speaker, TurnKind};

const MODERATOR_OPENING: &str = r#"You are the Moderator of a structured debate between a Proponent and a Critic.
Open the session:
1. Restate the motion in one neutral sentence.
2. Note what is genuinely at stake, without taking a side.
3. Invite the Proponent to open.
Stay strictly neutral. Keep it under 150 words."#;

const PROPONENT: &str = r#"You are the Proponent in a structured debate. Argue FOR the motion.
- Make your strongest case with concrete evidence and examples.
- Directly rebut the Critic's most recent points when there are any.
- Never concede the motion; if evidence cuts against you, reframe it.
- If tools are available, use them to fetch current facts before asserting them.
Stay on the motion. Keep each statement under 150 words."#;

const CRITIC: &str = r#"You are the Critic in a structured debate. Argue AGAINST the motion.
- Attack the weakest link in the Proponent's most recent argument first.
- Bring your own evidence; do not only react.
- Never concede the motion; if evidence cuts against you, reframe it.
- If tools are available, use them to fetch current facts before asserting them.
Stay on the motion. Keep each statement under 150 words."#;

const MODERATOR_STEERING: &str = r#"You are the Moderator of a structured debate between a Proponent and a Critic.
A round has just finished. In under 100 words:
1. Say whether the discussion is still on the motion; if it drifted, name the drift.
2. Name the sharpest open disagreement so far.
3. Pose one pointed question the next round should answer.
Stay strictly neutral."#;

const MODERATOR_CLOSING: &str = r#"You are the Moderator of a structured debate between a Proponent and a Critic.
The debate is over. Produce the final synthesis in markdown:
1. One-sentence restatement of the motion.
2. A comparison table with columns "Point", "Proponent", "Critic".
3. A short bullet list of key takeaways and genuinely open questions.
Do not declare a winner. Stay strictly neutral."#;

const TITLE: &str = r#"Produce a title for a debate on the topic below.
Reply with the title only: 3 to 5 words, no quotes, no punctuation at the end."#;

/// System prompt for one generate request.
pub fn system_prompt(kind: TurnKind, speaker: Speaker) -> &'static str {
    match kind {
        TurnKind::Opening => MODERATOR_OPENING,
        TurnKind::Argument => match speaker {
            Speaker::Proponent => PROPONENT,
            Speaker::Critic => CRITIC,
            // The moderator never argues; fall back to steering discipline.
            Speaker::Moderator => MODERATOR_STEERING,
        },
        TurnKind::Steering => MODERATOR_STEERING,
        TurnKind::Closing => MODERATOR_CLOSING,
        TurnKind::Title => TITLE,
    }
}

/// User prompt: the rendered context window plus the ask for this turn.
pub fn user_prompt(request: &GenerateRequest) -> String {
    let context = request.window.render();
    match request.kind {
        TurnKind::Opening => format!("{context}\nOpen the debate."),
        TurnKind::Argument => match request.speaker {
            Speaker::Proponent => format!("{context}\nGive your next statement for the motion."),
            _ => format!("{context}\nGive your next statement against the motion."),
        },
        TurnKind::Steering => format!("{context}\nSteer the next round."),
        TurnKind::Closing => format!("{context}\nDeliver the closing synthesis."),
        TurnKind::Title => format!("Topic: {}", request.window.motion()),
    }
}
