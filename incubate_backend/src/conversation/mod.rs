//! Inky's scripted conversation.
//!
//! [`advance`] is a pure transition function: given the current stage and
//! what the user just said, it returns the next stage and Inky's reply. It
//! never sleeps or touches storage; pacing belongs to whoever renders the
//! conversation. All randomness comes from the caller's `Rng`, so a seeded
//! generator replays the same conversation.

pub mod templates;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::analysis::SentimentAnalyzer;
use crate::reflection::{GrowthInsight, MessageType};

const LOW_SENTIMENT: f64 = 0.35;
const HIGH_SENTIMENT: f64 = 0.65;
const MOMENTUM_BONUS_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Greeting,
    Contextual,
    GoalSetting,
    Completed,
}

impl Stage {
    pub fn title(self) -> &'static str {
        match self {
            Stage::Greeting => "Daily Check-in",
            Stage::Contextual => "Insights & Patterns",
            Stage::GoalSetting => "Looking Forward",
            Stage::Completed => "All Done",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Stage::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmotionalNeed {
    Validation,
    Encouragement,
    Perspective,
    Celebration,
}

const VALIDATION_CUES: &[&str] = &[
    "nobody",
    "no one",
    "alone",
    "ignored",
    "invisible",
    "unappreciated",
    "misunderstood",
    "left out",
];
const ENCOURAGEMENT_CUES: &[&str] = &[
    "give up",
    "giving up",
    "can't do",
    "failing",
    "failure",
    "not good enough",
    "stuck",
    "pointless",
];
const PERSPECTIVE_CUES: &[&str] = &[
    "everything is",
    "always goes wrong",
    "never works",
    "nothing ever",
    "ruined",
    "worst",
    "disaster",
];
const CELEBRATION_CUES: &[&str] = &[
    "finally",
    "did it",
    "promoted",
    "promotion",
    "achieved",
    "nailed",
    "won ",
    "finished",
];

/// First matching need, checked in the order validation, encouragement,
/// perspective, celebration.
pub fn detect_emotional_need(text: &str) -> Option<EmotionalNeed> {
    let lowered = format!("{} ", text.to_lowercase().replace('\u{2019}', "'"));
    let table = [
        (EmotionalNeed::Validation, VALIDATION_CUES),
        (EmotionalNeed::Encouragement, ENCOURAGEMENT_CUES),
        (EmotionalNeed::Perspective, PERSPECTIVE_CUES),
        (EmotionalNeed::Celebration, CELEBRATION_CUES),
    ];
    table
        .into_iter()
        .find(|(_, cues)| cues.iter().any(|cue| lowered.contains(cue)))
        .map(|(need, _)| need)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentBand {
    Low,
    Neutral,
    High,
}

impl SentimentBand {
    pub fn from_score(score: f64) -> Self {
        if score < LOW_SENTIMENT {
            SentimentBand::Low
        } else if score > HIGH_SENTIMENT {
            SentimentBand::High
        } else {
            SentimentBand::Neutral
        }
    }
}

/// Everything a transition may look at besides the stage itself.
pub struct TurnContext<'a> {
    pub user_message: &'a str,
    pub insights: &'a [GrowthInsight],
    pub recent_keywords: &'a [String],
    pub weekly_momentum: f64,
    /// Messages in the conversation so far, including the one being answered.
    pub message_count: usize,
    pub analyzer: &'a SentimentAnalyzer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InkyReply {
    pub content: String,
    pub message_type: MessageType,
}

impl InkyReply {
    fn question(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            message_type: MessageType::Question,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: Stage,
    pub message: Option<InkyReply>,
    /// Set only on the step into `Completed`.
    pub growth_score: Option<u8>,
}

impl Transition {
    fn stay(stage: Stage) -> Self {
        Self {
            next: stage,
            message: None,
            growth_score: None,
        }
    }
}

fn pick<R: Rng + ?Sized>(pool: &[&str], rng: &mut R) -> String {
    pool.choose(rng).map(|s| s.to_string()).unwrap_or_default()
}

/// Opening line for a new session.
pub fn greeting<R: Rng + ?Sized>(rng: &mut R) -> InkyReply {
    InkyReply::question(pick(templates::GREETINGS, rng))
}

/// Move one stage forward on a non-blank user message.
pub fn advance<R: Rng + ?Sized>(stage: Stage, ctx: &TurnContext<'_>, rng: &mut R) -> Transition {
    if ctx.user_message.trim().is_empty() {
        return Transition::stay(stage);
    }

    match stage {
        Stage::Greeting => Transition {
            next: Stage::Contextual,
            message: Some(contextual_message(ctx, rng)),
            growth_score: None,
        },
        Stage::Contextual => Transition {
            next: Stage::GoalSetting,
            message: Some(goal_prompt(ctx, rng)),
            growth_score: None,
        },
        Stage::GoalSetting => {
            let score = growth_score(ctx.message_count, ctx.insights.len(), ctx.weekly_momentum);
            Transition {
                next: Stage::Completed,
                message: Some(InkyReply {
                    content: templates::completion_message(score).to_string(),
                    message_type: MessageType::Celebration,
                }),
                growth_score: Some(score),
            }
        }
        Stage::Completed => Transition::stay(Stage::Completed),
    }
}

fn contextual_message<R: Rng + ?Sized>(ctx: &TurnContext<'_>, rng: &mut R) -> InkyReply {
    if let Some(need) = detect_emotional_need(ctx.user_message) {
        let pool = match need {
            EmotionalNeed::Validation => templates::VALIDATION,
            EmotionalNeed::Encouragement => templates::ENCOURAGEMENT,
            EmotionalNeed::Perspective => templates::PERSPECTIVE,
            EmotionalNeed::Celebration => templates::CELEBRATION,
        };
        return InkyReply::question(pick(pool, rng));
    }

    if let Some(insight) = ctx.insights.first() {
        return InkyReply::question(templates::insight_question(insight));
    }

    if let Some(keyword) = ctx.recent_keywords.first() {
        let template = pick(templates::KEYWORD_QUESTIONS, rng);
        return InkyReply::question(templates::keyword_question(&template, keyword));
    }

    let pool = match SentimentBand::from_score(ctx.analyzer.enhanced_sentiment(ctx.user_message)) {
        SentimentBand::Low => templates::LOW_MOOD,
        SentimentBand::Neutral => templates::NEUTRAL_MOOD,
        SentimentBand::High => templates::HIGH_MOOD,
    };
    InkyReply::question(pick(pool, rng))
}

fn goal_prompt<R: Rng + ?Sized>(ctx: &TurnContext<'_>, rng: &mut R) -> InkyReply {
    let band = SentimentBand::from_score(ctx.analyzer.enhanced_sentiment(ctx.user_message));
    let pool = if band == SentimentBand::Low {
        templates::GENTLE_GOAL_PROMPTS
    } else {
        templates::GOAL_PROMPTS
    };
    InkyReply::question(pick(pool, rng))
}

/// 1-10 rating: base 5, up to 3 for conversation depth, up to 2 for
/// insights, 1 for rising momentum.
pub fn growth_score(message_count: usize, insight_count: usize, weekly_momentum: f64) -> u8 {
    let mut score = 5 + (message_count / 2).min(3) + insight_count.min(2);
    if weekly_momentum > MOMENTUM_BONUS_THRESHOLD {
        score += 1;
    }
    score.clamp(1, 10) as u8
}
