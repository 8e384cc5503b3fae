use crate::reflection::{GrowthInsight, InsightCategory};

pub const GREETINGS: &[&str] = &[
    "Good morning! How are you feeling today?",
    "Hello there! Ready to reflect on your day?",
    "Hi! I've been looking at your recent entries. How's everything going?",
    "Welcome back! I noticed some interesting patterns in your journal. Want to chat about them?",
];

pub const VALIDATION: &[&str] = &[
    "That sounds really lonely, and your feelings make complete sense. What would feeling supported look like for you right now?",
    "It hurts to feel unseen. Thank you for writing it down here. Who is one person who has shown up for you before?",
];

pub const ENCOURAGEMENT: &[&str] = &[
    "It sounds like things feel heavy right now. What's one tiny thing that went okay today, even if it was small?",
    "Feeling stuck is part of growing, not a sign you're failing. What's one step that feels doable tomorrow?",
];

pub const PERSPECTIVE: &[&str] = &[
    "When everything feels like it's going wrong, it helps to zoom out. Is there a moment this week that didn't fit that story?",
    "That sounds frustrating. If a friend described this day to you, what would you tell them?",
];

pub const CELEBRATION: &[&str] = &[
    "That's worth celebrating! What made it possible?",
    "Look at you! How do you want to remember this moment?",
];

pub const KEYWORD_QUESTIONS: &[&str] = &[
    "You've been writing about {keyword} a lot lately. What's on your mind about it?",
    "{keyword} keeps showing up in your journal. How is that part of your life going?",
];

pub const LOW_MOOD: &[&str] = &[
    "Thanks for being honest about how you feel. What's weighing on you the most?",
    "That sounds like a tough day. What's one thing that might help you feel a little lighter?",
];

pub const NEUTRAL_MOOD: &[&str] = &[
    "How has your week been going so far? Any highlights or challenges?",
    "What's one thing from today you'd like to remember?",
];

pub const HIGH_MOOD: &[&str] = &[
    "I love that energy! What's been fueling it?",
    "It sounds like a good day. What went especially well?",
];

pub const GOAL_PROMPTS: &[&str] = &[
    "Looking ahead, what's one small step you could take tomorrow to move closer to your goals?",
    "If you could accomplish just one thing this week, what would make you feel most proud?",
    "What's a challenge you're facing that you'd like to tackle differently?",
    "How can you make tomorrow even better than today?",
];

pub const GENTLE_GOAL_PROMPTS: &[&str] = &[
    "No pressure at all: is there one kind thing you could do for yourself tomorrow?",
    "What would make tomorrow feel just a little bit easier?",
    "Rest counts too. What's one small thing you'd like to look forward to?",
];

pub fn keyword_question(template: &str, keyword: &str) -> String {
    template.replace("{keyword}", keyword)
}

/// Follow-up question keyed on the strongest insight.
pub fn insight_question(insight: &GrowthInsight) -> String {
    match insight.category {
        InsightCategory::Sentiment => format!(
            "I noticed your mood has been {} lately. What do you think is contributing to this?",
            if insight.title.contains("Positive") {
                "improving"
            } else {
                "challenging"
            }
        ),
        InsightCategory::Productivity => format!(
            "You've been {} your todos! What's your secret to staying focused?",
            if insight.title.contains("High") {
                "crushing"
            } else {
                "working on"
            }
        ),
        InsightCategory::GoalProgress => {
            "Your goals seem to really energize you. What's one goal you're most excited about right now?"
                .to_string()
        }
        InsightCategory::Patterns => {
            "I'm seeing some interesting patterns in your entries. What do you think they're telling you about yourself?"
                .to_string()
        }
        InsightCategory::Momentum => {
            "How do you feel about your current momentum? Are you where you want to be?".to_string()
        }
    }
}

pub fn completion_message(score: u8) -> &'static str {
    match score {
        8..=10 => "Amazing work today! You're really building momentum and self-awareness. Keep this energy going!",
        6..=7 => "Great reflection session! You're making solid progress and staying engaged with your growth journey.",
        4..=5 => "Good effort today! Every reflection builds your self-awareness muscle. Keep showing up!",
        _ => "Thanks for taking time to reflect today. Every small step counts toward your growth!",
    }
}
