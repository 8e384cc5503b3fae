use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use rand::Rng;
use std::sync::Arc;

use crate::analysis::SentimentAnalyzer;
use crate::conversation::{self, Stage, TurnContext};
use crate::entry::Entry;
use crate::inky::InsightReport;
use crate::reflection::{ConversationMessage, DailyReflection, MessageSender, MessageType};
use crate::store::JournalStore;

/// Drives one day's reflection: holds the transcript, feeds user turns
/// through [`conversation::advance`] and records the outcome.
pub struct ReflectionSession {
    reflection: DailyReflection,
    stage: Stage,
    report: InsightReport,
    analyzer: Arc<SentimentAnalyzer>,
    saved: Option<Entry>,
}

impl ReflectionSession {
    pub fn new(date: NaiveDate, analyzer: Arc<SentimentAnalyzer>) -> Self {
        Self {
            reflection: DailyReflection::new(date),
            stage: Stage::Greeting,
            report: InsightReport::default(),
            analyzer,
            saved: None,
        }
    }

    pub fn reflection(&self) -> &DailyReflection {
        &self.reflection
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn report(&self) -> &InsightReport {
        &self.report
    }

    pub fn is_completed(&self) -> bool {
        self.reflection.is_completed
    }

    /// Greets the user if the conversation has not begun yet.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<ConversationMessage> {
        if !self.reflection.conversation.is_empty() {
            return None;
        }
        self.stage = Stage::Greeting;
        let greeting = conversation::greeting(rng);
        Some(self.push(ConversationMessage::inky(greeting.content, greeting.message_type)))
    }

    pub fn attach_report(&mut self, report: InsightReport) {
        tracing::debug!(
            "Session {} received {} insight(s), demo data: {}",
            self.reflection.id,
            report.insights.len(),
            report.used_demo_data
        );
        self.report = report;
    }

    /// Appends the user's message and Inky's answer. Blank input is ignored
    /// and returns `None`, as does anything sent after completion.
    pub fn send_user_message<R: Rng + ?Sized>(
        &mut self,
        text: &str,
        rng: &mut R,
    ) -> Option<ConversationMessage> {
        let text = text.trim();
        if text.is_empty() || self.stage.is_terminal() {
            return None;
        }

        self.push(ConversationMessage::user(text));

        let ctx = TurnContext {
            user_message: text,
            insights: &self.report.insights,
            recent_keywords: &self.report.recent_keywords,
            weekly_momentum: self.report.weekly_momentum,
            message_count: self.reflection.conversation.len(),
            analyzer: &self.analyzer,
        };
        let transition = conversation::advance(self.stage, &ctx, rng);
        self.stage = transition.next;

        if let Some(score) = transition.growth_score {
            self.reflection.growth_score = Some(score);
            self.reflection.is_completed = true;
            tracing::info!("Daily reflection completed with score {}", score);
        }

        transition
            .message
            .map(|reply| self.push(ConversationMessage::inky(reply.content, reply.message_type)))
    }

    /// Each Inky question paired with the user message that followed it.
    pub fn question_answer_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut pending: Option<&str> = None;

        for message in &self.reflection.conversation {
            match (message.sender, message.message_type) {
                (MessageSender::Inky, MessageType::Question) => {
                    pending = Some(message.content.as_str())
                }
                (MessageSender::User, _) => {
                    if let Some(question) = pending.take() {
                        pairs.push((question.to_string(), message.content.clone()));
                    }
                }
                _ => {}
            }
        }
        pairs
    }

    /// Store a completed reflection as a `reflection` entry whose text is the
    /// user's answers. Saving again returns the entry already written.
    pub async fn save(&mut self, store: &JournalStore) -> Result<Entry> {
        if !self.reflection.is_completed {
            return Err(anyhow!("reflection is not completed yet"));
        }
        if let Some(entry) = &self.saved {
            tracing::debug!("Reflection {} already saved as {}", self.reflection.id, entry.id);
            return Ok(entry.clone());
        }

        let title = format!("Daily Reflection {}", self.reflection.date.format("%Y-%m-%d"));
        let pairs = self.question_answer_pairs();
        let answers = pairs
            .iter()
            .map(|(_, answer)| answer.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let entry = store
            .save_new_reflection(Some(title.as_str()), &answers, pairs)
            .await?;
        self.saved = Some(entry.clone());

        tracing::info!(
            "Saved reflection {} as entry {} (growth score {:?})",
            self.reflection.id,
            entry.id,
            self.reflection.growth_score
        );
        Ok(entry)
    }

    fn push(&mut self, message: ConversationMessage) -> ConversationMessage {
        self.reflection.conversation.push(message.clone());
        message
    }
}

/// User-facing alert text for a failed action.
pub fn alert_message(action: &str, err: &anyhow::Error) -> String {
    format!("Failed to {}: {}", action, err)
}
