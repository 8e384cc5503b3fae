use std::io::Write;

use anyhow::Result;
use chrono::{Local, Utc};
use incubate_backend::reflection::{ConversationMessage, MessageSender};
use incubate_backend::runtime::IncubateRuntime;
use incubate_backend::session::{alert_message, ReflectionSession};
use rand::Rng;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::commands::{self, Command};
use super::pacing::Pacer;

pub fn render_message(message: &ConversationMessage) -> String {
    let who = match message.sender {
        MessageSender::Inky => "Inky",
        MessageSender::User => "You",
    };
    let time = message.timestamp.with_timezone(&Local).format("%H:%M");
    format!("{} ({})\n  {}\n", who, time, message.content)
}

async fn say<W: Write, R: Rng + ?Sized>(
    out: &mut W,
    pacer: &Pacer,
    rng: &mut R,
    message: &ConversationMessage,
) -> Result<()> {
    writeln!(out, "  Inky is thinking...")?;
    out.flush()?;
    pacer.pause(rng).await;
    writeln!(out, "{}", render_message(message))?;
    out.flush()?;
    Ok(())
}

/// Run today's reflection over line-oriented input until it completes or the
/// input ends. Returns the finished session.
pub async fn run_reflection<I, W, R>(
    runtime: &IncubateRuntime,
    input: I,
    out: &mut W,
    pacer: Pacer,
    rng: &mut R,
) -> Result<ReflectionSession>
where
    I: AsyncBufRead + Unpin,
    W: Write,
    R: Rng + ?Sized,
{
    let mut session = runtime.new_session(Local::now().date_naive());

    match runtime.insights.generate(Utc::now()).await {
        Ok(report) => session.attach_report(report),
        Err(e) => {
            tracing::error!("Insight generation failed: {:#}", e);
            writeln!(out, "{}", alert_message("generate insights", &e))?;
        }
    }

    writeln!(out, "{}\n", commands::HELP)?;
    writeln!(out, "-- {} --", session.stage().title())?;
    if let Some(greeting) = session.start(rng) {
        say(out, &pacer, rng, &greeting).await?;
    }

    let mut lines = input.lines();
    while !session.is_completed() {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            tracing::info!("Input closed before the reflection finished");
            break;
        };
        if let Some(command) = commands::parse(&line) {
            match commands::apply(runtime, &command).await {
                Ok(confirmation) => writeln!(out, "{}", confirmation)?,
                Err(e) => writeln!(out, "{}", alert_message("update your settings", &e))?,
            }
            if command == Command::Quit {
                break;
            }
            continue;
        }

        let stage_before = session.stage();
        if let Some(reply) = session.send_user_message(&line, rng) {
            if session.stage() != stage_before && !session.stage().is_terminal() {
                writeln!(out, "-- {} --", session.stage().title())?;
            }
            say(out, &pacer, rng, &reply).await?;
        }
    }

    if session.is_completed() {
        if let Some(score) = session.reflection().growth_score {
            writeln!(out, "Growth score: {}/10", score)?;
        }
        match session.save(&runtime.store).await {
            Ok(entry) => tracing::debug!("Reflection stored as {}", entry.id),
            Err(e) => {
                tracing::error!("Saving reflection failed: {:#}", e);
                writeln!(out, "{}", alert_message("save your reflection", &e))?;
            }
        }
    }

    Ok(session)
}
