use anyhow::Result;
use incubate_backend::profile;
use incubate_backend::runtime::IncubateRuntime;

pub const HELP: &str = "Commands: /name <first name>, /pin <digits>, /biometrics on|off, /quit";

/// Settings typed into the chat instead of a reflection answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    SetName(String),
    SetPin(String),
    SetBiometrics(bool),
}

/// `None` when `line` is an ordinary message. A malformed command parses as
/// [`Command::Help`].
pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim();
    let rest = line.strip_prefix('/')?;
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match (name, arg) {
        ("quit", _) => Command::Quit,
        ("name", arg) => Command::SetName(arg.to_string()),
        ("pin", arg) if arg.len() >= 4 && arg.chars().all(|c| c.is_ascii_digit()) => {
            Command::SetPin(arg.to_string())
        }
        ("biometrics", "on") => Command::SetBiometrics(true),
        ("biometrics", "off") => Command::SetBiometrics(false),
        _ => Command::Help,
    };
    Some(command)
}

/// Apply a settings command and return the confirmation to show.
pub async fn apply(runtime: &IncubateRuntime, command: &Command) -> Result<String> {
    let store = &runtime.store;
    let reply = match command {
        Command::Quit => "Bye for now.".to_string(),
        Command::Help => HELP.to_string(),
        Command::SetName(name) => {
            profile::save_first_name(store, name).await?;
            if name.trim().is_empty() {
                "Name cleared.".to_string()
            } else {
                format!("Nice to meet you, {}!", name.trim())
            }
        }
        Command::SetPin(pin) => {
            runtime.app_lock().set_pin(pin).await?;
            "PIN saved. It will be asked for on the next start.".to_string()
        }
        Command::SetBiometrics(enabled) => {
            profile::set_biometrics_enabled(store, *enabled).await?;
            format!("Biometric unlock {}.", if *enabled { "enabled" } else { "disabled" })
        }
    };
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, Utc};
    use incubate_backend::config::IncubateConfig;
    use incubate_backend::lock::UnlockOutcome;

    #[test]
    fn parses_settings_commands() {
        assert_eq!(parse("just text"), None);
        assert_eq!(parse(" /quit "), Some(Command::Quit));
        assert_eq!(parse("/name Ada"), Some(Command::SetName("Ada".to_string())));
        assert_eq!(parse("/pin 1234"), Some(Command::SetPin("1234".to_string())));
        assert_eq!(parse("/pin 12"), Some(Command::Help));
        assert_eq!(parse("/pin abcd"), Some(Command::Help));
        assert_eq!(parse("/biometrics on"), Some(Command::SetBiometrics(true)));
        assert_eq!(parse("/biometrics maybe"), Some(Command::Help));
        assert_eq!(parse("/unknown"), Some(Command::Help));
    }

    #[tokio::test]
    async fn commands_update_profile_and_lock() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = IncubateConfig {
            database_path: dir.path().join("db.sqlite").to_string_lossy().into_owned(),
            ..IncubateConfig::default()
        };
        let runtime = IncubateRuntime::bootstrap(config).expect("bootstrap");

        apply(&runtime, &Command::SetName("Ada".to_string()))
            .await
            .expect("name");
        let loaded = profile::load_profile(&runtime.store, 10, Local::now().date_naive())
            .await
            .expect("profile");
        assert_eq!(loaded.first_name, "Ada");

        apply(&runtime, &Command::SetBiometrics(true))
            .await
            .expect("biometrics");
        assert!(profile::biometrics_enabled(&runtime.store).await.expect("read"));

        apply(&runtime, &Command::SetPin("2468".to_string()))
            .await
            .expect("pin");
        let mut lock = runtime.app_lock();
        assert!(lock.has_pin().await.expect("has pin"));
        assert!(matches!(
            lock.verify_pin("1111", Utc::now()).await.expect("verify"),
            UnlockOutcome::Rejected { .. }
        ));
        assert_eq!(
            lock.verify_pin("2468", Utc::now()).await.expect("verify"),
            UnlockOutcome::Unlocked
        );
    }
}
