//! Line prompts on the controlling terminal.

use std::io::{IsTerminal, Write};

use anyhow::{bail, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// Read one line from stdin after printing `label`.
fn prompt_line(label: &str) -> Result<String> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Read a secret without echoing it. Piped input is read as a plain line.
pub fn prompt_password(label: &str) -> Result<String> {
    if !std::io::stdin().is_terminal() {
        return prompt_line(label);
    }
    print!("{label}");
    std::io::stdout().flush()?;

    enable_raw_mode().context("Failed to switch terminal to raw mode")?;
    let result = read_hidden();
    disable_raw_mode().context("Failed to restore terminal")?;
    println!();
    result
}

fn read_hidden() -> Result<String> {
    let mut secret = String::new();
    loop {
        if let Event::Key(key) = event::read()? {
            match apply_key(&mut secret, key) {
                KeyOutcome::Pending => {}
                KeyOutcome::Submit => return Ok(secret),
                KeyOutcome::Cancel => bail!("Cancelled"),
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Pending,
    Submit,
    Cancel,
}

fn apply_key(secret: &mut String, key: KeyEvent) -> KeyOutcome {
    if key.kind == KeyEventKind::Release {
        return KeyOutcome::Pending;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => KeyOutcome::Submit,
        KeyCode::Esc => KeyOutcome::Cancel,
        KeyCode::Char('c' | 'd') if ctrl => KeyOutcome::Cancel,
        KeyCode::Char('u') if ctrl => {
            secret.clear();
            KeyOutcome::Pending
        }
        KeyCode::Char(c) if !ctrl => {
            secret.push(c);
            KeyOutcome::Pending
        }
        KeyCode::Backspace => {
            secret.pop();
            KeyOutcome::Pending
        }
        _ => KeyOutcome::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_keys(keys: impl IntoIterator<Item = KeyEvent>) -> (String, KeyOutcome) {
        let mut secret = String::new();
        for key in keys {
            let outcome = apply_key(&mut secret, key);
            if outcome != KeyOutcome::Pending {
                return (secret, outcome);
            }
        }
        (secret, KeyOutcome::Pending)
    }

    #[test]
    fn test_hidden_input_collects_until_enter() {
        let keys = "s3cret pw".chars().map(KeyCode::Char).map(press);
        let (secret, outcome) = type_keys(keys.chain([press(KeyCode::Enter)]));
        assert_eq!(outcome, KeyOutcome::Submit);
        assert_eq!(secret, "s3cret pw");
    }

    #[test]
    fn test_hidden_input_editing_keys() {
        let (secret, outcome) = type_keys([
            press(KeyCode::Char('a')),
            press(KeyCode::Char('b')),
            press(KeyCode::Backspace),
            press(KeyCode::Char('c')),
            press(KeyCode::Left),
            press(KeyCode::Enter),
        ]);
        assert_eq!(outcome, KeyOutcome::Submit);
        assert_eq!(secret, "ac");

        let (secret, _) = type_keys([
            press(KeyCode::Char('x')),
            ctrl('u'),
            press(KeyCode::Char('y')),
            press(KeyCode::Enter),
        ]);
        assert_eq!(secret, "y");
    }

    #[test]
    fn test_hidden_input_cancel_and_release() {
        let (_, outcome) = type_keys([press(KeyCode::Char('a')), ctrl('c')]);
        assert_eq!(outcome, KeyOutcome::Cancel);
        let (_, outcome) = type_keys([press(KeyCode::Esc)]);
        assert_eq!(outcome, KeyOutcome::Cancel);

        let mut secret = String::new();
        let release = KeyEvent::new_with_kind(
            KeyCode::Char('z'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        );
        assert_eq!(apply_key(&mut secret, release), KeyOutcome::Pending);
        assert!(secret.is_empty());
    }
}
