//! Terminal client
//!
//! Creates or joins a room and keeps a live view of members and tallies.
//! Typing a number votes for that alternative; `leave` leaves the room.
//! Ctrl-C only disconnects, so `quizroom join` without a code rejoins later.

use anyhow::{anyhow, bail, Context, Result};
use quizroom_core::{room_code_from_input, AlternativeDraft, QuizDraft, ShareUrl};
use quizroom_net::{Client, RoomEvent, RoomState};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::profile::{PlayerProfile, ProfileStore};

/// A line typed by the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 1-based alternative number
    Vote(usize),
    Leave,
    Help,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let command = match line.to_ascii_lowercase().as_str() {
            "leave" | "q" | "quit" => Command::Leave,
            "help" | "?" => Command::Help,
            other => match other.parse::<usize>() {
                Ok(n) if n > 0 => Command::Vote(n),
                _ => Command::Unknown(line.to_string()),
            },
        };
        Some(command)
    }
}

/// Build the quiz a host starts a room with. Options get ids `opt-1`,
/// `opt-2`, ... in the order given.
pub fn build_quiz(question: Option<String>, options: Vec<String>) -> Result<Option<QuizDraft>> {
    if question.is_none() && options.is_empty() {
        return Ok(None);
    }

    let alternatives = options
        .into_iter()
        .enumerate()
        .map(|(i, text)| AlternativeDraft::new(format!("opt-{}", i + 1), text))
        .collect();
    let draft = QuizDraft::new(question.unwrap_or_default(), alternatives);
    draft.validate()?;
    Ok(Some(draft))
}

/// Split `host:port`
pub fn split_address(addr: &str) -> Result<(String, u16)> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("address '{}' has no port", addr))?;
    let port = port
        .parse()
        .with_context(|| format!("bad port in address '{}'", addr))?;
    Ok((host.to_string(), port))
}

/// Where to connect and which room to join.
///
/// A share URL carries its own server address; a bare code uses `server`.
/// With no target the last room from the profile is used.
pub fn resolve_join_target(
    target: Option<&str>,
    server: &str,
    last_room_code: Option<&str>,
) -> Result<(String, String)> {
    let Some(target) = target.or(last_room_code) else {
        bail!("no room code given and no previous room to rejoin");
    };

    if let Ok(share) = target.parse::<ShareUrl>() {
        return Ok((share.address(), share.room_code));
    }
    Ok((server.to_string(), room_code_from_input(target)?))
}

/// Tracks who is in the room to announce joins and leaves
#[derive(Debug, Default)]
pub struct MemberTracker {
    known: Vec<(String, String)>,
}

impl MemberTracker {
    /// Update known members and return (joined, left) display names,
    /// excluding `me`
    pub fn update(&mut self, state: &RoomState, me: &str) -> (Vec<String>, Vec<String>) {
        let current: Vec<(String, String)> = state
            .members
            .iter()
            .map(|m| (m.durable_identity_id.clone(), m.display_name.clone()))
            .collect();

        let joined = current
            .iter()
            .filter(|(id, _)| id != me && !self.known.iter().any(|(k, _)| k == id))
            .map(|(_, name)| name.clone())
            .collect();
        let left = self
            .known
            .iter()
            .filter(|(id, _)| id != me && !current.iter().any(|(c, _)| c == id))
            .map(|(_, name)| name.clone())
            .collect();

        self.known = current;
        (joined, left)
    }
}

/// Text view of a room
pub fn render_room(state: &RoomState, me: &str) -> String {
    let mut out = String::new();

    if let Some(quiz) = &state.quiz {
        out.push_str(&format!("\n{}\n", quiz.question));
        for (i, alternative) in quiz.alternatives.iter().enumerate() {
            let percent = quiz.percentage(&alternative.id).unwrap_or(0.0);
            out.push_str(&format!(
                "  [{}] {:<24} {:>3} votes {:>5.1}%\n",
                i + 1,
                alternative.text,
                alternative.vote_count,
                percent
            ));
        }
    }

    out.push_str(&format!("\nPlayers ({})\n", state.members.len()));
    for member in &state.members {
        let host = if member.is_host { "HOST - " } else { "" };
        let you = if member.durable_identity_id == me { " (you)" } else { "" };
        let voted = if member.voted_for.is_some() { " *" } else { "" };
        out.push_str(&format!("  {}{}{}{}\n", host, member.display_name, you, voted));
    }
    out
}

fn print_help(has_quiz: bool) {
    if has_quiz {
        println!("Type a number to vote, 'leave' to leave, Ctrl-C to disconnect.");
    } else {
        println!("Type 'leave' to leave, Ctrl-C to disconnect.");
    }
}

/// Host a new room
pub async fn create(
    server: &str,
    quiz: Option<QuizDraft>,
    profile: &mut PlayerProfile,
    store: &ProfileStore,
) -> Result<()> {
    let (host, port) = split_address(server)?;
    let client = Client::connect(server)
        .await
        .with_context(|| format!("could not reach {}", server))?;

    let created = client
        .create_room(&profile.durable_identity_id, &profile.display_name, quiz.clone())
        .await?;
    store.set_last_room(profile, Some(&created.room_code))?;

    println!("Room {} is open", created.room_code);
    println!("Share: {}", ShareUrl::new(host, port, &created.room_code));

    let state = RoomState {
        members: created.members,
        quiz: quiz.map(QuizDraft::into_quiz).transpose()?,
    };
    play(client, created.room_code, state, profile, store).await
}

/// Join a room, or rejoin the one this player was last in
pub async fn join(
    server: &str,
    target: Option<&str>,
    profile: &mut PlayerProfile,
    store: &ProfileStore,
) -> Result<()> {
    let (addr, room_code) =
        resolve_join_target(target, server, profile.last_room_code.as_deref())?;
    let client = Client::connect(addr.as_str())
        .await
        .with_context(|| format!("could not reach {}", addr))?;

    let state = match client
        .join_room(&room_code, &profile.durable_identity_id, &profile.display_name)
        .await
    {
        Ok(state) => state,
        Err(e) => {
            if profile.last_room_code.as_deref() == Some(room_code.as_str()) {
                store.set_last_room(profile, None)?;
            }
            return Err(e.into());
        }
    };
    store.set_last_room(profile, Some(&room_code))?;

    println!("Joined room {}", room_code);
    play(client, room_code, state, profile, store).await
}

async fn play(
    mut client: Client,
    room_code: String,
    mut state: RoomState,
    profile: &mut PlayerProfile,
    store: &ProfileStore,
) -> Result<()> {
    let me = profile.durable_identity_id.clone();
    let mut tracker = MemberTracker::default();
    tracker.update(&state, &me);

    print!("{}", render_room(&state, &me));
    print_help(state.quiz.is_some());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = client.next_event() => {
                match event {
                    Some(RoomEvent::Update(update)) => {
                        let (joined, left) = tracker.update(&update, &me);
                        for name in joined {
                            println!("{} joined", name);
                        }
                        for name in left {
                            println!("{} left", name);
                        }
                        state = update;
                        print!("{}", render_room(&state, &me));
                    }
                    Some(RoomEvent::Closed) => {
                        println!("The host closed the room.");
                        store.set_last_room(profile, None)?;
                        return Ok(());
                    }
                    Some(RoomEvent::Disconnected) | None => {
                        println!("Connection lost. Run `quizroom join` to rejoin {}.", room_code);
                        return Ok(());
                    }
                }
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    client.disconnect().await;
                    return Ok(());
                };

                match Command::parse(&line) {
                    None => {}
                    Some(Command::Leave) => {
                        client.leave_room().await?;
                        store.set_last_room(profile, None)?;
                        println!("Left room {}", room_code);
                        return Ok(());
                    }
                    Some(Command::Help) => print_help(state.quiz.is_some()),
                    Some(Command::Vote(n)) => {
                        let chosen = state
                            .quiz
                            .as_ref()
                            .and_then(|q| q.alternatives.get(n - 1))
                            .map(|a| a.id.clone());
                        let Some(chosen) = chosen else {
                            println!("No alternative {}", n);
                            continue;
                        };
                        match client.vote(&room_code, &me, &chosen).await {
                            Ok(update) => {
                                state = update;
                                print!("{}", render_room(&state, &me));
                            }
                            Err(e) => println!("Vote failed: {}", e),
                        }
                    }
                    Some(Command::Unknown(text)) => println!("Unknown command '{}'", text),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                client.disconnect().await;
                println!("\nDisconnected. Run `quizroom join` to rejoin {}.", room_code);
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizroom_core::{MemberView, Quiz};

    fn member(id: &str, name: &str, is_host: bool) -> MemberView {
        MemberView {
            durable_identity_id: id.into(),
            connection_id: uuid::Uuid::nil(),
            display_name: name.into(),
            voted_for: None,
            is_host,
        }
    }

    fn sample_state() -> RoomState {
        let mut quiz: Quiz = build_quiz(
            Some("Best pet?".into()),
            vec!["Cat".into(), "Dog".into()],
        )
        .unwrap()
        .unwrap()
        .into_quiz()
        .unwrap();
        quiz.alternatives[0].vote_count = 1;
        quiz.alternatives[1].vote_count = 3;

        RoomState {
            members: vec![member("a", "Alice", true), member("b", "Bob", false)],
            quiz: Some(quiz),
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(" 2 "), Some(Command::Vote(2)));
        assert_eq!(Command::parse("LEAVE"), Some(Command::Leave));
        assert_eq!(Command::parse("q"), Some(Command::Leave));
        assert_eq!(Command::parse("0"), Some(Command::Unknown("0".into())));
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn test_build_quiz_numbers_options() {
        let draft = build_quiz(Some("Q".into()), vec!["A".into(), "B".into()])
            .unwrap()
            .unwrap();
        assert_eq!(draft.alternatives[1].id, "opt-2");

        assert!(build_quiz(None, vec![]).unwrap().is_none());
        assert!(build_quiz(Some("Q".into()), vec![]).is_err());
        assert!(build_quiz(None, vec!["A".into()]).is_err());
    }

    #[test]
    fn test_resolve_join_target() {
        let (addr, code) = resolve_join_target(Some("ab12c"), "10.0.0.1:4000", None).unwrap();
        assert_eq!((addr.as_str(), code.as_str()), ("10.0.0.1:4000", "AB12C"));

        let (addr, code) =
            resolve_join_target(Some("quizroom://example.org:5000/xy7qz"), "10.0.0.1:4000", None)
                .unwrap();
        assert_eq!((addr.as_str(), code.as_str()), ("example.org:5000", "XY7QZ"));

        let (_, code) = resolve_join_target(None, "10.0.0.1:4000", Some("LAST1")).unwrap();
        assert_eq!(code, "LAST1");

        assert!(resolve_join_target(None, "10.0.0.1:4000", None).is_err());
    }

    #[test]
    fn test_split_address() {
        assert_eq!(split_address("127.0.0.1:4000").unwrap(), ("127.0.0.1".into(), 4000));
        assert!(split_address("localhost").is_err());
    }

    #[test]
    fn test_member_tracker_reports_changes() {
        let mut tracker = MemberTracker::default();
        let state = sample_state();

        let (joined, left) = tracker.update(&state, "a");
        assert_eq!(joined, vec!["Bob".to_string()]);
        assert!(left.is_empty());

        let mut next = state.clone();
        next.members.pop();
        let (joined, left) = tracker.update(&next, "a");
        assert!(joined.is_empty());
        assert_eq!(left, vec!["Bob".to_string()]);
    }

    #[test]
    fn test_render_room() {
        let text = render_room(&sample_state(), "b");
        assert!(text.contains("Best pet?"));
        assert!(text.contains("75.0%"));
        assert!(text.contains("HOST - Alice"));
        assert!(text.contains("Bob (you)"));
    }
}
