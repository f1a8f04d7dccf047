//! Line-oriented terminal client.
//!
//! [`ChatApp`] is a small state machine: one input line in, a [`Reply`] out.
//! [`run_chat`] wires it to stdin/stdout and the HTTP backend.

use anyhow::Result;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::auth::{Authenticator, JsonFileUserStore, UserStore};
use crate::client::{BackendClient, DocumentBackend};
use crate::models::Sender;
use crate::session::ChatSession;

const LOGGED_OUT_HELP: &str = "\
Commands:
  signup <username> <password>   create an account and log in
  login <username> <password>    log in
  help                           show this help
  quit                           exit";

const LOGGED_IN_HELP: &str = "\
Commands:
  upload <path>     upload a .pdf or .txt file
  files             list uploaded files
  ask <question>    ask about your documents (or just type the question)
  save              save the current chat
  load <name>       restore a saved chat
  sessions          list saved chats
  clear             start a new chat
  history           show the current chat
  logout            log out
  help              show this help
  quit              exit";

const SEARCH_FAILED: &str = "Error fetching response";

/// Output of one input line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reply {
    pub lines: Vec<String>,
    pub quit: bool,
}

impl Reply {
    fn lines(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            quit: false,
        }
    }

    fn line(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            quit: false,
        }
    }

    fn quit() -> Self {
        Self {
            lines: vec!["Goodbye!".to_string()],
            quit: true,
        }
    }
}

pub struct ChatApp<B, S> {
    backend: B,
    auth: Authenticator<S>,
    user: Option<String>,
    session: ChatSession,
}

impl<B: DocumentBackend, S: UserStore> ChatApp<B, S> {
    pub fn new(backend: B, users: S) -> Self {
        Self {
            backend,
            auth: Authenticator::new(users),
            user: None,
            session: ChatSession::new(),
        }
    }

    pub fn current_user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub async fn handle_line(&mut self, line: &str) -> Reply {
        let line = line.trim();
        if line.is_empty() {
            return Reply::default();
        }
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "quit" | "exit" => return Reply::quit(),
            "help" => {
                return Reply::line(if self.user.is_some() {
                    LOGGED_IN_HELP
                } else {
                    LOGGED_OUT_HELP
                })
            }
            _ => {}
        }

        if self.user.is_none() {
            return self.handle_logged_out(command, rest);
        }

        match command {
            "signup" | "login" => Reply::line(format!(
                "Already logged in as {}. Log out first.",
                self.user.as_deref().unwrap_or_default()
            )),
            "logout" => {
                self.user = None;
                self.session.clear();
                Reply::line("Logged out.")
            }
            "upload" => self.upload(rest).await,
            "files" => self.files().await,
            "ask" => self.ask(rest).await,
            "save" => {
                let name = self.session.save();
                Reply::line(format!("Chat saved as {}", name))
            }
            "load" => match self.session.load(rest) {
                Ok(()) => {
                    let mut reply = Reply::line(format!("Loaded {}", rest));
                    reply.lines.extend(self.history_lines());
                    reply
                }
                Err(e) => Reply::line(e.to_string()),
            },
            "sessions" => {
                let names = self.session.saved_names();
                if names.is_empty() {
                    Reply::line("No saved chats.")
                } else {
                    Reply::lines(names)
                }
            }
            "clear" => {
                self.session.clear();
                Reply::line("Started a new chat.")
            }
            "history" => {
                let lines = self.history_lines();
                if lines.is_empty() {
                    Reply::line("No messages yet.")
                } else {
                    Reply::lines(lines)
                }
            }
            _ => self.ask(line).await,
        }
    }

    fn handle_logged_out(&mut self, command: &str, rest: &str) -> Reply {
        let mut args = rest.split_whitespace();
        let username = args.next().unwrap_or_default();
        let password = args.next().unwrap_or_default();

        match command {
            "signup" => match self.auth.sign_up(username, password) {
                Ok(()) => {
                    self.user = Some(username.to_string());
                    Reply::line(format!("Signup successful! Logged in as {}.", username))
                }
                Err(e) => Reply::line(e.to_string()),
            },
            "login" => match self.auth.log_in(username, password) {
                Ok(()) => {
                    self.user = Some(username.to_string());
                    Reply::line(format!("Login successful! Welcome, {}.", username))
                }
                Err(e) => Reply::line(e.to_string()),
            },
            _ => Reply::line("Please log in first (type `help` for commands)."),
        }
    }

    async fn upload(&mut self, path: &str) -> Reply {
        if path.is_empty() {
            return Reply::line("Usage: upload <path>");
        }
        match self.backend.upload(Path::new(path)).await {
            Ok(resp) => Reply::line(format!("File uploaded: {}", resp.filename)),
            Err(e) => {
                tracing::debug!(error = %e, path, "upload failed");
                Reply::line("Upload failed!")
            }
        }
    }

    async fn files(&self) -> Reply {
        match self.backend.list_files().await {
            Ok(files) if files.is_empty() => Reply::line("No files uploaded yet."),
            Ok(files) => Reply::lines(files),
            Err(e) => {
                tracing::debug!(error = %e, "listing files failed");
                Reply::line("Error fetching files")
            }
        }
    }

    async fn ask(&mut self, question: &str) -> Reply {
        if question.is_empty() {
            return Reply::line("Usage: ask <question>");
        }
        self.session.push(Sender::User, question);
        match self.backend.search(question).await {
            Ok(resp) => {
                self.session.push(Sender::Bot, resp.answer.clone());
                Reply::line(format!("{}: {}", Sender::Bot, resp.answer))
            }
            Err(e) => {
                tracing::debug!(error = %e, "search failed");
                self.session.push(Sender::Bot, SEARCH_FAILED);
                Reply::line(SEARCH_FAILED)
            }
        }
    }

    fn history_lines(&self) -> Vec<String> {
        self.session
            .messages()
            .iter()
            .map(|m| format!("{}: {}", m.sender, m.text))
            .collect()
    }
}

/// Run the interactive client until `quit` or end of input.
pub async fn run_chat(backend_url: &str, users_file: &Path) -> Result<()> {
    let backend = BackendClient::new(backend_url)?;
    let mut app = ChatApp::new(backend, JsonFileUserStore::new(users_file));

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(format!("docqa chat ({})\n{}\n", backend_url, LOGGED_OUT_HELP).as_bytes())
        .await?;

    loop {
        let prompt = match app.current_user() {
            Some(user) => format!("{}> ", user),
            None => "> ".to_string(),
        };
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let reply = app.handle_line(&line).await;
        for out in &reply.lines {
            stdout.write_all(out.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        if reply.quit {
            break;
        }
    }
    stdout.flush().await?;
    Ok(())
}
