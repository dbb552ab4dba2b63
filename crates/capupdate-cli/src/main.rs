//! `CapUpdate` CLI: command-line client for the `CapUpdate` server.
//!
//! A standalone HTTP client that talks to the server's JSON API. Bookmarks
//! are kept in a local file and never leave the machine.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod bookmarks;

use std::fmt::Write as _;
use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use crate::bookmarks::{BookmarkStorage, Bookmarks, FileStorage, MemoryStorage};

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ── CLI structure ────────────────────────────────────────────────────

/// `CapUpdate`: publish and update hosted HTML applications.
#[derive(Parser)]
#[command(
    name = "capupdate",
    version,
    about = "CapUpdate CLI: publish, browse, update, and bookmark HTML applications",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         CAPUPDATE_ADDR        Server address (default: http://127.0.0.1:8300)\n  \
         CAPUPDATE_BOOKMARKS   Bookmark file (default: ~/.capupdate/capupdate-saved-apps.json)\n  \
         CAPUPDATE_PASSWORD    Password for publish / update / delete / verify\n\n\
         {DIM}Examples:{RESET}\n  \
         capupdate list\n  \
         capupdate publish --name Demo --version 1.0.0 --html index.html --password s3cret\n  \
         capupdate update AbC123xYz9 --version 1.0.1 --password s3cret\n  \
         capupdate bookmark toggle AbC123xYz9"
    ),
)]
struct Cli {
    /// `CapUpdate` server address.
    #[arg(long, env = "CAPUPDATE_ADDR", default_value = "http://127.0.0.1:8300")]
    addr: String,

    /// File holding local bookmarks.
    #[arg(long, env = "CAPUPDATE_BOOKMARKS")]
    bookmarks: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List published applications, newest first.
    List,
    /// Show one application.
    Get {
        /// Application id.
        id: String,
    },
    /// Publish a new application.
    Publish {
        /// Display name.
        #[arg(long)]
        name: String,
        /// Version label.
        #[arg(long)]
        version: String,
        /// Optional description.
        #[arg(long)]
        description: Option<String>,
        /// HTML file to publish, or `-` for stdin.
        #[arg(long)]
        html: String,
        /// Password required later to update or delete (at least 4 characters).
        #[arg(long, env = "CAPUPDATE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Update an application. Fields left out keep their current values.
    Update {
        /// Application id.
        id: String,
        /// Password chosen at publish time.
        #[arg(long, env = "CAPUPDATE_PASSWORD", hide_env_values = true)]
        password: String,
        /// New display name.
        #[arg(long)]
        name: Option<String>,
        /// New version label.
        #[arg(long)]
        version: Option<String>,
        /// New description (an empty string clears it).
        #[arg(long)]
        description: Option<String>,
        /// Replacement HTML file, or `-` for stdin.
        #[arg(long)]
        html: Option<String>,
    },
    /// Permanently delete an application.
    Delete {
        /// Application id.
        id: String,
        /// Password chosen at publish time.
        #[arg(long, env = "CAPUPDATE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Check a password without changing anything.
    Verify {
        /// Application id.
        id: String,
        /// Password to check.
        #[arg(long, env = "CAPUPDATE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Write an application's HTML to stdout or a file.
    Preview {
        /// Application id.
        id: String,
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Local bookmarks.
    Bookmark {
        #[command(subcommand)]
        action: BookmarkCommands,
    },
}

#[derive(Subcommand)]
enum BookmarkCommands {
    /// Save an application, or un-save it if already saved.
    Toggle {
        /// Application id.
        id: String,
    },
    /// Show saved applications, sorted by name.
    List,
    /// Print saved ids, one per line.
    Ids,
}

// ── Pretty output helpers ────────────────────────────────────────────

fn header(icon: &str, title: &str) {
    println!("{BOLD}{CYAN}{icon} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<14}{RESET} {WHITE}{value}{RESET}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn warning(msg: &str) {
    println!("{YELLOW}{BOLD}⚠{RESET} {YELLOW}{msg}{RESET}");
}

fn field<'a>(app: &'a Value, key: &str) -> &'a str {
    app.get(key).and_then(Value::as_str).unwrap_or("")
}

fn print_app_line(app: &Value, saved: bool) {
    let star = if saved {
        format!("{YELLOW}★{RESET}")
    } else {
        " ".to_owned()
    };
    println!(
        "  {star} {CYAN}{:<12}{RESET} {BOLD}{}{RESET} {DIM}v{}  updated {}{RESET}",
        field(app, "id"),
        field(app, "name"),
        field(app, "version"),
        field(app, "updatedAt"),
    );
}

fn print_app_detail(addr: &str, app: &Value) {
    let id = field(app, "id");
    header("📦", field(app, "name"));
    kv_line("ID", id);
    kv_line("Version", field(app, "version"));
    let description = field(app, "description");
    if !description.is_empty() {
        kv_line("Description", description);
    }
    kv_line("Created", field(app, "createdAt"));
    kv_line("Updated", field(app, "updatedAt"));
    kv_line("HTML", &format!("{} bytes", field(app, "htmlContent").len()));
    kv_line("API URL", &format!("{addr}/api/apps/{id}"));
    kv_line("Preview URL", &format!("{addr}/preview/{id}"));
    println!();
}

// ── HTTP client ──────────────────────────────────────────────────────

struct Client {
    http: reqwest::Client,
    addr: String,
}

impl Client {
    fn new(addr: String) -> Self {
        let http = reqwest::Client::new();
        let addr = addr.trim_end_matches('/').to_owned();
        Self { http, addr }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.addr)
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.addr))?;
        handle_response(resp).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.addr))?;
        handle_response(resp).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        let resp = self
            .http
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.addr))?;
        handle_response(resp).await
    }

    async fn delete(&self, path: &str, body: &Value) -> Result<Value> {
        let resp = self
            .http
            .delete(self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.addr))?;
        handle_response(resp).await
    }
}

async fn handle_response(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    let body = resp.text().await.context("failed to read response body")?;
    if !status.is_success() {
        bail!("{}", describe_error(status, &body));
    }
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).context("failed to parse response JSON")
}

/// Render a server error body as one readable message.
fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return format!("server returned {status}: {body}");
    };
    let mut msg = match parsed.get("message").and_then(Value::as_str) {
        Some(message) => format!("{message} ({status})"),
        None => format!("server returned {status}: {body}"),
    };
    if let Some(fields) = parsed.get("fieldErrors").and_then(Value::as_object) {
        for (name, errors) in fields {
            for error in errors.as_array().into_iter().flatten() {
                let _ = write!(msg, "\n    {name}: {}", error.as_str().unwrap_or_default());
            }
        }
    }
    msg
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let client = Client::new(cli.addr);
    let bookmarks = open_bookmarks(cli.bookmarks);

    match run(&client, bookmarks, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

type LocalBookmarks = Bookmarks<Box<dyn BookmarkStorage>>;

/// Open the bookmark file, falling back to memory when no location is known.
fn open_bookmarks(explicit: Option<PathBuf>) -> LocalBookmarks {
    let path = explicit.or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".capupdate").join("capupdate-saved-apps.json"))
    });
    let storage: Box<dyn BookmarkStorage> = match path {
        Some(path) => Box::new(FileStorage::new(path)),
        None => Box::new(MemoryStorage::default()),
    };
    Bookmarks::load(storage)
}

async fn run(client: &Client, mut bookmarks: LocalBookmarks, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::List => cmd_list(client, &bookmarks).await,
        Commands::Get { id } => cmd_get(client, &id).await,
        Commands::Publish {
            name,
            version,
            description,
            html,
            password,
        } => {
            let html_content = read_html(&html)?;
            let body = json!({
                "name": name,
                "version": version,
                "description": description,
                "htmlContent": html_content,
                "password": password,
            });
            cmd_publish(client, &body).await
        }
        Commands::Update {
            id,
            password,
            name,
            version,
            description,
            html,
        } => {
            let changes = Changes {
                name,
                version,
                description,
                html_content: html.as_deref().map(read_html).transpose()?,
            };
            cmd_update(client, &id, &password, changes).await
        }
        Commands::Delete { id, password } => cmd_delete(client, &id, &password).await,
        Commands::Verify { id, password } => cmd_verify(client, &id, &password).await,
        Commands::Preview { id, output } => cmd_preview(client, &id, output.as_deref()).await,
        Commands::Bookmark { action } => match action {
            BookmarkCommands::Toggle { id } => {
                cmd_bookmark_toggle(&mut bookmarks, &id);
                Ok(())
            }
            BookmarkCommands::List => cmd_bookmark_list(client, &bookmarks).await,
            BookmarkCommands::Ids => {
                for id in bookmarks.ids() {
                    println!("{id}");
                }
                Ok(())
            }
        },
    }
}

/// Read HTML from a file, or from stdin when `source` is `-`.
fn read_html(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read HTML from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(source).with_context(|| format!("failed to read HTML from {source}"))
}

fn app_path(id: &str) -> Result<String> {
    let id = id.trim();
    if id.is_empty() || id.contains('/') {
        bail!("invalid application id: '{id}'");
    }
    Ok(format!("/api/apps/{id}"))
}

// ── Application commands ─────────────────────────────────────────────

async fn cmd_list(client: &Client, bookmarks: &LocalBookmarks) -> Result<()> {
    let apps = client.get("/api/apps").await?;
    let apps = apps.as_array().map(Vec::as_slice).unwrap_or_default();

    header("📦", &format!("Applications ({})", apps.len()));
    if apps.is_empty() {
        println!("  {DIM}(none published yet){RESET}");
    }
    for app in apps {
        print_app_line(app, bookmarks.contains(field(app, "id")));
    }
    println!();
    Ok(())
}

async fn cmd_get(client: &Client, id: &str) -> Result<()> {
    let app = client.get(&app_path(id)?).await?;
    print_app_detail(&client.addr, &app);
    Ok(())
}

async fn cmd_publish(client: &Client, body: &Value) -> Result<()> {
    let resp = client.post("/api/apps", body).await?;
    let id = resp
        .pointer("/data/id")
        .and_then(Value::as_str)
        .context("server response did not include an id")?;
    success(&format!("Published {BOLD}{id}{RESET}"));
    kv_line("API URL", &format!("{}/api/apps/{id}", client.addr));
    kv_line("Preview URL", &format!("{}/preview/{id}", client.addr));
    Ok(())
}

/// Fields to change in an update. `None` keeps the current value.
struct Changes {
    name: Option<String>,
    version: Option<String>,
    description: Option<String>,
    html_content: Option<String>,
}

impl Changes {
    /// Merge onto the current record into a full update body.
    fn merge(self, current: &Value, password: &str) -> Value {
        let mut body = json!({
            "name": self.name.unwrap_or_else(|| field(current, "name").to_owned()),
            "version": self.version.unwrap_or_else(|| field(current, "version").to_owned()),
            "htmlContent": self
                .html_content
                .unwrap_or_else(|| field(current, "htmlContent").to_owned()),
            "authPassword": password,
        });
        if let Some(description) = self.description {
            body["description"] = Value::String(description);
        }
        body
    }
}

async fn cmd_update(client: &Client, id: &str, password: &str, changes: Changes) -> Result<()> {
    let path = app_path(id)?;
    let current = client.get(&path).await?;
    let body = changes.merge(&current, password);
    let resp = client.put(&path, &body).await?;

    success(&format!("Updated {BOLD}{id}{RESET}"));
    if let Some(app) = resp.get("data") {
        kv_line("Version", field(app, "version"));
        kv_line("Updated", field(app, "updatedAt"));
    }
    Ok(())
}

async fn cmd_delete(client: &Client, id: &str, password: &str) -> Result<()> {
    client
        .delete(&app_path(id)?, &json!({ "authPassword": password }))
        .await?;
    success(&format!("Deleted {BOLD}{id}{RESET}"));
    Ok(())
}

async fn cmd_verify(client: &Client, id: &str, password: &str) -> Result<()> {
    let path = format!("{}/verify", app_path(id)?);
    client
        .post(&path, &json!({ "authPassword": password }))
        .await?;
    success("Password accepted");
    Ok(())
}

async fn cmd_preview(client: &Client, id: &str, output: Option<&Path>) -> Result<()> {
    let app = client.get(&app_path(id)?).await?;
    let html = field(&app, "htmlContent");
    match output {
        Some(path) => {
            std::fs::write(path, html)
                .with_context(|| format!("failed to write {}", path.display()))?;
            success(&format!("Wrote {} bytes to {}", html.len(), path.display()));
        }
        None => print!("{html}"),
    }
    Ok(())
}

// ── Bookmark commands ────────────────────────────────────────────────

fn cmd_bookmark_toggle(bookmarks: &mut LocalBookmarks, id: &str) {
    if bookmarks.toggle(id) {
        success(&format!("Saved {BOLD}{id}{RESET}"));
    } else {
        success(&format!("Removed {BOLD}{id}{RESET} from saved applications"));
    }
    if !bookmarks.is_persistent() {
        warning("bookmarks could not be written; this change lasts for this run only");
    }
}

async fn cmd_bookmark_list(client: &Client, bookmarks: &LocalBookmarks) -> Result<()> {
    let apps = client.get("/api/apps").await?;
    let apps = apps.as_array().map(Vec::as_slice).unwrap_or_default();

    let mut saved: Vec<&Value> = apps
        .iter()
        .filter(|app| bookmarks.contains(field(app, "id")))
        .collect();
    saved.sort_by_key(|app| field(app, "name").to_lowercase());

    header("★", &format!("Saved applications ({})", saved.len()));
    if saved.is_empty() {
        println!("  {DIM}(nothing saved){RESET}");
    }
    for app in &saved {
        print_app_line(app, true);
    }

    let missing: Vec<&String> = bookmarks
        .ids()
        .iter()
        .filter(|id| !apps.iter().any(|app| field(app, "id") == id.as_str()))
        .collect();
    if !missing.is_empty() {
        println!();
        for id in missing {
            warning(&format!("{id} is saved but no longer published"));
        }
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_unspecified_fields() {
        let current = json!({
            "id": "abc",
            "name": "Demo",
            "version": "1.0.0",
            "description": "old",
            "htmlContent": "<p>old</p>",
        });
        let changes = Changes {
            name: None,
            version: Some("1.0.1".to_owned()),
            description: None,
            html_content: None,
        };
        let body = changes.merge(&current, "pw12");
        assert_eq!(body["name"], "Demo");
        assert_eq!(body["version"], "1.0.1");
        assert_eq!(body["htmlContent"], "<p>old</p>");
        assert_eq!(body["authPassword"], "pw12");
        assert!(body.get("description").is_none());
    }

    #[test]
    fn merge_sends_empty_description_to_clear_it() {
        let current = json!({ "name": "Demo", "version": "1", "htmlContent": "x" });
        let changes = Changes {
            name: None,
            version: None,
            description: Some(String::new()),
            html_content: Some("<b>new</b>".to_owned()),
        };
        let body = changes.merge(&current, "pw12");
        assert_eq!(body["description"], "");
        assert_eq!(body["htmlContent"], "<b>new</b>");
    }

    #[test]
    fn describe_error_lists_field_errors() {
        let body = r#"{"success":false,"error":"validation_failed","message":"Invalid form data.","fieldErrors":{"name":["Application name is required."]}}"#;
        let msg = describe_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert!(msg.starts_with("Invalid form data."));
        assert!(msg.contains("name: Application name is required."));
    }

    #[test]
    fn describe_error_falls_back_to_raw_body() {
        let msg = describe_error(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert!(msg.contains("502"));
        assert!(msg.contains("upstream down"));
    }

    #[test]
    fn app_path_rejects_bad_ids() {
        assert_eq!(app_path("abc").ok().as_deref(), Some("/api/apps/abc"));
        assert!(app_path("  ").is_err());
        assert!(app_path("a/b").is_err());
    }
}
