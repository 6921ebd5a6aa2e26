//! dejavu-cli — HTTP frontend for the Dejavu question-answering service
//!
//! Talks to the Dejavu HTTP API. A `login` prints a session token; `ask` and
//! `history` take that token and act on behalf of the logged-in user.
//!
//! # Subcommands
//! - `register <username> <email> <password>` — create an account
//! - `login <email> <password>`               — open a session, print the token
//! - `ask <question> --token <token>`         — submit a question
//! - `history --token <token>`                — list your questions
//! - `status`                                 — show server health

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8767";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "dejavu-cli",
    version,
    about = "Dejavu duplicate-aware question answering — CLI"
)]
struct Cli {
    /// Dejavu HTTP server URL (overrides DEJAVU_HTTP_URL env var)
    #[arg(long, env = "DEJAVU_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a new account
    Register {
        username: String,
        email: String,
        password: String,
    },

    /// Log in and print a session token
    Login { email: String, password: String },

    /// Submit a question; prints matched duplicates and the answer
    Ask {
        /// Question text
        question: String,

        /// Session token from `login`
        #[arg(long, env = "DEJAVU_TOKEN")]
        token: String,

        /// Output the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// List your previously asked questions
    History {
        /// Session token from `login`
        #[arg(long, env = "DEJAVU_TOKEN")]
        token: String,

        /// Output the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Show Dejavu server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

/// A stored question as returned by POST /ask (duplicates) and POST /history.
#[derive(Debug, Deserialize)]
pub struct QuestionItem {
    pub id: String,
    pub question_text: String,
    pub is_duplicate: bool,
    pub answer: Option<String>,
    pub created_at: String,
}

/// The full response from POST /ask.
#[derive(Debug, Deserialize)]
pub struct AskResponse {
    pub question_id: String,
    pub answer: String,
    pub is_duplicate: bool,
    pub duplicates: Vec<QuestionItem>,
    pub took_ms: Option<u64>,
}

/// The full response from POST /history.
#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    pub questions: Vec<QuestionItem>,
    pub count: usize,
}

// ============================================================================
// Output formatting
// ============================================================================

/// One-line summary of a stored question: short id, duplicate marker,
/// question text capped at 60 chars.
pub fn format_question_line(q: &QuestionItem) -> String {
    let id_hex = q.id.replace('-', "");
    let short_id = &id_hex[..6.min(id_hex.len())];
    let marker = if q.is_duplicate { "dup" } else { "new" };
    let text: String = q.question_text.chars().take(60).collect();
    format!("#{short_id} [{marker}] {text}")
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn make_client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}

fn post_json(
    server: &str,
    endpoint: &str,
    body: serde_json::Value,
) -> anyhow::Result<reqwest::blocking::Response> {
    let client = make_client(60)?;
    let url = format!("{}{}", server, endpoint);

    match client.post(&url).json(&body).send() {
        Ok(r) => Ok(r),
        Err(e) => {
            eprintln!("dejavu-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    }
}

fn fail_on_error_status(resp: reqwest::blocking::Response) -> reqwest::blocking::Response {
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        eprintln!("dejavu-cli: server returned {}: {}", status, body);
        std::process::exit(1);
    }
    resp
}

fn do_register(server: &str, username: &str, email: &str, password: &str) -> anyhow::Result<()> {
    let resp = post_json(
        server,
        "/register",
        serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
        }),
    )?;
    let resp = fail_on_error_status(resp);

    let body: serde_json::Value = resp.json()?;
    println!(
        "Account created: {} <{}>",
        body["username"].as_str().unwrap_or("?"),
        body["email"].as_str().unwrap_or("?")
    );
    println!("Log in with `dejavu-cli login <email> <password>`");

    Ok(())
}

fn do_login(server: &str, email: &str, password: &str) -> anyhow::Result<()> {
    let resp = post_json(
        server,
        "/login",
        serde_json::json!({
            "email": email,
            "password": password,
        }),
    )?;
    let resp = fail_on_error_status(resp);

    let body: serde_json::Value = resp.json()?;
    println!("Welcome {}", body["username"].as_str().unwrap_or("?"));
    println!("{}", body["token"].as_str().unwrap_or("?"));

    Ok(())
}

fn do_ask(server: &str, token: &str, question: &str, json_output: bool) -> anyhow::Result<()> {
    let resp = post_json(
        server,
        "/ask",
        serde_json::json!({
            "token": token,
            "question": question,
        }),
    )?;
    let resp = fail_on_error_status(resp);

    if json_output {
        let body: serde_json::Value = resp.json()?;
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let ask_resp: AskResponse = match resp.json() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("dejavu-cli: failed to parse ask response: {}", e);
            std::process::exit(1);
        }
    };

    if ask_resp.is_duplicate {
        println!("This question is similar to previously asked questions:");
        for dup in &ask_resp.duplicates {
            println!("  {}", format_question_line(dup));
        }
    } else {
        println!("This question has not been asked before.");
    }

    println!("\nAnswer:\n{}", ask_resp.answer);

    Ok(())
}

fn do_history(server: &str, token: &str, json_output: bool) -> anyhow::Result<()> {
    let resp = post_json(server, "/history", serde_json::json!({ "token": token }))?;
    let resp = fail_on_error_status(resp);

    if json_output {
        let body: serde_json::Value = resp.json()?;
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let history: HistoryResponse = match resp.json() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("dejavu-cli: failed to parse history response: {}", e);
            std::process::exit(1);
        }
    };

    if history.questions.is_empty() {
        eprintln!("No questions asked yet.");
        return Ok(());
    }

    println!("{} question(s):", history.count);
    for q in &history.questions {
        println!("{}", format_question_line(q));
        if let Some(answer) = &q.answer {
            let preview: String = answer.chars().take(200).collect();
            println!("    {}", preview);
        }
    }

    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let client = make_client(10)?;

    let url = format!("{}/health", server);
    let resp = client.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Dejavu server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:       {}", body["version"].as_str().unwrap_or("?"));
            println!("PostgreSQL:    {}", body["postgresql"].as_str().unwrap_or("?"));
            println!("Classifier:    {}", body["classifier"].as_str().unwrap_or("?"));
            println!("Generator:     {}", body["generator"].as_str().unwrap_or("?"));
            println!("Socket:        {}", body["socket"].as_str().unwrap_or("?"));
        }
        Ok(r) => {
            let status = r.status();
            eprintln!("dejavu-cli: server unhealthy (HTTP {})", status);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("dejavu-cli: cannot reach {} — {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Register {
            username,
            email,
            password,
        } => do_register(&server, &username, &email, &password),
        Commands::Login { email, password } => do_login(&server, &email, &password),
        Commands::Ask {
            question,
            token,
            json,
        } => do_ask(&server, &token, &question, json),
        Commands::History { token, json } => do_history(&server, &token, json),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("dejavu-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_question(id: &str, text: &str, is_duplicate: bool) -> QuestionItem {
        QuestionItem {
            id: id.to_string(),
            question_text: text.to_string(),
            is_duplicate,
            answer: Some("An answer".to_string()),
            created_at: "2026-08-23T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_format_question_line_short_id_and_marker() {
        let q = mock_question(
            "7b5c24ab-1234-5678-9abc-def012345678",
            "How do I reset my password?",
            true,
        );
        let line = format_question_line(&q);

        assert!(line.starts_with("#7b5c24"), "line was: {line}");
        assert!(line.contains("[dup]"));
        assert!(line.ends_with("How do I reset my password?"));
    }

    #[test]
    fn test_format_question_line_truncates_long_text() {
        let long_text = "A".repeat(100);
        let q = mock_question("aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee", &long_text, false);
        let line = format_question_line(&q);

        assert!(line.contains("[new]"));
        assert!(line.ends_with(&"A".repeat(60)));
        assert!(!line.ends_with(&"A".repeat(61)));
    }

    #[test]
    fn test_format_question_line_short_id_without_dashes() {
        let q = mock_question("abc", "short id edge case", false);
        let line = format_question_line(&q);
        assert!(line.starts_with("#abc"));
    }

    #[test]
    fn test_ask_response_parses() {
        let json = serde_json::json!({
            "question_id": "7b5c24ab-1234-5678-9abc-def012345678",
            "answer": "Go to settings > security.",
            "is_duplicate": true,
            "duplicates": [{
                "id": "11112222-3333-4444-5555-666677778888",
                "user_id": "99990000-1111-2222-3333-444455556666",
                "question_text": "How can I reset my password?",
                "is_duplicate": false,
                "answer": "Go to settings > security.",
                "created_at": "2026-08-20T09:00:00Z"
            }],
            "took_ms": 12
        });

        let parsed: AskResponse = serde_json::from_value(json).expect("Should parse");
        assert!(parsed.is_duplicate);
        assert_eq!(parsed.duplicates.len(), 1);
        assert_eq!(parsed.answer, "Go to settings > security.");
    }
}
