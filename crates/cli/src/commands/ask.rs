//! `docchat ask` — Question a local PDF, single-shot or interactive.
//!
//! Runs the same chat service the HTTP server uses, in-process, behind a
//! client-side session that keeps the conversation.

use std::path::Path;
use std::sync::Arc;

use docchat_config::AppConfig;
use docchat_core::{ChatSession, DocumentPayload, Message};
use docchat_gateway::ChatService;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

pub async fn run(
    config_path: Option<&Path>,
    pdf: &Path,
    question: Option<String>,
    pages: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config =
        AppConfig::load_with(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for the API key early to give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    DOCCHAT_API_KEY=...");
        eprintln!("    AI_GATEWAY_API_KEY=...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        return Err("No API key configured".into());
    }

    let bytes = tokio::fs::read(pdf)
        .await
        .map_err(|e| format!("Failed to read {}: {e}", pdf.display()))?;
    let document = DocumentPayload::from_pdf_bytes(&bytes)?;
    debug!(
        file = %pdf.display(),
        bytes = bytes.len(),
        encoded = document.len(),
        "Document loaded"
    );

    let service = Arc::new(ChatService::from_config(&config));
    let mut session = ChatSession::new(service, document);
    if let Some(pages) = pages {
        session = session.with_page_count(pages);
    }

    if let Some(question) = question {
        // Single question mode
        eprint!("  Thinking...");
        let result = session.ask(&question).await;
        eprint!("\r              \r");
        print_reply(result?);
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  Document:  {}", pdf.display());
    println!("  Model:     {}", config.model);
    println!();
    println!("  Ask a question and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"  You > ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        eprint!("  ...");
        let result = session.ask(line).await;
        eprint!("\r     \r");
        match result {
            Ok(reply) => print_reply(reply),
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!(
        "  {} message(s) in this conversation.",
        session.conversation().len()
    );
    Ok(())
}

fn print_reply(reply: &Message) {
    println!();
    for line in reply.content.lines() {
        println!("  Assistant > {line}");
    }
    if !reply.citations.is_empty() {
        let sources: Vec<String> = reply
            .citations
            .iter()
            .map(|page| format!("[Page {page}]"))
            .collect();
        println!("  Sources:    {}", sources.join(" "));
    }
    println!();
}
