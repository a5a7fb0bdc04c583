//! Command implementations for lensctl.

use crate::client::DaemonClient;
use crate::output;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub async fn status(client: &DaemonClient) -> Result<()> {
    let health = client.get("/v1/health").await?;

    println!();
    println!(
        "[OK]  lensd {}  up {}s",
        health["version"].as_str().unwrap_or("?"),
        health["uptime_seconds"].as_u64().unwrap_or(0)
    );
    println!(
        "  Published personas: {}",
        health["personas_published"].as_i64().unwrap_or(0)
    );
    Ok(())
}

pub async fn stats(client: &DaemonClient) -> Result<()> {
    let stats = client.get("/v1/stats").await?;

    println!();
    println!("[STATS]");
    println!(
        "  Personas:     {}",
        stats["total_personas"].as_i64().unwrap_or(0)
    );
    println!(
        "  Sessions:     {}",
        stats["total_sessions"].as_i64().unwrap_or(0)
    );
    println!(
        "  Messages:     {}",
        stats["total_messages"].as_i64().unwrap_or(0)
    );
    println!(
        "  Avg latency:  {}ms",
        stats["avg_latency_ms"].as_i64().unwrap_or(0)
    );
    Ok(())
}

pub async fn questions(client: &DaemonClient) -> Result<()> {
    let questions = client.get("/v1/interview/questions").await?;

    println!();
    for q in questions.as_array().cloned().unwrap_or_default() {
        println!(
            "{}. [{}] {}",
            q["number"].as_u64().unwrap_or(0),
            q["phase"].as_str().unwrap_or("-").cyan(),
            q["question"].as_str().unwrap_or("")
        );
        if let Some(hint) = q["hint"].as_str() {
            println!("   {}", hint.dimmed());
        }
    }
    Ok(())
}

pub async fn personas(
    client: &DaemonClient,
    search: Option<String>,
    decision_style: Option<String>,
) -> Result<()> {
    let mut path = "/v1/personas".to_string();
    let mut params = Vec::new();
    if let Some(s) = search {
        params.push(format!("search={}", s));
    }
    if let Some(d) = decision_style {
        params.push(format!("decision_style={}", d));
    }
    if !params.is_empty() {
        path = format!("{}?{}", path, params.join("&"));
    }

    let list = client.get(&path).await?;
    let total = list["total"].as_u64().unwrap_or(0);

    println!();
    println!("{} persona(s)", total);
    for persona in list["personas"].as_array().cloned().unwrap_or_default() {
        output::display_persona_row(&persona);
    }
    Ok(())
}

pub async fn show(client: &DaemonClient, id: &str) -> Result<()> {
    let persona = client.get(&format!("/v1/personas/{}", id)).await?;

    let name = persona["attributes"]["display_name"]
        .as_str()
        .unwrap_or("Persona");
    println!();
    println!("{}", name.cyan().bold());
    println!("{}", output::SEPARATOR);
    println!("{}", persona["narrative"].as_str().unwrap_or(""));
    println!();
    println!(
        "Attributes:\n{}",
        serde_json::to_string_pretty(&persona["attributes"])?
    );
    println!(
        "Confidence:\n{}",
        serde_json::to_string_pretty(&persona["confidence"])?
    );
    Ok(())
}

pub async fn chat(
    client: &DaemonClient,
    persona_id: &str,
    message: &str,
    session: Option<String>,
) -> Result<()> {
    let mut body = serde_json::json!({
        "persona_id": persona_id,
        "message": message,
    });
    if let Some(session) = session {
        body["session_id"] = serde_json::json!(session);
    }

    let pb = spinner("Asking persona...");
    let reply = client.post("/v1/chat", body).await;
    pb.finish_and_clear();
    let reply = reply?;

    output::display_reply(
        "Persona",
        reply["response"].as_str().unwrap_or(""),
        reply["confidence"].as_str().unwrap_or("medium"),
        reply["explanation"].as_str().unwrap_or(""),
    );
    if let Some(session_id) = reply["session_id"].as_str() {
        println!();
        println!("  {} {}", "[session]".dimmed(), session_id.dimmed());
    }
    Ok(())
}

pub async fn panel(client: &DaemonClient, persona_ids: &[String], question: &str) -> Result<()> {
    let body = serde_json::json!({
        "persona_ids": persona_ids,
        "message": question,
    });

    let pb = spinner("Querying panel...");
    let result = client.post("/v1/chat/panel", body).await;
    pb.finish_and_clear();
    let result = result?;

    println!();
    println!(
        "[PANEL]  {} personas  {}ms",
        result["persona_count"].as_u64().unwrap_or(0),
        result["latency_ms"].as_u64().unwrap_or(0)
    );

    for reply in result["responses"].as_array().cloned().unwrap_or_default() {
        output::display_reply(
            reply["persona_name"].as_str().unwrap_or("Persona"),
            reply["response"].as_str().unwrap_or(""),
            reply["confidence"].as_str().unwrap_or("medium"),
            reply["explanation"].as_str().unwrap_or(""),
        );
    }

    output::display_consensus(&result["consensus"]);
    Ok(())
}

pub async fn seed(client: &DaemonClient) -> Result<()> {
    let result = client.post("/v1/admin/seed", serde_json::json!({})).await?;
    println!(
        "[OK]  Seeded {} demo personas",
        result["inserted"].as_u64().unwrap_or(0)
    );
    Ok(())
}
