//! Output formatting - clean, ASCII-only terminal output.

use owo_colors::OwoColorize;
use serde_json::Value;

pub const SEPARATOR: &str = "----------------------------------------";

/// Color a confidence label: high green, medium yellow, low red.
pub fn confidence_colored(label: &str) -> String {
    match label {
        "high" => label.bright_green().to_string(),
        "low" => label.bright_red().to_string(),
        _ => label.yellow().to_string(),
    }
}

/// Display a single persona reply with confidence and grounding note.
pub fn display_reply(name: &str, response: &str, confidence: &str, explanation: &str) {
    println!();
    println!(
        "{}  [confidence: {}]",
        name.cyan(),
        confidence_colored(confidence)
    );
    println!();
    println!("{}", response);
    if !explanation.is_empty() {
        println!();
        println!("  {} {}", "[grounding]".dimmed(), explanation.dimmed());
    }
}

/// Display a consensus analysis block.
pub fn display_consensus(consensus: &Value) {
    let agreement = consensus["agreement_level"].as_str().unwrap_or("unknown");
    let agreement_colored = match agreement {
        "strong" => agreement.bright_green().to_string(),
        "moderate" => agreement.yellow().to_string(),
        _ => agreement.bright_red().to_string(),
    };

    println!();
    println!("{}", SEPARATOR);
    println!("[CONSENSUS]  Agreement: {}", agreement_colored);
    println!();
    if let Some(summary) = consensus["summary"].as_str() {
        println!("{}", summary);
    }

    print_str_list("Common themes", &consensus["common_themes"]);
    print_str_list("Key differences", &consensus["key_differences"]);

    if let Some(insights) = consensus["insights"].as_array() {
        if !insights.is_empty() {
            println!();
            println!("[INSIGHTS]");
            for insight in insights {
                let text = insight["insight"].as_str().unwrap_or_default();
                let confidence = insight["confidence"].as_str().unwrap_or("medium");
                let supporters: Vec<&str> = insight["supported_by"]
                    .as_array()
                    .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
                    .unwrap_or_default();
                println!(
                    "  * {} ({})  [{}]",
                    text,
                    confidence_colored(confidence),
                    supporters.join(", ").dimmed()
                );
            }
        }
    }
}

/// Display one persona row in a list.
pub fn display_persona_row(persona: &Value) {
    let id = persona["id"].as_str().unwrap_or_default();
    let name = persona["attributes"]["display_name"]
        .as_str()
        .unwrap_or("Persona");
    let style = persona["attributes"]["decision_style"]
        .as_str()
        .unwrap_or("-");
    let overall = persona["confidence"]["overall"].as_f64().unwrap_or(0.0);

    println!(
        "  {}  {}  [{}]  confidence {:.0}%",
        id.dimmed(),
        name.cyan(),
        style,
        overall * 100.0
    );
}

fn print_str_list(label: &str, value: &Value) {
    if let Some(items) = value.as_array() {
        if !items.is_empty() {
            println!();
            println!("{}:", label);
            for item in items {
                if let Some(s) = item.as_str() {
                    println!("  * {}", s);
                }
            }
        }
    }
}
