//! CLI `analyze` command: run analysis rounds over a text and print the comments.

use anyhow::Result;
use std::path::PathBuf;

use crate::config::MarginaliaConfig;
use crate::engine::types::DensityPolicy;
use crate::engine::{AnalysisRequest, AnalysisReport};

pub struct AnalyzeArgs {
    pub path: PathBuf,
    pub session: Option<String>,
    pub rounds: usize,
    pub meta: Option<String>,
    pub state: Option<String>,
    pub policy: Option<DensityPolicy>,
    pub json: bool,
}

/// Run `rounds` analysis calls against the same session and print the result.
pub async fn analyze(config: &MarginaliaConfig, args: AnalyzeArgs) -> Result<()> {
    let text = super::read_text(&args.path)?;
    let engine = crate::server::setup_engine(config)?;
    let session_id = args
        .session
        .unwrap_or_else(|| uuid::Uuid::now_v7().to_string());

    let mut last: Option<AnalysisReport> = None;
    for round in 1..=args.rounds.max(1) {
        let report = engine
            .analyze(AnalysisRequest {
                session_id: session_id.clone(),
                text: text.clone(),
                meta_prompt: args.meta.clone(),
                state_prompt: args.state.clone(),
                density_policy: args.policy,
                ..AnalysisRequest::default()
            })
            .await;

        if !args.json {
            println!(
                "Round {round}: {:?} ({} attempt(s))",
                report.status,
                report.attempts.len()
            );
            for comment in &report.new_comments {
                println!("  + [{}] \"{}\"", comment.persona_name, comment.phrase);
            }
        }
        last = Some(report);
    }

    let Some(report) = last else {
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("Session {session_id}");
    println!("{}", "=".repeat(50));
    if report.comments.is_empty() {
        println!("No comments.");
    }
    for (i, comment) in report.comments.iter().enumerate() {
        println!(
            "  {}. {} ({}, {}) on \"{}\"",
            i + 1,
            comment.persona_name,
            comment.icon,
            comment.color,
            comment.phrase
        );
        println!("     {}", comment.comment);
    }

    Ok(())
}
