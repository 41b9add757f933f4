//! Implementation of the `proofloop run` command: one-shot scoring or
//! optimization of a file (or stdin).

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::models::{Config, Mode, OptimizeRequest, OptimizeResult, Tone};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input file; reads stdin when absent
    pub file: Option<PathBuf>,

    /// optimize, score_only, or analyze
    #[arg(long, default_value = "optimize", value_parser = parse_mode)]
    pub mode: Mode,

    /// AI-detection threshold (0-100)
    #[arg(long, default_value_t = 10.0)]
    pub max_ai_percent: f64,

    /// Plagiarism threshold (0-100)
    #[arg(long, default_value_t = 5.0)]
    pub max_plagiarism_percent: f64,

    /// Rewrite budget (1-20)
    #[arg(long, default_value_t = 5)]
    pub max_iterations: u32,

    /// neutral, formal, informal, academic, or any custom description
    #[arg(long, default_value = "neutral", value_parser = parse_tone)]
    pub tone: Tone,

    /// Subject-matter hint for rewrites
    #[arg(long)]
    pub domain_hint: Option<String>,

    /// Extra rewrite guidance
    #[arg(long)]
    pub custom_instructions: Option<String>,
}

fn parse_mode(raw: &str) -> Result<Mode, String> {
    match raw {
        "optimize" => Ok(Mode::Optimize),
        "score_only" => Ok(Mode::ScoreOnly),
        "analyze" => Ok(Mode::Analyze),
        other => Err(format!(
            "unknown mode {other:?}, expected optimize, score_only, or analyze"
        )),
    }
}

fn parse_tone(raw: &str) -> Result<Tone, String> {
    Ok(match raw {
        "neutral" => Tone::Neutral,
        "formal" => Tone::Formal,
        "informal" => Tone::Informal,
        "academic" => Tone::Academic,
        custom => Tone::Custom(custom.to_string()),
    })
}

pub async fn execute(
    args: RunArgs,
    config_path: Option<PathBuf>,
    json_mode: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let _guard = logging::init(&config.logging)?;

    let text = read_input(args.file.as_deref())?;
    if text.trim().is_empty() {
        bail!("input text is empty");
    }

    let request = OptimizeRequest {
        text,
        mode: args.mode,
        tone: args.tone.clone(),
        domain_hint: args.domain_hint.clone(),
        custom_instructions: args.custom_instructions.clone(),
        max_ai_percent: args.max_ai_percent,
        max_plagiarism_percent: args.max_plagiarism_percent,
        max_iterations: args.max_iterations,
    };

    let optimizer = super::build_optimizer(&config)?;

    let result = if json_mode {
        optimizer.run(&request).await?
    } else {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}% {msg}")
                .unwrap()
                .progress_chars("=> "),
        );
        bar.set_message("scoring");
        let bar_for_progress = bar.clone();
        let optimizer = optimizer.with_progress(Arc::new(move |percent: u8| {
            bar_for_progress.set_position(u64::from(percent));
        }));
        let result = optimizer.run(&request).await;
        bar.finish_and_clear();
        result?
    };

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        render_human(&result);
    }
    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

fn read_input(file: Option<&std::path::Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn render_human(result: &OptimizeResult) {
    let verdict = if result.thresholds_met {
        style("thresholds met").green().bold()
    } else {
        style("thresholds not met").red().bold()
    };
    println!(
        "{verdict} after {} iteration(s)\n",
        result.iterations_used
    );

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "iteration",
        "ai detection",
        "plagiarism",
        "note",
    ]);
    for entry in &result.history {
        table.add_row(vec![
            Cell::new(entry.iteration),
            Cell::new(render_percent(entry.ai_detection_percent)),
            Cell::new(render_percent(entry.plagiarism_percent)),
            Cell::new(&entry.note),
        ]);
    }
    println!("{table}\n");

    if !result.notes.is_empty() {
        println!("{}\n", result.notes);
    }
    println!("--- final text ---\n{}", result.final_text);
}

fn render_percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}%"))
}
