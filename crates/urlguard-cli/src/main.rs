//! urlguard CLI
//!
//! Loads a JSON ruleset and classifies URL references against it.

use std::fs;
use std::path::Path;
use std::time::Instant;

use clap::{Parser, Subcommand};

use urlguard_builders::RulesetSpec;
use urlguard_core::diagnostics::{null_receiver, Receiver};
use urlguard_core::{Classification, UrlContext, UrlValue};

/// Prints every diagnostic as it arrives; used for `classify --verbose`.
struct PrintingReceiver;

impl Receiver for PrintingReceiver {
    fn note(&self, diagnostic: &str, context: &str) {
        println!("  - {diagnostic}: {context}");
    }
}

#[derive(Parser)]
#[command(name = "urlguard")]
#[command(about = "Classify URL references against a declarative ruleset")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate that a ruleset file parses and builds without error
    Validate {
        /// Ruleset JSON file
        #[arg(short, long)]
        ruleset: String,
    },

    /// Classify one or more URL references against a ruleset
    Classify {
        /// Ruleset JSON file
        #[arg(short, long)]
        ruleset: String,

        /// URL references to classify
        #[arg(required = true)]
        urls: Vec<String>,

        /// Print diagnostics emitted for non-MATCH verdicts
        #[arg(short, long)]
        verbose: bool,
    },

    /// Classify a corpus of reference URLs and report a match-rate summary
    Check {
        /// Ruleset JSON file
        #[arg(short, long)]
        ruleset: String,

        /// Corpus file: one URL per line, optionally prefixed `EXPECT_VERDICT ` (MATCH/NOT_A_MATCH/INVALID)
        #[arg(short, long)]
        corpus: String,

        /// Fail if the match ratio drops below this threshold (0.0-1.0)
        #[arg(long, default_value = "0.0")]
        min_match_ratio: f64,
    },
}

fn main() {
    let cli = Cli::parse();
    env_logger::init();

    let result = match cli.command {
        Commands::Validate { ruleset } => cmd_validate(&ruleset),
        Commands::Classify { ruleset, urls, verbose } => cmd_classify(&ruleset, &urls, verbose),
        Commands::Check { ruleset, corpus, min_match_ratio } => cmd_check(&ruleset, &corpus, min_match_ratio),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_ruleset(path: &str) -> Result<urlguard_core::UrlClassifier, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("failed to read '{path}': {e}"))?;
    let spec = RulesetSpec::from_json(&text).map_err(|e| format!("failed to parse '{path}': {e}"))?;
    spec.build().map_err(|e| format!("failed to build ruleset from '{path}': {e}"))
}

fn cmd_validate(ruleset: &str) -> Result<(), String> {
    load_ruleset(ruleset)?;
    println!("Ruleset '{ruleset}' is valid");
    Ok(())
}

fn verdict_label(verdict: Classification) -> &'static str {
    match verdict {
        Classification::Match => "MATCH",
        Classification::NotAMatch => "NOT_A_MATCH",
        Classification::Invalid => "INVALID",
    }
}

fn cmd_classify(ruleset: &str, urls: &[String], verbose: bool) -> Result<(), String> {
    let classifier = load_ruleset(ruleset)?;
    let ctx = UrlContext::default_context();

    let printing = PrintingReceiver;
    for reference in urls {
        let url = UrlValue::new(ctx.clone(), reference);
        let verdict = if verbose {
            classifier.apply(&url, &printing)
        } else {
            classifier.apply(&url, null_receiver().as_ref())
        };

        println!("{}\t{}", verdict_label(verdict), reference);
    }

    Ok(())
}

fn cmd_check(ruleset: &str, corpus: &str, min_match_ratio: f64) -> Result<(), String> {
    let classifier = load_ruleset(ruleset)?;
    let ctx = UrlContext::default_context();

    let content = fs::read_to_string(corpus).map_err(|e| format!("failed to read '{corpus}': {e}"))?;

    let start = Instant::now();
    let mut total = 0usize;
    let mut matches = 0usize;
    let mut mismatches = 0usize;

    println!("Checking corpus '{}'...\n", Path::new(corpus).display());

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (expected, reference) = match line.split_once(' ') {
            Some((tag @ ("MATCH" | "NOT_A_MATCH" | "INVALID"), rest)) => (Some(tag), rest.trim()),
            _ => (None, line),
        };

        let url = UrlValue::new(ctx.clone(), reference);
        let verdict = classifier.apply(&url, null_receiver().as_ref());
        total += 1;

        if verdict == Classification::Match {
            matches += 1;
        }

        if let Some(expected) = expected {
            if expected != verdict_label(verdict) {
                mismatches += 1;
                println!("[MISMATCH] {reference} - expected {expected}, got {}", verdict_label(verdict));
            }
        }
    }

    let elapsed = start.elapsed();
    let ratio = if total > 0 { matches as f64 / total as f64 } else { 0.0 };

    println!("\n--- Summary ---");
    println!("Total references: {total}");
    println!("Matches:          {matches} ({:.1}%)", ratio * 100.0);
    println!("Mismatches:       {mismatches}");
    println!("Time:             {:.1}ms", elapsed.as_secs_f64() * 1000.0);

    if mismatches > 0 {
        return Err(format!("{mismatches} reference(s) classified against their expected verdict"));
    }
    if ratio < min_match_ratio {
        return Err(format!("match ratio {:.2}% is below threshold {:.2}%", ratio * 100.0, min_match_ratio * 100.0));
    }

    println!("\nAll checks passed");
    Ok(())
}
