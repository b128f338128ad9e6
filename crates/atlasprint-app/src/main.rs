// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Atlasprint — command-line runner for the atlas print request filter.
//
// Loads a project, answers one WMS-style request given as KEY=VALUE pairs and
// writes the response body to a file or stdout.

mod services;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use atlasprint_server::FilterOutcome;
use services::app_services::AppServices;

#[derive(Debug, Parser)]
#[command(name = "atlasprint", version, about = "Print atlas pages for a filtered feature set")]
struct Cli {
    /// Project description (JSON).
    #[arg(long, env = "ATLASPRINT_PROJECT")]
    project: PathBuf,

    /// Filter configuration (JSON).
    #[arg(long, env = "ATLASPRINT_CONFIG")]
    config: Option<PathBuf>,

    /// Plugin descriptor with a `[general]` name and version.
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Write the response body here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Request parameters, e.g. SERVICE=WMS REQUEST=GetPrintAtlas.
    #[arg(value_parser = parse_key_value, required = true)]
    params: Vec<(String, String)>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let services = match AppServices::init(&cli.project, cli.config.as_deref(), cli.metadata.as_deref()) {
        Ok(services) => services,
        Err(e) => {
            init_logging("info");
            tracing::error!(error = %e, "startup failed");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&services.config.log_filter);
    tracing::info!("Atlasprint starting");

    let (outcome, handler) = services.handle(cli.params);

    let status = match outcome {
        FilterOutcome::PassThrough => "pass-through".to_string(),
        FilterOutcome::Responded(code) => code.to_string(),
    };
    eprintln!("status: {status}");
    for (name, value) in handler.headers() {
        eprintln!("{name}: {value}");
    }

    let written = match &cli.output {
        Some(path) => std::fs::write(path, handler.body()),
        None => std::io::stdout().lock().write_all(handler.body()),
    };
    if let Err(e) = written {
        tracing::error!(error = %e, "failed to write response body");
        return ExitCode::FAILURE;
    }

    match outcome {
        FilterOutcome::Responded(code) if code != 200 => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

/// `RUST_LOG` wins over the configured filter.
fn init_logging(fallback: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_pairs() {
        assert_eq!(
            parse_key_value("EXP_FILTER=$id = 3"),
            Ok(("EXP_FILTER".to_string(), "$id = 3".to_string()))
        );
        assert_eq!(parse_key_value("TEMPLATE="), Ok(("TEMPLATE".into(), String::new())));
        assert!(parse_key_value("=x").is_err());
        assert!(parse_key_value("SERVICE").is_err());
    }

    #[test]
    fn cli_parses_request() {
        let cli = Cli::try_parse_from([
            "atlasprint",
            "--project",
            "p.json",
            "-o",
            "out.pdf",
            "SERVICE=WMS",
            "REQUEST=GetCapabilitiesAtlas",
        ])
        .unwrap();
        assert_eq!(cli.params.len(), 2);
        assert_eq!(cli.output, Some(PathBuf::from("out.pdf")));
    }
}
