//! Command-line interface for the hppuml utility
//!
//! Provides a CLI to convert C++ header files into PlantUML class diagrams.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::debug;

use hppuml::core::logging::init_logging;
use hppuml::create_plantuml_file;
use hppuml::uml::DiagramConfig;

/// hppuml - Convert C++ header files to PlantUML
#[derive(Parser, Debug)]
#[command(name = "hppuml")]
#[command(about = "A Rust utility to convert C++ header files into PlantUML class diagrams")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    /// Input header file; repeat the flag or use wildcards for several
    #[arg(short = 'i', long = "input-file", value_name = "HEADER-FILE", required = true)]
    pub input_files: Vec<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long = "output-file", value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Infer dependency links from method parameter types
    #[arg(short = 'd', long = "enable-dependency")]
    pub enable_dependency: bool,

    /// Template file overriding the built-in one
    #[arg(short = 't', long = "template-file", value_name = "TEMPLATE-FILE")]
    pub template_file: Option<PathBuf>,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Diagram options selected by the flags
    pub fn diagram_config(&self) -> DiagramConfig {
        let config = DiagramConfig::default().with_dependency(self.enable_dependency);
        match &self.template_file {
            Some(path) => config.with_template_file(path),
            None => config,
        }
    }
}

/// Log level options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

/// Main CLI application
#[derive(Debug, Default)]
pub struct HppumlApp;

impl HppumlApp {
    pub fn new() -> Self {
        Self
    }

    /// Run the application with the given CLI arguments
    pub fn run(&self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over flags
        let log_level_str = std::env::var("HPPUML_LOG_LEVEL")
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| cli.log_level.as_str().to_string());

        let log_format_str = std::env::var("HPPUML_LOG_FORMAT")
            .ok()
            .unwrap_or_else(|| cli.log_format.as_str().to_string());

        if let Err(e) = init_logging(Some(&log_level_str), Some(&log_format_str)) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        self.convert(&cli)
    }

    /// Render the input files to the output file or stdout
    pub fn convert(&self, cli: &Cli) -> Result<()> {
        debug!(
            inputs = cli.input_files.len(),
            dependency = cli.enable_dependency,
            "Converting header files"
        );
        create_plantuml_file(
            cli.input_files.as_slice(),
            cli.output_file.as_deref(),
            cli.diagram_config(),
        )?;
        Ok(())
    }
}
