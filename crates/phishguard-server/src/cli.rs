//! Command-line interface

use clap::{Args, Parser, Subcommand};
use crate::config::DEFAULT_CONFIG_PATH;
use phishguard_classifier::{DevicePreference, DEFAULT_REPO};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "phishguard")]
#[command(author, version, about = "Phishing URL classification service")]
#[command(args_conflicts_with_subcommands = true)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Serve options used when no subcommand is given
    #[command(flatten)]
    pub serve: ServeArgs,
}

impl Cli {
    /// Resolve the command to run; serving is the default
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Serve(self.serve))
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the model and serve POST /predict
    Serve(ServeArgs),

    /// Download the classifier artifact from the Hugging Face Hub
    Download(DownloadArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Configuration file path
    #[arg(short, long, env = "PHISHGUARD_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Model artifact directory
    #[arg(short, long, env = "PHISHGUARD_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Device: auto, cpu or gpu
    #[arg(short, long, value_parser = parse_device)]
    pub device: Option<DevicePreference>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Hugging Face model repository
    #[arg(short, long, default_value = DEFAULT_REPO)]
    pub repo: String,

    /// Repository revision
    #[arg(long, default_value = "main")]
    pub revision: String,

    /// Destination directory
    #[arg(short, long, default_value = "./")]
    pub dest: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_device(s: &str) -> Result<DevicePreference, String> {
    match s.to_lowercase().as_str() {
        "auto" => Ok(DevicePreference::Auto),
        "cpu" => Ok(DevicePreference::Cpu),
        "gpu" | "cuda" | "metal" => Ok(DevicePreference::Gpu),
        other => Err(format!("unknown device '{}', expected auto, cpu or gpu", other)),
    }
}
