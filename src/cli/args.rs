//! Command-line argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::RawFormId;
use crate::form::FormId;

/// Resolve the form a placed reference should be presented as.
#[derive(Parser, Debug)]
#[command(name = "formlens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve references and print the effective form of each.
    Resolve(ResolveArgs),

    /// Load the scene and configuration and report what was registered.
    Check(SceneArgs),
}

/// Inputs shared by every command.
#[derive(Args, Debug)]
pub struct SceneArgs {
    /// Lua scene script describing sources, forms, references and scripts.
    #[arg(long)]
    pub scene: PathBuf,

    /// Lookup configuration file or directory. May be repeated.
    #[arg(long = "config", value_name = "PATH")]
    pub configs: Vec<PathBuf>,
}

/// Arguments for the resolve command.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub scene: SceneArgs,

    /// Reference form ids (hex, `0x` prefix optional).
    #[arg(required = true, value_parser = parse_form_id)]
    pub references: Vec<FormId>,
}

fn parse_form_id(text: &str) -> Result<FormId, String> {
    RawFormId::parse(text)
        .map(|raw| FormId(raw.get()))
        .map_err(|err| err.to_string())
}
