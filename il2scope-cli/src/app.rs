use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// il2scope - IL2CPP declaration dumper
#[derive(Debug, Parser)]
#[command(name = "il2scope", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit summaries as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write dump.cs and dump.json for a metadata snapshot.
    Dump {
        /// Path to the metadata snapshot (JSON).
        #[arg(value_name = "SNAPSHOT")]
        snapshot: PathBuf,

        /// Directory the artifacts are written to.
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        selection: DumpSelection,
    },

    /// Display a snapshot overview: version, images and table sizes.
    Info {
        /// Path to the metadata snapshot (JSON).
        #[arg(value_name = "SNAPSHOT")]
        snapshot: PathBuf,
    },
}

/// Output selection, applied on top of the configuration file.
#[derive(Debug, Args)]
pub struct DumpSelection {
    /// Configuration file (config.json layout); defaults apply when omitted.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not dump methods.
    #[arg(long)]
    pub no_methods: bool,

    /// Do not dump fields.
    #[arg(long)]
    pub no_fields: bool,

    /// Do not dump properties.
    #[arg(long)]
    pub no_properties: bool,

    /// Do not dump custom attributes.
    #[arg(long)]
    pub no_attributes: bool,

    /// Do not annotate field offsets.
    #[arg(long)]
    pub no_field_offsets: bool,

    /// Do not annotate method addresses and slots.
    #[arg(long)]
    pub no_method_offsets: bool,

    /// Do not annotate type definition indices.
    #[arg(long)]
    pub no_typedef_index: bool,

    /// Do not write dump.cs.
    #[arg(long)]
    pub no_cs: bool,

    /// Do not write dump.json.
    #[arg(long)]
    pub no_json: bool,

    /// Assemble images in parallel.
    #[arg(long)]
    pub parallel: bool,
}
