use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "opabridge",
    about = "Version-adaptive bridge to the OPA policy CLI",
    version
)]
pub struct Cli {
    /// Explicit path to the opa executable (wins over PATH discovery;
    /// falls back to $OPABRIDGE_OPA_PATH)
    #[arg(long, global = true)]
    pub opa_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report the installed OPA version and the calling-convention decision
    Version {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a policy module and print its package and imports
    Parse {
        /// Path to the Rego file
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the canonical data-root representation for a directory
    DataRoot {
        /// Directory holding policy data
        dir: PathBuf,
    },

    /// Render an AST reference (JSON array of segments) as a display string
    FormatRef {
        /// Segments, e.g. '[{"type":"var","value":"input"},{"type":"string","value":"a"}]'
        segments: String,
    },
}
