use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::prompt::Locale;

#[derive(Parser, Debug)]
#[command(name = "eduforge")]
#[command(version, about = "Turn a teaching-tool description into a single-file web app")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: ./eduforge.toml, then the user config dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where artifacts are saved
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Prompt and message language (en, sr)
    #[arg(long, global = true)]
    pub locale: Option<Locale>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a template specification to start from
    New {
        /// Target file (.json, or .yaml/.yml)
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check a specification for missing fields
    Validate {
        /// Specification file
        spec: PathBuf,
    },

    /// Print the request a specification compiles to, without sending it
    Prompt {
        /// Specification file
        spec: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a tool from a specification
    Generate {
        /// Specification file
        spec: PathBuf,

        /// Describe this image and append it to the initial state first
        #[arg(long, value_name = "IMAGE")]
        scene: Option<PathBuf>,

        /// Also write a zip archive
        #[arg(long)]
        zip: bool,
    },

    /// Revise a saved tool with an instruction
    Revise {
        /// Artifact directory
        artifact: PathBuf,

        /// What to change
        instruction: String,

        /// Also write a zip archive
        #[arg(long)]
        zip: bool,
    },

    /// Describe a sketch or screenshot as a scene paragraph
    Describe {
        /// Image file (png, jpg, gif, webp)
        image: PathBuf,
    },

    /// Zip a saved tool
    Archive {
        /// Artifact directory
        artifact: PathBuf,
    },

    /// List saved tools, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive specify / preview / converse wizard
    Studio {
        /// Start from this specification
        #[arg(long)]
        spec: Option<PathBuf>,
    },

    /// Serve saved tools on localhost
    Preview {
        /// Artifact directory served at / (default: newest)
        artifact: Option<PathBuf>,

        #[arg(long, default_value_t = crate::preview::DEFAULT_PORT)]
        port: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "eduforge",
            "list",
            "--output-dir",
            "out",
            "--locale",
            "sr",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.locale, Some(Locale::Serbian));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_bad_locale_rejected() {
        assert!(Cli::try_parse_from(["eduforge", "--locale", "xx", "list"]).is_err());
    }
}
