//! hashcrack command line, built on clap derive.
//!
//! Subcommands: `crack`, `hash`, `techniques`. `--verbose` and `--config`
//! are global.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::hashing::HashAlgorithm;
use crate::technique::TechniqueKind;

/// Concurrent password-hash cracking with a time budget.
#[derive(Debug, Parser)]
#[command(name = "hashcrack", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Path to a hashcrack.toml.
    #[arg(long, global = true, env = "HASHCRACK_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Technique names accepted on the command line, mapped to [`TechniqueKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TechniqueArg {
    #[value(alias = "brute_force")]
    BruteForce,
    #[value(alias = "dictionary_attack")]
    Dictionary,
    #[value(alias = "rainbow_table")]
    Rainbow,
    #[value(alias = "hybrid_attack")]
    Hybrid,
    #[value(alias = "mask_attack")]
    Mask,
}

impl From<TechniqueArg> for TechniqueKind {
    fn from(arg: TechniqueArg) -> Self {
        match arg {
            TechniqueArg::BruteForce => TechniqueKind::BruteForce,
            TechniqueArg::Dictionary => TechniqueKind::Dictionary,
            TechniqueArg::Rainbow => TechniqueKind::RainbowTable,
            TechniqueArg::Hybrid => TechniqueKind::Hybrid,
            TechniqueArg::Mask => TechniqueKind::Mask,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlgorithmArg {
    Md5,
    Sha256,
}

impl From<AlgorithmArg> for HashAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Md5 => HashAlgorithm::Md5,
            AlgorithmArg::Sha256 => HashAlgorithm::Sha256,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit a hash and follow the job until it finishes.
    Crack {
        /// Hex digest to crack.
        hash: String,

        #[arg(long, short, value_enum, default_value_t = AlgorithmArg::Md5)]
        algorithm: AlgorithmArg,

        /// Job time budget in seconds; 0 runs until a verdict.
        #[arg(long, default_value_t = 10)]
        max_time: u64,

        /// Run only these techniques (repeatable).
        #[arg(long, value_enum, conflicts_with = "disable")]
        only: Vec<TechniqueArg>,

        /// Skip these techniques (repeatable).
        #[arg(long, value_enum)]
        disable: Vec<TechniqueArg>,

        /// Newline-separated wordlist used by the dictionary and hybrid attacks.
        #[arg(long)]
        dictionary: Option<PathBuf>,

        /// Write the plain-text report to this file.
        #[arg(long)]
        export: Option<PathBuf>,

        /// Print the result as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the digest of a plaintext.
    Hash {
        plaintext: String,

        #[arg(long, short, value_enum, default_value_t = AlgorithmArg::Md5)]
        algorithm: AlgorithmArg,
    },

    /// List techniques and whether the current config enables them.
    Techniques,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_crack_defaults() {
        let cli = Cli::parse_from(["hashcrack", "crack", "5f4dcc3b5aa765d61d8327deb882cf99"]);
        match cli.command {
            Command::Crack {
                hash,
                algorithm,
                max_time,
                only,
                disable,
                dictionary,
                export,
                json,
            } => {
                assert_eq!(hash, "5f4dcc3b5aa765d61d8327deb882cf99");
                assert_eq!(algorithm, AlgorithmArg::Md5);
                assert_eq!(max_time, 10);
                assert!(only.is_empty());
                assert!(disable.is_empty());
                assert!(dictionary.is_none());
                assert!(export.is_none());
                assert!(!json);
            }
            _ => panic!("expected Crack command"),
        }
    }

    #[test]
    fn cli_parses_technique_selection() {
        let cli = Cli::parse_from([
            "hashcrack",
            "crack",
            "abc",
            "--algorithm",
            "sha256",
            "--only",
            "dictionary",
            "--only",
            "brute-force",
            "--max-time",
            "1",
        ]);
        match cli.command {
            Command::Crack {
                algorithm,
                only,
                max_time,
                ..
            } => {
                assert_eq!(HashAlgorithm::from(algorithm), HashAlgorithm::Sha256);
                let kinds: Vec<TechniqueKind> = only.into_iter().map(Into::into).collect();
                assert_eq!(kinds, vec![TechniqueKind::Dictionary, TechniqueKind::BruteForce]);
                assert_eq!(max_time, 1);
            }
            _ => panic!("expected Crack command"),
        }
    }

    #[test]
    fn cli_accepts_wire_names() {
        let cli = Cli::parse_from(["hashcrack", "crack", "abc", "--disable", "rainbow_table"]);
        match cli.command {
            Command::Crack { disable, .. } => {
                assert_eq!(disable, vec![TechniqueArg::Rainbow]);
            }
            _ => panic!("expected Crack command"),
        }
    }

    #[test]
    fn only_and_disable_conflict() {
        let parsed = Cli::try_parse_from([
            "hashcrack", "crack", "abc", "--only", "mask", "--disable", "hybrid",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from(["hashcrack", "--verbose", "--config", "alt.toml", "techniques"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        assert!(matches!(cli.command, Command::Techniques));
    }

    #[test]
    fn cli_parses_hash_subcommand() {
        let cli = Cli::parse_from(["hashcrack", "hash", "password", "-a", "sha256"]);
        match cli.command {
            Command::Hash {
                plaintext,
                algorithm,
            } => {
                assert_eq!(plaintext, "password");
                assert_eq!(algorithm, AlgorithmArg::Sha256);
            }
            _ => panic!("expected Hash command"),
        }
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
