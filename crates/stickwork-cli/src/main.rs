//! Stickwork CLI - Command-line interface for drum performance generation
//!
//! This binary generates performances from JSON configs, checks them
//! against the sticking rules and lists the built-in limb presets.

use clap::Parser;
use std::process::ExitCode;

use stickwork_cli::commands::generate::GenerateOptions;
use stickwork_cli::{commands, logging};

mod cli_args;

use cli_args::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            config,
            seed,
            bars_only,
            output,
            pretty,
        } => commands::generate::run(
            &config,
            &GenerateOptions {
                seed,
                bars_only,
                output,
                pretty,
            },
        ),
        Commands::Check {
            config,
            disable_rules,
            json,
        } => commands::check::run(&config, &disable_rules, json),
        Commands::Presets { json } => commands::presets::run(json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_generate() {
        let cli = Cli::try_parse_from(["stickwork", "generate", "--config", "song.json"]).unwrap();
        assert!(!cli.verbose);
        match cli.command {
            Commands::Generate {
                config,
                seed,
                bars_only,
                output,
                pretty,
            } => {
                assert_eq!(config, "song.json");
                assert_eq!(seed, None);
                assert!(!bars_only);
                assert_eq!(output, None);
                assert!(!pretty);
            }
            _ => panic!("expected generate command"),
        }
    }

    #[test]
    fn test_cli_parses_generate_with_options() {
        let cli = Cli::try_parse_from([
            "stickwork",
            "generate",
            "-c",
            "song.json",
            "--seed",
            "42",
            "--bars-only",
            "-o",
            "out.json",
            "--pretty",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate {
                config,
                seed,
                bars_only,
                output,
                pretty,
            } => {
                assert_eq!(config, "song.json");
                assert_eq!(seed, Some(42));
                assert!(bars_only);
                assert_eq!(output.as_deref(), Some("out.json"));
                assert!(pretty);
            }
            _ => panic!("expected generate command"),
        }
    }

    #[test]
    fn test_cli_requires_config_for_generate() {
        let err = Cli::try_parse_from(["stickwork", "generate"]).err().unwrap();
        assert!(err.to_string().contains("--config"));
    }

    #[test]
    fn test_cli_parses_check_with_disabled_rules() {
        let cli = Cli::try_parse_from([
            "stickwork",
            "check",
            "--config",
            "song.json",
            "--disable-rule",
            "sticking/max-ghost-notes",
            "--disable-rule",
            "sticking/max-consecutive-limb",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Check {
                config,
                disable_rules,
                json,
            } => {
                assert_eq!(config, "song.json");
                assert_eq!(
                    disable_rules,
                    vec!["sticking/max-ghost-notes", "sticking/max-consecutive-limb"]
                );
                assert!(json);
            }
            _ => panic!("expected check command"),
        }
    }

    #[test]
    fn test_cli_verbose_is_global() {
        let cli = Cli::try_parse_from(["stickwork", "presets", "--verbose"]).unwrap();
        assert!(cli.verbose);
        let cli = Cli::try_parse_from(["stickwork", "-v", "presets", "--json"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Presets { json } => assert!(json),
            _ => panic!("expected presets command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_seed() {
        assert!(
            Cli::try_parse_from(["stickwork", "generate", "-c", "a.json", "--seed", "-1"]).is_err()
        );
    }
}
