//! Command-line parsing (minimal, no clap dependency)

use anyhow::{bail, Context, Result};
use didhd_core::{AddressKind, Language, WordCount};
use std::path::PathBuf;

/// What the process was asked to do
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Help,
    Version,
    Run(Options),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub config_path: Option<PathBuf>,
    pub validate_only: bool,
    pub command: Option<Command>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Generate a new mnemonic
    Mnemonic {
        language: Option<Language>,
        words: Option<WordCount>,
    },
    /// Derive key pairs from a mnemonic read on stdin
    Derive {
        language: Option<Language>,
        coin_type: Option<u32>,
        chain: u32,
        index: u32,
        count: u32,
        show_private: bool,
    },
    /// Encode a hex public key as an address
    Address {
        public_key: String,
        kind: AddressKind,
    },
    /// Print the identity's extended public (and optionally private) key
    Xpub {
        language: Option<Language>,
        coin_type: Option<u32>,
        show_private: bool,
    },
    /// Check a mnemonic read on stdin
    Check { language: Option<Language> },
}

/// Parse arguments, excluding the program name.
pub fn parse_args(args: &[String]) -> Result<Action> {
    let mut options = Options::default();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                let path = args
                    .get(i)
                    .context("--config requires a path argument")?;
                options.config_path = Some(PathBuf::from(path));
            }
            "--validate" => {
                options.validate_only = true;
            }
            "--help" | "-h" => return Ok(Action::Help),
            "--version" | "-V" => return Ok(Action::Version),
            name if options.command.is_none() && !name.starts_with('-') => {
                let (command, consumed) = parse_command(name, &args[i + 1..])?;
                options.command = Some(command);
                i += consumed;
            }
            other => bail!("Unknown argument: {}", other),
        }
        i += 1;
    }

    Ok(Action::Run(options))
}

/// Parse one command and its flags; returns how many trailing args it used.
fn parse_command(name: &str, rest: &[String]) -> Result<(Command, usize)> {
    let mut language = None;
    let mut words = None;
    let mut coin_type = None;
    let mut chain = 0;
    let mut index = 0;
    let mut count = 1;
    let mut show_private = false;
    let mut kind = AddressKind::Identity;
    let mut positional: Option<String> = None;

    let mut i = 0;
    while i < rest.len() {
        let flag = rest[i].as_str();

        match (name, flag) {
            (_, "--language" | "-l") if name != "address" => {
                language = Some(take_value(rest, &mut i, flag)?.parse::<Language>()?);
            }
            ("mnemonic", "--words" | "-w") => {
                words = Some(WordCount::from_words(parse_number(take_value(rest, &mut i, flag)?, flag)?)?);
            }
            ("derive" | "xpub", "--coin-type") => {
                coin_type = Some(parse_number(take_value(rest, &mut i, flag)?, flag)?);
            }
            ("derive", "--chain") => chain = parse_number(take_value(rest, &mut i, flag)?, flag)?,
            ("derive", "--index") => index = parse_number(take_value(rest, &mut i, flag)?, flag)?,
            ("derive", "--count") => count = parse_number(take_value(rest, &mut i, flag)?, flag)?,
            ("derive" | "xpub", "--show-private") => show_private = true,
            ("address", "--standard") => kind = AddressKind::Standard,
            ("address", arg) if positional.is_none() && !arg.starts_with('-') => {
                positional = Some(arg.to_string());
            }
            // Leave global flags to the caller
            (_, "--config" | "-c" | "--validate" | "--help" | "-h" | "--version" | "-V") => break,
            (_, other) => bail!("Unknown option for {}: {}", name, other),
        }
        i += 1;
    }

    let command = match name {
        "mnemonic" => Command::Mnemonic { language, words },
        "derive" => {
            anyhow::ensure!(count > 0, "--count must be at least 1");
            Command::Derive {
                language,
                coin_type,
                chain,
                index,
                count,
                show_private,
            }
        }
        "address" => Command::Address {
            public_key: positional.context("address requires a hex public key")?,
            kind,
        },
        "xpub" => Command::Xpub {
            language,
            coin_type,
            show_private,
        },
        "check" => Command::Check { language },
        other => bail!("Unknown command: {}", other),
    };
    Ok((command, i))
}

fn take_value<'a>(rest: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str> {
    *i += 1;
    rest.get(*i)
        .map(String::as_str)
        .with_context(|| format!("{} requires a value", flag))
}

fn parse_number<T: std::str::FromStr>(value: &str, flag: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("{} expects a number, got {}", flag, value))
}
