//! didhd tool: command-line front end for HD identity keys
//!
//! Mnemonics are read from stdin, never from arguments, so they stay out of
//! shell history and process listings. The BIP-39 passphrase comes from
//! `DIDHD_PASSPHRASE`.
//!
//! # Usage
//!
//! ```bash
//! didhd-tool mnemonic --language english --words 24
//! didhd-tool derive --index 0 --count 5 < mnemonic.txt
//! didhd-tool address 02a1b2...
//! didhd-tool --config didhd.toml --validate
//! ```

mod cli;
mod commands;
mod config;

use anyhow::{Context, Result};
use cli::{Action, Command};
use std::io::BufRead;
use zeroize::Zeroizing;

fn main() -> Result<()> {
    // Keep seed material out of core files
    didhd_core::memory::disable_core_dumps();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match cli::parse_args(&args)? {
        Action::Help => {
            print_help();
            return Ok(());
        }
        Action::Version => {
            println!("didhd-tool {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Action::Run(options) => options,
    };

    // Load config
    let mut tool_config = match options.config_path {
        Some(ref path) => config::ToolConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => config::ToolConfig::default(),
    };

    // Apply env overrides
    tool_config.apply_env_overrides()?;

    // Validate
    tool_config
        .validate()
        .context("Configuration validation failed")?;

    // Init logger; RUST_LOG still wins when set
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(tool_config.logging.level.as_str()),
    )
    .init();

    if options.validate_only {
        let adapter = tool_config.adapter_config()?;
        println!("✅ Configuration is valid.");
        println!("  Language:   {}", tool_config.keys.language);
        println!("  Words:      {}", tool_config.keys.word_count);
        println!("  Coin type:  {}", tool_config.keys.coin_type);
        println!("  Network:    {}", adapter.network);
        println!("  Resolver:   {}", adapter.resolver);
        println!("  Wallet:     {} ({})", adapter.wallet_id, adapter.wallet_dir.display());
        return Ok(());
    }

    let Some(command) = options.command else {
        print_help();
        anyhow::bail!("No command given");
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Command::Mnemonic { language, words } => {
            commands::mnemonic(&tool_config, language, words, &mut out)
        }
        Command::Derive {
            language,
            coin_type,
            chain,
            index,
            count,
            show_private,
        } => {
            let mnemonic = read_mnemonic()?;
            let request = commands::DeriveRequest {
                language,
                coin_type,
                chain,
                index,
                count,
                show_private,
            };
            commands::derive(&tool_config, &mnemonic, &passphrase(), &request, &mut out)
        }
        Command::Address { public_key, kind } => commands::address(&public_key, kind, &mut out),
        Command::Xpub {
            language,
            coin_type,
            show_private,
        } => {
            let mnemonic = read_mnemonic()?;
            commands::xpub(
                &tool_config,
                &mnemonic,
                &passphrase(),
                language,
                coin_type,
                show_private,
                &mut out,
            )
        }
        Command::Check { language } => {
            let mnemonic = read_mnemonic()?;
            commands::check(&mnemonic, language, &mut out)
        }
    }
}

/// First line of stdin, trimmed.
fn read_mnemonic() -> Result<Zeroizing<String>> {
    let mut line = Zeroizing::new(String::new());
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read mnemonic from stdin")?;
    let trimmed = Zeroizing::new(line.trim().to_string());
    anyhow::ensure!(!trimmed.is_empty(), "No mnemonic on stdin");
    Ok(trimmed)
}

fn passphrase() -> Zeroizing<String> {
    Zeroizing::new(std::env::var("DIDHD_PASSPHRASE").unwrap_or_default())
}

fn print_help() {
    println!(
        r#"didhd-tool: HD identity keys for DID

USAGE:
    didhd-tool [OPTIONS] <COMMAND> [COMMAND OPTIONS]

COMMANDS:
    mnemonic              Generate a new mnemonic
        -l, --language <LANG>   english, french, spanish, japanese,
                                chinese_simplified, chinese_traditional
        -w, --words <N>         12, 15, 18, 21 or 24
    derive                Derive key pairs from a mnemonic on stdin,
                          with the network and resolver for their DIDs
        -l, --language <LANG>   Mnemonic language (detected when omitted)
        --coin-type <N>         BIP-44 coin type
        --chain <N>             0 external, 1 change (default: 0)
        --index <N>             First index (default: 0)
        --count <N>             Number of keys (default: 1)
        --show-private          Also print private keys
    address <HEX>         Encode a compressed public key as an address
        --standard              Wallet address instead of identity address
    xpub                  Print the identity's extended public key
        -l, --language <LANG>   Mnemonic language (detected when omitted)
        --coin-type <N>         BIP-44 coin type
        --show-private          Also print the extended private key
    check                 Validate a mnemonic on stdin
        -l, --language <LANG>   Expected language

OPTIONS:
    -c, --config <PATH>   Config file path (TOML)
    --validate            Validate configuration and exit
    -h, --help            Show this help message
    -V, --version         Show version

ENVIRONMENT VARIABLES (override config file):
    DIDHD_LANGUAGE        Mnemonic language
    DIDHD_WORD_COUNT      Words per generated mnemonic
    DIDHD_COIN_TYPE       BIP-44 coin type
    DIDHD_LOG_LEVEL       Log level (error/warn/info/debug/trace)
    DIDHD_NETWORK         ID chain network (mainnet/testnet)
    DIDHD_RESOLVER        Resolver URL
    DIDHD_PASSPHRASE      BIP-39 passphrase for derive and xpub

EXAMPLES:
    # New 24-word Japanese mnemonic
    didhd-tool mnemonic --language japanese --words 24

    # First five identity addresses
    didhd-tool derive --count 5 < mnemonic.txt

    # Validate configuration
    didhd-tool --config didhd.toml --validate
"#
    );
}
