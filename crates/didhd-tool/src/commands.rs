//! Command implementations. Each writes its report to `out`.

use anyhow::{Context, Result};
use didhd_core::{
    derive_key_pair, detect_language, encode_address_as, generate_mnemonic_with,
    validate_mnemonic, AddressKind, DerivationPath, HdKeyError, KeyPath, Language,
    MasterIdentity, OsEntropy, Wipe, WordCount, PUBLICKEY_BYTES,
};
use didhd_spv::Did;
use std::io::Write;
use zeroize::Zeroizing;

use crate::config::ToolConfig;

/// Write a fresh mnemonic.
pub fn mnemonic(
    config: &ToolConfig,
    language: Option<Language>,
    words: Option<WordCount>,
    out: &mut impl Write,
) -> Result<()> {
    let language = language.map_or_else(|| config.language(), Ok)?;
    let words = words.map_or_else(|| config.word_count(), Ok)?;

    let phrase = Zeroizing::new(generate_mnemonic_with(language, words, &OsEntropy)?);
    writeln!(out, "{}", phrase.as_str())?;
    Ok(())
}

pub struct DeriveRequest {
    pub language: Option<Language>,
    pub coin_type: Option<u32>,
    pub chain: u32,
    pub index: u32,
    pub count: u32,
    pub show_private: bool,
}

/// Derive `count` consecutive key pairs and write one block per key.
///
/// Indices whose child key is out of range are reported and skipped.
pub fn derive(
    config: &ToolConfig,
    mnemonic: &str,
    passphrase: &str,
    request: &DeriveRequest,
    out: &mut impl Write,
) -> Result<()> {
    let language = resolve_language(mnemonic, request.language)?;
    let coin_type = request.coin_type.unwrap_or(config.keys.coin_type);

    let adapter = config.adapter_config()?;

    let mut identity = MasterIdentity::from_mnemonic(mnemonic, passphrase, language, coin_type)
        .context("Failed to build identity from mnemonic")?;
    log::info!(
        "Identity {:08x} ({} mnemonic, coin type {})",
        identity.fingerprint(),
        language,
        coin_type
    );
    writeln!(out, "network:  {}", adapter.network)?;
    writeln!(out, "resolver: {}", adapter.resolver)?;

    for offset in 0..request.count {
        let index = request
            .index
            .checked_add(offset)
            .context("index range overflows")?;
        let path = KeyPath::new(coin_type, request.chain, index)?;

        let mut pair = match derive_key_pair(&identity, coin_type, request.chain, index) {
            Ok(pair) => pair,
            Err(HdKeyError::DerivationOverflow { depth, index }) => {
                log::warn!("No valid key at depth {} index {}, skipping", depth, index);
                writeln!(out, "{}  (skipped: out of range)", path)?;
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to derive {}", path)),
        };

        writeln!(out, "{}", path)?;
        writeln!(out, "  address:     {}", pair.address())?;
        writeln!(out, "  did:         {}", Did::from_key_pair(&pair)?)?;
        writeln!(out, "  public key:  {}", hex::encode(pair.public_key()))?;
        if request.show_private {
            let private = Zeroizing::new(hex::encode(pair.private_key()));
            writeln!(out, "  private key: {}", private.as_str())?;
        }
        pair.wipe();
    }

    identity.wipe();
    Ok(())
}

/// Write the address of a hex-encoded compressed public key.
pub fn address(public_key_hex: &str, kind: AddressKind, out: &mut impl Write) -> Result<()> {
    let bytes = hex::decode(public_key_hex.trim()).context("public key is not valid hex")?;
    let public_key: [u8; PUBLICKEY_BYTES] = bytes.as_slice().try_into().map_err(|_| {
        anyhow::anyhow!(
            "public key must be {} bytes, got {}",
            PUBLICKEY_BYTES,
            bytes.len()
        )
    })?;

    writeln!(out, "{}", encode_address_as(&public_key, kind)?)?;
    Ok(())
}

/// Write the identity node's extended public key, and with `show_private`
/// its extended private key.
pub fn xpub(
    config: &ToolConfig,
    mnemonic: &str,
    passphrase: &str,
    language: Option<Language>,
    coin_type: Option<u32>,
    show_private: bool,
    out: &mut impl Write,
) -> Result<()> {
    let language = resolve_language(mnemonic, language)?;
    let coin_type = coin_type.unwrap_or(config.keys.coin_type);

    let mut identity = MasterIdentity::from_mnemonic(mnemonic, passphrase, language, coin_type)
        .context("Failed to build identity from mnemonic")?;
    let xpub = identity.extended_public_key()?;
    let xprv = if show_private {
        Some(identity.extended_private_key()?)
    } else {
        None
    };
    identity.wipe();

    writeln!(out, "{}", DerivationPath::identity(coin_type)?)?;
    writeln!(out, "  fingerprint: {:08x}", xpub.fingerprint())?;
    writeln!(out, "  xpub:        {}", xpub.to_base58())?;
    if let Some(xprv) = xprv {
        writeln!(out, "  xprv:        {}", xprv.to_base58().as_str())?;
    }
    Ok(())
}

/// Validate a mnemonic and report its language.
pub fn check(mnemonic: &str, language: Option<Language>, out: &mut impl Write) -> Result<()> {
    let language = resolve_language(mnemonic, language)?;
    validate_mnemonic(language, mnemonic)?;

    let words = mnemonic.split_whitespace().count();
    writeln!(out, "valid {} mnemonic, {} words", language, words)?;
    Ok(())
}

/// The explicit language, else the one the mnemonic's words (and, when they
/// fit several lists, its checksum) belong to.
fn resolve_language(mnemonic: &str, language: Option<Language>) -> Result<Language> {
    match language {
        Some(language) => Ok(language),
        None => detect_language(mnemonic).context("Could not detect mnemonic language"),
    }
}
