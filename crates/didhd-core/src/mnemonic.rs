//! BIP-39 mnemonic generation and validation
//!
//! Six wordlists are supported, selected by a closed [`Language`] enum.
//! Japanese phrases are joined with the ideographic space (U+3000), every
//! other language with an ASCII space.

use std::fmt;
use std::str::FromStr;

use bip39::Mnemonic;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::entropy::{EntropySource, OsEntropy};
use crate::{HdKeyError, Result};

/// Mnemonic wordlist language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    French,
    Spanish,
    Japanese,
    ChineseSimplified,
    ChineseTraditional,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::French,
        Language::Spanish,
        Language::Japanese,
        Language::ChineseSimplified,
        Language::ChineseTraditional,
    ];

    /// Map a numeric language selector (0..=5) to a language.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Self::English),
            1 => Ok(Self::French),
            2 => Ok(Self::Spanish),
            3 => Ok(Self::Japanese),
            4 => Ok(Self::ChineseSimplified),
            5 => Ok(Self::ChineseTraditional),
            other => Err(HdKeyError::InvalidArgument(format!(
                "unsupported language code {}",
                other
            ))),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::English => 0,
            Self::French => 1,
            Self::Spanish => 2,
            Self::Japanese => 3,
            Self::ChineseSimplified => 4,
            Self::ChineseTraditional => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::English => "english",
            Self::French => "french",
            Self::Spanish => "spanish",
            Self::Japanese => "japanese",
            Self::ChineseSimplified => "chinese_simplified",
            Self::ChineseTraditional => "chinese_traditional",
        }
    }

    /// Canonical word separator for phrases in this language
    pub fn separator(self) -> &'static str {
        match self {
            Self::Japanese => "\u{3000}",
            _ => " ",
        }
    }

    pub(crate) fn to_bip39(self) -> bip39::Language {
        match self {
            Self::English => bip39::Language::English,
            Self::French => bip39::Language::French,
            Self::Spanish => bip39::Language::Spanish,
            Self::Japanese => bip39::Language::Japanese,
            Self::ChineseSimplified => bip39::Language::SimplifiedChinese,
            Self::ChineseTraditional => bip39::Language::TraditionalChinese,
        }
    }

    fn from_bip39(language: bip39::Language) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.to_bip39() == language)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = HdKeyError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|language| language.name() == lower)
            .ok_or_else(|| HdKeyError::InvalidArgument(format!("unsupported language: {}", s)))
    }
}

/// Mnemonic length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordCount {
    /// 128 bits of entropy
    #[default]
    Words12,
    /// 160 bits
    Words15,
    /// 192 bits
    Words18,
    /// 224 bits
    Words21,
    /// 256 bits
    Words24,
}

impl WordCount {
    pub fn from_words(words: usize) -> Result<Self> {
        match words {
            12 => Ok(Self::Words12),
            15 => Ok(Self::Words15),
            18 => Ok(Self::Words18),
            21 => Ok(Self::Words21),
            24 => Ok(Self::Words24),
            other => Err(HdKeyError::InvalidArgument(format!(
                "invalid word count {}. Use 12, 15, 18, 21, or 24",
                other
            ))),
        }
    }

    pub fn words(self) -> usize {
        match self {
            Self::Words12 => 12,
            Self::Words15 => 15,
            Self::Words18 => 18,
            Self::Words21 => 21,
            Self::Words24 => 24,
        }
    }

    /// Entropy length in bytes: 4 bytes per 3 words
    pub fn entropy_bytes(self) -> usize {
        self.words() / 3 * 4
    }
}

/// Generate a new 12-word mnemonic from the operating system RNG.
pub fn generate_mnemonic(language: Language) -> Result<String> {
    generate_mnemonic_with(language, WordCount::default(), &OsEntropy)
}

/// Generate a mnemonic of the given length, drawing entropy from `source`.
pub fn generate_mnemonic_with(
    language: Language,
    word_count: WordCount,
    source: &dyn EntropySource,
) -> Result<String> {
    let len = word_count.entropy_bytes();
    let mut entropy = Zeroizing::new([0u8; 32]);
    source.fill(&mut entropy[..len])?;

    let mnemonic = Mnemonic::from_entropy_in(language.to_bip39(), &entropy[..len])
        .map_err(|e| HdKeyError::InvalidArgument(e.to_string()))?;

    log::debug!(
        "Generated {}-word {} mnemonic",
        word_count.words(),
        language
    );
    Ok(join_words(&mnemonic, language))
}

fn join_words(mnemonic: &Mnemonic, language: Language) -> String {
    mnemonic
        .words()
        .collect::<Vec<_>>()
        .join(language.separator())
}

/// Parse a phrase against one language's wordlist, checking the checksum.
pub(crate) fn parse(language: Language, phrase: &str) -> Result<Mnemonic> {
    if phrase.trim().is_empty() {
        return Err(HdKeyError::InvalidMnemonic("mnemonic is empty".into()));
    }
    Mnemonic::parse_in(language.to_bip39(), phrase)
        .map_err(|e| HdKeyError::InvalidMnemonic(e.to_string()))
}

/// Validate a mnemonic against a language's wordlist and checksum.
pub fn validate_mnemonic(language: Language, mnemonic: &str) -> Result<()> {
    if mnemonic.is_empty() {
        return Err(HdKeyError::InvalidArgument("mnemonic is empty".into()));
    }
    parse(language, mnemonic).map(|_| ())
}

/// Whether `mnemonic` is a valid phrase in `language`.
pub fn is_valid_mnemonic(language: Language, mnemonic: &str) -> bool {
    validate_mnemonic(language, mnemonic).is_ok()
}

/// Guess the wordlist a phrase was written in.
///
/// When every word fits several lists, the one whose checksum validates
/// wins. Fails when no list fits, or when the phrase is valid in more than one.
pub fn detect_language(mnemonic: &str) -> Result<Language> {
    match Mnemonic::language_of(mnemonic) {
        Ok(language) => Language::from_bip39(language).ok_or_else(|| {
            HdKeyError::InvalidMnemonic(format!("unsupported wordlist {:?}", language))
        }),
        // Every word sits in several lists (mostly the two Chinese ones);
        // the checksum decides
        Err(bip39::Error::AmbiguousLanguages(_)) => {
            let mut valid = Language::ALL
                .into_iter()
                .filter(|&language| validate_mnemonic(language, mnemonic).is_ok());
            match (valid.next(), valid.next()) {
                (Some(language), None) => Ok(language),
                (None, _) => Err(HdKeyError::InvalidMnemonic(
                    "words match several wordlists and none has a valid checksum".into(),
                )),
                (Some(first), Some(second)) => Err(HdKeyError::InvalidMnemonic(format!(
                    "mnemonic is valid in both {} and {}",
                    first, second
                ))),
            }
        }
        Err(e) => Err(HdKeyError::InvalidMnemonic(e.to_string())),
    }
}
