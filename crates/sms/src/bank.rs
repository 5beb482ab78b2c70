//! Bank profiles and sender resolution.
//!
//! A profile is plain data: the sender codes a bank uses and ordered pattern
//! lists for debit, credit, balance and UPI detection. Patterns are matched
//! case-insensitively and may use the `{amount}` placeholder, which expands
//! to a currency marker followed by a figure whose digits form the first
//! capture group.

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use thiserror::Error;

pub const AMOUNT_PLACEHOLDER: &str = "{amount}";
const AMOUNT_FRAGMENT: &str = r"(?:rs\.?|inr|₹)\s*(\d+(?:,\d+)*(?:\.\d{2})?)";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Bank '{bank}' has an invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        bank: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Bank '{0}' declares no sender ids")]
    NoSenderIds(String),
    #[error("Failed to parse bank registry TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Uncompiled profile, as written in a registry TOML file:
///
/// ```toml
/// [[bank]]
/// name = "State Bank of India"
/// sender_ids = ["SBIALERT", "SBIUPI"]
/// debit = ['\bdebited\b.*?{amount}']
/// credit = ['\bcredited\b.*?{amount}']
/// balance = ['\bbalance\b.*?{amount}']
/// upi = ['\bupi\b']
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct BankProfileConfig {
    pub name: String,
    pub sender_ids: Vec<String>,
    #[serde(default)]
    pub debit: Vec<String>,
    #[serde(default)]
    pub credit: Vec<String>,
    #[serde(default)]
    pub balance: Vec<String>,
    #[serde(default)]
    pub upi: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default, rename = "bank")]
    banks: Vec<BankProfileConfig>,
}

/// Built-in profile table entry.
pub struct BankSpec {
    pub name: &'static str,
    pub sender_ids: &'static [&'static str],
    pub debit: &'static [&'static str],
    pub credit: &'static [&'static str],
    pub balance: &'static [&'static str],
    pub upi: &'static [&'static str],
}

const UPI_MARKERS: &[&str] = &[
    r"\bupi\b",
    r"[\w.\-]+@[a-z]+",
    r"\b(?:paytm|gpay|phonepe|amazon\s*pay|bhim)\b",
];

pub const DEFAULT_BANKS: &[BankSpec] = &[
    BankSpec {
        name: "State Bank of India",
        sender_ids: &["SBIALERT", "SBIUPI", "SBIPAY"],
        debit: &[
            r"\b(?:debited|withdrawn|spent)\b.*?{amount}",
            r"{amount}.*?\b(?:debited|withdrawn|spent|sent|paid)\b",
        ],
        credit: &[
            r"\b(?:credited|deposited|received)\b.*?{amount}",
            r"{amount}.*?\b(?:credited|deposited|received)\b",
        ],
        balance: &[r"\bbalance\b.*?{amount}", r"\bbal\b.*?{amount}"],
        upi: UPI_MARKERS,
    },
    BankSpec {
        name: "HDFC Bank",
        sender_ids: &["HDFCBK", "HDFCUPI"],
        debit: &[
            r"\b(?:debited|spent)\b.*?{amount}",
            r"{amount}.*?\b(?:debited|spent|sent|paid)\b",
        ],
        credit: &[
            r"\b(?:credited|received)\b.*?{amount}",
            r"{amount}.*?\b(?:credited|received)\b",
        ],
        balance: &[r"\b(?:avl\s+)?bal(?:ance)?\b.*?{amount}"],
        upi: UPI_MARKERS,
    },
    BankSpec {
        name: "ICICI Bank",
        sender_ids: &["ICICIB", "ICICIUPI"],
        debit: &[
            r"\b(?:debited|withdrawn)\b.*?{amount}",
            r"{amount}.*?\b(?:debited|withdrawn|sent|paid)\b",
        ],
        credit: &[
            r"\b(?:credited|deposited)\b.*?{amount}",
            r"{amount}.*?\b(?:credited|deposited)\b",
        ],
        balance: &[r"\bbalance\b.*?{amount}"],
        upi: UPI_MARKERS,
    },
    BankSpec {
        name: "Axis Bank",
        sender_ids: &["AXISBK", "AXISUPI"],
        debit: &[
            r"\b(?:debited|spent)\b.*?{amount}",
            r"{amount}.*?\b(?:debited|spent|sent|paid)\b",
        ],
        credit: &[
            r"\b(?:credited|received)\b.*?{amount}",
            r"{amount}.*?\b(?:credited|received)\b",
        ],
        balance: &[r"\bbalance\b.*?{amount}"],
        upi: UPI_MARKERS,
    },
    BankSpec {
        name: "Kotak Mahindra Bank",
        sender_ids: &["KOTAKBK", "KOTAKB"],
        debit: &[
            r"\b(?:debited|withdrawn|spent)\b.*?{amount}",
            r"{amount}.*?\b(?:debited|withdrawn|spent|sent|paid)\b",
        ],
        credit: &[
            r"\b(?:credited|received)\b.*?{amount}",
            r"{amount}.*?\b(?:credited|received)\b",
        ],
        balance: &[r"\b(?:avl\s+)?bal(?:ance)?\b.*?{amount}"],
        upi: UPI_MARKERS,
    },
    BankSpec {
        name: "Yes Bank",
        sender_ids: &["YESBNK"],
        debit: &[
            r"\b(?:debited|withdrawn)\b.*?{amount}",
            r"{amount}.*?\b(?:debited|withdrawn|sent|paid)\b",
        ],
        credit: &[
            r"\b(?:credited|deposited)\b.*?{amount}",
            r"{amount}.*?\b(?:credited|deposited)\b",
        ],
        balance: &[r"\bbalance\b.*?{amount}"],
        upi: UPI_MARKERS,
    },
];

#[derive(Debug, Clone)]
pub struct BankProfile {
    pub name: String,
    /// Upper-cased, in declaration order.
    pub sender_ids: Vec<String>,
    pub debit_patterns: Vec<Regex>,
    pub credit_patterns: Vec<Regex>,
    pub balance_patterns: Vec<Regex>,
    pub upi_patterns: Vec<Regex>,
}

impl BankProfile {
    pub fn from_config(config: BankProfileConfig) -> Result<Self, RegistryError> {
        if config.sender_ids.iter().all(|id| id.trim().is_empty()) {
            return Err(RegistryError::NoSenderIds(config.name));
        }
        let compile = |patterns: &[String]| -> Result<Vec<Regex>, RegistryError> {
            patterns
                .iter()
                .map(|p| compile_pattern(&config.name, p))
                .collect()
        };

        Ok(BankProfile {
            debit_patterns: compile(&config.debit)?,
            credit_patterns: compile(&config.credit)?,
            balance_patterns: compile(&config.balance)?,
            upi_patterns: compile(&config.upi)?,
            sender_ids: config
                .sender_ids
                .iter()
                .map(|id| id.trim().to_uppercase())
                .filter(|id| !id.is_empty())
                .collect(),
            name: config.name,
        })
    }

    /// Case-insensitive substring match of `sender` against the sender ids.
    pub fn matches_sender(&self, sender: &str) -> bool {
        let sender = sender.to_uppercase();
        self.sender_ids.iter().any(|id| sender.contains(id.as_str()))
    }
}

fn compile_pattern(bank: &str, pattern: &str) -> Result<Regex, RegistryError> {
    let expanded = pattern.replace(AMOUNT_PLACEHOLDER, AMOUNT_FRAGMENT);
    RegexBuilder::new(&expanded)
        .case_insensitive(true)
        .build()
        .map_err(|source| RegistryError::InvalidPattern {
            bank: bank.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}

impl From<&BankSpec> for BankProfileConfig {
    fn from(spec: &BankSpec) -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        BankProfileConfig {
            name: spec.name.to_string(),
            sender_ids: owned(spec.sender_ids),
            debit: owned(spec.debit),
            credit: owned(spec.credit),
            balance: owned(spec.balance),
            upi: owned(spec.upi),
        }
    }
}

/// Two profiles whose sender ids overlap, so that resolution depends on
/// registry order. `shadowed` can never win for senders containing `winner_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderOverlap {
    pub winner: String,
    pub winner_id: String,
    pub shadowed: String,
    pub shadowed_id: String,
}

/// Ordered, read-only set of bank profiles. Build once at startup and share.
#[derive(Debug, Clone)]
pub struct BankRegistry {
    profiles: Vec<BankProfile>,
}

impl BankRegistry {
    pub fn new(profiles: Vec<BankProfile>) -> Self {
        Self { profiles }
    }

    /// The compiled [`DEFAULT_BANKS`] table.
    pub fn builtin() -> Self {
        Self::from_specs(DEFAULT_BANKS).expect("built-in bank patterns are valid")
    }

    pub fn from_specs(specs: &[BankSpec]) -> Result<Self, RegistryError> {
        Self::from_configs(specs.iter().map(BankProfileConfig::from).collect())
    }

    pub fn from_configs(configs: Vec<BankProfileConfig>) -> Result<Self, RegistryError> {
        let profiles = configs
            .into_iter()
            .map(BankProfile::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(profiles))
    }

    pub fn from_toml(toml_content: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = toml::from_str(toml_content)?;
        Self::from_configs(file.banks)
    }

    /// First profile, in registry order, with a sender id contained in `sender`.
    pub fn resolve(&self, sender: &str) -> Option<&BankProfile> {
        self.profiles.iter().find(|p| p.matches_sender(sender))
    }

    pub fn is_bank_sender(&self, sender: &str) -> bool {
        self.resolve(sender).is_some()
    }

    pub fn profiles(&self) -> &[BankProfile] {
        &self.profiles
    }

    /// Reports sender ids of later profiles that contain (or equal) an id of
    /// an earlier profile. Such senders always resolve to the earlier one.
    pub fn sender_overlaps(&self) -> Vec<SenderOverlap> {
        let mut overlaps = Vec::new();
        for (i, earlier) in self.profiles.iter().enumerate() {
            for later in &self.profiles[i + 1..] {
                for later_id in &later.sender_ids {
                    if let Some(winner_id) = earlier
                        .sender_ids
                        .iter()
                        .find(|id| later_id.contains(id.as_str()))
                    {
                        overlaps.push(SenderOverlap {
                            winner: earlier.name.clone(),
                            winner_id: winner_id.clone(),
                            shadowed: later.name.clone(),
                            shadowed_id: later_id.clone(),
                        });
                    }
                }
            }
        }
        overlaps
    }
}

impl Default for BankRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
