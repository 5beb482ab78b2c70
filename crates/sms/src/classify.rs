use kharcha_core::{Category, CategorySuggestion, Transaction};
use regex::{Regex, RegexBuilder};

use crate::confidence::{exceeds, from_tenths};

pub const UPI_CATEGORY: &str = "UPI Payment";
pub const OTHER_CATEGORY: &str = "Other";

// In tenths, like the confidence scorer.
const KEYWORD_SCORE: u32 = 3;
const UPI_BONUS: u32 = 2;

/// Parse-time keyword groups, tried in order.
pub const KEYWORD_GROUPS: &[(&str, &[&str])] = &[
    (
        "Food & Dining",
        &["swiggy", "zomato", "restaurant", "food", "dining", "cafe", "pizza", "burger"],
    ),
    (
        "Transportation",
        &["uber", "ola", "metro", "bus", "taxi", "fuel", "petrol", "diesel", "parking"],
    ),
    (
        "Shopping",
        &["amazon", "flipkart", "myntra", "shopping", "store", "mall", "purchase"],
    ),
    (
        "Entertainment",
        &["netflix", "spotify", "movie", "entertainment", "game", "subscription"],
    ),
    (
        "Bills & Utilities",
        &["electricity", "water", "gas", "mobile", "internet", "recharge", "bill"],
    ),
    (
        "Healthcare",
        &["hospital", "doctor", "medical", "pharmacy", "health", "medicine"],
    ),
    (
        "Investment",
        &["mutual", "fund", "sip", "investment", "stock", "trading"],
    ),
];

/// Internal pairing of a category name with its precompiled keyword matcher.
#[derive(Debug, Clone)]
struct CompiledGroup {
    category: String,
    matcher: Regex,
}

/// Assigns categories: a fixed keyword table at parse time, and an on-demand
/// re-score against the user's category list.
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    groups: Vec<CompiledGroup>,
}

impl CategoryClassifier {
    pub fn new(groups: &[(&str, &[&str])]) -> Self {
        let groups = groups
            .iter()
            .filter(|(_, keywords)| !keywords.is_empty())
            .map(|(category, keywords)| CompiledGroup {
                category: category.to_string(),
                matcher: word_start_matcher(keywords),
            })
            .collect();
        Self { groups }
    }

    /// Category from the first keyword group found in the body or merchant,
    /// else `UPI Payment` / `Other`.
    pub fn initial_category(&self, body: &str, merchant: Option<&str>, is_upi: bool) -> String {
        let text = format!("{} {}", body, merchant.unwrap_or_default());
        self.groups
            .iter()
            .find(|g| g.matcher.is_match(&text))
            .map(|g| g.category.clone())
            .unwrap_or_else(|| {
                if is_upi {
                    UPI_CATEGORY.to_string()
                } else {
                    OTHER_CATEGORY.to_string()
                }
            })
    }

    /// Best category from `categories` for `tx`.
    ///
    /// Each category scores 0.3 per keyword found in the description and
    /// merchant, plus 0.2 for a UPI transaction with at least one hit. The
    /// top scorer is proposed only when it beats the transaction's current
    /// confidence; otherwise the current category and confidence come back.
    pub fn enhance(&self, tx: &Transaction, categories: &[Category]) -> CategorySuggestion {
        let text = format!(
            "{} {}",
            tx.description,
            tx.merchant.as_deref().unwrap_or_default()
        )
        .to_lowercase();

        let mut best: Option<(u32, &Category)> = None;
        for category in categories {
            let hits = category
                .keywords
                .iter()
                .filter(|k| !k.is_empty() && text.contains(k.to_lowercase().as_str()))
                .count() as u32;
            if hits == 0 {
                continue;
            }
            let mut score = KEYWORD_SCORE * hits;
            if tx.is_upi {
                score += UPI_BONUS;
            }
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, category));
            }
        }

        match best {
            Some((score, category)) if exceeds(score, tx.confidence) => CategorySuggestion {
                category: category.name.clone(),
                confidence: from_tenths(score),
            },
            _ => CategorySuggestion {
                category: tx.category.clone(),
                confidence: tx.confidence,
            },
        }
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::new(KEYWORD_GROUPS)
    }
}

fn word_start_matcher(keywords: &[&str]) -> Regex {
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&format!(r"\b(?:{alternation})"))
        .case_insensitive(true)
        .build()
        .expect("escaped keywords form a valid regex")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kharcha_core::{default_categories, Money, TransactionType};

    fn classifier() -> CategoryClassifier {
        CategoryClassifier::default()
    }

    fn tx(description: &str, merchant: Option<&str>, is_upi: bool, confidence: f32) -> Transaction {
        Transaction {
            id: "txn_1".to_string(),
            amount: Money::from_paise(100_00),
            kind: TransactionType::Debit,
            description: description.to_string(),
            category: "Other".to_string(),
            date: Utc::now(),
            account: "****1234".to_string(),
            balance: None,
            merchant: merchant.map(str::to_string),
            upi_id: None,
            is_upi,
            source_message_id: "sms_1".to_string(),
            bank_name: "HDFC Bank".to_string(),
            confidence,
            is_edited: false,
            raw_text: String::new(),
        }
    }

    // ── Initial ──────────────────────────────────────────────────────────────

    #[test]
    fn initial_matches_body_keyword() {
        let c = classifier();
        assert_eq!(
            c.initial_category("Rs.500.00 debited at SWIGGY BANGALORE", None, false),
            "Food & Dining"
        );
    }

    #[test]
    fn initial_matches_merchant_keyword() {
        let c = classifier();
        assert_eq!(c.initial_category("Rs.80.00 paid", Some("Uber India"), true), "Transportation");
    }

    #[test]
    fn initial_first_group_wins() {
        let c = classifier();
        // Shopping and Entertainment both match; Shopping comes first.
        assert_eq!(
            c.initial_category("amazon prime subscription", None, false),
            "Shopping"
        );
    }

    #[test]
    fn initial_matches_at_word_start_only() {
        let c = classifier();
        assert_eq!(c.initial_category("Refund processed", None, false), OTHER_CATEGORY);
        assert_eq!(c.initial_category("two restaurants", None, false), "Food & Dining");
    }

    #[test]
    fn initial_falls_back_on_upi_flag() {
        let c = classifier();
        assert_eq!(c.initial_category("sent to friend", None, true), UPI_CATEGORY);
        assert_eq!(c.initial_category("sent to friend", None, false), OTHER_CATEGORY);
    }

    // ── Enhancement ──────────────────────────────────────────────────────────

    #[test]
    fn enhance_replaces_when_score_beats_confidence() {
        let c = classifier();
        let t = tx("UPI payment to zomato food", Some("zomato"), true, 0.5);
        let s = c.enhance(&t, &default_categories());
        // zomato + food = 0.6, +0.2 UPI bonus
        assert_eq!(s.category, "Food & Dining");
        assert!((s.confidence - 0.8).abs() < 1e-5);
    }

    #[test]
    fn enhance_keeps_current_when_score_too_low() {
        let c = classifier();
        let t = tx("Transaction with uber", Some("uber"), false, 0.9);
        let s = c.enhance(&t, &default_categories());
        assert_eq!(s.category, "Other");
        assert_eq!(s.confidence, 0.9);
    }

    #[test]
    fn enhance_never_lowers_confidence() {
        let c = classifier();
        let cats = default_categories();
        for confidence in [0.0, 0.3, 0.5, 0.7, 0.9, 1.0] {
            let t = tx("payment for netflix movie subscription", None, true, confidence);
            assert!(c.enhance(&t, &cats).confidence >= confidence);
        }
    }

    #[test]
    fn enhance_caps_at_one() {
        let c = classifier();
        let cats = vec![Category::new("Food", ["a", "b", "c", "d"])];
        let t = tx("a b c d", None, true, 0.5);
        assert_eq!(c.enhance(&t, &cats).confidence, 1.0);
    }

    #[test]
    fn enhance_picks_highest_raw_score_above_one() {
        let c = classifier();
        let cats = vec![
            Category::new("Five", ["a", "b", "c", "d", "e"]),
            Category::new("Four", ["a", "b", "c", "d"]),
        ];
        let t = tx("a b c d e", None, false, 0.5);
        let s = c.enhance(&t, &cats);
        assert_eq!(s.category, "Five");
        assert_eq!(s.confidence, 1.0);
    }

    #[test]
    fn enhance_equal_score_keeps_current() {
        let c = classifier();
        let cats = vec![Category::new("Three", ["alpha", "beta", "gamma"])];
        let confidence = crate::confidence::score("Rs.500.00 debited");
        let t = tx("alpha beta gamma", None, false, confidence);
        let s = c.enhance(&t, &cats);
        assert_eq!(s.category, "Other");
        assert_eq!(s.confidence, confidence);
    }

    #[test]
    fn enhance_highest_score_wins_ties_go_first() {
        let c = classifier();
        let cats = vec![
            Category::new("One", ["alpha"]),
            Category::new("Two", ["alpha", "beta"]),
            Category::new("Three", ["beta", "alpha"]),
        ];
        let t = tx("alpha beta", None, false, 0.1);
        assert_eq!(c.enhance(&t, &cats).category, "Two");
    }

    #[test]
    fn enhance_without_categories_is_identity() {
        let c = classifier();
        let t = tx("anything", None, false, 0.4);
        let s = c.enhance(&t, &[]);
        assert_eq!(s, CategorySuggestion { category: "Other".to_string(), confidence: 0.4 });
    }
}
