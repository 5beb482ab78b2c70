pub const FALLBACK_DESCRIPTION: &str = "Bank transaction";

/// Banking boilerplate that never helps describe a payment.
const STOPWORDS: &[&str] = &[
    "rs", "inr", "debited", "credited", "account", "ref", "upi", "a/c", "dear", "customer",
    "your", "from", "available", "balance", "bal", "avl",
];

const MAX_WORDS: usize = 4;

/// Human-readable summary of a transaction.
///
/// With a merchant the summary names it; otherwise it is built from the first
/// few meaningful words of the body.
pub fn describe(body: &str, merchant: Option<&str>, is_upi: bool) -> String {
    if let Some(merchant) = merchant {
        return if is_upi {
            format!("UPI payment to {merchant}")
        } else {
            format!("Transaction with {merchant}")
        };
    }

    let lowered = body.to_lowercase();
    let words: Vec<&str> = lowered
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .filter(|w| !STOPWORDS.contains(w))
        .take(MAX_WORDS)
        .collect();

    if words.is_empty() {
        FALLBACK_DESCRIPTION.to_string()
    } else {
        words.join(" ")
    }
}
