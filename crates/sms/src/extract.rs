use kharcha_core::{Money, TransactionType, UNKNOWN_ACCOUNT};

use crate::bank::BankProfile;

// ── Compiled regex cache ─────────────────────────────────────────────────────

re!(re_money,
    r"(?i)(?:\brs\.?|\binr|₹)\s*(\d{1,3}(?:,\d{2,3})*\.\d{2}|\d+\.\d{2})\b");
re!(re_upi_handle,
    r"([A-Za-z0-9.\-_]+@[A-Za-z0-9.\-_]+)");
re!(re_merchant_preposition,
    r"(?i)\b(?:to|at|from)\s+([a-z][a-z\s]*?)(?:\s+on\b|\s+ref\b|\s+upi\b|\s+transaction\b|\s+via\b|\.|,|$)");
re!(re_merchant_upi,
    r"(?i)\b([a-z0-9][a-z0-9.\-_]*)@[a-z0-9.\-_]+");
re!(re_merchant_label,
    r"(?i)\bmerchant\s*:?\s+([a-z][a-z\s]*)");
re!(re_account_marker,
    r"(?i)\b(?:a/c|acct|account|card)(?:\s*no\.?)?\s*(?:ending\s*)?[*xX.]*\d*?(\d{4})\b");
re!(re_four_digits,
    r"\b(\d{4})\b");

// ── Extraction result ────────────────────────────────────────────────────────

/// Every field the extractor could recover from one message body.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFields {
    pub amount: Option<Money>,
    /// Text the money pattern matched, kept even when it failed to parse.
    pub amount_text: Option<String>,
    pub kind: Option<TransactionType>,
    pub balance: Option<Money>,
    pub is_upi: bool,
    pub upi_id: Option<String>,
    pub merchant: Option<String>,
    pub account: String,
}

pub struct Extractor;

impl Extractor {
    /// Extract all fields from `body` using the patterns of `profile`.
    pub fn extract(body: &str, profile: &BankProfile) -> ExtractedFields {
        let amount_text = Self::amount_text(body);
        let amount = amount_text.as_deref().and_then(parse_positive);
        let is_upi = Self::is_upi(body, profile);

        ExtractedFields {
            amount,
            amount_text,
            kind: Self::transaction_type(body, profile),
            balance: Self::balance(body, profile),
            is_upi,
            upi_id: if is_upi { Self::upi_handle(body) } else { None },
            merchant: Self::merchant(body),
            account: Self::account_suffix(body),
        }
    }

    // ── Amount ───────────────────────────────────────────────────────────────

    /// The first currency figure in the body, as written.
    pub fn amount_text(body: &str) -> Option<String> {
        re_money()
            .captures(body)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    pub fn amount(body: &str) -> Option<Money> {
        Self::amount_text(body).as_deref().and_then(parse_positive)
    }

    // ── Type ─────────────────────────────────────────────────────────────────

    /// Debit patterns are consulted first, so a body matching both lists is a debit.
    pub fn transaction_type(body: &str, profile: &BankProfile) -> Option<TransactionType> {
        if profile.debit_patterns.iter().any(|p| p.is_match(body)) {
            Some(TransactionType::Debit)
        } else if profile.credit_patterns.iter().any(|p| p.is_match(body)) {
            Some(TransactionType::Credit)
        } else {
            None
        }
    }

    // ── Balance ──────────────────────────────────────────────────────────────

    pub fn balance(body: &str, profile: &BankProfile) -> Option<Money> {
        profile.balance_patterns.iter().find_map(|p| {
            let caps = p.captures(body)?;
            let figure = caps.iter().skip(1).flatten().next()?;
            Money::parse(figure.as_str())
        })
    }

    // ── UPI ──────────────────────────────────────────────────────────────────

    pub fn is_upi(body: &str, profile: &BankProfile) -> bool {
        profile.upi_patterns.iter().any(|p| p.is_match(body))
    }

    /// First `name@provider` token.
    pub fn upi_handle(body: &str) -> Option<String> {
        let handle = re_upi_handle().captures(body)?.get(1)?.as_str();
        let handle = handle.trim_end_matches(&['.', '-', '_'][..]);
        handle.contains('@').then(|| handle.to_string())
    }

    // ── Merchant ─────────────────────────────────────────────────────────────

    /// Tries a preposition-led phrase, then a UPI payee, then a `merchant` label.
    pub fn merchant(body: &str) -> Option<String> {
        [re_merchant_preposition(), re_merchant_upi(), re_merchant_label()]
            .into_iter()
            .find_map(|re| {
                let captured = re.captures(body)?.get(1)?.as_str().trim();
                (!captured.is_empty()).then(|| captured.to_string())
            })
    }

    // ── Account ──────────────────────────────────────────────────────────────

    /// Masked account suffix such as `****1234`.
    ///
    /// Deliberately not a plain "first four digits in the body" scan: that
    /// reads `Rs.2500.00` as account `****2500`. Digits introduced by an
    /// account marker win; otherwise the first standalone four-digit run
    /// outside a currency figure is used.
    pub fn account_suffix(body: &str) -> String {
        let marked = re_account_marker()
            .captures(body)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());

        let digits = marked.or_else(|| {
            let without_money = re_money().replace_all(body, " ");
            re_four_digits()
                .captures(&without_money)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        });

        match digits {
            Some(d) => format!("****{d}"),
            None => UNKNOWN_ACCOUNT.to_string(),
        }
    }
}

fn parse_positive(text: &str) -> Option<Money> {
    Money::parse(text).filter(|m| m.is_positive())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
