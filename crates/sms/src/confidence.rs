// Scores are kept in tenths so that equal sums compare equal.
const BASE: u32 = 5;
const AMOUNT_BONUS: u32 = 2;
const KEYWORD_BONUS: u32 = 2;
const ACCOUNT_BONUS: u32 = 1;
const MAX_TENTHS: u32 = 10;

re!(re_amount_shape, r"(?i)(?:\brs\.?|\binr|₹)\s*\d+");
re!(re_type_keyword, r"(?i)\b(?:debited|credited|spent|received)\b");
re!(re_account_number, r"(?i)\b(?:a/c|acct|account)\b.*?\d{4}");

/// Confidence for a score counted in tenths, capped at 1.0.
pub(crate) fn from_tenths(tenths: u32) -> f32 {
    tenths.min(MAX_TENTHS) as f32 / 10.0
}

/// Whether a score in tenths is strictly above `confidence`. Confidences
/// built by [`from_tenths`] compare exactly; the tolerance absorbs
/// arithmetic noise in values set elsewhere.
pub(crate) fn exceeds(tenths: u32, confidence: f32) -> bool {
    tenths as f32 / 10.0 - confidence > 1e-6
}

/// How unambiguous a message reads, in `[0.0, 1.0]`.
///
/// Starts at 0.5; a currency amount adds 0.2, an explicit debit/credit verb
/// adds 0.2 and an account number adds 0.1.
pub fn score(body: &str) -> f32 {
    let mut tenths = BASE;
    if re_amount_shape().is_match(body) {
        tenths += AMOUNT_BONUS;
    }
    if re_type_keyword().is_match(body) {
        tenths += KEYWORD_BONUS;
    }
    if re_account_number().is_match(body) {
        tenths += ACCOUNT_BONUS;
    }
    from_tenths(tenths)
}
