use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::money::Money;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// All patterns run against lowercased text. `\d` is Unicode-aware, so
// Devanagari and other decimal digit scripts match too.
re!(re_rupee_sign, r"₹\s?(\d+(?:\.\d{2})?)");
re!(re_rs_prefix, r"rs\.?\s?(\d+(?:\.\d{2})?)");
re!(re_dollar_sign, r"\$\s?(\d+(?:\.\d{2})?)");
re!(re_slash_dash, r"(\d+)\s?/-");
re!(re_rupee_word, r"(\d+(?:\.\d{2})?)\s?rupees?");
re!(re_dollar_word, r"(\d+(?:\.\d{2})?)\s?dollars?");
re!(re_spend_verb, r"(?:spent|paid|cost|worth)\s+(\d+(?:\.\d{2})?)");
re!(re_bare_number, r"(\d+(?:\.\d{2})?)");
re!(re_single_digit, r"^\d$");

/// One rule in the amount-matching chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountPattern {
    RupeeSign,
    RsPrefix,
    DollarSign,
    SlashDash,
    RupeeWord,
    DollarWord,
    SpendVerb,
    BareNumber,
}

impl AmountPattern {
    /// Evaluation order. The first rule with any match decides the amount,
    /// regardless of where other rules would have matched in the text.
    pub const PRIORITY: [AmountPattern; 8] = [
        AmountPattern::RupeeSign,
        AmountPattern::RsPrefix,
        AmountPattern::DollarSign,
        AmountPattern::SlashDash,
        AmountPattern::RupeeWord,
        AmountPattern::DollarWord,
        AmountPattern::SpendVerb,
        AmountPattern::BareNumber,
    ];

    fn regex(self) -> &'static Regex {
        match self {
            AmountPattern::RupeeSign => re_rupee_sign(),
            AmountPattern::RsPrefix => re_rs_prefix(),
            AmountPattern::DollarSign => re_dollar_sign(),
            AmountPattern::SlashDash => re_slash_dash(),
            AmountPattern::RupeeWord => re_rupee_word(),
            AmountPattern::DollarWord => re_dollar_word(),
            AmountPattern::SpendVerb => re_spend_verb(),
            AmountPattern::BareNumber => re_bare_number(),
        }
    }
}

impl std::fmt::Display for AmountPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmountPattern::RupeeSign => write!(f, "rupee_sign"),
            AmountPattern::RsPrefix => write!(f, "rs_prefix"),
            AmountPattern::DollarSign => write!(f, "dollar_sign"),
            AmountPattern::SlashDash => write!(f, "slash_dash"),
            AmountPattern::RupeeWord => write!(f, "rupee_word"),
            AmountPattern::DollarWord => write!(f, "dollar_word"),
            AmountPattern::SpendVerb => write!(f, "spend_verb"),
            AmountPattern::BareNumber => write!(f, "bare_number"),
        }
    }
}

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// Find the amount mentioned in a chat message, if any.
    pub fn extract_amount(text: &str) -> Option<Money> {
        Self::extract_with_pattern(text).map(|(amount, _)| amount)
    }

    /// Like [`Extractor::extract_amount`], also reporting which rule fired.
    ///
    /// Only the first matching rule is parsed. A number too large for
    /// `Decimal` yields `None` rather than falling through to a weaker rule.
    pub fn extract_with_pattern(text: &str) -> Option<(Money, AmountPattern)> {
        let lowered = text.to_lowercase();
        let (pattern, caps) = AmountPattern::PRIORITY
            .iter()
            .find_map(|&p| p.regex().captures(&lowered).map(|c| (p, c)))?;
        let amount = parse_amount_str(caps.get(1)?.as_str())?;
        Some((amount, pattern))
    }
}

// ── Amount parsing ────────────────────────────────────────────────────────────

fn parse_amount_str(s: &str) -> Option<Money> {
    let clean: String = s
        .chars()
        .filter(|&c| c != ',')
        .map(|c| ascii_digit(c).unwrap_or(c))
        .collect();
    let dec = Decimal::from_str(&clean).ok()?;
    Some(Money::from_decimal(dec))
}

fn is_decimal_digit(c: char) -> bool {
    re_single_digit().is_match(c.encode_utf8(&mut [0; 4]))
}

/// Map any Unicode decimal digit (`२`, `٣`, ...) to its ASCII form.
///
/// Decimal digits are encoded in runs of ten starting at zero, so the value is
/// the offset from the start of the contiguous digit run, modulo ten.
fn ascii_digit(c: char) -> Option<char> {
    if c.is_ascii_digit() {
        return Some(c);
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let mut zero = c as u32;
    while let Some(prev) = zero.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        zero -= 1;
    }
    char::from_digit((c as u32 - zero) % 10, 10)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
