//! Extraction service collaborator and response validation.
//!
//! The service is untrusted: its reply is validated into an [`Extraction`]. Anything
//! malformed, non-numeric or non-positive becomes [`Extraction::NotATransaction`] rather than
//! an error.

use std::fmt::Write as _;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tally_shared::types::CategoryId;
use tracing::debug;

use super::error::ExtractError;
use super::types::{Category, ExtractedTransaction, Extraction, ExtractionRequest};
use crate::ledger::{DEFAULT_DESCRIPTION, TransactionKind};

/// Reads financial events out of text or images.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns the service's raw text reply.
    async fn extract(&self, request: &ExtractionRequest) -> Result<String, ExtractError>;
}

/// Instructions sent to the extraction service along with the content.
#[must_use]
pub fn extraction_prompt(categories: &[Category], reference_time: DateTime<Utc>) -> String {
    let mut prompt = String::from(
        "You read bank alerts, receipts and payment confirmations and extract one financial \
         transaction.\n\
         Reply with JSON only, no prose. If the content is not a completed payment, transfer, \
         purchase, refund or income, reply with null.\n\
         Otherwise reply with an object:\n\
         {\"amount\": number, \"description\": string, \"category_id\": string or null, \
         \"type\": \"income\" or \"expense\", \"date\": \"YYYY-MM-DD\"}\n\
         Use the merchant or counterparty as the description. Ignore balances, limits and \
         promotional amounts.\n",
    );
    let _ = writeln!(
        prompt,
        "Today is {}. Resolve relative dates against it.",
        reference_time.date_naive()
    );
    if categories.is_empty() {
        prompt.push_str("No categories are defined; use null for category_id.\n");
    } else {
        prompt.push_str("Pick category_id from this list, or null if none fits:\n");
        for category in categories {
            let _ = writeln!(
                prompt,
                "- {} ({}, {})",
                category.id,
                category.name,
                category.kind.as_str()
            );
        }
    }
    prompt
}

/// Validates a raw service reply.
///
/// `fallback_time` is used when the reply has no usable date.
#[must_use]
pub fn parse_extraction(raw: &str, categories: &[Category], fallback_time: DateTime<Utc>) -> Extraction {
    let Some(object) = json_object(raw) else {
        return Extraction::NotATransaction;
    };

    if object.get("is_transaction").and_then(Value::as_bool) == Some(false) {
        return Extraction::NotATransaction;
    }

    let Some(amount) = object.get("amount").and_then(parse_amount) else {
        debug!("Extraction reply has no usable amount");
        return Extraction::NotATransaction;
    };
    if amount <= Decimal::ZERO {
        return Extraction::NotATransaction;
    }

    let description = first_str(&object, &["description", "merchant", "payee"])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_DESCRIPTION)
        .to_string();

    let kind = first_str(&object, &["type", "kind"])
        .and_then(TransactionKind::parse)
        .unwrap_or(TransactionKind::Expense);

    let category_id = first_str(&object, &["category_id", "category"])
        .and_then(|wanted| match_category(wanted, categories));

    let occurred_at = first_str(&object, &["date", "occurred_at"])
        .and_then(parse_date)
        .unwrap_or(fallback_time);

    Extraction::Recognized(ExtractedTransaction {
        amount,
        description,
        category_id,
        kind,
        occurred_at,
    })
}

/// Extracts the JSON object from a reply that may be fenced or wrapped in prose.
fn json_object(raw: &str) -> Option<Map<String, Value>> {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map_or(trimmed, |rest| rest.trim_end().trim_end_matches("```"))
        .trim();

    if unfenced.is_empty() || unfenced.eq_ignore_ascii_case("null") {
        return None;
    }

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end < start {
        return None;
    }

    match serde_json::from_str::<Value>(&unfenced[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "Extraction reply is not valid JSON");
            None
        }
    }
}

fn first_str<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
}

/// Parses a number, or the first numeric token of a string such as "₹1,234.50".
fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => numeric_token(s).and_then(|t| Decimal::from_str(&t).ok()),
        _ => None,
    }
}

fn numeric_token(s: &str) -> Option<String> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    // A minus sign may sit before the currency symbol ("-₹40")
    let negative = s[..start]
        .chars()
        .rev()
        .find(|c| !c.is_whitespace() && !matches!(*c, '$' | '€' | '£' | '₹' | '¥'))
        == Some('-');

    let token: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .filter(|c| *c != ',')
        .collect();
    let token = token.trim_end_matches('.');

    Some(if negative {
        format!("-{token}")
    } else {
        token.to_string()
    })
}

fn match_category(wanted: &str, categories: &[Category]) -> Option<CategoryId> {
    let wanted = wanted.trim();
    categories
        .iter()
        .find(|c| c.id.to_string().eq_ignore_ascii_case(wanted))
        .or_else(|| categories.iter().find(|c| c.name.eq_ignore_ascii_case(wanted)))
        .map(|c| c.id)
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD`, which is read as noon UTC.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let noon = NaiveTime::from_hms_opt(12, 0, 0)?;
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(noon).and_utc())
}
