//! Provider-side search query for candidate messages.

use chrono::{DateTime, Utc};

/// Terms that strongly suggest a message describes money moving.
const POSITIVE_TERMS: &[&str] = &[
    "$",
    "€",
    "£",
    "₹",
    "¥",
    "payment",
    "paid",
    "transfer",
    "receipt",
    "invoice",
    "debited",
    "credited",
    "transaction",
    "purchase",
    "order",
    "refund",
    "UPI",
    "bank",
    "\"credit card\"",
    "\"debit card\"",
    "PayPal",
    "Venmo",
    "Stripe",
    "GPay",
    "Paytm",
    "PhonePe",
];

/// Terms that mark marketing, recruiting and newsletter mail.
const EXCLUDED_TERMS: &[&str] = &[
    "unsubscribe",
    "job",
    "hiring",
    "newsletter",
    "webinar",
    "promotion",
    "offer",
    "sale",
];

/// Provider-classified categories never worth scanning.
const EXCLUDED_CATEGORIES: &[&str] = &["promotions", "social"];

/// Search query bounded below by a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    after: DateTime<Utc>,
}

impl CandidateQuery {
    /// Matches messages received after `after`.
    #[must_use]
    pub fn after(after: DateTime<Utc>) -> Self {
        Self { after }
    }

    /// Lower time bound of the query.
    #[must_use]
    pub fn lower_bound(&self) -> DateTime<Utc> {
        self.after
    }

    /// Renders the provider search string.
    #[must_use]
    pub fn render(&self) -> String {
        let positive = POSITIVE_TERMS.join(" OR ");
        let excluded = EXCLUDED_TERMS
            .iter()
            .map(|term| format!("-{term}"))
            .collect::<Vec<_>>()
            .join(" ");
        let categories = EXCLUDED_CATEGORIES
            .iter()
            .map(|c| format!("-category:{c}"))
            .collect::<Vec<_>>()
            .join(" ");

        format!(
            "after:{} ({positive}) {excluded} {categories}",
            self.after.timestamp()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered() -> String {
        let after = "2024-03-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        CandidateQuery::after(after).render()
    }

    #[test]
    fn test_query_starts_with_time_bound() {
        assert!(rendered().starts_with("after:1709251200 ("));
    }

    #[test]
    fn test_query_contains_positive_disjunction() {
        let query = rendered();
        assert!(query.contains("payment OR paid OR transfer"));
        assert!(query.contains("₹"));
        assert!(query.contains("\"credit card\""));
    }

    #[test]
    fn test_query_excludes_noise() {
        let query = rendered();
        for term in ["-unsubscribe", "-newsletter", "-hiring", "-webinar"] {
            assert!(query.contains(term), "missing {term}");
        }
        assert!(query.ends_with("-category:promotions -category:social"));
    }
}
