use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Stored lower-case.
    pub keywords: BTreeSet<String>,
}

impl Category {
    /// A user-defined category with a fresh id.
    pub fn new<I, S>(name: &str, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_id(&uuid::Uuid::new_v4().to_string(), name, keywords)
    }

    pub fn with_id<I, S>(id: &str, name: &str, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }
}

/// The category recommended by the enhancement pass, and its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub category: String,
    pub confidence: f32,
}

pub const DEFAULT_CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "food",
        "Food & Dining",
        &["swiggy", "zomato", "restaurant", "food", "cafe", "dining"],
    ),
    (
        "transport",
        "Transportation",
        &["uber", "ola", "metro", "bus", "fuel", "petrol", "diesel"],
    ),
    (
        "shopping",
        "Shopping",
        &["amazon", "flipkart", "myntra", "shopping", "store"],
    ),
    (
        "bills",
        "Bills & Utilities",
        &["electricity", "water", "gas", "mobile", "internet", "bill"],
    ),
    (
        "entertainment",
        "Entertainment",
        &["netflix", "spotify", "movie", "entertainment", "subscription"],
    ),
    (
        "healthcare",
        "Healthcare",
        &["hospital", "doctor", "medical", "pharmacy", "health"],
    ),
    (
        "investment",
        "Investment",
        &["mutual", "fund", "sip", "investment", "stock", "trading"],
    ),
    (
        "income",
        "Income",
        &["salary", "income", "payment", "freelance", "business"],
    ),
];

/// Seed list written to the category store the first time it is found empty.
pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(id, name, keywords)| Category::with_id(id, name, keywords.iter()))
        .collect()
}
