use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Name given to messages that match no category keyword.
pub const FALLBACK_CATEGORY: &str = "Others";
pub const FALLBACK_GLYPH: &str = "📝";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub glyph: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Category {
    pub fn new(name: &str, glyph: Option<&str>, keywords: &[&str]) -> Self {
        Category {
            name: name.to_string(),
            glyph: glyph.map(str::to_string),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Display form, e.g. `🍔 Food`.
    pub fn label(&self) -> String {
        display_label(&self.name, self.glyph.as_deref())
    }
}

pub(crate) fn display_label(name: &str, glyph: Option<&str>) -> String {
    match glyph {
        Some(g) if !g.is_empty() => format!("{g} {name}"),
        _ => name.to_string(),
    }
}

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse category table: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Category table has no categories")]
    Empty,
    #[error("Category at position {0} has an empty name")]
    EmptyName(usize),
    #[error("Duplicate category: '{0}'")]
    Duplicate(String),
}

/// Built-in table. Declaration order breaks score ties, so keep it stable.
pub const DEFAULT_CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "Food",
        "🍔",
        &[
            "food", "restaurant", "cafe", "coffee", "lunch", "dinner", "breakfast",
            "pizza", "burger", "sandwich", "meal", "eat", "hungry", "kitchen",
            "zomato", "swiggy", "dominos", "mcdonalds", "kfc", "subway", "starbucks",
            "delivery", "takeaway", "dine", "buffet", "snack", "grocery store",
            "supermarket", "vegetables", "fruits", "milk", "bread",
        ],
    ),
    (
        "Shopping",
        "🛒",
        &[
            "shopping", "amazon", "flipkart", "myntra", "clothes", "shirt", "shoes",
            "buy", "purchase", "order", "mall", "store", "shop", "retail",
            "electronics", "mobile", "laptop", "headphones", "gadget",
            "cosmetics", "makeup", "perfume", "jewelry", "watch", "bag",
            "online", "ecommerce", "delivery", "cart", "checkout",
        ],
    ),
    (
        "Transport",
        "🚕",
        &[
            "uber", "ola", "taxi", "cab", "auto", "rickshaw", "bus", "metro",
            "train", "flight", "travel", "transport", "commute", "ride",
            "petrol", "diesel", "fuel", "gas", "parking", "toll",
            "vehicle", "car", "bike", "scooter", "maintenance", "service",
        ],
    ),
    (
        "Bills",
        "💡",
        &[
            "electricity", "water", "gas", "internet", "wifi", "mobile bill",
            "phone bill", "utility", "bill", "payment", "recharge",
            "broadband", "cable", "tv", "netflix", "spotify", "subscription",
            "insurance", "premium", "emi", "loan", "credit card",
        ],
    ),
    (
        "Rent",
        "🏠",
        &[
            "rent", "house", "apartment", "flat", "home", "accommodation",
            "landlord", "deposit", "maintenance", "society", "housing",
        ],
    ),
    (
        "Travel",
        "✈️",
        &[
            "vacation", "trip", "holiday", "hotel", "resort", "booking",
            "airbnb", "flight", "ticket", "visa", "passport", "tour",
            "sightseeing", "tourism", "adventure", "beach", "mountain",
        ],
    ),
    (
        "Books",
        "📚",
        &[
            "book", "kindle", "novel", "magazine", "newspaper", "education",
            "course", "learning", "study", "library", "bookstore",
            "stationery", "pen", "notebook", "academic",
        ],
    ),
    (
        "Healthcare",
        "🏥",
        &[
            "doctor", "hospital", "medicine", "pharmacy", "medical",
            "health", "checkup", "treatment", "clinic", "dentist",
            "prescription", "vitamins", "supplements",
        ],
    ),
    (
        "Entertainment",
        "🎮",
        &[
            "movie", "cinema", "theater", "game", "gaming", "concert",
            "party", "club", "bar", "pub", "entertainment", "fun",
            "sports", "gym", "fitness", "membership",
        ],
    ),
];

#[derive(Debug, Default, Deserialize)]
struct TableFile {
    #[serde(default, rename = "category")]
    categories: Vec<Category>,
}

/// Ordered, read-only category table.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

impl CategoryTable {
    /// Validate and normalize a list of categories, keeping their order.
    ///
    /// Keywords are trimmed and lowercased; blank keywords are dropped since an
    /// empty string would match every message.
    pub fn new(categories: Vec<Category>) -> Result<Self, CategoryError> {
        if categories.is_empty() {
            return Err(CategoryError::Empty);
        }

        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(categories.len());
        for (idx, category) in categories.into_iter().enumerate() {
            let name = category.name.trim().to_string();
            if name.is_empty() {
                return Err(CategoryError::EmptyName(idx));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(CategoryError::Duplicate(name));
            }
            let keywords = category
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            normalized.push(Category {
                name,
                glyph: category.glyph.filter(|g| !g.trim().is_empty()),
                keywords,
            });
        }

        Ok(Self { categories: normalized })
    }

    pub fn builtin() -> Self {
        let categories = DEFAULT_CATEGORIES
            .iter()
            .map(|&(name, glyph, keywords)| Category::new(name, Some(glyph), keywords))
            .collect();
        Self { categories }
    }

    /// Parse a table from TOML `[[category]]` entries, in file order.
    pub fn from_toml(toml_content: &str) -> Result<Self, CategoryError> {
        let file: TableFile = toml::from_str(toml_content)?;
        Self::new(file.categories)
    }

    pub fn from_path(path: &Path) -> Result<Self, CategoryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}
