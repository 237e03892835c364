use serde::{Deserialize, Serialize};

use crate::category::{display_label, Category, CategoryTable, FALLBACK_CATEGORY, FALLBACK_GLYPH};
use crate::extract::Extractor;
use crate::money::Money;

/// Outcome of classifying one chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    pub glyph: Option<String>,
    pub amount: Option<Money>,
    /// Keyword score of the winning category. Not a probability.
    pub confidence: u32,
}

impl Classification {
    pub fn label(&self) -> String {
        display_label(&self.category, self.glyph.as_deref())
    }

    pub fn is_fallback(&self) -> bool {
        self.confidence == 0
    }
}

/// Scores text against a category table by keyword presence.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    table: CategoryTable,
}

impl Classifier {
    pub fn new(table: CategoryTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    pub fn classify(&self, text: &str) -> Classification {
        let lowered = text.to_lowercase();

        // Strict `>` keeps the first category to reach the maximum.
        let mut best: Option<(&Category, u32)> = None;
        for category in self.table.iter() {
            let score = score_keywords(&category.keywords, &lowered);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((category, score));
            }
        }

        let amount = Extractor::extract_amount(text);
        match best {
            Some((category, score)) if score > 0 => Classification {
                category: category.name.clone(),
                glyph: category.glyph.clone(),
                amount,
                confidence: score,
            },
            _ => Classification {
                category: FALLBACK_CATEGORY.to_string(),
                glyph: Some(FALLBACK_GLYPH.to_string()),
                amount,
                confidence: 0,
            },
        }
    }

    /// Per-category scores in table order.
    pub fn scores(&self, text: &str) -> Vec<(&str, u32)> {
        let lowered = text.to_lowercase();
        self.table
            .iter()
            .map(|c| (c.name.as_str(), score_keywords(&c.keywords, &lowered)))
            .collect()
    }
}

fn score_keywords(keywords: &[String], lowered: &str) -> u32 {
    keywords
        .iter()
        .filter(|kw| lowered.contains(kw.as_str()))
        .map(|kw| keyword_weight(kw))
        .sum()
}

/// Longer keywords are more specific and count double.
fn keyword_weight(keyword: &str) -> u32 {
    if keyword.chars().count() > 5 {
        2
    } else {
        1
    }
}
