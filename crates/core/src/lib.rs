pub mod category;
pub mod classify;
pub mod extract;
pub mod money;
pub mod reply;

pub use category::{Category, CategoryError, CategoryTable, FALLBACK_CATEGORY, FALLBACK_GLYPH};
pub use classify::{Classification, Classifier};
pub use extract::{AmountPattern, Extractor};
pub use money::Money;
pub use reply::format_reply;
