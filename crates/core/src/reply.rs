use crate::classify::Classification;

/// Render the chat reply for a classified message.
///
/// A zero amount is treated like a missing one and gets the "include an
/// amount" tip instead of a confirmation.
pub fn format_reply(result: &Classification, original_text: &str) -> String {
    let category = result.label();
    match result.amount.filter(|a| !a.is_zero()) {
        Some(amount) => format!(
            "💰 *Expense Categorized!*\n\n\
             📊 *Category:* {category}\n\
             💵 *Amount:* {amount}\n\
             📝 *Description:* {original_text}\n\n\
             ✅ Your expense has been recorded!"
        ),
        None => format!(
            "🤔 *Expense Detected*\n\n\
             📊 *Category:* {category}\n\
             📝 *Description:* {original_text}\n\n\
             ℹ️ Tip: Include amount like '₹250' for better tracking!"
        ),
    }
}
