//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggestions come from the in-memory catalog and FAQ table, so no storage
//! is touched while the user types.

use crate::{bot::BotData, core::responder::Responder, errors::Error};

/// Discord shows at most this many suggestions
const MAX_SUGGESTIONS: usize = 25;

/// Provides autocomplete suggestions for product names.
///
/// Returns catalog product names containing the partial input (ignoring
/// case), in catalog order.
pub async fn autocomplete_product_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let mut names = ctx.data().catalog.names_matching(partial);
    names.truncate(MAX_SUGGESTIONS);
    names
}

/// Provides autocomplete suggestions for FAQ topic keys.
///
/// A topic is suggested when its key or its title contains the partial input.
pub async fn autocomplete_topic(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    topics_matching(&ctx.data().responder, partial)
        .into_iter()
        .map(|(key, _)| key)
        .collect()
}

/// `(key, title)` of topics whose key or title contains `partial`.
fn topics_matching(responder: &Responder, partial: &str) -> Vec<(String, String)> {
    let partial_lower = partial.trim().to_lowercase();
    responder
        .topics()
        .iter()
        .filter(|t| {
            t.key.to_lowercase().contains(&partial_lower)
                || t.title.to_lowercase().contains(&partial_lower)
        })
        .map(|t| (t.key.clone(), t.title.clone()))
        .take(MAX_SUGGESTIONS)
        .collect()
}
