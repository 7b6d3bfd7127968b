//! FAQ chat Discord commands - `ask`, `faq` and `chat_clear`.
//!
//! Each user has one persisted conversation. Replies list the suggested
//! follow-up topics by title so they can be picked with `/faq`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{chat::ChatMessage, responder::Responder},
        errors::{Error, Result},
    };
    use std::fmt::Write;

    fn render_reply(responder: &Responder, message: &ChatMessage) -> Result<String> {
        let mut response = format!("🐔 {}", message.text);
        if let Some(topics) = message.suggested_topics.as_deref().filter(|t| !t.is_empty()) {
            response.push_str("\n\n**You might also ask:**\n");
            for key in topics {
                writeln!(&mut response, "• {} (`/faq {key}`)", responder.title_of(key))?;
            }
        }
        Ok(response)
    }

    /// Asks the farm assistant a question.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ask(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Your question (e.g., 'How much are the eggs?')"] question: String,
    ) -> Result<()> {
        if question.trim().is_empty() {
            ctx.say("❓ Type a question after `/ask`.").await?;
            return Ok(());
        }

        ctx.defer().await?;
        let user_id = ctx.author().id.to_string();
        let mut session = ctx.data().chat(&user_id).await?;

        let Some(reply) = session.send(&question).await? else {
            ctx.say("❓ Type a question after `/ask`.").await?;
            return Ok(());
        };

        ctx.say(render_reply(session.responder(), &reply)?).await?;
        Ok(())
    }

    /// Answers one of the common questions directly.
    #[poise::command(slash_command, prefix_command)]
    pub async fn faq(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Topic to ask about"]
        #[autocomplete = "autocomplete::autocomplete_topic"]
        topic: String,
    ) -> Result<()> {
        ctx.defer().await?;
        let user_id = ctx.author().id.to_string();
        let mut session = ctx.data().chat(&user_id).await?;

        let reply = session.choose_topic(topic.trim()).await?;
        ctx.say(render_reply(session.responder(), &reply)?).await?;
        Ok(())
    }

    /// Forgets your conversation with the farm assistant.
    #[poise::command(slash_command, prefix_command)]
    pub async fn chat_clear(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user_id = ctx.author().id.to_string();
        let mut session = ctx.data().chat(&user_id).await?;
        session.clear().await?;

        let welcome = session
            .messages()
            .first()
            .map(|m| render_reply(session.responder(), m))
            .transpose()?
            .unwrap_or_default();
        ctx.say(format!("🧹 Conversation cleared.\n\n{welcome}")).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
