//! Order Discord commands - `checkout`, `orders` and `order_status`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::money},
        core::order::{CustomerInfo, DeliveryType, OrderStatus, PaymentMethod, SubmissionOutcome},
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Delivery options offered at checkout
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum DeliveryChoice {
        #[name = "Delivery to my address"]
        Delivery,
        #[name = "Pickup at the farm"]
        Pickup,
    }

    impl From<DeliveryChoice> for DeliveryType {
        fn from(choice: DeliveryChoice) -> Self {
            match choice {
                DeliveryChoice::Delivery => Self::Delivery,
                DeliveryChoice::Pickup => Self::Pickup,
            }
        }
    }

    /// Payment options offered at checkout
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum PaymentChoice {
        Cash,
        Card,
        #[name = "Bank transfer"]
        Transfer,
    }

    impl From<PaymentChoice> for PaymentMethod {
        fn from(choice: PaymentChoice) -> Self {
            match choice {
                PaymentChoice::Cash => Self::Cash,
                PaymentChoice::Card => Self::Card,
                PaymentChoice::Transfer => Self::Transfer,
            }
        }
    }

    /// Statuses an order can be moved to
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum StatusChoice {
        Pending,
        Confirmed,
        Processing,
        Delivered,
        Cancelled,
    }

    impl From<StatusChoice> for OrderStatus {
        fn from(choice: StatusChoice) -> Self {
            match choice {
                StatusChoice::Pending => Self::Pending,
                StatusChoice::Confirmed => Self::Confirmed,
                StatusChoice::Processing => Self::Processing,
                StatusChoice::Delivered => Self::Delivered,
                StatusChoice::Cancelled => Self::Cancelled,
            }
        }
    }

    fn non_blank(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Places an order for everything in your cart.
    #[poise::command(slash_command)]
    #[allow(clippy::too_many_arguments)]
    pub async fn checkout(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Your name"] name: String,
        #[description = "Phone number so we can confirm the order"] phone: String,
        #[description = "Delivery or pickup"] delivery: DeliveryChoice,
        #[description = "How you'd like to pay"] payment: PaymentChoice,
        #[description = "Delivery address (required for delivery)"] address: Option<String>,
        #[description = "E-mail for a receipt"] email: Option<String>,
        #[description = "Anything we should know"] notes: Option<String>,
    ) -> Result<()> {
        ctx.defer().await?;
        let customer = CustomerInfo {
            name: name.trim().to_string(),
            phone: phone.trim().to_string(),
            email: non_blank(email),
            address: non_blank(address),
            delivery_type: delivery.into(),
            payment_method: payment.into(),
            notes: non_blank(notes),
        };

        let submitter = ctx.data().submitter(&ctx.author().id.to_string());
        let response = match submitter.checkout(customer).await? {
            SubmissionOutcome::Confirmed {
                order_number,
                message,
            } => {
                let mut response = format!("✅ Order **{order_number}** placed. Thank you!");
                if let Some(message) = message {
                    write!(&mut response, "\n{message}")?;
                }
                response
            }
            SubmissionOutcome::SavedLocally { order_number } => format!(
                "📝 We couldn't reach the farm right now, so your order was saved as \
                 **{order_number}**. We'll be in touch by phone to confirm it."
            ),
            SubmissionOutcome::Rejected { message } => {
                format!("❌ {message}\nYour cart is unchanged, so you can try again.")
            }
            SubmissionOutcome::Invalid(issues) => {
                let mut response = String::from("⚠️ Your order needs a few fixes:\n");
                for issue in issues {
                    writeln!(&mut response, "• {issue}")?;
                }
                response
            }
        };

        ctx.say(response).await?;
        Ok(())
    }

    /// Lists your recent orders.
    #[poise::command(slash_command, prefix_command)]
    pub async fn orders(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let history = ctx.data().order_history(&ctx.author().id.to_string());
        let orders = history.list().await;

        if orders.is_empty() {
            ctx.say("📦 You haven't placed any orders yet.").await?;
            return Ok(());
        }

        let mut response = String::from("📦 **Your orders**\n\n");
        for order in orders.iter().take(10) {
            writeln!(
                &mut response,
                "• **{}** - {} - {} item line(s), {} - _{}_",
                order.order_number.as_deref().unwrap_or("unnumbered"),
                order.created_at.format("%Y-%m-%d %H:%M"),
                order.items.len(),
                money(order.total()),
                order.status
            )?;
        }
        ctx.say(response).await?;
        Ok(())
    }

    /// Updates the status of one of your orders.
    #[poise::command(slash_command, prefix_command)]
    pub async fn order_status(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order number"] order_number: String,
        #[description = "New status"] status: StatusChoice,
    ) -> Result<()> {
        let history = ctx.data().order_history(&ctx.author().id.to_string());

        match history
            .update_status(order_number.trim(), status.into())
            .await
        {
            Ok(order) => {
                ctx.say(format!(
                    "🔄 Order **{}** is now _{}_.",
                    order_number.trim(),
                    order.status
                ))
                .await?;
            }
            Err(Error::OrderNotFound { order_number }) => {
                ctx.say(format!("❌ No order numbered '{order_number}' in your history."))
                    .await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
