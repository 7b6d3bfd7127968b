//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Cart commands
pub mod cart;

/// FAQ chat commands
pub mod chat;

/// General utility commands
pub mod general;

/// Checkout and order history commands
pub mod order;

// Export commands
pub use cart::*;
pub use chat::*;
pub use general::*;
pub use order::*;

use crate::core::cart::CartLineItem;
use rust_decimal::Decimal;
use std::fmt::Write;

/// Formats an amount of money for display.
pub(crate) fn money(amount: Decimal) -> String {
    format!("${amount:.2}")
}

/// Renders cart lines as a numbered list, positions starting at 1.
pub(crate) fn render_lines(items: &[CartLineItem]) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    for (position, item) in items.iter().enumerate() {
        writeln!(
            &mut out,
            "`{}.` **{}** × {} @ {} = {}",
            position + 1,
            item.name(),
            item.quantity(),
            money(item.unit_price()),
            money(item.total_price())
        )?;
    }
    Ok(out)
}

/// Converts a 1-based position typed by a user into a cart index.
pub(crate) const fn to_index(position: u32) -> Option<usize> {
    match position {
        0 => None,
        p => Some(p as usize - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::cart::Cart, test_utils::test_product};

    #[test]
    fn test_positions_are_one_based() {
        assert_eq!(to_index(0), None);
        assert_eq!(to_index(1), Some(0));
        assert_eq!(to_index(3), Some(2));
    }

    #[test]
    fn test_render_lines() -> Result<(), std::fmt::Error> {
        let mut cart = Cart::new();
        cart.add_product(&test_product("eggs", "Eggs", 450));
        cart.add_product(&test_product("eggs", "Eggs", 450));

        let rendered = render_lines(cart.items())?;
        assert_eq!(rendered, "`1.` **Eggs** × 2 @ $4.50 = $9.00\n");
        Ok(())
    }
}
