//! Validation utilities for the Kitchen Stock Platform

use rust_decimal::Decimal;

use crate::models::{DraftLine, RecipeComponent, SaleLineItem};

// ============================================================================
// Quantity and Money
// ============================================================================

/// Largest quantity accepted on a sale line, add-on, recipe or order line
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Largest price, cost or discount accepted
pub const MAX_AMOUNT: i64 = 1_000_000_000;

/// Largest stock level (in either direction) accepted on an ingredient
pub const MAX_STOCK_LEVEL: i64 = 1_000_000_000;

// Bounded inputs keep resolver and sale total products below `Decimal::MAX`.

/// Validate that a sold or recipe quantity is strictly positive and bounded
pub fn validate_positive_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be greater than zero");
    }
    validate_quantity_bound(quantity)
}

/// Validate that a price or cost is not negative and bounded
pub fn validate_non_negative_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    if amount > Decimal::from(MAX_AMOUNT) {
        return Err("Amount is too large");
    }
    Ok(())
}

fn validate_quantity_bound(quantity: Decimal) -> Result<(), &'static str> {
    if quantity > Decimal::from(MAX_QUANTITY) {
        return Err("Quantity is too large");
    }
    Ok(())
}

/// Validate an ingredient's current stock; negatives are allowed
pub fn validate_stock_quantity(stock: Decimal) -> Result<(), &'static str> {
    if stock.abs() > Decimal::from(MAX_STOCK_LEVEL) {
        return Err("Stock level is too large");
    }
    Ok(())
}

// ============================================================================
// Inventory Setup
// ============================================================================

/// Validate configured stock levels of an ingredient
pub fn validate_stock_levels(
    min_stock_level: Decimal,
    max_stock_level: Option<Decimal>,
) -> Result<(), &'static str> {
    if min_stock_level < Decimal::ZERO {
        return Err("Minimum stock level cannot be negative");
    }
    validate_stock_quantity(min_stock_level)?;
    if let Some(max) = max_stock_level {
        if max < Decimal::ZERO {
            return Err("Maximum stock level cannot be negative");
        }
        validate_stock_quantity(max)?;
        if max > Decimal::ZERO && max < min_stock_level {
            return Err("Maximum stock level must not be below the minimum");
        }
    }
    Ok(())
}

/// Validate a recipe's component list
pub fn validate_recipe_components(components: &[RecipeComponent]) -> Result<(), &'static str> {
    if components.is_empty() {
        return Err("Recipe must have at least one ingredient");
    }
    for c in components {
        validate_positive_quantity(c.quantity_per_serving)?;
    }
    let mut ids: Vec<_> = components.iter().map(|c| c.ingredient_id).collect();
    ids.sort();
    ids.dedup();
    if ids.len() != components.len() {
        return Err("Recipe lists the same ingredient more than once");
    }
    Ok(())
}

// ============================================================================
// Sales and Orders
// ============================================================================

/// Validate the line items of a submitted sale
pub fn validate_sale_lines(lines: &[SaleLineItem]) -> Result<(), &'static str> {
    if lines.is_empty() {
        return Err("Sale must contain at least one line item");
    }
    for line in lines {
        validate_positive_quantity(line.quantity)?;
        validate_non_negative_amount(line.unit_price)?;
        for add_on in &line.add_ons {
            validate_positive_quantity(add_on.quantity)?;
            validate_non_negative_amount(add_on.unit_price)?;
        }
    }
    Ok(())
}

/// Validate a line edit on an order draft. Zero quantities are allowed.
pub fn validate_draft_line(line: &DraftLine) -> Result<(), &'static str> {
    if line.quantity < Decimal::ZERO {
        return Err("Order quantity cannot be negative");
    }
    validate_quantity_bound(line.quantity)?;
    validate_non_negative_amount(line.unit_cost)
}

// ============================================================================
// Contact Details
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SelectedAddOn;
    use uuid::Uuid;

    fn sale_line(quantity: i64) -> SaleLineItem {
        SaleLineItem {
            menu_item_id: Uuid::new_v4(),
            name: "Mocha".to_string(),
            quantity: Decimal::from(quantity),
            unit_price: Decimal::from(4),
            add_ons: vec![],
        }
    }

    #[test]
    fn test_validate_sale_lines_valid() {
        assert!(validate_sale_lines(&[sale_line(1), sale_line(3)]).is_ok());
    }

    #[test]
    fn test_validate_sale_lines_empty() {
        assert!(validate_sale_lines(&[]).is_err());
    }

    #[test]
    fn test_validate_sale_lines_zero_quantity() {
        assert!(validate_sale_lines(&[sale_line(0)]).is_err());
    }

    #[test]
    fn test_validate_sale_lines_bad_add_on() {
        let mut line = sale_line(1);
        line.add_ons.push(SelectedAddOn {
            add_on_id: Uuid::new_v4(),
            name: "Syrup".to_string(),
            quantity: Decimal::ZERO,
            unit_price: Decimal::ONE,
        });
        assert!(validate_sale_lines(&[line]).is_err());
    }

    #[test]
    fn test_validate_sale_lines_rejects_oversized_values() {
        let mut line = sale_line(1);
        line.quantity = Decimal::MAX;
        assert_eq!(validate_sale_lines(&[line]), Err("Quantity is too large"));

        let mut line = sale_line(1);
        line.unit_price = Decimal::from(MAX_AMOUNT) + Decimal::ONE;
        assert_eq!(validate_sale_lines(&[line]), Err("Amount is too large"));

        let mut line = sale_line(MAX_QUANTITY);
        line.unit_price = Decimal::from(MAX_AMOUNT);
        assert!(validate_sale_lines(&[line]).is_ok());
    }

    #[test]
    fn test_bounded_line_amount_does_not_overflow() {
        let mut line = sale_line(MAX_QUANTITY);
        line.unit_price = Decimal::from(MAX_AMOUNT);
        line.add_ons.push(SelectedAddOn {
            add_on_id: Uuid::new_v4(),
            name: "Syrup".to_string(),
            quantity: Decimal::from(MAX_QUANTITY),
            unit_price: Decimal::from(MAX_AMOUNT),
        });
        assert!(validate_sale_lines(std::slice::from_ref(&line)).is_ok());
        assert!(line.amount() > Decimal::ZERO);
    }

    #[test]
    fn test_validate_stock_quantity() {
        assert!(validate_stock_quantity(Decimal::from(-250)).is_ok());
        assert!(validate_stock_quantity(Decimal::MIN).is_err());
        assert!(validate_stock_levels(Decimal::MAX, None).is_err());
    }

    #[test]
    fn test_validate_stock_levels() {
        assert!(validate_stock_levels(Decimal::from(5), None).is_ok());
        assert!(validate_stock_levels(Decimal::from(5), Some(Decimal::from(20))).is_ok());
        assert!(validate_stock_levels(Decimal::from(5), Some(Decimal::from(2))).is_err());
        assert!(validate_stock_levels(Decimal::from(-1), None).is_err());
    }

    #[test]
    fn test_validate_recipe_components_duplicate() {
        let id = Uuid::new_v4();
        let components = vec![
            RecipeComponent { ingredient_id: id, quantity_per_serving: Decimal::ONE },
            RecipeComponent { ingredient_id: id, quantity_per_serving: Decimal::from(2) },
        ];
        assert!(validate_recipe_components(&components).is_err());
    }

    #[test]
    fn test_validate_recipe_components_empty() {
        assert!(validate_recipe_components(&[]).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("orders@roastery.co").is_ok());
        assert!(validate_email("roastery").is_err());
    }
}
