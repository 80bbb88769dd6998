//! Cart
//!
//! The marketplace cart and its totals.

use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::discounts::{DiscountError, split_discount, whole_percent};

/// Errors related to cart lines or totals.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// Lines need at least one unit.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// Unit prices cannot be negative.
    #[error("unit price must not be negative, got {0} minor units")]
    NegativePrice(i64),

    /// Subscription discounts are whole percentages up to 100.
    #[error("subscription discount must be between 0 and 100, got {0}")]
    InvalidDiscount(u8),

    /// The product is not in the cart.
    #[error("product {0} is not in the cart")]
    UnknownProduct(String),

    /// A line's currency differs from the cart currency (line currency, cart currency).
    #[error("Line has currency {0}, but cart has currency {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// Multiplying a price by its quantity overflowed.
    #[error("amount overflowed while totalling the cart")]
    Overflow,

    /// Wrapped discount calculation error.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// A product in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine<'a> {
    product_id: String,
    unit_price: Money<'a, Currency>,
    quantity: u32,
    subscription_discount_pct: u8,
}

impl<'a> CartLine<'a> {
    /// Create a new cart line.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`]: `quantity` is zero.
    /// - [`CartError::NegativePrice`]: `unit_price` is below zero.
    /// - [`CartError::InvalidDiscount`]: `subscription_discount_pct` is above 100.
    pub fn new(
        product_id: impl Into<String>,
        unit_price: Money<'a, Currency>,
        quantity: u32,
        subscription_discount_pct: u8,
    ) -> Result<Self, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        if unit_price.to_minor_units() < 0 {
            return Err(CartError::NegativePrice(unit_price.to_minor_units()));
        }

        if subscription_discount_pct > 100 {
            return Err(CartError::InvalidDiscount(subscription_discount_pct));
        }

        Ok(Self {
            product_id: product_id.into(),
            unit_price,
            quantity,
            subscription_discount_pct,
        })
    }

    /// Product identifier
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// Price per unit
    pub fn unit_price(&self) -> Money<'a, Currency> {
        self.unit_price
    }

    /// Units in the cart
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Subscriber discount on this product, in whole percent
    pub fn subscription_discount_pct(&self) -> u8 {
        self.subscription_discount_pct
    }

    /// Unit price multiplied by quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Overflow`] if the multiplication overflows.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, CartError> {
        let minor = self
            .unit_price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
            .ok_or(CartError::Overflow)?;

        Ok(Money::from_minor(minor, self.unit_price.currency()))
    }

    /// Discounted line total and the amount removed by the subscription discount.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the calculation overflows.
    pub fn priced(&self) -> Result<(Money<'a, Currency>, Money<'a, Currency>), CartError> {
        let subtotal = self.subtotal()?;

        Ok(split_discount(
            &whole_percent(self.subscription_discount_pct),
            subtotal,
        )?)
    }

    /// Line total after the subscription discount.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the calculation overflows.
    pub fn total(&self) -> Result<Money<'a, Currency>, CartError> {
        Ok(self.priced()?.0)
    }
}

/// Cart-level totals.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CartTotals<'a> {
    /// Sum of line subtotals
    pub subtotal: Money<'a, Currency>,

    /// Sum of subscription discounts
    pub discount: Money<'a, Currency>,

    /// Amount payable
    pub total: Money<'a, Currency>,

    /// Number of units across all lines
    pub item_count: u64,
}

/// Cart
#[derive(Debug, Clone)]
pub struct Cart<'a> {
    lines: Vec<CartLine<'a>>,
    currency: &'static Currency,
}

impl<'a> Cart<'a> {
    /// Create an empty cart.
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            lines: Vec::new(),
            currency,
        }
    }

    /// Add a line. Adding a product already in the cart adds to its quantity, and
    /// the newer price and discount replace the old ones.
    ///
    /// # Errors
    ///
    /// - [`CartError::CurrencyMismatch`]: the line is priced in another currency.
    /// - [`CartError::Overflow`]: the merged quantity overflows.
    pub fn add(&mut self, line: CartLine<'a>) -> Result<(), CartError> {
        let line_currency = line.unit_price.currency();

        if line_currency != self.currency {
            return Err(CartError::CurrencyMismatch(
                line_currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|existing| existing.product_id == line.product_id)
        {
            existing.quantity = existing
                .quantity
                .checked_add(line.quantity)
                .ok_or(CartError::Overflow)?;
            existing.unit_price = line.unit_price;
            existing.subscription_discount_pct = line.subscription_discount_pct;
        } else {
            self.lines.push(line);
        }

        Ok(())
    }

    /// Remove a product, returning its line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownProduct`] if the product is not in the cart.
    pub fn remove(&mut self, product_id: &str) -> Result<CartLine<'a>, CartError> {
        let pos = self.position(product_id)?;

        Ok(self.lines.remove(pos))
    }

    /// Replace the quantity of a product.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`]: `quantity` is zero.
    /// - [`CartError::UnknownProduct`]: the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let pos = self.position(product_id)?;

        if let Some(line) = self.lines.get_mut(pos) {
            line.quantity = quantity;
        }

        Ok(())
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in insertion order
    pub fn lines(&self) -> &[CartLine<'a>] {
        &self.lines
    }

    /// Number of distinct products
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Cart currency
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Calculate cart totals.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if a line total overflows.
    pub fn totals(&self) -> Result<CartTotals<'a>, CartError> {
        let zero = Money::from_minor(0, self.currency);

        self.lines.iter().try_fold(
            CartTotals {
                subtotal: zero,
                discount: zero,
                total: zero,
                item_count: 0,
            },
            |acc, line| {
                let (total, discount) = line.priced()?;

                Ok(CartTotals {
                    subtotal: acc.subtotal.add(line.subtotal()?)?,
                    discount: acc.discount.add(discount)?,
                    total: acc.total.add(total)?,
                    item_count: acc.item_count.saturating_add(u64::from(line.quantity)),
                })
            },
        )
    }

    fn position(&self, product_id: &str) -> Result<usize, CartError> {
        self.lines
            .iter()
            .position(|line| line.product_id == product_id)
            .ok_or_else(|| CartError::UnknownProduct(product_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{IDR, USD};
    use testresult::TestResult;

    use super::*;

    fn idr(minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, IDR)
    }

    #[test]
    fn line_rejects_zero_quantity_and_large_discounts() {
        assert_eq!(
            CartLine::new("jar", idr(100), 0, 0),
            Err(CartError::InvalidQuantity)
        );
        assert_eq!(
            CartLine::new("jar", idr(100), 1, 101),
            Err(CartError::InvalidDiscount(101))
        );
    }

    #[test]
    fn line_rejects_negative_price() {
        assert_eq!(
            CartLine::new("jar", idr(-5_000), 2, 0),
            Err(CartError::NegativePrice(-5_000))
        );
        assert!(CartLine::new("sample", idr(0), 1, 0).is_ok());
    }

    #[test]
    fn line_total_applies_subscription_discount() -> TestResult {
        let line = CartLine::new("tote", idr(12_500), 3, 10)?;

        assert_eq!(line.subtotal()?, idr(37_500));
        assert_eq!(line.total()?, idr(33_750));

        Ok(())
    }

    #[test]
    fn full_discount_is_free_not_negative() -> TestResult {
        let line = CartLine::new("sample", idr(5_000), 2, 100)?;

        assert_eq!(line.total()?, idr(0));

        Ok(())
    }

    #[test]
    fn adding_same_product_merges_quantity() -> TestResult {
        let mut cart = Cart::new(IDR);

        cart.add(CartLine::new("bottle", idr(20_000), 1, 0)?)?;
        cart.add(CartLine::new("bottle", idr(18_000), 2, 5)?)?;

        assert_eq!(cart.len(), 1);

        let line = cart.lines().first();
        assert_eq!(line.map(CartLine::quantity), Some(3));
        assert_eq!(line.map(CartLine::unit_price), Some(idr(18_000)));
        assert_eq!(line.map(CartLine::subscription_discount_pct), Some(5));

        Ok(())
    }

    #[test]
    fn totals_sum_all_lines() -> TestResult {
        let mut cart = Cart::new(IDR);

        cart.add(CartLine::new("bottle", idr(20_000), 2, 0)?)?;
        cart.add(CartLine::new("brush", idr(9_999), 1, 20)?)?;

        let totals = cart.totals()?;

        assert_eq!(totals.subtotal, idr(49_999));
        assert_eq!(totals.discount, idr(2_000));
        assert_eq!(totals.total, idr(47_999));
        assert_eq!(totals.item_count, 3);

        Ok(())
    }

    #[test]
    fn empty_cart_totals_are_zero() -> TestResult {
        let totals = Cart::new(IDR).totals()?;

        assert_eq!(totals.total, idr(0));
        assert_eq!(totals.item_count, 0);

        Ok(())
    }

    #[test]
    fn currency_mismatch_is_rejected() -> TestResult {
        let mut cart = Cart::new(IDR);
        let result = cart.add(CartLine::new("mug", Money::from_minor(500, USD), 1, 0)?);

        assert_eq!(result, Err(CartError::CurrencyMismatch("USD", "IDR")));

        Ok(())
    }

    #[test]
    fn remove_and_set_quantity() -> TestResult {
        let mut cart = Cart::new(IDR);

        cart.add(CartLine::new("bottle", idr(20_000), 1, 0)?)?;
        cart.add(CartLine::new("brush", idr(5_000), 1, 0)?)?;

        cart.set_quantity("brush", 4)?;
        assert_eq!(cart.totals()?.item_count, 5);

        let removed = cart.remove("bottle")?;
        assert_eq!(removed.product_id(), "bottle");
        assert_eq!(cart.len(), 1);

        assert_eq!(
            cart.remove("bottle"),
            Err(CartError::UnknownProduct("bottle".to_string()))
        );
        assert_eq!(
            cart.set_quantity("brush", 0),
            Err(CartError::InvalidQuantity)
        );

        cart.clear();
        assert!(cart.is_empty());

        Ok(())
    }
}
