//! Shipping fee rules.
//!
//! Orders of 300 TL and above ship free; everything below pays a flat
//! 49.90 TL.

use rust_decimal::Decimal;

/// Subtotal at which shipping becomes free (inclusive).
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(300, 0, 0, false, 0);

/// Flat fee for orders under the threshold.
pub const FLAT_SHIPPING_FEE: Decimal = Decimal::from_parts(4990, 0, 0, false, 2);

/// Shipping fee for a cart subtotal.
///
/// An empty cart (zero subtotal) ships nothing and pays nothing.
#[must_use]
pub fn shipping_fee(subtotal: Decimal) -> Decimal {
    if subtotal.is_zero() || subtotal >= FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else {
        FLAT_SHIPPING_FEE
    }
}
