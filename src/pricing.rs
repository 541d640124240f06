//! Money math for rental orders.
//!
//! All amounts are [`Decimal`] so totals stay exact; floating point never
//! touches a price. A line is priced as `quantity * daily_rate * days` and
//! an order total is the sum of its line subtotals.

use rust_decimal::Decimal;

/// Computes the subtotal for a single rental line.
pub fn line_subtotal(quantity: i32, daily_rate: Decimal, days: i32) -> Decimal {
    Decimal::from(quantity) * daily_rate * Decimal::from(days)
}

/// Sums line subtotals into an order total. An empty iterator yields zero.
pub fn order_total<I>(subtotals: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    subtotals.into_iter().sum()
}
