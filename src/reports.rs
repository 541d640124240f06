//! Monthly revenue aggregation.
//!
//! Orders are bucketed by the month of their `order_date` (rental dates do
//! not matter here). The functions operate on plain rows so they can be
//! exercised without a database.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// The slice of an order that revenue reporting needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRevenue {
    pub order_date: NaiveDate,
    pub total_amount: Decimal,
}

/// Aggregated revenue for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyStatistic {
    /// English month name, e.g. "March"
    #[schema(example = "March")]
    pub month: String,
    /// Month number within the year, 1-12
    #[schema(example = 3)]
    pub month_number: u32,
    #[schema(example = 2024)]
    pub year: i32,
    /// Number of orders dated in this month
    #[schema(example = 2)]
    pub order_count: u64,
    /// Sum of order totals for this month
    #[schema(example = "1200000")]
    pub total_revenue: Decimal,
}

/// Summary line across a set of monthly statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportTotals {
    pub total_orders: u64,
    pub total_revenue: Decimal,
    /// Total revenue divided by the number of months that had orders
    pub average_revenue_per_month: Decimal,
}

/// Buckets the given orders into per-month statistics for one year.
///
/// Months without any orders are omitted; the result is sorted by month
/// ascending. Orders dated outside `year` are ignored.
pub fn monthly_rollup(rows: &[OrderRevenue], year: i32) -> Vec<MonthlyStatistic> {
    let mut buckets: BTreeMap<u32, (u64, Decimal)> = BTreeMap::new();

    for row in rows.iter().filter(|r| r.order_date.year() == year) {
        let bucket = buckets
            .entry(row.order_date.month())
            .or_insert((0, Decimal::ZERO));
        bucket.0 += 1;
        bucket.1 += row.total_amount;
    }

    buckets
        .into_iter()
        .map(|(month_number, (order_count, total_revenue))| MonthlyStatistic {
            month: month_label(month_number).to_string(),
            month_number,
            year,
            order_count,
            total_revenue,
        })
        .collect()
}

/// Distinct years that have at least one order, newest first.
pub fn available_years(rows: &[OrderRevenue]) -> Vec<i32> {
    let mut years: Vec<i32> = rows.iter().map(|r| r.order_date.year()).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

/// Collapses monthly statistics into report-level totals.
///
/// The average divides by the number of months that actually had orders,
/// not by twelve. An empty input yields all zeroes.
pub fn summarize(statistics: &[MonthlyStatistic]) -> ReportTotals {
    if statistics.is_empty() {
        return ReportTotals {
            total_orders: 0,
            total_revenue: Decimal::ZERO,
            average_revenue_per_month: Decimal::ZERO,
        };
    }

    let total_orders: u64 = statistics.iter().map(|s| s.order_count).sum();
    let total_revenue: Decimal = statistics.iter().map(|s| s.total_revenue).sum();
    let average_revenue_per_month =
        (total_revenue / Decimal::from(statistics.len() as u64)).round_dp(2);

    ReportTotals {
        total_orders,
        total_revenue,
        average_revenue_per_month,
    }
}

fn month_label(month_number: u32) -> &'static str {
    chrono::Month::try_from(month_number as u8)
        .map(|month| month.name())
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn revenue(date: NaiveDate, amount: Decimal) -> OrderRevenue {
        OrderRevenue {
            order_date: date,
            total_amount: amount,
        }
    }

    #[test]
    fn rollup_groups_orders_by_month() {
        let rows = vec![
            revenue(day(2024, 3, 10), dec!(500000)),
            revenue(day(2024, 3, 25), dec!(700000)),
            revenue(day(2024, 5, 2), dec!(250000)),
        ];

        let months = monthly_rollup(&rows, 2024);

        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, "March");
        assert_eq!(months[0].month_number, 3);
        assert_eq!(months[0].order_count, 2);
        assert_eq!(months[0].total_revenue, dec!(1200000));
        assert_eq!(months[1].month, "May");
        assert_eq!(months[1].order_count, 1);
        assert_eq!(months[1].total_revenue, dec!(250000));
    }

    #[test]
    fn rollup_skips_other_years_and_empty_months() {
        let rows = vec![
            revenue(day(2024, 1, 5), dec!(100000)),
            revenue(day(2023, 1, 5), dec!(999999)),
        ];

        let months = monthly_rollup(&rows, 2024);

        assert_eq!(months.len(), 1);
        assert_eq!(months[0].month, "January");
        assert_eq!(months[0].total_revenue, dec!(100000));
    }

    #[test]
    fn rollup_of_empty_input_is_empty() {
        assert!(monthly_rollup(&[], 2024).is_empty());
    }

    #[test]
    fn rollup_months_are_sorted_ascending() {
        let rows = vec![
            revenue(day(2024, 12, 1), dec!(1)),
            revenue(day(2024, 2, 1), dec!(1)),
            revenue(day(2024, 7, 1), dec!(1)),
        ];

        let numbers: Vec<u32> = monthly_rollup(&rows, 2024)
            .iter()
            .map(|m| m.month_number)
            .collect();

        assert_eq!(numbers, vec![2, 7, 12]);
    }

    #[test]
    fn years_are_distinct_and_newest_first() {
        let rows = vec![
            revenue(day(2022, 6, 1), dec!(1)),
            revenue(day(2024, 1, 1), dec!(1)),
            revenue(day(2022, 9, 1), dec!(1)),
            revenue(day(2023, 3, 1), dec!(1)),
        ];

        assert_eq!(available_years(&rows), vec![2024, 2023, 2022]);
    }

    #[test]
    fn summarize_averages_over_active_months_only() {
        let months = vec![
            MonthlyStatistic {
                month: "March".into(),
                month_number: 3,
                year: 2024,
                order_count: 2,
                total_revenue: dec!(1200000),
            },
            MonthlyStatistic {
                month: "May".into(),
                month_number: 5,
                year: 2024,
                order_count: 1,
                total_revenue: dec!(400000),
            },
        ];

        let totals = summarize(&months);

        assert_eq!(totals.total_orders, 3);
        assert_eq!(totals.total_revenue, dec!(1600000));
        // divides by 2 active months, not 12
        assert_eq!(totals.average_revenue_per_month, dec!(800000));
    }

    #[test]
    fn summarize_single_month_average_equals_its_revenue() {
        let months = monthly_rollup(
            &[
                revenue(day(2024, 3, 1), dec!(500000)),
                revenue(day(2024, 3, 20), dec!(700000)),
            ],
            2024,
        );

        let totals = summarize(&months);

        assert_eq!(totals.total_orders, 2);
        assert_eq!(totals.total_revenue, dec!(1200000));
        assert_eq!(totals.average_revenue_per_month, dec!(1200000));
    }

    #[test]
    fn summarize_empty_is_all_zero() {
        let totals = summarize(&[]);
        assert_eq!(totals.total_orders, 0);
        assert_eq!(totals.total_revenue, Decimal::ZERO);
        assert_eq!(totals.average_revenue_per_month, Decimal::ZERO);
    }
}
