mod common;

use axum::http::{Method, StatusCode};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use rental_api::services::orders::{OrderDraft, OrderItemDraft};

use common::TestApp;

/// Seeds one order whose total equals `amount`, dated `order_date`.
async fn seed_order(app: &TestApp, order_date: NaiveDate, amount: i64) {
    let draft = OrderDraft {
        customer_name: "Seed Customer".to_string(),
        customer_phone: "08120000000".to_string(),
        customer_address: None,
        order_date: Some(order_date),
        rental_start_date: order_date,
        rental_end_date: order_date,
        notes: None,
        items: vec![OrderItemDraft {
            car_type: "Toyota Avanza".to_string(),
            quantity: 1,
            daily_rate: Decimal::from(amount),
            days: 1,
        }],
    };

    app.state
        .services
        .orders
        .create_order(draft)
        .await
        .expect("seed order");
}

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn amount(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("amount should be a string")).expect("parse amount")
}

#[tokio::test]
async fn monthly_report_groups_by_month_and_filters_year() {
    let app = TestApp::new().await;

    seed_order(&app, day(2024, 3, 10), 500_000).await;
    seed_order(&app, day(2024, 3, 25), 700_000).await;
    seed_order(&app, day(2024, 5, 2), 300_000).await;
    seed_order(&app, day(2023, 7, 1), 900_000).await;

    let body = app
        .request_json(
            Method::GET,
            "/api/v1/reports/monthly?year=2024",
            None,
            StatusCode::OK,
        )
        .await;

    assert!(body["success"].as_bool().unwrap_or(false));
    let data = &body["data"];
    assert_eq!(data["year"], 2024);

    let months = data["months"].as_array().expect("months array");
    assert_eq!(months.len(), 2);

    assert_eq!(months[0]["month"], "March");
    assert_eq!(months[0]["month_number"], 3);
    assert_eq!(months[0]["order_count"], 2);
    assert_eq!(amount(&months[0]["total_revenue"]), Decimal::from(1_200_000));

    assert_eq!(months[1]["month"], "May");
    assert_eq!(months[1]["order_count"], 1);
    assert_eq!(amount(&months[1]["total_revenue"]), Decimal::from(300_000));

    let totals = &data["totals"];
    assert_eq!(totals["total_orders"], 3);
    assert_eq!(amount(&totals["total_revenue"]), Decimal::from(1_500_000));
    // two active months, not twelve
    assert_eq!(
        amount(&totals["average_revenue_per_month"]),
        Decimal::from(750_000)
    );

    let years: Vec<i64> = data["available_years"]
        .as_array()
        .expect("years array")
        .iter()
        .map(|y| y.as_i64().expect("year"))
        .collect();
    assert_eq!(years, vec![2024, 2023]);
}

#[tokio::test]
async fn monthly_report_average_rounds_to_two_decimals() {
    let app = TestApp::new().await;

    seed_order(&app, day(2024, 1, 3), 500).await;
    seed_order(&app, day(2024, 2, 3), 300).await;
    seed_order(&app, day(2024, 3, 3), 200).await;

    let body = app
        .request_json(
            Method::GET,
            "/api/v1/reports/monthly?year=2024",
            None,
            StatusCode::OK,
        )
        .await;

    // 1000 / 3 months
    assert_eq!(
        amount(&body["data"]["totals"]["average_revenue_per_month"]),
        Decimal::from_str("333.33").unwrap()
    );
}

#[tokio::test]
async fn monthly_report_for_year_without_orders_is_empty() {
    let app = TestApp::new().await;

    seed_order(&app, day(2024, 3, 10), 500_000).await;

    let body = app
        .request_json(
            Method::GET,
            "/api/v1/reports/monthly?year=1999",
            None,
            StatusCode::OK,
        )
        .await;

    let data = &body["data"];
    assert_eq!(data["year"], 1999);
    assert_eq!(data["months"].as_array().map(|m| m.len()), Some(0));

    let totals = &data["totals"];
    assert_eq!(totals["total_orders"], 0);
    assert_eq!(amount(&totals["total_revenue"]), Decimal::ZERO);
    assert_eq!(amount(&totals["average_revenue_per_month"]), Decimal::ZERO);

    // Other years with data are still advertised
    let years = data["available_years"].as_array().expect("years array");
    assert_eq!(years.len(), 1);
    assert_eq!(years[0], 2024);
}

#[tokio::test]
async fn monthly_report_defaults_to_current_year() {
    let app = TestApp::new().await;

    let today = Utc::now().date_naive();
    seed_order(&app, today, 400_000).await;

    let body = app
        .request_json(Method::GET, "/api/v1/reports/monthly", None, StatusCode::OK)
        .await;

    let data = &body["data"];
    assert_eq!(data["year"], i64::from(today.year()));

    let months = data["months"].as_array().expect("months array");
    assert_eq!(months.len(), 1);
    assert_eq!(months[0]["month_number"], i64::from(today.month()));
    assert_eq!(amount(&months[0]["total_revenue"]), Decimal::from(400_000));
}

#[tokio::test]
async fn monthly_report_on_empty_database_has_no_years() {
    let app = TestApp::new().await;

    let body = app
        .request_json(Method::GET, "/api/v1/reports/monthly", None, StatusCode::OK)
        .await;

    let data = &body["data"];
    assert_eq!(data["months"].as_array().map(|m| m.len()), Some(0));
    assert_eq!(data["available_years"].as_array().map(|y| y.len()), Some(0));
    assert_eq!(data["totals"]["total_orders"], 0);
}
