mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn reports_on_an_empty_store_are_empty() {
    let app = TestApp::new().await;

    for uri in ["/reports/product-revenue", "/reports/state-sales"] {
        let response = app.request(Method::GET, uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        assert_eq!(response_json(response).await, json!({"data": []}), "{}", uri);
    }
}

#[tokio::test]
async fn product_revenue_sums_quantity_times_price() {
    let app = TestApp::new().await;
    app.bootstrap().await;

    let a = app.insert_product("Alpha", dec!(10.00), "Maine").await;
    let _b = app.insert_product("Beta", dec!(5.00), "Maine").await;
    app.insert_invoice(a, 2, "Ohio").await;
    app.insert_invoice(a, 3, "Utah").await;

    let response = app.request(Method::GET, "/reports/product-revenue").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_json(response).await,
        json!({"data": [{"ProductID": a, "ProductName": "Alpha", "TotalRevenue": 50.0}]})
    );
}

#[tokio::test]
async fn product_revenue_is_ordered_highest_first() {
    let app = TestApp::new().await;
    app.bootstrap().await;

    let cheap = app.insert_product("Cheap", dec!(1.25), "Maine").await;
    let pricey = app.insert_product("Pricey", dec!(99.99), "Maine").await;
    app.insert_invoice(cheap, 4, "Ohio").await;
    app.insert_invoice(pricey, 1, "Ohio").await;

    let rows = app
        .state
        .services
        .reports
        .product_revenue_report()
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].product_id, pricey);
    assert!((rows[0].total_revenue - 99.99).abs() < 1e-9);
    assert_eq!(rows[1].product_id, cheap);
    assert!((rows[1].total_revenue - 5.0).abs() < 1e-9);
}

#[tokio::test]
async fn state_sales_group_by_customer_state() {
    let app = TestApp::new().await;
    app.bootstrap().await;

    let product = app.insert_product("Gadget", dec!(20.00), "Nevada").await;
    app.insert_invoice(product, 1, "CA").await;
    app.insert_invoice(product, 1, "CA").await;
    app.insert_invoice(product, 2, "TX").await;

    let response = app.request(Method::GET, "/reports/state-sales").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let mut rows = body["data"].as_array().cloned().unwrap_or_default();
    rows.sort_by(|l, r| l["State"].as_str().cmp(&r["State"].as_str()));
    assert_eq!(
        rows,
        vec![
            json!({"State": "CA", "TotalRevenue": 40.0}),
            json!({"State": "TX", "TotalRevenue": 40.0}),
        ]
    );
}

#[tokio::test]
async fn reports_agree_with_seeded_totals() {
    let app = TestApp::new().await;
    app.state
        .services
        .seeder
        .seed(sales_report_api::services::seeding::SeedParams::new(4, 60))
        .await
        .unwrap();

    let reports = &app.state.services.reports;
    let by_product = reports.product_revenue_report().await.unwrap();
    let by_state = reports.state_sales_report().await.unwrap();

    let product_total: f64 = by_product.iter().map(|r| r.total_revenue).sum();
    let state_total: f64 = by_state.iter().map(|r| r.total_revenue).sum();
    assert!(product_total > 0.0);
    assert!((product_total - state_total).abs() < 1e-6);

    for pair in by_product.windows(2) {
        assert!(pair[0].total_revenue >= pair[1].total_revenue);
    }
    for pair in by_state.windows(2) {
        assert!(pair[0].total_revenue >= pair[1].total_revenue);
    }
}
