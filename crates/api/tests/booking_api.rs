//! HTTP-level tests for the booking endpoints: create, update, pay, delete,
//! availability checks and price lookups.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, delete, get, send_json, send_json_as, Fixture};
use serde_json::{json, Value};
use sqlx::PgPool;

fn booking(f: &Fixture, zones: &[i64], from: &str, to: &str) -> Value {
    json!({
        "branch_id": f.branch_id,
        "zone_ids": zones,
        "start_time": format!("2025-03-10T{from}:00Z"),
        "end_time": format!("2025-03-10T{to}:00Z"),
        "service_id": f.service_id,
        "final_price": 100,
        "client": { "name": "Anna", "phone": "+7 (900) 123-45-67" },
    })
}

async fn create(pool: &PgPool, body: Value) -> Value {
    let response = send_json(
        common::build_test_app(pool.clone()),
        Method::POST,
        "/api/v1/appointments",
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

async fn client_totals(pool: &PgPool, client_id: i64) -> (f64, f64, i32) {
    let json = body_json(
        get(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/clients/{client_id}"),
        )
        .await,
    )
    .await;
    (
        json["data"]["paid"].as_f64().unwrap(),
        json["data"]["spent"].as_f64().unwrap(),
        json["data"]["visits_count"].as_i64().unwrap() as i32,
    )
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn create_books_and_creates_the_client(pool: PgPool) {
    let f = common::seed(&pool).await;

    let json = create(&pool, booking(&f, &[f.zone_a], "10:00", "11:00")).await;

    let data = &json["data"];
    assert!(data["appointment_id"].is_i64());
    assert_eq!(data["public_code"].as_str().unwrap().len(), 8);
    assert!(data["client_id"].is_i64());
    assert_eq!(data["client_found"], false);
    assert_eq!(data["client_created"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn second_booking_with_same_phone_finds_the_client(pool: PgPool) {
    let f = common::seed(&pool).await;
    let first = create(&pool, booking(&f, &[f.zone_a], "10:00", "11:00")).await;

    let mut body = booking(&f, &[f.zone_a], "12:00", "13:00");
    body["client"]["phone"] = json!("7 900 123 45 67");
    let second = create(&pool, body).await;

    assert_eq!(second["data"]["client_id"], first["data"]["client_id"]);
    assert_eq!(second["data"]["client_found"], true);
    assert_eq!(second["data"]["client_created"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn create_without_contact_has_no_client(pool: PgPool) {
    let f = common::seed(&pool).await;
    let mut body = booking(&f, &[f.zone_a], "10:00", "11:00");
    body["client"] = json!({ "name": "Walk-in" });

    let json = create(&pool, body).await;

    assert!(json["data"]["client_id"].is_null());
    assert_eq!(json["data"]["client_created"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn overlapping_booking_is_rejected(pool: PgPool) {
    let f = common::seed(&pool).await;
    create(&pool, booking(&f, &[f.zone_a], "10:00", "11:00")).await;

    let response = send_json(
        common::build_test_app(pool.clone()),
        Method::POST,
        "/api/v1/appointments",
        booking(&f, &[f.zone_a, f.zone_b], "10:30", "11:30"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn overlap_is_only_logged_when_enforcement_is_off(pool: PgPool) {
    let f = common::seed(&pool).await;
    create(&pool, booking(&f, &[f.zone_a], "10:00", "11:00")).await;

    let config = slotbook_api::config::ServerConfig {
        enforce_availability: false,
        ..common::test_config()
    };
    let response = send_json(
        common::build_app_with_config(pool.clone(), config),
        Method::POST,
        "/api/v1/appointments",
        booking(&f, &[f.zone_a], "10:30", "11:30"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn back_to_back_bookings_are_allowed(pool: PgPool) {
    let f = common::seed(&pool).await;
    create(&pool, booking(&f, &[f.zone_a], "10:00", "11:00")).await;
    create(&pool, booking(&f, &[f.zone_a], "11:00", "12:00")).await;
    create(&pool, booking(&f, &[f.zone_b], "10:00", "11:00")).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn closed_or_missing_zones_are_rejected(pool: PgPool) {
    let f = common::seed(&pool).await;

    let response = send_json(
        common::build_test_app(pool.clone()),
        Method::POST,
        "/api/v1/appointments",
        booking(&f, &[f.closed_zone], "10:00", "11:00"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send_json(
        common::build_test_app(pool.clone()),
        Method::POST,
        "/api/v1/appointments",
        booking(&f, &[999_999], "10:00", "11:00"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn missing_fields_return_400(pool: PgPool) {
    let f = common::seed(&pool).await;

    for field in ["branch_id", "zone_ids", "start_time", "service_id"] {
        let mut body = booking(&f, &[f.zone_a], "10:00", "11:00");
        body.as_object_mut().unwrap().remove(field);

        let response = send_json(
            common::build_test_app(pool.clone()),
            Method::POST,
            "/api/v1/appointments",
            body,
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "without {field}");
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn reversed_window_returns_400(pool: PgPool) {
    let f = common::seed(&pool).await;

    let response = send_json(
        common::build_test_app(pool.clone()),
        Method::POST,
        "/api/v1/appointments",
        booking(&f, &[f.zone_a], "11:00", "10:00"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Availability check
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn check_reports_conflicts_and_honours_exclusion(pool: PgPool) {
    let f = common::seed(&pool).await;
    let created = create(&pool, booking(&f, &[f.zone_a], "10:00", "11:00")).await;
    let id = created["data"]["appointment_id"].as_i64().unwrap();

    let probe = json!({
        "branch_id": f.branch_id,
        "zone_ids": [f.zone_a],
        "start_time": "2025-03-10T10:30:00Z",
        "end_time": "2025-03-10T11:30:00Z",
    });
    let json = body_json(
        send_json(
            common::build_test_app(pool.clone()),
            Method::POST,
            "/api/v1/appointments/check",
            probe.clone(),
        )
        .await,
    )
    .await;
    assert_eq!(json["data"]["available"], false);
    assert_eq!(json["data"]["conflicts"][0]["id"], id);

    let mut excluded = probe;
    excluded["appointment_id"] = json!(id);
    let json = body_json(
        send_json(
            common::build_test_app(pool.clone()),
            Method::POST,
            "/api/v1/appointments/check",
            excluded,
        )
        .await,
    )
    .await;
    assert_eq!(json["data"]["available"], true);
}

// ---------------------------------------------------------------------------
// Update, pay and the client ledger
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn paying_and_unpaying_moves_the_ledger(pool: PgPool) {
    let f = common::seed(&pool).await;
    let created = create(&pool, booking(&f, &[f.zone_a], "10:00", "11:00")).await;
    let id = created["data"]["appointment_id"].as_i64().unwrap();
    let client_id = created["data"]["client_id"].as_i64().unwrap();
    assert_eq!(client_totals(&pool, client_id).await.0, 0.0);

    let response = send_json(
        common::build_test_app(pool.clone()),
        Method::POST,
        &format!("/api/v1/appointments/{id}/pay"),
        json!({ "is_paid": true, "payment_method": "card" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["is_paid"], true);
    assert_eq!(json["data"]["payment_method"], "card");

    let (paid, spent, _) = client_totals(&pool, client_id).await;
    assert_eq!(paid, 100.0);
    assert_eq!(spent, 100.0);

    let mut unpaid = booking(&f, &[f.zone_a], "10:00", "11:00");
    unpaid["is_paid"] = json!(false);
    let response = send_json(
        common::build_test_app(pool.clone()),
        Method::PUT,
        &format!("/api/v1/appointments/{id}"),
        unpaid,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let (paid, spent, _) = client_totals(&pool, client_id).await;
    assert_eq!(paid, 0.0);
    assert_eq!(spent, 0.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn pay_rejects_unknown_methods(pool: PgPool) {
    let f = common::seed(&pool).await;
    let created = create(&pool, booking(&f, &[f.zone_a], "10:00", "11:00")).await;
    let id = created["data"]["appointment_id"].as_i64().unwrap();

    for body in [
        json!({ "is_paid": true, "payment_method": "barter" }),
        json!({ "is_paid": true }),
    ] {
        let response = send_json(
            common::build_test_app(pool.clone()),
            Method::POST,
            &format!("/api/v1/appointments/{id}/pay"),
            body,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn arrived_counts_as_a_visit_but_cancelled_does_not(pool: PgPool) {
    let f = common::seed(&pool).await;
    let created = create(&pool, booking(&f, &[f.zone_a], "10:00", "11:00")).await;
    let id = created["data"]["appointment_id"].as_i64().unwrap();
    let client_id = created["data"]["client_id"].as_i64().unwrap();
    assert_eq!(client_totals(&pool, client_id).await.2, 0);

    let mut cancelled = booking(&f, &[f.zone_b], "12:00", "13:00");
    cancelled["status"] = json!("cancelled");
    let sibling = create(&pool, cancelled).await;
    assert_eq!(sibling["data"]["client_id"], client_id);
    assert_eq!(client_totals(&pool, client_id).await.2, 0);

    let mut arrived = booking(&f, &[f.zone_a], "10:00", "11:00");
    arrived["status"] = json!("arrived");
    let response = send_json(
        common::build_test_app(pool.clone()),
        Method::PUT,
        &format!("/api/v1/appointments/{id}"),
        arrived,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(client_totals(&pool, client_id).await.2, 1);

    let client = body_json(
        get(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/clients/{client_id}"),
        )
        .await,
    )
    .await;
    assert_eq!(client["data"]["first_visit"], "2025-03-10T10:00:00Z");
    assert_eq!(client["data"]["last_visit"], "2025-03-10T10:00:00Z");

    let history = body_json(
        get(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/appointments/{id}/history?action=status_change"),
        )
        .await,
    )
    .await;
    assert_eq!(history["data"].as_array().unwrap().len(), 1);
    assert_eq!(history["data"][0]["changes"]["after"]["status"], "arrived");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn update_cannot_move_a_booking_to_another_branch(pool: PgPool) {
    let f = common::seed(&pool).await;
    let other = common::seed(&pool).await;
    let created = create(&pool, booking(&f, &[f.zone_a], "10:00", "11:00")).await;
    let id = created["data"]["appointment_id"].as_i64().unwrap();

    let response = send_json(
        common::build_test_app(pool.clone()),
        Method::PUT,
        &format!("/api/v1/appointments/{id}"),
        booking(&other, &[other.zone_a], "10:00", "11:00"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "CROSS_BRANCH");

    let response = send_json(
        common::build_test_app(pool.clone()),
        Method::PUT,
        "/api/v1/appointments/999999",
        booking(&f, &[f.zone_a], "10:00", "11:00"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Delete and history
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn delete_keeps_history_and_frees_the_slot(pool: PgPool) {
    let f = common::seed(&pool).await;
    let created = create(&pool, booking(&f, &[f.zone_a], "10:00", "11:00")).await;
    let id = created["data"]["appointment_id"].as_i64().unwrap();

    let response = delete(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/appointments/{id}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["appointment_id"], id);

    let response = get(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/appointments/{id}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let history = body_json(
        get(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/appointments/{id}/history"),
        )
        .await,
    )
    .await;
    let actions: Vec<&str> = history["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["delete", "create"]);

    create(&pool, booking(&f, &[f.zone_a], "10:00", "11:00")).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn deleting_twice_returns_404_without_new_history(pool: PgPool) {
    let f = common::seed(&pool).await;
    let created = create(&pool, booking(&f, &[f.zone_a], "10:00", "11:00")).await;
    let id = created["data"]["appointment_id"].as_i64().unwrap();
    let uri = format!("/api/v1/appointments/{id}");

    let first = delete(common::build_test_app(pool.clone()), &uri).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = delete(common::build_test_app(pool.clone()), &uri).await;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(second).await["code"], "NOT_FOUND");

    let history = body_json(
        get(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/appointments/{id}/history?action=delete"),
        )
        .await,
    )
    .await;
    assert_eq!(history["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn bearer_token_user_is_recorded_in_history(pool: PgPool) {
    let f = common::seed(&pool).await;
    let token = common::bearer_token(77);

    let response = send_json_as(
        common::build_test_app(pool.clone()),
        Method::POST,
        "/api/v1/appointments",
        booking(&f, &[f.zone_a], "10:00", "11:00"),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["data"]["appointment_id"]
        .as_i64()
        .unwrap();

    let history = body_json(
        get(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/appointments/{id}/history"),
        )
        .await,
    )
    .await;
    assert_eq!(history["data"][0]["user_id"], 77);
    assert_eq!(history["data"][0]["source"], "web");
}

// ---------------------------------------------------------------------------
// Prices
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn price_lookup_prefers_time_scoped_rules(pool: PgPool) {
    let f = common::seed(&pool).await;

    let response = send_json(
        common::build_test_app(pool.clone()),
        Method::POST,
        "/api/v1/services",
        json!({
            "category_id": f.category_id,
            "branch_id": f.branch_id,
            "name": "Colour",
            "zone_ids": [f.zone_a],
            "price_rules": [
                { "day_type": "weekday", "time_from": "09:00", "time_to": "12:00", "price": 50 },
                { "day_type": "weekday", "price": 40 },
            ],
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let service_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    for (time, expected) in [("10:00", 50.0), ("14:00", 40.0)] {
        let json = body_json(
            get(
                common::build_test_app(pool.clone()),
                &format!(
                    "/api/v1/services/{service_id}/price?branch_id={}&zone_id={}&day_type=weekday&time={time}",
                    f.branch_id, f.zone_a
                ),
            )
            .await,
        )
        .await;
        assert_eq!(json["data"]["price"], expected, "at {time}");
    }

    let json = body_json(
        get(
            common::build_test_app(pool.clone()),
            &format!(
                "/api/v1/services/{service_id}/price?branch_id={}&day_type=holiday",
                f.branch_id
            ),
        )
        .await,
    )
    .await;
    assert!(json["data"]["price"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn zone_services_reject_a_zone_from_another_branch(pool: PgPool) {
    let f = common::seed(&pool).await;
    let other = common::seed(&pool).await;

    let response = get(
        common::build_test_app(pool.clone()),
        &format!(
            "/api/v1/branches/{}/zones/{}/services?day_type=weekday",
            f.branch_id, other.zone_a
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(
        get(
            common::build_test_app(pool.clone()),
            &format!(
                "/api/v1/branches/{}/zones/{}/services?day_type=weekday",
                f.branch_id, f.zone_a
            ),
        )
        .await,
    )
    .await;
    assert_eq!(json["data"][0]["id"], f.service_id);
}
