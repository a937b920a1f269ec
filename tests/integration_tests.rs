use std::sync::{Arc, Barrier};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use rentacar::config::AppConfig;
use rentacar::db;
use rentacar::errors::AppError;
use rentacar::models::{CustomerInput, NewBooking};
use rentacar::routes;
use rentacar::services::booking;
use rentacar::services::session::AdminCredentials;
use rentacar::state::AppState;

// ── Helpers ──

const ADMIN_PASSWORD: &str = "s3cret-pass";

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_username: "admin".to_string(),
        admin_password_hash: bcrypt::hash(ADMIN_PASSWORD, 4).unwrap(),
        session_secret: "test-session-secret".to_string(),
        session_ttl_hours: 8,
        login_max_attempts: 5,
        login_window_secs: 60,
        cors_origin: None,
    }
}

fn test_state() -> Arc<AppState> {
    let config = test_config();
    let conn = db::init_db(":memory:").unwrap();
    let credentials =
        AdminCredentials::new(&config.admin_username, &config.admin_password_hash, 4).unwrap();
    Arc::new(AppState::new(conn, config, credentials))
}

fn test_app(state: Arc<AppState>) -> Router {
    routes::router(state)
}

async fn send(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, Value) {
    let res = test_app(state.clone()).oneshot(request).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn login(state: &Arc<AppState>) -> String {
    let (status, json) = send(
        state,
        with_json(
            "POST",
            "/api/auth/login",
            None,
            &json!({ "username": "admin", "password": ADMIN_PASSWORD }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["token"].as_str().unwrap().to_string()
}

fn vehicle_body(plate: &str) -> Value {
    json!({
        "plateNumber": plate,
        "brand": "Toyota",
        "model": "Corolla",
        "year": 2023,
        "category": "ECONOMICO",
        "dailyRate1_2": 35000,
        "dailyRate3_6": 30000,
        "weeklyRate": 25000,
        "monthlyRate": 20000,
        "transmission": "AUTOMATICA",
        "fuelType": "GASOLINA",
        "passengerCapacity": 5,
        "hasAC": true,
        "hasGPS": false
    })
}

async fn create_vehicle(state: &Arc<AppState>, token: &str, plate: &str) -> i64 {
    let (status, json) = send(
        state,
        with_json("POST", "/api/admin/vehicles", Some(token), &vehicle_body(plate)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["id"].as_i64().unwrap()
}

fn booking_body(vehicle_id: i64, start: &str, end: &str, email: &str, phone: &str) -> Value {
    json!({
        "vehicleId": vehicle_id,
        "startDate": start,
        "endDate": end,
        "customer": {
            "firstName": "Ana",
            "lastName": "Lopez",
            "email": email,
            "phone": phone,
            "dpi": "1234567890123",
            "licenseNumber": "LIC-00123",
            "licenseExpiry": "2099-12-31"
        },
        "pickupLocation": "Aeropuerto La Aurora"
    })
}

async fn create_booking(state: &Arc<AppState>, body: &Value) -> (StatusCode, Value) {
    send(state, with_json("POST", "/api/bookings", None, body)).await
}

async fn set_booking_status(
    state: &Arc<AppState>,
    token: &str,
    id: i64,
    status: &str,
) -> (StatusCode, Value) {
    send(
        state,
        with_json(
            "PATCH",
            &format!("/api/admin/bookings/{id}/status"),
            Some(token),
            &json!({ "status": status }),
        ),
    )
    .await
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let state = test_state();
    let (status, json) = send(&state, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

// ── Auth ──

#[tokio::test]
async fn test_admin_requires_auth() {
    let state = test_state();
    let (status, _) = send(&state, get("/api/admin/bookings", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&state, get("/api/admin/vehicles", Some("forged.token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_and_me() {
    let state = test_state();
    let token = login(&state).await;

    let (status, json) = send(&state, get("/api/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["username"], "admin");
    assert_eq!(json["role"], "admin");

    let (status, _) = send(&state, get("/api/admin/bookings", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let state = test_state();
    for (username, password) in [("admin", "wrong"), ("root", ADMIN_PASSWORD)] {
        let (status, _) = send(
            &state,
            with_json(
                "POST",
                "/api/auth/login",
                None,
                &json!({ "username": username, "password": password }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_login_is_throttled_per_client() {
    let state = test_state();
    let attempt = |ip: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header("Content-Type", "application/json")
            .header("X-Forwarded-For", ip)
            .body(Body::from(
                json!({ "username": "admin", "password": "wrong" }).to_string(),
            ))
            .unwrap()
    };

    for _ in 0..5 {
        let (status, _) = send(&state, attempt("198.51.100.4, 10.0.0.1")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, json) = send(&state, attempt("198.51.100.4")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(json["error"].as_str().is_some());

    let (status, _) = send(&state, attempt("198.51.100.5")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Fleet ──

#[tokio::test]
async fn test_vehicle_admin_flow() {
    let state = test_state();
    let token = login(&state).await;
    let id = create_vehicle(&state, &token, "P-123456").await;

    let (status, json) = send(
        &state,
        with_json("POST", "/api/admin/vehicles", Some(&token), &vehicle_body("P-123456")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("plate"));

    let (status, json) = send(
        &state,
        with_json(
            "PATCH",
            &format!("/api/admin/vehicles/{id}"),
            Some(&token),
            &json!({ "dailyRate1_2": 36000, "imageUrl": "https://cdn.example.com/corolla.jpg" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["dailyRate1_2"], 36000);
    assert_eq!(json["imageUrl"], "https://cdn.example.com/corolla.jpg");

    let (status, json) = send(&state, get("/api/vehicles", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["plateNumber"], "P-123456");
    assert_eq!(json[0]["status"], "DISPONIBLE");
    assert_eq!(json[0]["hasAC"], true);

    let (status, json) = send(
        &state,
        with_json(
            "POST",
            &format!("/api/admin/vehicles/{id}/status"),
            Some(&token),
            &json!({ "status": "MANTENIMIENTO" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "MANTENIMIENTO");

    let (status, json) = send(
        &state,
        get("/api/admin/vehicles?status=MANTENIMIENTO", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["bookingCount"], 0);

    let (status, _) = send(&state, get("/api/admin/vehicles?status=ROTO", Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_vehicle_validation_errors() {
    let state = test_state();
    let token = login(&state).await;

    let mut body = vehicle_body("123456");
    body["passengerCapacity"] = json!(40);
    let (status, json) = send(
        &state,
        with_json("POST", "/api/admin/vehicles", Some(&token), &body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"].as_array().unwrap().len(), 2);

    let mut body = vehicle_body("P-654321");
    body["category"] = json!("DEPORTIVO");
    let (status, _) = send(
        &state,
        with_json("POST", "/api/admin/vehicles", Some(&token), &body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Availability & booking ──

#[tokio::test]
async fn test_availability_requires_dates() {
    let state = test_state();
    let (status, json) = send(&state, get("/api/vehicles/available", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"][0]["field"], "startDate");

    let (status, _) = send(
        &state,
        get(
            "/api/vehicles/available?startDate=2030-07-03&endDate=2030-07-01",
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_end_to_end_booking() {
    let state = test_state();
    let token = login(&state).await;
    let vehicle_id = create_vehicle(&state, &token, "P-100200").await;

    let (status, json) = send(
        &state,
        get(
            "/api/vehicles/available?startDate=2030-07-01&endDate=2030-07-03",
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["pricing"]["total"], 78400);

    let (status, json) = create_booking(
        &state,
        &booking_body(vehicle_id, "2030-07-01", "2030-07-03", "ana@example.com", "55550001"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    let booking = &json["booking"];
    assert_eq!(booking["status"], "PENDIENTE");
    assert_eq!(booking["paymentStatus"], "PENDIENTE");
    assert_eq!(booking["totalDays"], 2);
    assert_eq!(booking["dailyRateApplied"], 35000);
    assert_eq!(booking["subtotal"], 70000);
    assert_eq!(booking["taxAmount"], 8400);
    assert_eq!(booking["totalAmount"], 78400);
    assert_eq!(booking["depositAmount"], 23520);
    assert_eq!(booking["dropoffLocation"], "Aeropuerto La Aurora");
    assert_eq!(json["customer"]["email"], "ana@example.com");
    assert_eq!(json["vehicle"]["plateNumber"], "P-100200");

    let id = booking["id"].as_i64().unwrap();
    let (status, json) = send(&state, get(&format!("/api/bookings/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking"]["totalAmount"], 78400);

    // the booked vehicle drops out of the search
    let (_, json) = send(
        &state,
        get(
            "/api/vehicles/available?startDate=2030-07-02&endDate=2030-07-04",
            None,
        ),
    )
    .await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_touching_booking_is_rejected() {
    let state = test_state();
    let token = login(&state).await;
    let vehicle_id = create_vehicle(&state, &token, "P-100200").await;

    let (status, first) = create_booking(
        &state,
        &booking_body(vehicle_id, "2030-06-01", "2030-06-05", "ana@example.com", "55550001"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = create_booking(
        &state,
        &booking_body(vehicle_id, "2030-06-05", "2030-06-08", "luis@example.com", "55550002"),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["blockingBookingIds"], json!([first["booking"]["id"]]));
}

#[tokio::test]
async fn test_booking_body_validation() {
    let state = test_state();

    let mut body = booking_body(1, "2030-06-01", "2030-06-05", "not-an-email", "55550001");
    body["customer"]["dpi"] = json!("123");
    let (status, json) = create_booking(&state, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = json["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["customer.dpi", "customer.email"]);

    let mut body = booking_body(1, "2030-06-01", "2030-06-05", "ana@example.com", "55550001");
    body["totalAmount"] = json!(1);
    let (status, json) = create_booking(&state, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"][0]["field"], "body");

    let body = booking_body(1, "2030-06-05", "2030-06-01", "ana@example.com", "55550001");
    let (status, _) = create_booking(&state, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = booking_body(999, "2030-06-01", "2030-06-05", "ana@example.com", "55550001");
    let (status, _) = create_booking(&state, &body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_repeat_customer_keeps_latest_phone() {
    let state = test_state();
    let token = login(&state).await;
    let vehicle_id = create_vehicle(&state, &token, "P-100200").await;

    let (_, first) = create_booking(
        &state,
        &booking_body(vehicle_id, "2030-06-01", "2030-06-03", "ana@example.com", "55550001"),
    )
    .await;
    let (_, second) = create_booking(
        &state,
        &booking_body(vehicle_id, "2030-06-10", "2030-06-12", "ana@example.com", "55550002"),
    )
    .await;

    assert_eq!(first["customer"]["id"], second["customer"]["id"]);
    assert_eq!(second["customer"]["phone"], "55550002");

    let (_, json) = send(&state, get("/api/admin/bookings", Some(&token))).await;
    let bookings = json.as_array().unwrap();
    assert_eq!(bookings.len(), 2);
    for b in bookings {
        assert_eq!(b["customer"]["phone"], "55550002");
    }
}

// ── Status machine & retirement ──

#[tokio::test]
async fn test_lifecycle_and_retirement_guard() {
    let state = test_state();
    let token = login(&state).await;
    let vehicle_id = create_vehicle(&state, &token, "P-100200").await;

    let (_, created) = create_booking(
        &state,
        &booking_body(vehicle_id, "2030-06-01", "2030-06-03", "ana@example.com", "55550001"),
    )
    .await;
    let id = created["booking"]["id"].as_i64().unwrap();

    let (status, json) = set_booking_status(&state, &token, id, "ACTIVO").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["currentStatus"], "PENDIENTE");
    assert_eq!(json["requestedStatus"], "ACTIVO");

    let (status, _) = set_booking_status(&state, &token, id, "CONFIRMADO").await;
    assert_eq!(status, StatusCode::OK);
    let (status, json) = set_booking_status(&state, &token, id, "ACTIVO").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["vehicle"]["status"], "RENTADO");

    let (_, json) = send(
        &state,
        get(&format!("/api/admin/vehicles/{vehicle_id}/check-deletable"), Some(&token)),
    )
    .await;
    assert_eq!(json, json!({ "allowed": false, "activeCount": 1 }));

    let (status, json) = send(
        &state,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/admin/vehicles/{vehicle_id}"))
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["blockingBookingIds"], json!([id]));

    let (status, json) = set_booking_status(&state, &token, id, "COMPLETADO").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking"]["status"], "COMPLETADO");
    assert_eq!(json["vehicle"]["status"], "DISPONIBLE");

    let (status, _) = set_booking_status(&state, &token, id, "CANCELADO").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = set_booking_status(&state, &token, id, "ARCHIVADO").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = send(
        &state,
        get(&format!("/api/admin/vehicles/{vehicle_id}/check-deletable"), Some(&token)),
    )
    .await;
    assert_eq!(json["allowed"], true);

    let (status, json) = send(
        &state,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/admin/vehicles/{vehicle_id}"))
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "RETIRADO");

    let (_, json) = send(
        &state,
        get("/api/admin/bookings?status=COMPLETADO", Some(&token)),
    )
    .await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_booking_status_change() {
    let state = test_state();
    let token = login(&state).await;
    let (status, _) = set_booking_status(&state, &token, 4040, "CONFIRMADO").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Concurrency ──

fn race_booking(vehicle_id: i64, email: &str, start: &str, end: &str) -> NewBooking {
    let date = |s: &str| {
        chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    };
    NewBooking {
        vehicle_id,
        start: date(start),
        end: date(end),
        customer: CustomerInput {
            first_name: "Ana".to_string(),
            last_name: "Lopez".to_string(),
            email: email.to_string(),
            phone: "55551234".to_string(),
            dpi: "1234567890123".to_string(),
            license_number: "LIC-00123".to_string(),
            license_expiry: chrono::NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
            address: None,
            city: None,
            department: None,
        },
        pickup_location: "Aeropuerto La Aurora".to_string(),
        dropoff_location: None,
        special_requests: None,
    }
}

#[test]
fn test_concurrent_overlapping_bookings_commit_once() {
    let path = std::env::temp_dir().join(format!(
        "rentacar-race-{}-{}.db",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let path_str = path.to_str().unwrap().to_string();

    let setup = db::init_db(&path_str).unwrap();
    let vehicle_id = rentacar::db::queries::insert_vehicle(
        &setup,
        &serde_json::from_value(vehicle_body("P-777777")).unwrap(),
    )
    .unwrap();
    drop(setup);

    for round in 0..5 {
        let start = format!("2031-0{}-01", round + 1);
        let end = format!("2031-0{}-10", round + 1);
        let barrier = Arc::new(Barrier::new(2));

        let results: Vec<Result<_, AppError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = ["a", "b"]
                .into_iter()
                .map(|who| {
                    let barrier = Arc::clone(&barrier);
                    let path = path_str.clone();
                    let request =
                        race_booking(vehicle_id, &format!("{who}{round}@example.com"), &start, &end);
                    scope.spawn(move || {
                        let mut conn = db::init_db(&path).unwrap();
                        barrier.wait();
                        booking::create_booking(&mut conn, &request).map(|d| d.booking.id)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let committed = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::Conflict { .. })))
            .count();
        assert_eq!((committed, conflicts), (1, 1), "round {round}: {results:?}");
    }

    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(path.with_extension("db-wal"));
    let _ = std::fs::remove_file(path.with_extension("db-shm"));
}
