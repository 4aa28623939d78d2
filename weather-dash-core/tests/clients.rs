//! Auth and weather clients against a mock HTTP server.

use std::sync::Arc;

use weather_dash_core::{
    AuthApi, AuthClient, DashboardError, MemorySessionStore, SessionStore, SharedSession,
    WeatherApi, WeatherClient,
};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn condition() -> serde_json::Value {
    serde_json::json!({"main": "Clear", "description": "clear sky", "icon": "01d"})
}

fn current_weather(city: &str) -> serde_json::Value {
    serde_json::json!({
        "temperature": 21.3,
        "feels_like": 20.8,
        "humidity": 40,
        "pressure": 1016,
        "wind_speed": 2.1,
        "wind_direction": 90,
        "conditions": [condition()],
        "city": city,
        "country": "JP",
        "timestamp": "2026-10-18T12:00:00",
        "lat": 35.68,
        "lon": 139.69
    })
}

fn clients(server: &MockServer, session: &SharedSession) -> (AuthClient, WeatherClient) {
    let http = reqwest::Client::new();
    (
        AuthClient::new(server.uri(), http.clone(), session.clone()),
        WeatherClient::new(server.uri(), http, session.clone()),
    )
}

async fn authorization_headers(server: &MockServer) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|req| {
            req.headers
                .get("authorization")
                .map(|v| v.to_str().unwrap_or_default().to_string())
        })
        .collect()
}

#[tokio::test]
async fn login_posts_form_and_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("username=johndoe"))
        .and(body_string_contains("password=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "jwt-for-johndoe",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session: SharedSession = Arc::new(MemorySessionStore::new());
    let (auth, _) = clients(&server, &session);

    let token = auth.login("johndoe", "secret").await.unwrap();

    assert_eq!(token.access_token, "jwt-for-johndoe");
    assert_eq!(session.get().as_deref(), Some("jwt-for-johndoe"));
    assert!(auth.is_authenticated());
}

#[tokio::test]
async fn login_rejection_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Incorrect username or password"
        })))
        .mount(&server)
        .await;

    let session: SharedSession = Arc::new(MemorySessionStore::new());
    let (auth, _) = clients(&server, &session);

    let err = auth.login("johndoe", "wrong").await.unwrap_err();

    assert!(matches!(err, DashboardError::AuthenticationFailed(_)));
    assert!(!session.is_present());
}

#[tokio::test]
async fn login_server_error_is_reported_as_authentication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session: SharedSession = Arc::new(MemorySessionStore::new());
    let (auth, _) = clients(&server, &session);

    let err = auth.login("johndoe", "secret").await.unwrap_err();
    assert!(matches!(err, DashboardError::AuthenticationFailed(_)));
}

#[tokio::test]
async fn current_user_without_token_never_hits_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/users/me"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session: SharedSession = Arc::new(MemorySessionStore::new());
    let (auth, _) = clients(&server, &session);

    assert_eq!(auth.current_user().await.unwrap_err(), DashboardError::NotAuthenticated);
}

#[tokio::test]
async fn current_user_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/users/me"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "username": "johndoe",
            "email": "johndoe@example.com",
            "full_name": "John Doe",
            "disabled": false
        })))
        .mount(&server)
        .await;

    let session: SharedSession = Arc::new(MemorySessionStore::with_token("tok-1"));
    let (auth, _) = clients(&server, &session);

    let user = auth.current_user().await.unwrap();
    assert_eq!(user.username, "johndoe");
    assert_eq!(user.full_name.as_deref(), Some("John Doe"));
}

#[tokio::test]
async fn current_user_unauthorized_leaves_session_alone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let session: SharedSession = Arc::new(MemorySessionStore::with_token("expired"));
    let (auth, _) = clients(&server, &session);

    assert_eq!(auth.current_user().await.unwrap_err(), DashboardError::Unauthorized);
    assert!(session.is_present());

    auth.logout();
    assert!(!session.is_present());
}

#[tokio::test]
async fn weather_requests_carry_token_only_when_present() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather/current"))
        .and(query_param("city", "Tokyo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather("Tokyo")))
        .expect(2)
        .mount(&server)
        .await;

    let session: SharedSession = Arc::new(MemorySessionStore::new());
    let (_, weather) = clients(&server, &session);

    weather.current_by_city("Tokyo").await.unwrap();
    session.set("tok-2");
    let tokyo = weather.current_by_city("Tokyo").await.unwrap();

    assert_eq!(tokyo.city, "Tokyo");
    assert_eq!(
        authorization_headers(&server).await,
        vec![None, Some("Bearer tok-2".to_string())]
    );
}

#[tokio::test]
async fn current_by_coordinates_uses_lat_lon_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather/current"))
        .and(query_param("lat", "35.68"))
        .and(query_param("lon", "139.69"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather("Tokyo")))
        .mount(&server)
        .await;

    let session: SharedSession = Arc::new(MemorySessionStore::new());
    let (_, weather) = clients(&server, &session);

    let result = weather.current_by_coordinates(35.68, 139.69).await.unwrap();
    assert_eq!((result.lat, result.lon), (Some(35.68), Some(139.69)));
}

#[tokio::test]
async fn forecast_and_geocode_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather/forecast"))
        .and(query_param("city", "Paris"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "city": "Paris",
            "country": "FR",
            "forecast": [
                {"date": "2026-10-19T12:00:00", "temp_min": 9, "temp_max": 17, "humidity": 70,
                 "conditions": [condition()], "precipitation_chance": 20, "wind_speed": 3.2},
                {"date": "2026-10-20T12:00:00", "temp_min": 8, "temp_max": 15, "humidity": 80,
                 "conditions": [condition()], "precipitation_chance": 60, "wind_speed": 5.0}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather/geocode"))
        .and(query_param("city", "Paris"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "lat": 48.8566, "lon": 2.3522, "city": "Paris", "country": "FR"
        })))
        .mount(&server)
        .await;

    let session: SharedSession = Arc::new(MemorySessionStore::with_token("tok"));
    let (_, weather) = clients(&server, &session);

    let forecast = weather.forecast_by_city("Paris").await.unwrap();
    let dates: Vec<_> = forecast.forecast.iter().map(|f| f.date.as_str()).collect();
    assert_eq!(dates, ["2026-10-19T12:00:00", "2026-10-20T12:00:00"]);

    let place = weather.geocode_city("Paris").await.unwrap();
    assert_eq!(place.city.as_deref(), Some("Paris"));
}

#[tokio::test]
async fn status_codes_map_onto_error_taxonomy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather/forecast"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather/current"))
        .respond_with(ResponseTemplate::new(404).set_body_string("City not found: Atlantis"))
        .mount(&server)
        .await;

    let session: SharedSession = Arc::new(MemorySessionStore::new());
    let (_, weather) = clients(&server, &session);

    assert_eq!(weather.forecast_by_city("Paris").await.unwrap_err(), DashboardError::Unauthorized);

    match weather.current_by_city("Atlantis").await.unwrap_err() {
        DashboardError::NetworkOrServer(msg) => {
            assert!(msg.contains("404"), "message should carry the status: {msg}");
            assert!(msg.contains("City not found"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn air_quality_by_city() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather/air-quality"))
        .and(query_param("city", "Paris"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "aqi": 2,
            "description": "Fair",
            "pollutants": {"pm2_5": 8.1, "no2": 14.0},
            "city": "Paris",
            "country": "FR",
            "timestamp": "2026-10-18T12:00:00"
        })))
        .mount(&server)
        .await;

    let session: SharedSession = Arc::new(MemorySessionStore::new());
    let (_, weather) = clients(&server, &session);

    let air = weather.air_quality_by_city("Paris").await.unwrap();
    assert_eq!(air.aqi, 2);
    assert_eq!(air.pollutants.get("no2"), Some(&14.0));
}
