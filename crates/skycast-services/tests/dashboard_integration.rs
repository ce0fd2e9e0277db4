//! Integration tests for the Dashboard against a mock weather provider.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use skycast_core::{App, Config, SearchConfig, Secrets, WeatherConfig};
use skycast_services::{Dashboard, PlaceStatus, Theme, WeatherState};
use skycast_weather::{PlaceQuery, TemperatureUnit};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// `{"email":"ada@example.com","name":"Ada Lovelace","picture":"https://example.com/ada.png"}`
const ADA_PAYLOAD: &str = "eyJlbWFpbCI6ImFkYUBleGFtcGxlLmNvbSIsIm5hbWUiOiJBZGEgTG92ZWxhY2UiLCJwaWN0dXJlIjoiaHR0cHM6Ly9leGFtcGxlLmNvbS9hZGEucG5nIn0";

fn current_json(name: &str, temp: f64) -> serde_json::Value {
    serde_json::json!({
        "id": 1000,
        "name": name,
        "coord": {"lat": 48.85, "lon": 2.35},
        "weather": [{"main": "Clear", "description": "clear sky", "icon": "01d"}],
        "main": {"temp": temp, "feels_like": temp, "pressure": 1015, "humidity": 40},
        "wind": {"speed": 2.5, "deg": 120},
        "sys": {"sunrise": 1717991000, "sunset": 1718049000}
    })
}

fn forecast_json(samples: usize) -> serde_json::Value {
    let list: Vec<_> = (0..samples)
        .map(|i| {
            serde_json::json!({
                "dt_txt": format!("2024-06-{:02} {:02}:00:00", 1 + (i * 3) / 24, (i * 3) % 24),
                "main": {"temp": 15.0 + i as f64, "pressure": 1010, "humidity": 55},
                "weather": [{"main": "Clouds", "description": "few clouds", "icon": "02d"}]
            })
        })
        .collect();
    serde_json::json!({ "list": list })
}

fn air_json() -> serde_json::Value {
    serde_json::json!({
        "list": [{"main": {"aqi": 1}, "components": {"co": 200.0, "no2": 1.0, "o3": 60.0,
                  "so2": 0.5, "pm2_5": 2.0, "pm10": 3.0}}]
    })
}

/// Mount forecast and air quality for any coordinates.
async fn mount_details(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(40)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/air_pollution"))
        .respond_with(ResponseTemplate::new(200).set_body_json(air_json()))
        .mount(server)
        .await;
}

async fn mount_city(server: &MockServer, name: &str, temp: f64) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", name))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json(name, temp)))
        .mount(server)
        .await;
}

fn app_for(server: &MockServer, dir: &TempDir) -> App {
    let config = Config {
        config_dir: dir.path().to_path_buf(),
        weather: WeatherConfig {
            api_base_url: server.uri(),
            refresh_minutes: 5,
            request_timeout_secs: 5,
        },
        search: SearchConfig { debounce_ms: 20 },
        ..Config::default()
    };
    let secrets = Secrets {
        weather_api_key: "test_key".to_string(),
        google_client_id: "client-123".to_string(),
    };
    App::with_parts(config, secrets)
}

async fn wait_for<F>(dashboard: &Dashboard, done: F) -> WeatherState
where
    F: Fn(&WeatherState) -> bool,
{
    let mut rx = dashboard.weather().subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let state = rx.borrow_and_update().clone();
            if done(&state) {
                return state;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("dashboard never reached the expected state")
}

#[tokio::test]
async fn test_show_place_populates_record_and_forecasts() {
    let server = MockServer::start().await;
    mount_city(&server, "Paris", 21.4).await;
    mount_details(&server).await;

    let dir = TempDir::new().unwrap();
    let dashboard = Dashboard::from_app(&app_for(&server, &dir)).unwrap();

    dashboard.show_place(PlaceQuery::name("Paris")).await.unwrap();

    let state = dashboard.weather().snapshot();
    assert_eq!(state.status("Paris"), PlaceStatus::Ready);
    let record = state.record("Paris").unwrap();
    assert_eq!(record.city, "Paris");
    assert_eq!(record.air_quality.as_ref().unwrap().aqi, 1);
    assert_eq!(state.forecasts["Paris"].len(), 5);
    assert_eq!(state.hourly["Paris"].len(), 24);

    assert_eq!(dashboard.display_temperature(record.temperature), "21°C");
    dashboard
        .preferences()
        .set_temperature_unit(TemperatureUnit::Fahrenheit);
    assert_eq!(dashboard.display_temperature(record.temperature), "71°F");
    // stored value never changes with the display unit
    assert_eq!(dashboard.weather().snapshot().record("Paris").unwrap().temperature, 21.4);
}

#[tokio::test]
async fn test_unknown_city_fails_with_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Atlantis"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404", "message": "city not found"
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let dashboard = Dashboard::from_app(&app_for(&server, &dir)).unwrap();
    dashboard.show_place(PlaceQuery::name("Atlantis")).await.unwrap();

    let state = dashboard.weather().snapshot();
    assert_eq!(state.status("Atlantis"), PlaceStatus::Failed);
    assert!(state.record("Atlantis").is_none());
    let message = state.error("Atlantis").unwrap();
    assert!(message.contains("Atlantis"));
    assert!(message.contains("not found"));
}

#[tokio::test]
async fn test_dismiss_clears_place() {
    let server = MockServer::start().await;
    mount_city(&server, "Rome", 27.0).await;
    mount_details(&server).await;

    let dir = TempDir::new().unwrap();
    let dashboard = Dashboard::from_app(&app_for(&server, &dir)).unwrap();
    dashboard.show_place(PlaceQuery::name("Rome")).await.unwrap();
    dashboard.dismiss_place("Rome");

    assert!(!dashboard.weather().snapshot().contains("Rome"));
}

#[tokio::test]
async fn test_start_refreshes_favorites() {
    let server = MockServer::start().await;
    mount_city(&server, "Paris", 20.0).await;
    mount_city(&server, "Tokyo", 30.0).await;
    mount_details(&server).await;

    let dir = TempDir::new().unwrap();
    let dashboard = Dashboard::from_app(&app_for(&server, &dir)).unwrap();
    dashboard.toggle_favorite("Paris");
    dashboard.toggle_favorite("Tokyo");

    dashboard.start();
    let state = wait_for(&dashboard, |s| {
        s.status("Paris") == PlaceStatus::Ready && s.status("Tokyo") == PlaceStatus::Ready
    })
    .await;
    assert_eq!(state.record("Tokyo").unwrap().temperature, 30.0);

    dashboard.shutdown().await;
}

#[tokio::test]
async fn test_preferences_and_user_survive_restart() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    {
        let dashboard = Dashboard::from_app(&app_for(&server, &dir)).unwrap();
        assert!(dashboard.toggle_favorite("Paris"));
        assert!(dashboard.toggle_favorite("Tokyo"));
        dashboard
            .preferences()
            .set_temperature_unit(TemperatureUnit::Fahrenheit);
        assert_eq!(dashboard.preferences().toggle_theme(), Theme::Dark);

        let token = format!("header.{}.signature", ADA_PAYLOAD);
        dashboard.auth().sign_in_with_credential(&token).unwrap();
    }

    let dashboard = Dashboard::from_app(&app_for(&server, &dir)).unwrap();
    let prefs = dashboard.preferences().snapshot();
    assert_eq!(prefs.favorite_cities, vec!["Paris", "Tokyo"]);
    assert_eq!(prefs.temperature_unit, TemperatureUnit::Fahrenheit);
    assert_eq!(prefs.theme, Theme::Dark);

    let user = dashboard.auth().user().unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.name, "Ada Lovelace");

    dashboard.auth().logout();
    let dashboard = Dashboard::from_app(&app_for(&server, &dir)).unwrap();
    assert!(!dashboard.auth().is_signed_in());
}

#[tokio::test]
async fn test_search_publishes_suggestions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "London", "country": "GB", "state": "England", "lat": 51.5, "lon": -0.12},
            {"name": "London", "country": "CA", "state": "Ontario", "lat": 42.98, "lon": -81.24}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let dashboard = Dashboard::from_app(&app_for(&server, &dir)).unwrap();
    let mut rx = dashboard.search().subscribe();

    dashboard.search().on_input("Lo");
    dashboard.search().on_input("London");

    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .unwrap()
        .unwrap();

    let labels: Vec<String> = rx.borrow().iter().map(|s| s.label()).collect();
    assert_eq!(labels, vec!["London, England, GB", "London, Ontario, CA"]);
}

#[tokio::test]
async fn test_sign_in_request_uses_client_id() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let dashboard = Dashboard::from_app(&app_for(&server, &dir)).unwrap();

    let request = dashboard.sign_in_request("http://localhost:3000");
    assert!(request.url.contains("client_id=client-123"));
    assert!(request.url.contains("response_type=id_token"));
}
