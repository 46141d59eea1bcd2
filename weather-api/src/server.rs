use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use weather_core::{NormalizedWeatherReport, Units, WeatherError, WeatherQuery, WeatherService};

const SERVICE_NAME: &str = "weather-api";

#[derive(Clone)]
struct AppState {
    service: Arc<WeatherService>,
}

pub fn router(service: Arc<WeatherService>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/weather", get(weather))
        .route("/weather/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { service })
}

pub async fn run(port: u16, service: Arc<WeatherService>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    tracing::info!("Weather API listening on http://{addr}");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutting down");
}

#[derive(Debug, Deserialize)]
struct WeatherParams {
    city: Option<String>,
    date: Option<String>,
    units: Option<String>,
    lang: Option<String>,
}

async fn weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<NormalizedWeatherReport>, ApiError> {
    let city = params
        .city
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| WeatherError::MissingParameter("The \"city\" parameter is required".into()))?;

    let units = match params.units.as_deref() {
        None | Some("") => Units::default(),
        Some(u) => u.parse()?,
    };

    let query = WeatherQuery { city, date: params.date, units, lang: params.lang };
    let report = state.service.weather_by_day(&query).await?;

    Ok(Json(report))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Weather API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "weather": "/weather",
            "health": "/weather/health",
            "documentation": {
                "method": "GET",
                "path": "/weather",
                "queryParams": {
                    "city": "string (required) - City name",
                    "date": "string (optional) - YYYY-MM-DD, \"today\" or \"tomorrow\"",
                    "units": "string (optional) - \"metric\", \"imperial\" or \"kelvin\"",
                    "lang": "string (optional) - Language code (e.g. pt_br, en, es)",
                },
            },
        },
    }))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<u16>,
}

#[derive(Debug)]
struct ApiError(WeatherError);

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            e => e
                .upstream_status()
                .and_then(|code| StatusCode::from_u16(code).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, "Weather request failed: {}", self.0);
        } else {
            tracing::warn!(%status, "Weather request rejected: {}", self.0);
        }

        let body = ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
            code: self.0.upstream_status().filter(|code| *code == status.as_u16()),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, Local, NaiveDate, TimeZone};
    use std::time::Duration;
    use weather_core::{OpenWeatherConfig, provider_from_config};
    use wiremock::matchers::{any, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn spawn_app(upstream: &MockServer) -> String {
        let config = OpenWeatherConfig {
            api_key: "TEST_KEY".into(),
            base_url: upstream.uri(),
            lang: "en".into(),
            timeout: Duration::from_secs(5),
        };
        let provider = provider_from_config(&config).unwrap();
        let service = Arc::new(WeatherService::new(provider, config.lang.clone()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(service)).await.unwrap();
        });

        format!("http://{addr}")
    }

    async fn no_upstream_calls(upstream: &MockServer) {
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(upstream)
            .await;
    }

    async fn get(url: &str, query: &[(&str, &str)]) -> (StatusCode, serde_json::Value) {
        let res = reqwest::Client::new().get(url).query(query).send().await.unwrap();
        let status = StatusCode::from_u16(res.status().as_u16()).unwrap();
        (status, res.json().await.unwrap())
    }

    fn local_ts(date: NaiveDate, hour: u32) -> i64 {
        Local
            .from_local_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
            .earliest()
            .unwrap()
            .timestamp()
    }

    fn forecast_entry(dt: i64, pop: f64) -> serde_json::Value {
        json!({
            "dt": dt,
            "main": {
                "temp": 27.4, "feels_like": 29.1, "temp_min": 25.6, "temp_max": 28.2,
                "pressure": 1012, "humidity": 65
            },
            "weather": [{ "main": "Clouds", "description": "broken clouds", "icon": "04d" }],
            "clouds": { "all": 75 },
            "wind": { "speed": 4.6, "deg": 140 },
            "visibility": 10000,
            "pop": pop
        })
    }

    #[tokio::test]
    async fn missing_city_is_bad_request() {
        let upstream = MockServer::start().await;
        no_upstream_calls(&upstream).await;
        let base = spawn_app(&upstream).await;

        let (status, body) = get(&format!("{base}/weather"), &[("date", "tomorrow")]).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required parameter");
        assert!(body["message"].as_str().unwrap().contains("city"));
        assert!(body.get("code").is_none());
    }

    #[tokio::test]
    async fn past_date_is_rejected_without_upstream_calls() {
        let upstream = MockServer::start().await;
        no_upstream_calls(&upstream).await;
        let base = spawn_app(&upstream).await;

        let (status, body) =
            get(&format!("{base}/weather"), &[("city", "Curitiba"), ("date", "2020-01-01")]).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Past date not supported");
    }

    #[tokio::test]
    async fn date_beyond_window_is_rejected_without_upstream_calls() {
        let upstream = MockServer::start().await;
        no_upstream_calls(&upstream).await;
        let base = spawn_app(&upstream).await;

        let far = Local::now().date_naive().checked_add_days(Days::new(10)).unwrap();
        let far = far.format("%Y-%m-%d").to_string();
        let (status, body) =
            get(&format!("{base}/weather"), &[("city", "Curitiba"), ("date", far.as_str())]).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Forecast horizon exceeded");
        assert!(body["message"].as_str().unwrap().contains(&far));
    }

    #[tokio::test]
    async fn invalid_date_and_units_are_bad_requests() {
        let upstream = MockServer::start().await;
        no_upstream_calls(&upstream).await;
        let base = spawn_app(&upstream).await;

        let (status, body) =
            get(&format!("{base}/weather"), &[("city", "Natal"), ("date", "2024-02-30")]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid date format");

        let (status, body) =
            get(&format!("{base}/weather"), &[("city", "Natal"), ("units", "rankine")]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid parameter");
    }

    #[tokio::test]
    async fn tomorrow_geocodes_then_forecasts_once() {
        let upstream = MockServer::start().await;
        let tomorrow = Local::now().date_naive().checked_add_days(Days::new(1)).unwrap();

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("q", "São Paulo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "São Paulo", "lat": -23.5505, "lon": -46.6333, "country": "BR" }
            ])))
            .expect(1)
            .mount(&upstream)
            .await;

        let list: Vec<serde_json::Value> = [9, 12, 15, 21]
            .into_iter()
            .map(|h| forecast_entry(local_ts(tomorrow, h), 0.73))
            .collect();
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .and(query_param("lat", "-23.5505"))
            .and(query_param("lon", "-46.6333"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "TEST_KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "cod": "200", "list": list })))
            .expect(1)
            .mount(&upstream)
            .await;

        let base = spawn_app(&upstream).await;
        let (status, body) =
            get(&format!("{base}/weather"), &[("city", "São Paulo"), ("date", "tomorrow")]).await;

        let expected_date = chrono::DateTime::from_timestamp(local_ts(tomorrow, 12), 0)
            .unwrap()
            .format("%Y-%m-%d")
            .to_string();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["date"], expected_date);
        assert_eq!(body["city"], "São Paulo");
        assert_eq!(body["country"], "BR");
        assert_eq!(body["temperature"]["current"], 27);
        assert_eq!(body["temperature"]["feelsLike"], 29);
        assert_eq!(body["visibility"], 10.0);
        assert_eq!(body["precipitationProbability"], 73);
    }

    #[tokio::test]
    async fn today_uses_current_weather_endpoint() {
        let upstream = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Recife"))
            .and(query_param("lang", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Recife",
                "dt": Utc::now().timestamp(),
                "main": {
                    "temp": 29.6, "feels_like": 33.2, "temp_min": 29.0, "temp_max": 30.1,
                    "pressure": 1011, "humidity": 70
                },
                "weather": [{ "main": "Clear", "description": "clear sky", "icon": "01d" }],
                "wind": { "speed": 5.7, "deg": 110 },
                "clouds": { "all": 0 },
                "sys": { "country": "BR" }
            })))
            .expect(1)
            .mount(&upstream)
            .await;

        let base = spawn_app(&upstream).await;
        let (status, body) = get(&format!("{base}/weather"), &[("city", "Recife")]).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["city"], "Recife");
        assert_eq!(body["temperature"]["current"], 30);
        assert_eq!(body["precipitationProbability"], 0);
        assert!(body.get("visibility").is_none());
    }

    #[tokio::test]
    async fn upstream_status_is_passed_through() {
        let upstream = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "cod": 401,
                "message": "Invalid API key"
            })))
            .mount(&upstream)
            .await;

        let base = spawn_app(&upstream).await;
        let (status, body) =
            get(&format!("{base}/weather"), &[("city", "Recife"), ("date", "today")]).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 401);
        assert_eq!(body["message"], "Invalid API key");
    }

    #[tokio::test]
    async fn unknown_city_is_internal_error() {
        let upstream = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&upstream)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&upstream)
            .await;

        let base = spawn_app(&upstream).await;
        let (status, body) =
            get(&format!("{base}/weather"), &[("city", "Atlantis"), ("date", "tomorrow")]).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "City not found");
        assert!(body.get("code").is_none());
    }

    async fn error_response(err: WeatherError) -> (StatusCode, serde_json::Value) {
        let res = ApiError(err).into_response();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn error_statuses_follow_failure_kind() {
        let (status, _) = error_response(WeatherError::CityNotFound("Atlantis".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = error_response(WeatherError::NoForecastData).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) =
            error_response(WeatherError::InvalidDateFormat("2024-13-01".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = error_response(WeatherError::UpstreamTransportFailure {
            status: Some(429),
            message: "Too many requests".into(),
        })
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["code"], 429);
    }

    #[tokio::test]
    async fn code_is_omitted_when_upstream_status_is_not_returned() {
        // body read failed after a successful upstream status line
        let (status, body) = error_response(WeatherError::UpstreamTransportFailure {
            status: Some(200),
            message: "Failed to read OpenWeather forecast response body".into(),
        })
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("code").is_none());
        assert_eq!(body["error"], "Error fetching weather data");
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let upstream = MockServer::start().await;
        no_upstream_calls(&upstream).await;
        let base = spawn_app(&upstream).await;

        let (status, body) = get(&format!("{base}/weather/health"), &[]).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "weather-api");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn index_describes_endpoints() {
        let upstream = MockServer::start().await;
        no_upstream_calls(&upstream).await;
        let base = spawn_app(&upstream).await;

        let (status, body) = get(&format!("{base}/"), &[]).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["endpoints"]["weather"], "/weather");
        assert_eq!(body["endpoints"]["health"], "/weather/health");
        assert!(body["endpoints"]["documentation"]["queryParams"]["city"].is_string());
    }
}
