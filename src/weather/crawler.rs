use std::time::Duration;

use log::info;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use super::{WeatherError, parse_weather_html};
use crate::{
    config::WeatherConfig,
    http::{ApiClient, QueryParams},
    models::WeatherReport,
};

const SEARCH_ENDPOINT: &str = "search.naver";

/// Fetches and parses the weather search page.
#[derive(Debug)]
pub struct WeatherCrawler {
    client: ApiClient,
}

impl WeatherCrawler {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let user_agent =
            HeaderValue::from_str(&config.user_agent).map_err(|e| WeatherError::Config(format!("user_agent: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, user_agent);

        let client = ApiClient::with_config(&config.base_url, Duration::from_secs(config.timeout_secs), headers);
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: ApiClient) -> Self {
        Self { client }
    }

    /// Requests `search.naver?query=<location> 날씨` and parses the result.
    pub async fn fetch(&self, location: &str) -> Result<WeatherReport, WeatherError> {
        info!(location = location; "Crawling weather");

        let params = QueryParams::new().with("query", format!("{location} 날씨"));
        let html = self.client.get_text(SEARCH_ENDPOINT, Some(&params), None).await?;

        parse_weather_html(location, &html)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::ApiErrorKind;

    const PAGE: &str = r#"
        <div class="temperature_text"><strong><span class="blind">현재 온도</span>8.2°</strong></div>
        <div class="weather_main"><i><span class="blind">구름많음</span></i></div>
        <a class="air_area"><div class="text_area"><span class="text">나쁨</span></div></a>
    "#;

    fn config(server: &MockServer) -> WeatherConfig {
        WeatherConfig {
            base_url: server.uri(),
            user_agent: "petple-test/1.0".to_string(),
            timeout_secs: 5,
            ..WeatherConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_sends_query_and_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.naver"))
            .and(query_param("query", "부산 날씨"))
            .and(header("user-agent", "petple-test/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let crawler = WeatherCrawler::new(&config(&server)).unwrap();
        let report = crawler.fetch("부산").await.unwrap();

        assert_eq!(report.location, "부산");
        assert_eq!(report.current_temp, "8.2°");
        assert_eq!(report.weather_status, "구름많음");
        assert_eq!(report.air_quality, "나쁨");
    }

    #[tokio::test]
    async fn test_http_failure_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let crawler = WeatherCrawler::new(&config(&server)).unwrap();
        let err = crawler.fetch("서울").await.unwrap_err();

        match err {
            WeatherError::Fetch(e) => assert_eq!(e.kind(), ApiErrorKind::Api),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unexpected_layout_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>점검 중</body></html>"))
            .mount(&server)
            .await;

        let crawler = WeatherCrawler::new(&config(&server)).unwrap();
        let err = crawler.fetch("서울").await.unwrap_err();
        assert!(matches!(err, WeatherError::MissingElement(_)), "got {err:?}");
    }

    #[test]
    fn test_invalid_user_agent_is_config_error() {
        let config = WeatherConfig {
            user_agent: "bad\nagent".to_string(),
            ..WeatherConfig::default()
        };
        assert!(matches!(WeatherCrawler::new(&config), Err(WeatherError::Config(_))));
    }
}
