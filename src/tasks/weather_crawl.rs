use log::{error, info};

use crate::{
    db::{self, SqlitePool},
    models::{Id, WeatherReport},
    weather::{WeatherCrawler, WeatherError},
};

/// Crawls the weather for one location and stores a snapshot.
pub struct WeatherCrawlJob {
    crawler: WeatherCrawler,
    db_pool: SqlitePool,
    location: String,
}

impl WeatherCrawlJob {
    pub fn new(crawler: WeatherCrawler, db_pool: SqlitePool, location: &str) -> Self {
        Self {
            crawler,
            db_pool,
            location: location.to_string(),
        }
    }

    /// One scheduled run. Failures are logged and the tick is skipped.
    pub async fn run_tick(&self) {
        match self.crawl_once().await {
            Ok((report, id)) => info!(
                id = id,
                location = &*report.location,
                temp = &*report.current_temp,
                status = &*report.weather_status;
                "Weather snapshot stored"
            ),
            Err(e) => error!(location = &*self.location, error:% = e; "Weather crawl failed, nothing stored"),
        }
    }

    /// Fetch, parse and persist. Nothing is written unless the page parsed.
    pub async fn crawl_once(&self) -> Result<(WeatherReport, Id), WeatherError> {
        let report = self.crawler.fetch(&self.location).await?;

        let pool = self.db_pool.clone();
        let to_store = report.clone();
        let id = tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            db::insert_weather_snapshot(&conn, &to_store)
        })
        .await??;

        Ok((report, id))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::WeatherConfig;

    const PAGE: &str = r#"
        <div class="temperature_text"><strong><span class="blind">현재 온도</span>15.0°</strong></div>
        <div class="weather_main"><i><span class="blind">비</span></i></div>
    "#;

    fn job(server: &MockServer, pool: SqlitePool) -> WeatherCrawlJob {
        let config = WeatherConfig {
            base_url: server.uri(),
            ..WeatherConfig::default()
        };
        WeatherCrawlJob::new(WeatherCrawler::new(&config).unwrap(), pool, "서울")
    }

    #[tokio::test]
    async fn test_tick_stores_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let temp_dir = tempdir().unwrap();
        let pool = db::init_db(temp_dir.path().join("crawl.db")).unwrap();

        job(&server, pool.clone()).run_tick().await;

        let latest = db::get_latest_weather(&pool.get().unwrap(), "서울").unwrap().unwrap();
        assert_eq!(latest.current_temp.as_deref(), Some("15.0°"));
        assert_eq!(latest.weather_status.as_deref(), Some("비"));
        assert_eq!(latest.air_quality.as_deref(), Some("정보 없음"));
    }

    #[tokio::test]
    async fn test_failed_tick_stores_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let temp_dir = tempdir().unwrap();
        let pool = db::init_db(temp_dir.path().join("crawl_fail.db")).unwrap();
        let job = job(&server, pool.clone());

        // Parse failure, then upstream failure. Neither panics nor writes.
        job.run_tick().await;
        job.run_tick().await;

        assert!(db::get_latest_weather(&pool.get().unwrap(), "서울").unwrap().is_none());
    }
}
