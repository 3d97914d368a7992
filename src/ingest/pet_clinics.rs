use std::time::Duration;

use log::{debug, info, warn};
use reqwest::header::HeaderMap;
use serde_json::{Map, Value};

use super::IngestError;
use crate::{
    config::SeoulOpenApiConfig,
    db::{self, SqlitePool},
    http::{ApiClient, ApiResult},
    log::mask_string,
    models::PetClinic,
};

/// Largest window the open API serves in one request.
pub const MAX_WINDOW: u32 = 1000;

/// Client for one dataset of the Seoul open-data API.
///
/// Rows are addressed by a 1-based inclusive window:
/// `GET {base}/{api_key}/json/{dataset}/{start}/{end}/`.
#[derive(Debug)]
pub struct SeoulOpenApi {
    client: ApiClient,
    api_key: String,
    dataset: String,
}

impl SeoulOpenApi {
    pub fn new(config: &SeoulOpenApiConfig) -> Self {
        let client = ApiClient::with_config(
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
            HeaderMap::new(),
        );
        Self::with_client(client, &config.api_key, &config.dataset)
    }

    pub fn with_client(client: ApiClient, api_key: &str, dataset: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            dataset: dataset.to_string(),
        }
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Fetches the raw feed rows for `start..=end`. A response without the
    /// dataset or `row` keys yields an empty list.
    pub async fn fetch_rows(&self, start: u32, end: u32) -> ApiResult<Vec<Map<String, Value>>> {
        debug!(
            dataset = &*self.dataset,
            start = start,
            end = end,
            api_key = &*mask_string(&self.api_key);
            "Fetching pet clinic rows"
        );

        let endpoint = format!("{}/json/{}/{}/{}/", self.api_key, self.dataset, start, end);
        let body = self.client.get(&endpoint, None, None).await?;

        let rows = extract_rows(&body, &self.dataset);
        if rows.is_empty() {
            if let Some(code) = result_code(&body, &self.dataset) {
                warn!(dataset = &*self.dataset, code = code; "Open API returned no rows");
            }
        }
        Ok(rows)
    }
}

/// Pulls `body[dataset].row` out of a feed response.
pub fn extract_rows(body: &Value, dataset: &str) -> Vec<Map<String, Value>> {
    body.get(dataset)
        .and_then(|d| d.get("row"))
        .and_then(Value::as_array)
        .map(|rows| rows.iter().filter_map(|r| r.as_object().cloned()).collect())
        .unwrap_or_default()
}

/// The API reports status as `RESULT.CODE`, either at the top level (errors)
/// or inside the dataset object.
fn result_code<'a>(body: &'a Value, dataset: &str) -> Option<&'a str> {
    body.pointer("/RESULT/CODE")
        .or_else(|| body.get(dataset).and_then(|d| d.pointer("/RESULT/CODE")))
        .and_then(Value::as_str)
}

/// Maps feed rows to records, dropping rows that have no management number.
pub fn map_rows(rows: &[Map<String, Value>]) -> Vec<PetClinic> {
    rows.iter()
        .filter_map(|row| {
            let clinic = PetClinic::from_feed_row(row);
            if clinic.is_none() {
                let name = row.get("BPLCNM").and_then(Value::as_str).unwrap_or_default();
                warn!(name = name; "Skipping pet clinic row without management number");
            }
            clinic
        })
        .collect()
}

/// Result of loading one window.
#[derive(Debug, Clone)]
pub struct LoadedWindow {
    /// Rows the API returned, including skipped ones.
    pub rows_fetched: usize,
    /// Records that were upserted.
    pub clinics: Vec<PetClinic>,
}

/// Fetches feed windows and upserts them into `seoul_pet_clinics`.
pub struct PetClinicLoader {
    api: SeoulOpenApi,
    db_pool: SqlitePool,
}

impl PetClinicLoader {
    pub fn new(api: SeoulOpenApi, db_pool: SqlitePool) -> Self {
        Self { api, db_pool }
    }

    /// Loads rows `start..=end` (1-based, inclusive) and upserts them in one
    /// transaction.
    ///
    /// An empty fetch fails with [`IngestError::NoData`] and writes nothing.
    pub async fn load_window(&self, start: u32, end: u32) -> Result<LoadedWindow, IngestError> {
        if start == 0 || end < start || end - start >= MAX_WINDOW {
            return Err(IngestError::InvalidWindow { start, end });
        }

        let rows = self.api.fetch_rows(start, end).await?;
        if rows.is_empty() {
            return Err(IngestError::NoData { start, end });
        }

        let clinics = map_rows(&rows);
        if clinics.is_empty() {
            return Err(IngestError::NoData { start, end });
        }

        let pool = self.db_pool.clone();
        let batch = clinics.clone();
        let upserted = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            db::upsert_pet_clinics(&mut conn, &batch)
        })
        .await??;

        info!(
            dataset = self.api.dataset(),
            start = start,
            end = end,
            fetched = rows.len(),
            upserted = upserted;
            "Pet clinic window loaded"
        );

        Ok(LoadedWindow {
            rows_fetched: rows.len(),
            clinics,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::ApiErrorKind;

    const DATASET: &str = "LOCALDATA_020301";

    fn loader(server: &MockServer, pool: SqlitePool) -> PetClinicLoader {
        let api = SeoulOpenApi::with_client(ApiClient::new(&server.uri()), "test-key", DATASET);
        PetClinicLoader::new(api, pool)
    }

    fn feed(rows: Value) -> Value {
        json!({
            DATASET: {
                "list_total_count": 2,
                "RESULT": {"CODE": "INFO-000", "MESSAGE": "정상 처리되었습니다"},
                "row": rows
            }
        })
    }

    #[tokio::test]
    async fn test_load_window_upserts_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/test-key/json/{DATASET}/1/5/")))
            .respond_with(ResponseTemplate::new(200).set_body_json(feed(json!([
                {"MGTNO": "3000000-001", "BPLCNM": "하늘동물병원", "X": "198000.5", "Y": "451000.25"},
                {"MGTNO": "3000000-002", "BPLCNM": "바다동물병원", "X": "", "Y": null},
                {"BPLCNM": "번호없는병원"}
            ]))))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = tempdir().unwrap();
        let pool = db::init_db(temp_dir.path().join("ingest.db")).unwrap();

        let loaded = loader(&server, pool.clone()).load_window(1, 5).await.unwrap();
        assert_eq!(loaded.rows_fetched, 3);
        assert_eq!(loaded.clinics.len(), 2);

        let conn = pool.get().unwrap();
        assert_eq!(db::count_pet_clinics(&conn).unwrap(), 2);
        let stored = db::get_pet_clinic(&conn, "3000000-002").unwrap().unwrap();
        assert_eq!(stored.bplc_nm.as_deref(), Some("바다동물병원"));
        assert_eq!(stored.x, None);
    }

    #[tokio::test]
    async fn test_reloading_same_window_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/test-key/json/{DATASET}/1/1/")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(feed(json!([{"MGTNO": "M-1", "TRDSTATENM": "영업/정상"}]))),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/test-key/json/{DATASET}/1/1/")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(feed(json!([{"MGTNO": "M-1", "TRDSTATENM": "폐업"}]))),
            )
            .mount(&server)
            .await;

        let temp_dir = tempdir().unwrap();
        let pool = db::init_db(temp_dir.path().join("idempotent.db")).unwrap();
        let loader = loader(&server, pool.clone());

        loader.load_window(1, 1).await.unwrap();
        loader.load_window(1, 1).await.unwrap();

        let conn = pool.get().unwrap();
        assert_eq!(db::count_pet_clinics(&conn).unwrap(), 1);
        let stored = db::get_pet_clinic(&conn, "M-1").unwrap().unwrap();
        assert_eq!(stored.trd_state_nm.as_deref(), Some("폐업"));
    }

    #[tokio::test]
    async fn test_empty_feed_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"RESULT": {"CODE": "INFO-200", "MESSAGE": "해당하는 데이터가 없습니다."}})),
            )
            .mount(&server)
            .await;

        let temp_dir = tempdir().unwrap();
        let pool = db::init_db(temp_dir.path().join("empty.db")).unwrap();

        let err = loader(&server, pool.clone()).load_window(1, 5).await.unwrap_err();
        assert!(matches!(err, IngestError::NoData { start: 1, end: 5 }), "got {err:?}");
        assert_eq!(db::count_pet_clinics(&pool.get().unwrap()).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let temp_dir = tempdir().unwrap();
        let pool = db::init_db(temp_dir.path().join("upstream.db")).unwrap();

        let err = loader(&server, pool).load_window(1, 5).await.unwrap_err();
        match err {
            IngestError::Upstream(e) => {
                assert_eq!(e.kind(), ApiErrorKind::Api);
                assert_eq!(e.status_code(), Some(500));
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_windows_are_rejected_without_fetching() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let temp_dir = tempdir().unwrap();
        let pool = db::init_db(temp_dir.path().join("invalid.db")).unwrap();
        let loader = loader(&server, pool);

        for (start, end) in [(0, 5), (10, 3), (1, 1001)] {
            let err = loader.load_window(start, end).await.unwrap_err();
            assert!(matches!(err, IngestError::InvalidWindow { .. }), "got {err:?}");
        }
    }

    #[test]
    fn test_extract_rows_tolerates_missing_keys() {
        assert!(extract_rows(&json!({}), DATASET).is_empty());
        assert!(extract_rows(&json!({DATASET: {}}), DATASET).is_empty());
        assert!(extract_rows(&Value::Null, DATASET).is_empty());
        assert_eq!(extract_rows(&feed(json!([{"MGTNO": "a"}, 5])), DATASET).len(), 1);
    }
}
