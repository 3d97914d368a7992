use std::sync::Arc;

use axum::{
    Json, Router,
    extract::FromRef,
    routing::{get, post},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Value, json};
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{db::SqlitePool, ingest::PetClinicLoader};

mod error;
pub mod pet_clinics;
pub mod users;
pub mod weather;

pub use error::ServiceError;

const DEFAULT_PAGE_SIZE: i64 = 100;
const MAX_PAGE_SIZE: i64 = 1000;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub clinic_loader: Arc<PetClinicLoader>,
    pub weather_location: Arc<str>,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.db_pool.clone()
    }
}

/// `limit`/`offset` query parameters for list endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Page size, 1 to 1000. Defaults to 100.
    limit: Option<i64>,
    /// Rows to skip. Defaults to 0.
    offset: Option<i64>,
}

impl Pagination {
    fn resolve(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Runs `f` with a pooled connection on the blocking thread pool.
async fn with_db<T, E, F>(pool: &SqlitePool, f: F) -> Result<T, ServiceError>
where
    T: Send + 'static,
    E: From<r2d2::Error> + Into<ServiceError> + Send + 'static,
    F: FnOnce(&mut Connection) -> Result<T, E> + Send + 'static,
{
    let pool = pool.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        f(&mut conn)
    })
    .await?;
    result.map_err(Into::into)
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is up", body = Value, example = json!({"status": "ok"})))
)]
pub async fn api_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api_health,
        users::api_create_user,
        users::api_list_users,
        users::api_get_user,
        users::api_update_user,
        users::api_delete_user,
        pet_clinics::api_load_pet_clinics,
        pet_clinics::api_list_pet_clinics,
        pet_clinics::api_get_pet_clinic,
        weather::api_latest_weather,
    ),
    components(
        schemas(
            crate::db::UserRow,
            crate::models::PetClinic,
            crate::models::WeatherSnapshot,
            error::ServiceError,
            users::UserCreate,
            users::UserUpdate,
        )
    ),
    tags(
        (name = "petple", description = "Petple service API"),
        (name = "Users", description = "User accounts"),
        (name = "Pet clinics", description = "Seoul licensed animal hospitals"),
        (name = "Weather", description = "Scraped weather snapshots"),
    )
)]
pub struct ApiDoc;

pub fn create_router(db_pool: SqlitePool, clinic_loader: Arc<PetClinicLoader>, weather_location: &str) -> Router {
    let app_state = AppState {
        db_pool,
        clinic_loader,
        weather_location: Arc::from(weather_location),
    };

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api_health))
        .route("/users", post(users::api_create_user).get(users::api_list_users))
        .route(
            "/users/{id}",
            get(users::api_get_user)
                .put(users::api_update_user)
                .delete(users::api_delete_user),
        )
        .route("/load-pet-clinics", get(pet_clinics::api_load_pet_clinics))
        .route("/pet-clinics", get(pet_clinics::api_list_pet_clinics))
        .route("/pet-clinics/{mgt_no}", get(pet_clinics::api_get_pet_clinic))
        .route("/weather/latest", get(weather::api_latest_weather))
        .with_state(app_state)
}
