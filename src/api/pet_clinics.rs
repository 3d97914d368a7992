use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::{AppState, Pagination, error::ServiceError, with_db};
use crate::{db, models::PetClinic};

fn default_start() -> u32 {
    1
}

fn default_end() -> u32 {
    5
}

/// Feed rows to load, 1-based and inclusive.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoadWindow {
    #[serde(default = "default_start")]
    #[param(default = 1, minimum = 1)]
    start: u32,
    #[serde(default = "default_end")]
    #[param(default = 5, minimum = 1)]
    end: u32,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ClinicPath {
    /// Management number.
    mgt_no: String,
}

/// Fetches one window of the Seoul pet clinic feed and upserts it.
#[utoipa::path(
    get,
    path = "/load-pet-clinics",
    tag = "Pet clinics",
    params(LoadWindow),
    responses(
        (status = 200, description = "Rows loaded and stored", body = Vec<PetClinic>),
        (status = 400, description = "Invalid row window", body = ServiceError),
        (status = 404, description = "No data returned from API", body = ServiceError),
        (status = 502, description = "Open API request failed", body = ServiceError),
    )
)]
pub async fn api_load_pet_clinics(
    State(app_state): State<AppState>,
    Query(window): Query<LoadWindow>,
) -> Result<Json<Vec<PetClinic>>, ServiceError> {
    let loaded = app_state.clinic_loader.load_window(window.start, window.end).await?;
    Ok(Json(loaded.clinics))
}

#[utoipa::path(
    get,
    path = "/pet-clinics",
    tag = "Pet clinics",
    params(Pagination),
    responses(
        (status = 200, description = "Stored clinics ordered by management number", body = Vec<PetClinic>),
    )
)]
pub async fn api_list_pet_clinics(
    State(app_state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<PetClinic>>, ServiceError> {
    let (limit, offset) = page.resolve();
    let clinics = with_db(&app_state.db_pool, move |conn| db::list_pet_clinics(conn, limit, offset)).await?;
    Ok(Json(clinics))
}

#[utoipa::path(
    get,
    path = "/pet-clinics/{mgt_no}",
    tag = "Pet clinics",
    params(ClinicPath),
    responses(
        (status = 200, description = "Clinic found", body = PetClinic),
        (status = 404, description = "Clinic not found", body = ServiceError),
    )
)]
pub async fn api_get_pet_clinic(
    State(app_state): State<AppState>,
    Path(ClinicPath { mgt_no }): Path<ClinicPath>,
) -> Result<Json<PetClinic>, ServiceError> {
    let lookup = mgt_no.clone();
    with_db(&app_state.db_pool, move |conn| db::get_pet_clinic(conn, &lookup))
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound(format!("Pet clinic '{mgt_no}' not found")))
}
