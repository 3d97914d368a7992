use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::{AppState, error::ServiceError, with_db};
use crate::{db, models::WeatherSnapshot};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LatestWeatherQuery {
    /// Defaults to the configured crawl location.
    location: Option<String>,
}

#[utoipa::path(
    get,
    path = "/weather/latest",
    tag = "Weather",
    params(LatestWeatherQuery),
    responses(
        (status = 200, description = "Most recent stored snapshot", body = WeatherSnapshot),
        (status = 404, description = "Nothing stored for the location", body = ServiceError),
    )
)]
pub async fn api_latest_weather(
    State(app_state): State<AppState>,
    Query(query): Query<LatestWeatherQuery>,
) -> Result<Json<WeatherSnapshot>, ServiceError> {
    let location = query.location.unwrap_or_else(|| app_state.weather_location.to_string());
    let lookup = location.clone();

    with_db(&app_state.db_pool, move |conn| db::get_latest_weather(conn, &lookup))
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound(format!("No weather data for '{location}'")))
}
