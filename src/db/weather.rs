use log::debug;
use rusqlite::{Connection, named_params};
use serde_rusqlite::from_rows;

use crate::db::error::DbResult;
use crate::models::{Id, WeatherReport, WeatherSnapshot};

/// Stores a scraped report. Snapshots are append-only; `crawled_at` is set by
/// the database in UTC.
pub fn insert_weather_snapshot(conn: &Connection, report: &WeatherReport) -> DbResult<Id> {
    debug!(
        location = &*report.location,
        temp = &*report.current_temp;
        "DB: Inserting weather snapshot"
    );

    conn.execute(
        r#"
        INSERT INTO weather_data (location, current_temp, weather_status, air_quality)
        VALUES (:location, :current_temp, :weather_status, :air_quality)
        "#,
        named_params! {
            ":location": report.location,
            ":current_temp": report.current_temp,
            ":weather_status": report.weather_status,
            ":air_quality": report.air_quality,
        },
    )?;

    Ok(conn.last_insert_rowid())
}

/// Most recent snapshot for `location`, newest by time then by id.
pub fn get_latest_weather(conn: &Connection, location: &str) -> DbResult<Option<WeatherSnapshot>> {
    let mut stmt = conn.prepare_cached(
        r#"
        SELECT
            id,
            location,
            current_temp,
            weather_status,
            air_quality,
            REPLACE(crawled_at, ' ', 'T') as crawled_at
        FROM weather_data
        WHERE location = :location
        ORDER BY crawled_at DESC, id DESC
        LIMIT 1
        "#,
    )?;

    let rows = stmt.query(named_params! { ":location": location })?;
    let snapshot = from_rows::<WeatherSnapshot>(rows).next().transpose()?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::db::init_db;

    fn report(location: &str, temp: &str) -> WeatherReport {
        WeatherReport {
            location: location.to_string(),
            current_temp: temp.to_string(),
            weather_status: "맑음".to_string(),
            air_quality: "좋음".to_string(),
        }
    }

    #[test]
    fn test_latest_snapshot_per_location() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let pool = init_db(temp_dir.path().join("weather.db")).expect("Failed to init DB");
        let conn = pool.get().expect("Failed to get connection");

        assert!(get_latest_weather(&conn, "서울").unwrap().is_none());

        insert_weather_snapshot(&conn, &report("서울", "12.1°")).unwrap();
        let newest = insert_weather_snapshot(&conn, &report("서울", "13.4°")).unwrap();
        insert_weather_snapshot(&conn, &report("부산", "18.0°")).unwrap();

        let latest = get_latest_weather(&conn, "서울").unwrap().unwrap();
        assert_eq!(latest.id, newest);
        assert_eq!(latest.current_temp.as_deref(), Some("13.4°"));
        assert_eq!(latest.weather_status.as_deref(), Some("맑음"));

        let busan = get_latest_weather(&conn, "부산").unwrap().unwrap();
        assert_eq!(busan.current_temp.as_deref(), Some("18.0°"));
    }
}
