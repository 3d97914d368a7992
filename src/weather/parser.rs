use scraper::{ElementRef, Html, Selector};

use super::WeatherError;
use crate::models::WeatherReport;

const TEMPERATURE: &str = "div.temperature_text > strong";
const STATUS: &str = "div.weather_main > i > span.blind";
const AIR_QUALITY: &str = "a.air_area > div.text_area > span.text";

/// Hidden label the page puts in front of the temperature value.
const TEMPERATURE_LABEL: &str = "현재 온도";

/// Stored when the page has no air quality block.
pub const DEFAULT_AIR_QUALITY: &str = "정보 없음";

/// Extracts a [`WeatherReport`] from the search results page.
///
/// Temperature and status are required; air quality falls back to
/// [`DEFAULT_AIR_QUALITY`].
pub fn parse_weather_html(location: &str, html: &str) -> Result<WeatherReport, WeatherError> {
    let document = Html::parse_document(html);

    let current_temp = first_text(&document, TEMPERATURE)?
        .ok_or(WeatherError::MissingElement(TEMPERATURE))?
        .replace(TEMPERATURE_LABEL, "")
        .trim()
        .to_string();
    let weather_status = first_text(&document, STATUS)?.ok_or(WeatherError::MissingElement(STATUS))?;
    let air_quality = first_text(&document, AIR_QUALITY)?.unwrap_or_else(|| DEFAULT_AIR_QUALITY.to_string());

    Ok(WeatherReport {
        location: location.to_string(),
        current_temp,
        weather_status,
        air_quality,
    })
}

fn first_text(document: &Html, selector: &'static str) -> Result<Option<String>, WeatherError> {
    let parsed = Selector::parse(selector).map_err(|e| WeatherError::Selector {
        selector,
        reason: e.to_string(),
    })?;
    Ok(document.select(&parsed).next().map(element_text))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <html><body>
          <div class="weather_info">
            <div class="temperature_text">
              <strong><span class="blind">현재 온도</span>21.4<span class="celsius">°</span></strong>
            </div>
            <div class="weather_main"><i class="wt_icon ico_wt1"><span class="blind">맑음</span></i></div>
            <ul class="today_chart_list">
              <li><a class="air_area" href="#"><div class="text_area"><span class="title">미세먼지</span><span class="text">좋음</span></div></a></li>
              <li><a class="air_area" href="#"><div class="text_area"><span class="title">초미세먼지</span><span class="text">보통</span></div></a></li>
            </ul>
          </div>
        </body></html>
    "##;

    #[test]
    fn test_parses_all_fields() {
        let report = parse_weather_html("서울", PAGE).unwrap();
        assert_eq!(
            report,
            WeatherReport {
                location: "서울".to_string(),
                current_temp: "21.4°".to_string(),
                weather_status: "맑음".to_string(),
                air_quality: "좋음".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_air_quality_uses_default() {
        let page = r#"
            <div class="temperature_text"><strong>현재 온도 -3.0°</strong></div>
            <div class="weather_main"><i><span class="blind">눈</span></i></div>
        "#;
        let report = parse_weather_html("강릉", page).unwrap();
        assert_eq!(report.current_temp, "-3.0°");
        assert_eq!(report.weather_status, "눈");
        assert_eq!(report.air_quality, DEFAULT_AIR_QUALITY);
    }

    #[test]
    fn test_missing_required_element_fails() {
        let page = r#"<div class="weather_main"><i><span class="blind">흐림</span></i></div>"#;
        let err = parse_weather_html("서울", page).unwrap_err();
        assert!(matches!(err, WeatherError::MissingElement(TEMPERATURE)), "got {err:?}");

        let page = r#"<div class="temperature_text"><strong>10°</strong></div>"#;
        let err = parse_weather_html("서울", page).unwrap_err();
        assert!(matches!(err, WeatherError::MissingElement(STATUS)), "got {err:?}");
    }

    #[test]
    fn test_all_selectors_parse() {
        for selector in [TEMPERATURE, STATUS, AIR_QUALITY] {
            assert!(Selector::parse(selector).is_ok(), "{selector}");
        }
    }
}
