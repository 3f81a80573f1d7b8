//! Outbound query construction for the dataset API

use aqi_core::LocationQuery;
use url::Url;

/// Only PM2.5 readings are requested
pub const POLLUTANT_ID: &str = "PM2.5";

const API_KEY_PARAM: &str = "api-key";
const REDACTED: &str = "***";

/// Trim and percent-encode free text for use as a query value
pub fn sanitize(input: &str) -> String {
    urlencoding::encode(input.trim()).into_owned()
}

/// Render a coordinate the way the dataset stores it ("28.0", never "28")
pub fn format_coord(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Filter parameters for one location query, values already sanitized
pub fn filter_params(query: &LocationQuery) -> Vec<(&'static str, String)> {
    let mut params = match query {
        LocationQuery::ByCity { city, state } => vec![
            ("filters[state]", sanitize(state)),
            ("filters[city]", sanitize(city)),
        ],
        LocationQuery::ByCoords { lat, lon } => vec![
            ("filters[latitude]", sanitize(&format_coord(*lat))),
            ("filters[longitude]", sanitize(&format_coord(*lon))),
        ],
    };
    params.push(("filters[pollutant_id]", sanitize(POLLUTANT_ID)));
    params
}

/// Full request URL for a query
pub fn build_url(dataset_url: &Url, api_key: &str, limit: u32, query: &LocationQuery) -> String {
    let mut params = vec![
        (API_KEY_PARAM, sanitize(api_key)),
        ("format", "json".to_string()),
        ("limit", limit.to_string()),
    ];
    params.extend(filter_params(query));

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{dataset_url}?{query_string}")
}

/// Same URL with the API key masked, for logging
pub fn redact(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let masked = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((API_KEY_PARAM, _)) => format!("{API_KEY_PARAM}={REDACTED}"),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{base}?{masked}")
}
