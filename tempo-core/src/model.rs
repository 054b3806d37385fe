use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A device position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Current weather as returned by the OpenWeather `data/2.5/weather` endpoint.
///
/// Field names follow the wire format so the same shape is used for decoding
/// the API response and for the copy kept in the shared store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub coord: Coord,
    pub weather: Vec<Condition>,
    pub main: Readings,
    pub name: String,
    /// Shift in seconds from UTC.
    #[serde(default)]
    pub timezone: Option<i64>,
    /// Observation time, unix seconds.
    #[serde(default)]
    pub dt: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: i64,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: i64,
    pub humidity: i64,
}

impl WeatherRecord {
    /// Description of the first reported condition, if any.
    pub fn description(&self) -> Option<&str> {
        self.weather.first().map(|w| w.description.as_str())
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.dt.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

/// The latest record together with the moment the app wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedWeatherSnapshot {
    pub written_at: DateTime<Utc>,
    pub record: WeatherRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEOUL: &str = r#"{
        "coord": {"lon": 126.9778, "lat": 37.5683},
        "weather": [
            {"id": 800, "main": "Clear", "description": "맑음", "icon": "01d"},
            {"id": 701, "main": "Mist", "description": "박무", "icon": "50d"}
        ],
        "base": "stations",
        "main": {
            "temp": 24.5, "feels_like": 24.9, "temp_min": 22.7, "temp_max": 25.8,
            "pressure": 1009, "humidity": 71, "sea_level": 1009
        },
        "visibility": 10000,
        "name": "Seoul",
        "timezone": 32400,
        "dt": 1718600000,
        "cod": 200
    }"#;

    #[test]
    fn decodes_api_body_field_for_field() {
        let record: WeatherRecord = serde_json::from_str(SEOUL).expect("valid body");

        assert_eq!(record.coord, Coord { lon: 126.9778, lat: 37.5683 });
        assert_eq!(record.name, "Seoul");
        assert_eq!(record.timezone, Some(32400));
        assert_eq!(record.dt, Some(1718600000));
        assert_eq!(
            record.main,
            Readings {
                temp: 24.5,
                feels_like: 24.9,
                temp_min: 22.7,
                temp_max: 25.8,
                pressure: 1009,
                humidity: 71,
            }
        );
        assert_eq!(record.weather.len(), 2);
        assert_eq!(
            record.weather[0],
            Condition {
                id: 800,
                main: "Clear".into(),
                description: "맑음".into(),
                icon: "01d".into(),
            }
        );
        assert_eq!(record.description(), Some("맑음"));
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let body = r#"{
            "coord": {"lon": 0.0, "lat": 0.0},
            "weather": [],
            "main": {"temp": 1.0, "feels_like": 0.0, "temp_min": 0.5, "temp_max": 1.5,
                     "pressure": 1000, "humidity": 50},
            "name": ""
        }"#;
        let record: WeatherRecord = serde_json::from_str(body).expect("valid body");

        assert_eq!(record.timezone, None);
        assert_eq!(record.dt, None);
        assert_eq!(record.description(), None);
        assert_eq!(record.observed_at(), None);
    }

    #[test]
    fn partial_body_is_rejected() {
        let body = r#"{"coord": {"lon": 0.0, "lat": 0.0}, "name": "Nowhere"}"#;
        assert!(serde_json::from_str::<WeatherRecord>(body).is_err());
    }

    #[test]
    fn observed_at_converts_unix_seconds() {
        let record: WeatherRecord = serde_json::from_str(SEOUL).unwrap();
        let at = record.observed_at().unwrap();
        assert_eq!(at.timestamp(), 1718600000);
    }
}
