//! Widget timeline: what the widget shows and when it asks again.
//!
//! The widget process only reads the shared store. It never fetches weather.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use tracing::warn;

use crate::{config::DEFAULT_REFRESH_SECS, model::WeatherRecord, store::WeatherStore};

/// One renderable widget state.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherEntry {
    pub date: DateTime<Utc>,
    pub weather: Option<WeatherRecord>,
}

impl WeatherEntry {
    pub fn empty(date: DateTime<Utc>) -> Self {
        Self { date, weather: None }
    }

    pub fn has_data(&self) -> bool {
        self.weather.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadPolicy {
    /// Ask for a new timeline once this instant has passed.
    After(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub entries: Vec<WeatherEntry>,
    pub policy: ReloadPolicy,
}

impl Timeline {
    pub fn next_reload(&self) -> DateTime<Utc> {
        match self.policy {
            ReloadPolicy::After(at) => at,
        }
    }
}

/// Answers the widget host's three kinds of request.
#[derive(Debug, Clone)]
pub struct TimelineProvider {
    store: WeatherStore,
    refresh: Duration,
}

impl TimelineProvider {
    pub fn new(store: WeatherStore, refresh: std::time::Duration) -> Self {
        let refresh = Duration::from_std(refresh).unwrap_or_else(|_| {
            warn!(?refresh, "refresh interval out of range; using the default");
            default_refresh()
        });
        Self { store, refresh }
    }

    /// Shown before any data is known. Does no I/O.
    pub fn placeholder(&self, now: DateTime<Utc>) -> WeatherEntry {
        WeatherEntry::empty(now)
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> WeatherEntry {
        WeatherEntry {
            date: now,
            weather: self.latest(),
        }
    }

    /// A single entry for `now`, reloaded after the refresh interval.
    pub fn timeline(&self, now: DateTime<Utc>) -> Timeline {
        Timeline {
            entries: vec![WeatherEntry {
                date: now,
                weather: self.latest(),
            }],
            policy: ReloadPolicy::After(self.next_reload(now)),
        }
    }

    fn next_reload(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.refresh).unwrap_or_else(|| {
            warn!(refresh = %self.refresh, "reload time out of range; using the default interval");
            now + default_refresh()
        })
    }

    fn latest(&self) -> Option<WeatherRecord> {
        self.store.load().map(|snapshot| snapshot.record)
    }
}

fn default_refresh() -> Duration {
    Duration::seconds(DEFAULT_REFRESH_SECS as i64)
}

/// Text rendering of an entry.
pub struct EntryView<'a>(pub &'a WeatherEntry);

impl fmt::Display for EntryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.weather {
            Some(weather) => {
                writeln!(f, "{}", weather.name)?;
                writeln!(f, "{:.1}°C", weather.main.temp)?;
                write!(f, "{}", weather.description().unwrap_or(""))
            }
            None => {
                writeln!(f, "No weather data")?;
                writeln!(f, "Open the app to")?;
                write!(f, "update the information.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Condition, Coord, Readings};
    use chrono::TimeZone;

    fn record() -> WeatherRecord {
        WeatherRecord {
            coord: Coord { lon: 126.98, lat: 37.57 },
            weather: vec![Condition {
                id: 800,
                main: "Clear".into(),
                description: "맑음".into(),
                icon: "01d".into(),
            }],
            main: Readings {
                temp: 21.04,
                feels_like: 20.5,
                temp_min: 19.0,
                temp_max: 23.0,
                pressure: 1015,
                humidity: 40,
            },
            name: "Seoul".into(),
            timezone: Some(32400),
            dt: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 17, 9, 0, 0).unwrap()
    }

    fn provider(root: &std::path::Path) -> TimelineProvider {
        let store = WeatherStore::new(root, "group.test.tempo", "savedWeatherData");
        TimelineProvider::new(store, std::time::Duration::from_secs(15 * 60))
    }

    #[test]
    fn placeholder_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let entry = provider(dir.path()).placeholder(now());
        assert_eq!(entry, WeatherEntry::empty(now()));
    }

    #[test]
    fn empty_store_gives_no_data_entries() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(dir.path());

        assert!(!provider.snapshot(now()).has_data());

        let timeline = provider.timeline(now());
        assert_eq!(timeline.entries.len(), 1);
        assert!(!timeline.entries[0].has_data());
    }

    #[test]
    fn timeline_reads_store_and_reloads_after_fifteen_minutes() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(dir.path());
        provider.store.save(&record()).unwrap();

        let timeline = provider.timeline(now());

        assert_eq!(
            timeline.entries,
            vec![WeatherEntry {
                date: now(),
                weather: Some(record()),
            }]
        );
        assert_eq!(
            timeline.next_reload(),
            Utc.with_ymd_and_hms(2025, 6, 17, 9, 15, 0).unwrap()
        );
    }

    #[test]
    fn huge_refresh_interval_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = WeatherStore::new(dir.path(), "group.test.tempo", "savedWeatherData");
        let provider = TimelineProvider::new(store, std::time::Duration::from_secs(10_000_000_000_000));

        let timeline = provider.timeline(now());
        assert_eq!(
            timeline.next_reload(),
            Utc.with_ymd_and_hms(2025, 6, 17, 9, 15, 0).unwrap()
        );
    }

    #[test]
    fn refresh_interval_beyond_chrono_range_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = WeatherStore::new(dir.path(), "group.test.tempo", "savedWeatherData");
        let provider = TimelineProvider::new(store, std::time::Duration::from_secs(u64::MAX));

        assert_eq!(provider.timeline(now()).next_reload(), now() + Duration::minutes(15));
    }

    #[test]
    fn snapshot_sees_latest_write() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider(dir.path());
        provider.store.save(&record()).unwrap();

        let entry = provider.snapshot(now());
        assert_eq!(entry.weather, Some(record()));
    }

    #[test]
    fn view_renders_weather() {
        let entry = WeatherEntry {
            date: now(),
            weather: Some(record()),
        };
        assert_eq!(EntryView(&entry).to_string(), "Seoul\n21.0°C\n맑음");
    }

    #[test]
    fn view_renders_no_data() {
        let rendered = EntryView(&WeatherEntry::empty(now())).to_string();
        assert!(rendered.starts_with("No weather data"));
        assert_eq!(rendered.lines().count(), 3);
    }
}
