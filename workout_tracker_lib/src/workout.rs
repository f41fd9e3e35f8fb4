use std::fmt;

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::geo_point::GeoPoint;

/// A very rough estimate for a generic person.
pub const DEFAULT_KCAL_PER_KM: f64 = 60.;

/// A finished workout, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub timestamp_iso: String,
    pub distance_meters: f64,
    pub duration_ms: i64,
    pub avg_speed_kmh: f64,
    pub route: Vec<GeoPoint>,
}

impl WorkoutRecord {
    pub fn new(finished_at_ms: i64, distance_meters: f64, duration_ms: i64, avg_speed_kmh: f64, route: Vec<GeoPoint>) -> Self {
        Self {
            timestamp_iso: iso_timestamp(finished_at_ms),
            distance_meters,
            duration_ms,
            avg_speed_kmh,
            route,
        }
    }

    pub fn summary(&self, kcal_per_km: f64) -> WorkoutSummary {
        WorkoutSummary {
            distance_meters: self.distance_meters,
            avg_speed_kmh: self.avg_speed_kmh,
            calories: estimate_calories(self.distance_meters, kcal_per_km),
            duration_ms: self.duration_ms,
        }
    }
}

/// What the user sees when a workout ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkoutSummary {
    pub distance_meters: f64,
    pub avg_speed_kmh: f64,
    pub calories: u64,
    pub duration_ms: i64,
}

impl fmt::Display for WorkoutSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Distance: {:.2} km, Avg speed: {:.1} km/h, Calories: {}, Duration: {}",
            self.distance_meters / 1000.,
            self.avg_speed_kmh,
            self.calories,
            format_duration(self.duration_ms)
        )
    }
}

/// Linear in distance, not physiologically precise.
pub fn estimate_calories(distance_meters: f64, kcal_per_km: f64) -> u64 {
    let calories = (distance_meters / 1000. * kcal_per_km).round();
    if calories.is_finite() && calories > 0. {
        calories as u64
    } else {
        0
    }
}

/// Formats as HH:MM:SS. Negative durations show as zero.
pub fn format_duration(duration_ms: i64) -> String {
    let duration_ms = duration_ms.max(0);
    let hrs = duration_ms / 3_600_000;
    let mins = (duration_ms % 3_600_000) / 60_000;
    let secs = (duration_ms % 60_000) / 1000;
    format!("{:02}:{:02}:{:02}", hrs, mins, secs)
}

/// ISO 8601 in UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
pub fn iso_timestamp(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_persisted_field_names() {
        let record = WorkoutRecord::new(0, 1234.5, 60_000, 7.4, vec![GeoPoint::new(56.1, 10.2)]);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["timestampIso"], "1970-01-01T00:00:00.000Z");
        assert_eq!(json["distanceMeters"], 1234.5);
        assert_eq!(json["durationMs"], 60_000);
        assert_eq!(json["avgSpeedKmh"], 7.4);
        assert_eq!(json["route"][0]["latitude"], 56.1);
        assert_eq!(json["route"][0]["longitude"], 10.2);
    }

    #[test]
    fn survives_a_trip_through_json() {
        let record = WorkoutRecord::new(
            1_714_564_800_123,
            5012.25,
            1_800_000,
            10.02,
            vec![GeoPoint::new(56.1572, 10.2107), GeoPoint::new(56.1572, 10.2107), GeoPoint::new(56.16, 10.21)],
        );

        let json = serde_json::to_string(&record).unwrap();
        let restored: WorkoutRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, record);
        assert_eq!(restored.timestamp_iso, "2024-05-01T12:00:00.123Z");
    }

    #[test]
    fn calories_are_sixty_per_km() {
        assert_eq!(estimate_calories(0., DEFAULT_KCAL_PER_KM), 0);
        assert_eq!(estimate_calories(1000., DEFAULT_KCAL_PER_KM), 60);
        assert_eq!(estimate_calories(2508., DEFAULT_KCAL_PER_KM), 150);
        assert_eq!(estimate_calories(f64::NAN, DEFAULT_KCAL_PER_KM), 0);
    }

    #[test]
    fn durations_are_clock_formatted() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(61_999), "00:01:01");
        assert_eq!(format_duration(3_723_000), "01:02:03");
        assert_eq!(format_duration(-5), "00:00:00");
    }

    #[test]
    fn summary_display() {
        let record = WorkoutRecord::new(0, 2500., 3_723_000, 8.04, Vec::new());
        assert_eq!(
            record.summary(DEFAULT_KCAL_PER_KM).to_string(),
            "Distance: 2.50 km, Avg speed: 8.0 km/h, Calories: 150, Duration: 01:02:03"
        );
    }
}
