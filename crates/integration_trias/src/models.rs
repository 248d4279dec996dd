//! TRIAS response models
//!
//! Typed representations of location information and stop event
//! deliveries. Both implement the decoder's schema contracts.

use std::fmt;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::decoder::{
    DecodeError, FieldKey, PayloadSchema, ResponseSchema, ServiceHeader, parse_bool, parse_f64,
    parse_timestamp,
};

const STOP_POINT_REF: FieldKey = FieldKey::leaf("trias:StopPointRef");
const LOCALITY_REF: FieldKey = FieldKey::leaf("trias:LocalityRef");
const LONGITUDE: FieldKey = FieldKey::leaf("trias:Longitude");
const LATITUDE: FieldKey = FieldKey::leaf("trias:Latitude");
const COMPLETE: FieldKey = FieldKey::leaf("trias:Complete");
const PROBABILITY: FieldKey = FieldKey::leaf("trias:Probability");
const STOP_POINT_NAME: FieldKey = FieldKey::scoped("trias:StopPointName", "trias:Text");
const LOCATION_NAME: FieldKey = FieldKey::scoped("trias:LocationName", "trias:Text");

const LOCATION_RESULT_KEYS: &[FieldKey] = &[
    STOP_POINT_REF,
    LOCALITY_REF,
    LONGITUDE,
    LATITUDE,
    COMPLETE,
    PROBABILITY,
    STOP_POINT_NAME,
    LOCATION_NAME,
];

const JOURNEY_REF: FieldKey = FieldKey::leaf("trias:JourneyRef");
const PT_MODE: FieldKey = FieldKey::leaf("trias:PtMode");
const PLANNED_BAY: FieldKey = FieldKey::scoped("trias:PlannedBay", "trias:Text");
const TIMETABLED_TIME: FieldKey =
    FieldKey::scoped("trias:ServiceDeparture", "trias:TimetabledTime");
const ESTIMATED_TIME: FieldKey = FieldKey::scoped("trias:ServiceDeparture", "trias:EstimatedTime");
const LINE_NAME: FieldKey = FieldKey::scoped("trias:PublishedLineName", "trias:Text");
const DESTINATION: FieldKey = FieldKey::scoped("trias:DestinationText", "trias:Text");

const STOP_EVENT_RESULT_KEYS: &[FieldKey] = &[
    STOP_POINT_REF,
    JOURNEY_REF,
    PT_MODE,
    STOP_POINT_NAME,
    PLANNED_BAY,
    TIMETABLED_TIME,
    ESTIMATED_TIME,
    LINE_NAME,
    DESTINATION,
];

/// One match of a location information request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationResult {
    /// Stop point identifier (e.g. `de:08221:1160`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_point_ref: Option<String>,
    /// Name of the stop point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_point_name: Option<String>,
    /// Locality identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality_ref: Option<String>,
    /// Free-form location name, usually the town
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    /// Longitude in WGS84 degrees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Latitude in WGS84 degrees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Whether the match fully covers the input
    #[serde(default)]
    pub complete: bool,
    /// Match probability between 0 and 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

impl LocationResult {
    /// Best display name: the stop name if known, the location name otherwise
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.stop_point_name
            .as_deref()
            .or(self.location_name.as_deref())
    }

    /// Coordinates as `(latitude, longitude)` when both are present
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    /// Returns true if this result is a stop point
    #[must_use]
    pub const fn is_stop(&self) -> bool {
        self.stop_point_ref.is_some()
    }

    /// Format as a compact one-line summary
    #[must_use]
    pub fn format_summary(&self) -> String {
        let name = self.name().unwrap_or("?");
        let town = match (&self.stop_point_name, &self.location_name) {
            (Some(_), Some(town)) => format!(", {town}"),
            _ => String::new(),
        };
        let id = self
            .stop_point_ref
            .as_deref()
            .or(self.locality_ref.as_deref())
            .map(|id| format!(" [{id}]"))
            .unwrap_or_default();
        let position = self
            .coordinates()
            .map(|(lat, lon)| format!(" ({lat:.5}, {lon:.5})"))
            .unwrap_or_default();

        format!("{name}{town}{id}{position}")
    }
}

impl fmt::Display for LocationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_summary())
    }
}

impl PayloadSchema for LocationResult {
    const ELEMENT_NAME: &'static str = "trias:LocationResult";

    fn property_keys() -> &'static [FieldKey] {
        LOCATION_RESULT_KEYS
    }

    fn set_value(&mut self, key: FieldKey, value: &str) -> Result<(), DecodeError> {
        match key {
            STOP_POINT_REF => self.stop_point_ref = Some(value.to_string()),
            LOCALITY_REF => self.locality_ref = Some(value.to_string()),
            STOP_POINT_NAME => self.stop_point_name = Some(value.to_string()),
            LOCATION_NAME => self.location_name = Some(value.to_string()),
            LONGITUDE => self.longitude = Some(parse_f64(key, value)?),
            LATITUDE => self.latitude = Some(parse_f64(key, value)?),
            COMPLETE => self.complete = parse_bool(key, value)?,
            PROBABILITY => self.probability = Some(parse_f64(key, value)?),
            _ => return Err(DecodeError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

/// Response to a location information request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationInformationResponse {
    /// Service delivery header
    pub header: ServiceHeader,
    /// Matches in the order the service ranked them
    pub results: Vec<LocationResult>,
}

impl ResponseSchema for LocationInformationResponse {
    type Payload = LocationResult;

    fn header(&self) -> &ServiceHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ServiceHeader {
        &mut self.header
    }

    fn payloads(&self) -> &[LocationResult] {
        &self.results
    }

    fn payloads_mut(&mut self) -> &mut Vec<LocationResult> {
        &mut self.results
    }
}

/// One departure from a stop
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopEventResult {
    /// Stop point the departure happens at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_point_ref: Option<String>,
    /// Name of that stop point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_point_name: Option<String>,
    /// Planned bay or platform
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_bay: Option<String>,
    /// Timetabled departure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timetabled_departure: Option<DateTime<Utc>>,
    /// Realtime estimate, when the operator provides one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_departure: Option<DateTime<Utc>>,
    /// Published line name (e.g. `S5`, `33`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_name: Option<String>,
    /// Destination shown on the vehicle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Operator journey identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journey_ref: Option<String>,
    /// Public transport mode (`bus`, `tram`, `rail`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl StopEventResult {
    /// Delay in whole minutes; `None` without a realtime estimate
    #[must_use]
    pub fn delay_minutes(&self) -> Option<i64> {
        let timetabled = self.timetabled_departure?;
        let estimated = self.estimated_departure?;
        Some((estimated - timetabled).num_minutes())
    }

    /// Departure to show: the estimate if known, the timetable otherwise
    #[must_use]
    pub fn departure(&self) -> Option<DateTime<Utc>> {
        self.estimated_departure.or(self.timetabled_departure)
    }

    /// Format as a compact one-line summary, times in the local zone
    #[must_use]
    pub fn format_summary(&self) -> String {
        self.format_summary_in(&Local)
    }

    /// Format as a compact one-line summary with times shown in `tz`
    #[must_use]
    pub fn format_summary_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let time = self.timetabled_departure.map_or_else(
            || String::from("--:--"),
            |t| t.with_timezone(tz).format("%H:%M").to_string(),
        );
        let line = self.line_name.as_deref().unwrap_or("?");
        let destination = self.destination.as_deref().unwrap_or("?");
        let bay = self
            .planned_bay
            .as_deref()
            .map(|b| format!(" ({b})"))
            .unwrap_or_default();
        let delay = match self.delay_minutes() {
            Some(mins) if mins > 0 => format!(" +{mins}"),
            Some(mins) if mins < 0 => format!(" {mins}"),
            _ => String::new(),
        };

        format!("{time}{delay} {line} → {destination}{bay}")
    }
}

impl fmt::Display for StopEventResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_summary())
    }
}

impl PayloadSchema for StopEventResult {
    const ELEMENT_NAME: &'static str = "trias:StopEventResult";

    fn property_keys() -> &'static [FieldKey] {
        STOP_EVENT_RESULT_KEYS
    }

    fn set_value(&mut self, key: FieldKey, value: &str) -> Result<(), DecodeError> {
        match key {
            STOP_POINT_REF => self.stop_point_ref = Some(value.to_string()),
            STOP_POINT_NAME => self.stop_point_name = Some(value.to_string()),
            PLANNED_BAY => self.planned_bay = Some(value.to_string()),
            TIMETABLED_TIME => self.timetabled_departure = Some(parse_timestamp(key, value)?),
            ESTIMATED_TIME => self.estimated_departure = Some(parse_timestamp(key, value)?),
            LINE_NAME => self.line_name = Some(value.to_string()),
            DESTINATION => self.destination = Some(value.to_string()),
            JOURNEY_REF => self.journey_ref = Some(value.to_string()),
            PT_MODE => self.mode = Some(value.to_string()),
            _ => return Err(DecodeError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

/// Response to a stop event request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopEventResponse {
    /// Service delivery header
    pub header: ServiceHeader,
    /// Departures in service order
    pub results: Vec<StopEventResult>,
}

impl ResponseSchema for StopEventResponse {
    type Payload = StopEventResult;

    fn header(&self) -> &ServiceHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ServiceHeader {
        &mut self.header
    }

    fn payloads(&self) -> &[StopEventResult] {
        &self.results
    }

    fn payloads_mut(&mut self) -> &mut Vec<StopEventResult> {
        &mut self.results
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    #[test]
    fn test_location_set_value() {
        let mut result = LocationResult::default();
        result.set_value(STOP_POINT_REF, "de:08221:1160").unwrap();
        result.set_value(STOP_POINT_NAME, "Bismarckplatz").unwrap();
        result.set_value(LOCATION_NAME, "Heidelberg").unwrap();
        result.set_value(LATITUDE, "49.40955").unwrap();
        result.set_value(LONGITUDE, "8.69251").unwrap();
        result.set_value(COMPLETE, "true").unwrap();

        assert_eq!(result.name(), Some("Bismarckplatz"));
        assert!(result.is_stop());
        assert!(result.complete);
        let (lat, lon) = result.coordinates().unwrap();
        assert!((lat - 49.40955).abs() < 1e-9);
        assert!((lon - 8.69251).abs() < 1e-9);
    }

    #[test]
    fn test_location_type_mismatch() {
        let mut result = LocationResult::default();
        let err = result.set_value(PROBABILITY, "likely").unwrap_err();
        assert!(matches!(err, DecodeError::TypeMismatch { expected: "f64", .. }));
        assert_eq!(result.probability, None);

        assert!(result.set_value(COMPLETE, "maybe").is_err());
    }

    #[test]
    fn test_location_unknown_key() {
        let mut result = LocationResult::default();
        let err = result.set_value(PLANNED_BAY, "3").unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownKey("trias:PlannedBay>trias:Text".to_string())
        );
    }

    #[test]
    fn test_every_declared_key_is_settable() {
        for key in LocationResult::property_keys() {
            let mut result = LocationResult::default();
            assert!(
                !matches!(
                    result.set_value(*key, "1"),
                    Err(DecodeError::UnknownKey(_))
                ),
                "{key} declared but not handled"
            );
        }
        for key in StopEventResult::property_keys() {
            let mut result = StopEventResult::default();
            assert!(
                !matches!(
                    result.set_value(*key, "2026-03-01T08:15:00Z"),
                    Err(DecodeError::UnknownKey(_))
                ),
                "{key} declared but not handled"
            );
        }
    }

    #[test]
    fn test_location_name_falls_back() {
        let result = LocationResult {
            location_name: Some("Heidelberg, Hauptstraße".to_string()),
            ..Default::default()
        };
        assert_eq!(result.name(), Some("Heidelberg, Hauptstraße"));
        assert!(!result.is_stop());
        assert_eq!(result.format_summary(), "Heidelberg, Hauptstraße");
    }

    #[test]
    fn test_location_summary() {
        let result = LocationResult {
            stop_point_ref: Some("de:08221:1160".to_string()),
            stop_point_name: Some("Bismarckplatz".to_string()),
            location_name: Some("Heidelberg".to_string()),
            latitude: Some(49.409_55),
            longitude: Some(8.692_51),
            ..Default::default()
        };
        assert_eq!(
            result.to_string(),
            "Bismarckplatz, Heidelberg [de:08221:1160] (49.40955, 8.69251)"
        );
    }

    #[test]
    fn test_stop_event_delay() {
        let mut event = StopEventResult::default();
        assert_eq!(event.delay_minutes(), None);

        event.timetabled_departure = Some(Utc.with_ymd_and_hms(2026, 3, 1, 8, 15, 0).unwrap());
        assert_eq!(event.delay_minutes(), None);
        assert_eq!(event.departure(), event.timetabled_departure);

        event.estimated_departure = Some(Utc.with_ymd_and_hms(2026, 3, 1, 8, 19, 0).unwrap());
        assert_eq!(event.delay_minutes(), Some(4));
        assert_eq!(event.departure(), event.estimated_departure);
    }

    #[test]
    fn test_stop_event_summary() {
        let event = StopEventResult {
            planned_bay: Some("Steig C".to_string()),
            timetabled_departure: Some(Utc.with_ymd_and_hms(2026, 3, 1, 8, 15, 0).unwrap()),
            estimated_departure: Some(Utc.with_ymd_and_hms(2026, 3, 1, 8, 17, 0).unwrap()),
            line_name: Some("5".to_string()),
            destination: Some("Weinheim".to_string()),
            ..Default::default()
        };
        assert_eq!(event.format_summary_in(&Utc), "08:15 +2 5 → Weinheim (Steig C)");
    }

    #[test]
    fn test_stop_event_summary_uses_zone_offset() {
        let event = StopEventResult {
            timetabled_departure: Some(Utc.with_ymd_and_hms(2026, 7, 1, 6, 4, 0).unwrap()),
            line_name: Some("5".to_string()),
            destination: Some("Weinheim".to_string()),
            ..Default::default()
        };
        let cest = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(event.format_summary_in(&cest), "08:04 5 → Weinheim");

        let local = event.timetabled_departure.unwrap().with_timezone(&Local);
        assert!(event.format_summary().starts_with(&local.format("%H:%M").to_string()));
    }

    #[test]
    fn test_stop_event_bad_time() {
        let mut event = StopEventResult::default();
        let err = event.set_value(ESTIMATED_TIME, "soon").unwrap_err();
        assert!(matches!(err, DecodeError::TypeMismatch { .. }));
    }
}
