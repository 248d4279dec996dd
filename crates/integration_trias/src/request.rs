//! TRIAS request payloads
//!
//! Builds the fixed-format XML bodies the service expects. The request
//! timestamp and requestor reference are injected by [`envelope`] when the
//! request is sent, so a payload can be reused (and cached) across calls.

use std::fmt::{self, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};

use crate::error::TriasError;

/// Default search radius for coordinate lookups, in meters
pub const DEFAULT_RADIUS_METERS: u32 = 500;

/// Kind of location a search is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    /// Public transport stop
    Stop,
    /// Street address
    Address,
    /// Point of interest
    Poi,
    /// Town or municipality
    Locality,
}

impl LocationType {
    /// The value used in the `Type` restriction
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Address => "address",
            Self::Poi => "poi",
            Self::Locality => "locality",
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request body that goes inside `RequestPayload`
pub trait RequestPayload {
    /// Render the payload element
    fn payload_xml(&self) -> String;
}

/// What a location search starts from
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// Free-text name
    Name(String),
    /// Circle around a coordinate
    Coordinate {
        /// Latitude in WGS84 degrees
        latitude: f64,
        /// Longitude in WGS84 degrees
        longitude: f64,
        /// Search radius in meters
        radius_meters: u32,
    },
}

/// Location information request (`LocationInformationRequest`)
#[derive(Debug, Clone, PartialEq)]
pub struct LocationInformationRequest {
    /// Search input
    pub input: LocationInput,
    /// Restrict results to one kind of location
    pub location_type: Option<LocationType>,
    /// Maximum number of results
    pub max_results: u8,
}

impl LocationInformationRequest {
    /// Search locations by name
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            input: LocationInput::Name(name.into()),
            location_type: None,
            max_results: 10,
        }
    }

    /// Search locations around a coordinate
    ///
    /// # Errors
    ///
    /// Returns [`TriasError::InvalidLocation`] if the coordinate is out of range.
    pub fn by_coordinate(latitude: f64, longitude: f64) -> Result<Self, TriasError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(TriasError::InvalidLocation(format!(
                "coordinate out of range: {latitude}, {longitude}"
            )));
        }

        Ok(Self {
            input: LocationInput::Coordinate {
                latitude,
                longitude,
                radius_meters: DEFAULT_RADIUS_METERS,
            },
            location_type: Some(LocationType::Stop),
            max_results: 10,
        })
    }

    /// Restrict results to one location type
    #[must_use]
    pub const fn with_type(mut self, location_type: LocationType) -> Self {
        self.location_type = Some(location_type);
        self
    }

    /// Set the maximum number of results
    #[must_use]
    pub const fn with_max_results(mut self, max: u8) -> Self {
        self.max_results = max;
        self
    }

    /// Set the search radius; ignored for name searches
    #[must_use]
    pub const fn with_radius(mut self, meters: u32) -> Self {
        if let LocationInput::Coordinate { radius_meters, .. } = &mut self.input {
            *radius_meters = meters;
        }
        self
    }
}

impl RequestPayload for LocationInformationRequest {
    fn payload_xml(&self) -> String {
        let mut xml = String::from("<LocationInformationRequest><InitialInput>");

        match &self.input {
            LocationInput::Name(name) => {
                let _ = write!(xml, "<LocationName>{}</LocationName>", escape(name.trim()));
            },
            LocationInput::Coordinate {
                latitude,
                longitude,
                radius_meters,
            } => {
                let _ = write!(
                    xml,
                    "<GeoRestriction><Circle><Center>\
                     <Longitude>{longitude}</Longitude><Latitude>{latitude}</Latitude>\
                     </Center><Radius>{radius_meters}</Radius></Circle></GeoRestriction>"
                );
            },
        }

        xml.push_str("</InitialInput><Restrictions>");
        if let Some(location_type) = self.location_type {
            let _ = write!(xml, "<Type>{location_type}</Type>");
        }
        let _ = write!(
            xml,
            "<NumberOfResults>{}</NumberOfResults></Restrictions></LocationInformationRequest>",
            self.max_results
        );
        xml
    }
}

/// Stop event request (`StopEventRequest`), departures only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopEventRequest {
    /// Stop point to query
    pub stop_point_ref: String,
    /// First departure to list; the service uses "now" when absent
    pub departure: Option<DateTime<Utc>>,
    /// Maximum number of results
    pub max_results: u8,
    /// Ask for realtime estimates
    pub include_realtime: bool,
}

impl StopEventRequest {
    /// Departures at a stop point
    #[must_use]
    pub fn new(stop_point_ref: impl Into<String>) -> Self {
        Self {
            stop_point_ref: stop_point_ref.into(),
            departure: None,
            max_results: 10,
            include_realtime: true,
        }
    }

    /// List departures from this time on
    #[must_use]
    pub const fn with_departure(mut self, departure: DateTime<Utc>) -> Self {
        self.departure = Some(departure);
        self
    }

    /// Set the maximum number of results
    #[must_use]
    pub const fn with_max_results(mut self, max: u8) -> Self {
        self.max_results = max;
        self
    }

    /// Enable or disable realtime estimates
    #[must_use]
    pub const fn with_realtime(mut self, include: bool) -> Self {
        self.include_realtime = include;
        self
    }
}

impl RequestPayload for StopEventRequest {
    fn payload_xml(&self) -> String {
        let mut xml = String::from("<StopEventRequest><Location><LocationRef>");
        let _ = write!(
            xml,
            "<StopPointRef>{}</StopPointRef></LocationRef>",
            escape(self.stop_point_ref.trim())
        );
        if let Some(departure) = self.departure {
            let _ = write!(
                xml,
                "<DepArrTime>{}</DepArrTime>",
                departure.to_rfc3339_opts(SecondsFormat::Secs, true)
            );
        }
        let _ = write!(
            xml,
            "</Location><Params><NumberOfResults>{}</NumberOfResults>\
             <StopEventType>departure</StopEventType>\
             <IncludeRealtimeData>{}</IncludeRealtimeData></Params></StopEventRequest>",
            self.max_results, self.include_realtime
        );
        xml
    }
}

/// Wrap a payload in a complete `Trias` service request
#[must_use]
pub fn envelope(payload: &str, timestamp: DateTime<Utc>, requestor_ref: Option<&str>) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><Trias version="1.1" xmlns="http://www.vdv.de/trias" xmlns:siri="http://www.siri.org.uk/siri"><ServiceRequest>"#,
    );
    let _ = write!(
        xml,
        "<siri:RequestTimestamp>{}</siri:RequestTimestamp>",
        timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    if let Some(requestor) = requestor_ref {
        let _ = write!(
            xml,
            "<siri:RequestorRef>{}</siri:RequestorRef>",
            escape(requestor)
        );
    }
    let _ = write!(
        xml,
        "<RequestPayload>{payload}</RequestPayload></ServiceRequest></Trias>"
    );
    xml
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_location_by_name() {
        let xml = LocationInformationRequest::by_name("Bismarckplatz")
            .with_type(LocationType::Stop)
            .with_max_results(5)
            .payload_xml();
        assert_eq!(
            xml,
            "<LocationInformationRequest><InitialInput><LocationName>Bismarckplatz</LocationName>\
             </InitialInput><Restrictions><Type>stop</Type><NumberOfResults>5</NumberOfResults>\
             </Restrictions></LocationInformationRequest>"
        );
    }

    #[test]
    fn test_location_name_is_escaped() {
        let xml = LocationInformationRequest::by_name(" Q7 <Mannheim> & Co ").payload_xml();
        assert!(xml.contains("<LocationName>Q7 &lt;Mannheim&gt; &amp; Co</LocationName>"));
        assert!(!xml.contains("<Type>"));
    }

    #[test]
    fn test_location_by_coordinate() {
        let xml = LocationInformationRequest::by_coordinate(49.4, 8.69)
            .unwrap()
            .with_radius(250)
            .payload_xml();
        assert!(xml.contains("<Longitude>8.69</Longitude><Latitude>49.4</Latitude>"));
        assert!(xml.contains("<Radius>250</Radius>"));
        assert!(xml.contains("<Type>stop</Type>"));
    }

    #[test]
    fn test_location_by_coordinate_out_of_range() {
        assert!(LocationInformationRequest::by_coordinate(91.0, 8.0).is_err());
        assert!(LocationInformationRequest::by_coordinate(49.0, -181.0).is_err());
        assert!(LocationInformationRequest::by_coordinate(f64::NAN, 8.0).is_err());
    }

    #[test]
    fn test_radius_ignored_for_names() {
        let request = LocationInformationRequest::by_name("Heidelberg").with_radius(100);
        assert_eq!(request.input, LocationInput::Name("Heidelberg".to_string()));
    }

    #[test]
    fn test_stop_event_request() {
        let departure = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let xml = StopEventRequest::new("de:08221:1160")
            .with_departure(departure)
            .with_max_results(3)
            .with_realtime(false)
            .payload_xml();
        assert!(xml.contains("<StopPointRef>de:08221:1160</StopPointRef>"));
        assert!(xml.contains("<DepArrTime>2026-03-01T08:00:00Z</DepArrTime>"));
        assert!(xml.contains("<NumberOfResults>3</NumberOfResults>"));
        assert!(xml.contains("<IncludeRealtimeData>false</IncludeRealtimeData>"));
    }

    #[test]
    fn test_stop_event_without_time() {
        let xml = StopEventRequest::new("de:08221:1160").payload_xml();
        assert!(!xml.contains("DepArrTime"));
        assert!(xml.contains("<IncludeRealtimeData>true</IncludeRealtimeData>"));
    }

    #[test]
    fn test_envelope() {
        let timestamp = Utc.with_ymd_and_hms(2026, 3, 1, 7, 59, 30).unwrap();
        let xml = envelope("<X/>", timestamp, Some("API&KEY"));
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<siri:RequestTimestamp>2026-03-01T07:59:30Z</siri:RequestTimestamp>"));
        assert!(xml.contains("<siri:RequestorRef>API&amp;KEY</siri:RequestorRef>"));
        assert!(xml.ends_with("<RequestPayload><X/></RequestPayload></ServiceRequest></Trias>"));

        let anonymous = envelope("<X/>", timestamp, None);
        assert!(!anonymous.contains("RequestorRef"));
    }
}
