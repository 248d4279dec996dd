//! Command implementations
//!
//! Each command returns its rendered output so it can be tested against a
//! mocked [`TriasClient`].

use integration_trias::{
    LocationInformationRequest, LocationInformationResponse, StopEventRequest, StopEventResponse,
    TriasClient, decode,
};
use serde::Serialize;

/// Response kinds the offline decoder understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ResponseKind {
    /// Location information deliveries
    Locations,
    /// Stop event deliveries
    StopEvents,
}

/// Output style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// One line per result
    Text,
    /// Pretty-printed JSON
    Json,
}

pub async fn locations(
    client: &dyn TriasClient,
    request: &LocationInformationRequest,
    output: Output,
) -> anyhow::Result<String> {
    let response = client.search_locations(request).await?;
    render_locations(&response, output)
}

pub async fn departures(
    client: &dyn TriasClient,
    request: &StopEventRequest,
    output: Output,
) -> anyhow::Result<String> {
    let response = client.stop_events(request).await?;
    render_departures(&response, output)
}

/// Decode a saved response body without touching the network
pub fn decode_body(body: &[u8], kind: ResponseKind, output: Output) -> anyhow::Result<String> {
    match kind {
        ResponseKind::Locations => {
            let response: LocationInformationResponse = decode(body)?;
            render_locations(&response, output)
        },
        ResponseKind::StopEvents => {
            let response: StopEventResponse = decode(body)?;
            render_departures(&response, output)
        },
    }
}

fn render_locations(
    response: &LocationInformationResponse,
    output: Output,
) -> anyhow::Result<String> {
    if output == Output::Json {
        return to_json(response);
    }

    if response.results.is_empty() {
        return Ok("No locations found".to_string());
    }

    Ok(response
        .results
        .iter()
        .enumerate()
        .map(|(i, result)| format!("{:>2}. {result}", i + 1))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn render_departures(response: &StopEventResponse, output: Output) -> anyhow::Result<String> {
    if output == Output::Json {
        return to_json(response);
    }

    let Some(first) = response.results.first() else {
        return Ok("No departures found".to_string());
    };

    let stop = first.stop_point_name.as_deref().unwrap_or("?");
    let mut lines = vec![format!("Departures at {stop}:")];
    lines.extend(response.results.iter().map(|event| format!("  {event}")));
    Ok(lines.join("\n"))
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use integration_trias::{
        DecodeError, LocationResult, ServiceHeader, StopEventResult, TriasError,
    };
    use mockall::mock;

    use super::*;

    mock! {
        pub Trias {}

        #[async_trait::async_trait]
        impl TriasClient for Trias {
            async fn search_locations(&self, request: &LocationInformationRequest) -> Result<LocationInformationResponse, TriasError>;
            async fn stop_events(&self, request: &StopEventRequest) -> Result<StopEventResponse, TriasError>;
            async fn is_healthy(&self) -> bool;
        }
    }

    fn header() -> ServiceHeader {
        ServiceHeader {
            status: true,
            ..Default::default()
        }
    }

    fn sample_locations() -> LocationInformationResponse {
        LocationInformationResponse {
            header: header(),
            results: vec![
                LocationResult {
                    stop_point_ref: Some("de:08221:1160".to_string()),
                    stop_point_name: Some("Bismarckplatz".to_string()),
                    ..Default::default()
                },
                LocationResult {
                    location_name: Some("Heidelberg".to_string()),
                    ..Default::default()
                },
            ],
        }
    }

    #[tokio::test]
    async fn locations_as_text() {
        let mut mock = MockTrias::new();
        mock.expect_search_locations()
            .withf(|request| request.max_results == 2)
            .returning(|_| Ok(sample_locations()));

        let request = LocationInformationRequest::by_name("Bismarck").with_max_results(2);
        let text = locations(&mock, &request, Output::Text).await.unwrap();

        assert_eq!(text, " 1. Bismarckplatz [de:08221:1160]\n 2. Heidelberg");
    }

    #[tokio::test]
    async fn locations_as_json() {
        let mut mock = MockTrias::new();
        mock.expect_search_locations()
            .returning(|_| Ok(sample_locations()));

        let request = LocationInformationRequest::by_name("Bismarck");
        let json = locations(&mock, &request, Output::Json).await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["results"][0]["stop_point_name"], "Bismarckplatz");
        assert_eq!(value["header"]["status"], true);
    }

    #[tokio::test]
    async fn locations_empty() {
        let mut mock = MockTrias::new();
        mock.expect_search_locations()
            .returning(|_| Ok(LocationInformationResponse::default()));

        let request = LocationInformationRequest::by_name("Atlantis");
        let text = locations(&mock, &request, Output::Text).await.unwrap();
        assert_eq!(text, "No locations found");
    }

    #[tokio::test]
    async fn locations_error_propagates() {
        let mut mock = MockTrias::new();
        mock.expect_search_locations().returning(|_| {
            Err(TriasError::Decode(DecodeError::MissingValue(
                "trias:Probability".to_string(),
            )))
        });

        let request = LocationInformationRequest::by_name("Bismarck");
        let err = locations(&mock, &request, Output::Text).await.unwrap_err();
        assert!(err.to_string().contains("trias:Probability"));
    }

    #[tokio::test]
    async fn departures_as_text() {
        let mut mock = MockTrias::new();
        mock.expect_stop_events()
            .withf(|request| request.stop_point_ref == "de:08221:1160")
            .returning(|_| {
                Ok(StopEventResponse {
                    header: header(),
                    results: vec![StopEventResult {
                        stop_point_name: Some("Bismarckplatz".to_string()),
                        line_name: Some("5".to_string()),
                        destination: Some("Weinheim".to_string()),
                        ..Default::default()
                    }],
                })
            });

        let request = StopEventRequest::new("de:08221:1160");
        let text = departures(&mock, &request, Output::Text).await.unwrap();
        assert_eq!(text, "Departures at Bismarckplatz:\n  --:-- 5 → Weinheim");
    }

    #[tokio::test]
    async fn departures_empty() {
        let mut mock = MockTrias::new();
        mock.expect_stop_events()
            .returning(|_| Ok(StopEventResponse::default()));

        let request = StopEventRequest::new("de:08221:1160");
        let text = departures(&mock, &request, Output::Text).await.unwrap();
        assert_eq!(text, "No departures found");
    }

    #[test]
    fn decode_body_reports_errors() {
        let result = decode_body(b"<trias:Trias>", ResponseKind::Locations, Output::Text);
        assert!(result.is_err());
    }
}
