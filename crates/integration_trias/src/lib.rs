//! TRIAS public transit client
//!
//! Talks to a [VDV TRIAS](https://www.vdv.de/ip-kom-oev.aspx) endpoint: builds
//! XML service requests, POSTs them, and decodes the XML deliveries into
//! typed responses.
//!
//! # Architecture
//!
//! The [`decoder`] is a single-pass, event-driven decoder. A response kind
//! declares its shape through [`ResponseSchema`] and [`PayloadSchema`]; the
//! decoder folds `quick-xml` events into it and reports the first error it
//! hits. [`TriasClient`] defines the service interface, implemented by
//! [`HttpTriasClient`].
//!
//! # Example
//!
//! ```rust,ignore
//! use integration_trias::{
//!     HttpTriasClient, LocationInformationRequest, LocationType, TriasClient, TriasConfig,
//! };
//!
//! let config = TriasConfig::default();
//! let client = HttpTriasClient::new(&config)?;
//!
//! let request = LocationInformationRequest::by_name("Bismarckplatz")
//!     .with_type(LocationType::Stop)
//!     .with_max_results(5);
//! let response = client.search_locations(&request).await?;
//! ```

mod client;
mod config;
pub mod decoder;
mod error;
mod models;
mod request;

pub use client::{HttpTriasClient, TriasClient};
pub use config::TriasConfig;
pub use decoder::{DecodeError, PayloadSchema, ResponseSchema, ServiceHeader, decode};
pub use error::TriasError;
pub use models::{
    LocationInformationResponse, LocationResult, StopEventResponse, StopEventResult,
};
pub use request::{
    DEFAULT_RADIUS_METERS, LocationInformationRequest, LocationInput, LocationType,
    RequestPayload, StopEventRequest, envelope,
};
