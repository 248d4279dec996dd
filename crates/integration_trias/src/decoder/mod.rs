//! Streaming TRIAS response decoder
//!
//! [`decode`] runs a `quick-xml` pull reader over the response body and
//! feeds each event to a fresh [`DecodeState`]. The response type decides
//! which elements matter through [`ResponseSchema`] and [`PayloadSchema`].
//!
//! # Example
//!
//! ```rust,ignore
//! use integration_trias::{LocationInformationResponse, decode};
//!
//! let response: LocationInformationResponse = decode(body.as_bytes())?;
//! for result in response.results {
//!     println!("{:?}", result.name());
//! }
//! ```

mod error;
mod observer;
mod schema;
mod state;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, trace};

pub use error::{DecodeError, Flow};
pub use observer::ObserverTable;
pub use schema::{
    FieldKey, HeaderField, PayloadSchema, ResponseSchema, ScopedKey, ServiceHeader, parse_bool,
    parse_f64, parse_timestamp,
};
pub use state::{DecodeEvent, DecodeState};

/// Decode a UTF-8 TRIAS response document into `R`
///
/// A fresh state is built for every call, so this is safe to call
/// concurrently from several tasks.
///
/// # Errors
///
/// Returns [`DecodeError::EncodingFailure`] for non-UTF-8 input,
/// [`DecodeError::MalformedDocument`] when the input is not a single
/// well-formed XML document (including empty input), and the
/// first field-level error otherwise.
pub fn decode<R: ResponseSchema>(bytes: &[u8]) -> Result<R, DecodeError> {
    let text =
        std::str::from_utf8(bytes).map_err(|e| DecodeError::EncodingFailure(e.to_string()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut state = DecodeState::<R>::new();
    feed_events(text, &mut state);

    let result = state.finish();
    match &result {
        Ok(response) => debug!(
            element = R::Payload::ELEMENT_NAME,
            count = response.payloads().len(),
            calc_time = response.header().calc_time,
            "Decoded TRIAS response"
        ),
        Err(e) => debug!(error = %e, element = R::Payload::ELEMENT_NAME, "TRIAS decode failed"),
    }
    result
}

/// Drive `state` with the events of `xml` until it asks to stop
fn feed_events<R: ResponseSchema>(xml: &str, state: &mut DecodeState<R>) {
    let mut reader = Reader::from_str(xml);

    if state.handle(DecodeEvent::DocumentStart) == Flow::Abort {
        return;
    }

    loop {
        let flow = match reader.read_event() {
            Ok(Event::Start(e)) => match std::str::from_utf8(e.name().as_ref()) {
                Ok(name) => state.handle(DecodeEvent::ElementOpen(name)),
                Err(err) => state.handle(DecodeEvent::ParseError(err.to_string())),
            },
            Ok(Event::Empty(e)) => match std::str::from_utf8(e.name().as_ref()) {
                Ok(name) => {
                    state.handle(DecodeEvent::ElementOpen(name));
                    state.handle(DecodeEvent::ElementClose(name))
                },
                Err(err) => state.handle(DecodeEvent::ParseError(err.to_string())),
            },
            Ok(Event::End(e)) => match std::str::from_utf8(e.name().as_ref()) {
                Ok(name) => state.handle(DecodeEvent::ElementClose(name)),
                Err(err) => state.handle(DecodeEvent::ParseError(err.to_string())),
            },
            Ok(Event::Text(e)) => match e.unescape() {
                Ok(text) => state.handle(DecodeEvent::Characters(&text)),
                Err(err) => state.handle(DecodeEvent::ParseError(err.to_string())),
            },
            Ok(Event::CData(e)) => match std::str::from_utf8(e.as_ref()) {
                Ok(text) => state.handle(DecodeEvent::Characters(text)),
                Err(err) => state.handle(DecodeEvent::ParseError(err.to_string())),
            },
            Ok(Event::Eof) => state.handle(DecodeEvent::DocumentEnd),
            Err(e) => {
                let position = reader.error_position();
                trace!(position, error = ?e, "XML tokenizer error");
                state.handle(DecodeEvent::ParseError(format!(
                    "{e} (at byte {position})"
                )))
            },
            // declarations, comments, processing instructions, doctype
            Ok(_) => Flow::Continue,
        };

        if flow == Flow::Abort {
            break;
        }
    }
}
