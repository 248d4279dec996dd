//! Decode state machine
//!
//! Consumes SAX-style events one at a time and folds them into a response.
//! The state is owned by a single decode call; feeding it synthetic events
//! is how most of the behaviour below is tested.

use super::error::{DecodeError, ErrorCapture, Flow};
use super::observer::ObserverTable;
use super::schema::{FieldKey, HeaderField, PayloadSchema, ResponseSchema};

/// One event from the XML event source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent<'a> {
    /// Start of the document
    DocumentStart,
    /// An element opened, by qualified name
    ElementOpen(&'a str),
    /// A chunk of character data
    Characters(&'a str),
    /// An element closed, by qualified name
    ElementClose(&'a str),
    /// The tokenizer gave up
    ParseError(String),
    /// End of the document
    DocumentEnd,
}

/// In-flight state of one decode call
#[derive(Debug)]
pub struct DecodeState<R: ResponseSchema> {
    observers: ObserverTable,
    current_element: String,
    active_parent: Option<String>,
    text_buffer: String,
    in_progress: Option<R::Payload>,
    response: R,
    errors: ErrorCapture,
    depth: usize,
    root_seen: bool,
    root_closed: bool,
    finished: bool,
}

impl<R: ResponseSchema> Default for DecodeState<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ResponseSchema> DecodeState<R> {
    /// Create an empty state
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: ObserverTable::default(),
            current_element: String::new(),
            active_parent: None,
            text_buffer: String::new(),
            in_progress: None,
            response: R::default(),
            errors: ErrorCapture::default(),
            depth: 0,
            root_seen: false,
            root_closed: false,
            finished: false,
        }
    }

    /// Apply one event
    ///
    /// Returns [`Flow::Abort`] once a fatal error has been recorded or the
    /// document has ended; the caller should stop feeding events then.
    pub fn handle(&mut self, event: DecodeEvent<'_>) -> Flow {
        if self.finished {
            return Flow::Abort;
        }

        match event {
            DecodeEvent::DocumentStart => {
                self.observers = ObserverTable::from_keys(R::Payload::property_keys());
                Flow::Continue
            },
            DecodeEvent::ElementOpen(name) => self.on_element_open(name),
            DecodeEvent::Characters(text) => {
                self.text_buffer.push_str(text.trim());
                Flow::Continue
            },
            DecodeEvent::ElementClose(name) => self.on_element_close(name),
            DecodeEvent::ParseError(cause) => {
                self.finished = true;
                self.errors.record(DecodeError::MalformedDocument(cause));
                Flow::Abort
            },
            DecodeEvent::DocumentEnd => {
                self.finished = true;
                if !self.root_seen {
                    self.errors.record(DecodeError::MalformedDocument(
                        "document has no root element".to_string(),
                    ));
                } else if self.depth > 0 {
                    self.errors.record(DecodeError::MalformedDocument(format!(
                        "document ended inside <{}> with {} unclosed element(s)",
                        self.current_element, self.depth
                    )));
                }
                Flow::Abort
            },
        }
    }

    fn on_element_open(&mut self, name: &str) -> Flow {
        if self.depth == 0 {
            if self.root_closed {
                self.finished = true;
                return self.errors.record(DecodeError::MalformedDocument(format!(
                    "second root element <{name}> after the document element closed"
                )));
            }
            self.root_seen = true;
        }

        self.depth += 1;
        name.clone_into(&mut self.current_element);
        self.text_buffer.clear();

        if self.observers.is_parent(name) {
            self.active_parent = Some(name.to_string());
        }

        if name == R::Payload::ELEMENT_NAME {
            self.in_progress = Some(R::Payload::default());
        }

        Flow::Continue
    }

    fn on_element_close(&mut self, name: &str) -> Flow {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.root_closed = true;
        }

        let flow = if let Some(field) = HeaderField::from_tag(name) {
            self.response.header_mut().assign(field, &self.text_buffer);
            Flow::Continue
        } else if name == R::Payload::ELEMENT_NAME {
            if let Some(record) = self.in_progress.take() {
                self.response.payloads_mut().push(record);
            }
            Flow::Continue
        } else {
            self.on_field_close(name)
        };

        if self.active_parent.as_deref() == Some(name) {
            self.active_parent = None;
        }

        flow
    }

    fn on_field_close(&mut self, name: &str) -> Flow {
        let Some(key) = self.resolve_key(name) else {
            return Flow::Continue;
        };

        let Some(record) = self.in_progress.as_mut() else {
            return self.errors.record(DecodeError::MissingValue(format!(
                "{key} closed outside of <{}>",
                R::Payload::ELEMENT_NAME
            )));
        };

        match record.set_value(key, &self.text_buffer) {
            Ok(()) => Flow::Continue,
            Err(e) => self.errors.record(e),
        }
    }

    /// Find the declared key for a closing element, if any
    fn resolve_key(&self, name: &str) -> Option<FieldKey> {
        let scoped = self
            .active_parent
            .as_deref()
            .and_then(|parent| self.observers.resolve(parent, name))
            .map(FieldKey::Scoped);

        scoped.or_else(|| {
            R::Payload::property_keys()
                .iter()
                .copied()
                .find(|key| key.is_leaf(name))
        })
    }

    /// The response accumulated so far
    ///
    /// When an error has been recorded this is a best-effort partial value.
    #[must_use]
    pub const fn response(&self) -> &R {
        &self.response
    }

    /// The first error recorded, if any
    #[must_use]
    pub const fn first_error(&self) -> Option<&DecodeError> {
        self.errors.first()
    }

    /// Consume the state into the decode result
    ///
    /// # Errors
    ///
    /// Returns the first recorded error, if any.
    pub fn finish(self) -> Result<R, DecodeError> {
        match self.errors.into_first() {
            Some(error) => Err(error),
            None => Ok(self.response),
        }
    }
}
