/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Binary-mode event envelope.
//!
//! Envelope attributes travel as `ce-` prefixed transport headers and the
//! event data travels untouched as the message body. Headers and body are
//! never mixed: [`EventEnvelope::unwrap`] reads attributes only from headers
//! and takes the body verbatim as `data`, and [`EventEnvelope::wrap`] does the
//! reverse.

use std::fmt;

use chrono::{DateTime, FixedOffset};

use crate::message::Headers;

/// The only envelope spec version this codec accepts.
pub const SPEC_VERSION: &str = "1.0";

/// `ce-specversion` header (required, must equal [`SPEC_VERSION`]).
pub const HEADER_SPECVERSION: &str = "ce-specversion";
/// `ce-type` header (required).
pub const HEADER_TYPE: &str = "ce-type";
/// `ce-source` header (required).
pub const HEADER_SOURCE: &str = "ce-source";
/// `ce-id` header (required).
pub const HEADER_ID: &str = "ce-id";
/// `ce-time` header (optional, RFC 3339).
pub const HEADER_TIME: &str = "ce-time";
/// `ce-datacontenttype` header (optional).
pub const HEADER_DATACONTENTTYPE: &str = "ce-datacontenttype";

const ATTRIBUTE_HEADERS: [&str; 6] = [
    HEADER_SPECVERSION,
    HEADER_TYPE,
    HEADER_SOURCE,
    HEADER_ID,
    HEADER_TIME,
    HEADER_DATACONTENTTYPE,
];

/// Reasons an inbound envelope is rejected before its payload is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// A required attribute header is absent. Holds the header name.
    MissingAttribute(&'static str),
    /// `ce-specversion` is present but is not `1.0`. Holds the value received.
    UnsupportedSpecVersion(String),
}

impl EnvelopeError {
    /// The header name of the attribute that failed validation.
    #[must_use]
    pub const fn attribute(&self) -> &'static str {
        match self {
            Self::MissingAttribute(header) => header,
            Self::UnsupportedSpecVersion(_) => HEADER_SPECVERSION,
        }
    }
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAttribute(header) => {
                write!(f, "missing required envelope attribute '{header}'")
            }
            Self::UnsupportedSpecVersion(found) => write!(
                f,
                "invalid envelope attribute '{HEADER_SPECVERSION}': expected '{SPEC_VERSION}', found '{found}'"
            ),
        }
    }
}

impl std::error::Error for EnvelopeError {}

/// A validated event envelope.
///
/// Every `EventEnvelope` obtained from [`EventEnvelope::unwrap`] carries all
/// required attributes and spec version `1.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEnvelope {
    event_type: String,
    source: String,
    id: String,
    time: Option<String>,
    datacontenttype: Option<String>,
    extensions: Headers,
    data: Vec<u8>,
}

impl EventEnvelope {
    /// Creates an envelope with the required attributes set.
    #[must_use]
    pub fn new(
        event_type: impl Into<String>,
        source: impl Into<String>,
        id: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            source: source.into(),
            id: id.into(),
            time: None,
            datacontenttype: None,
            extensions: Headers::new(),
            data,
        }
    }

    /// Sets the `time` attribute.
    #[must_use]
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Sets the `datacontenttype` attribute.
    #[must_use]
    pub fn with_datacontenttype(mut self, content_type: impl Into<String>) -> Self {
        self.datacontenttype = Some(content_type.into());
        self
    }

    /// Adds a header that travels alongside the envelope attributes.
    #[must_use]
    pub fn with_extension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extensions.insert(name.into(), value.into());
        self
    }

    /// Validates the attribute headers and unwraps the envelope.
    ///
    /// Required attributes are checked in a fixed order: `ce-specversion`
    /// presence, `ce-specversion` value, `ce-type`, `ce-source`, `ce-id`. The
    /// first failure is the one reported. Optional attributes and every other
    /// header never influence the outcome; non-attribute headers are kept as
    /// extensions.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError`] naming the first missing or invalid attribute.
    pub fn unwrap(headers: &Headers, body: &[u8]) -> Result<Self, EnvelopeError> {
        let specversion = required(headers, HEADER_SPECVERSION)?;
        if specversion != SPEC_VERSION {
            return Err(EnvelopeError::UnsupportedSpecVersion(specversion.to_string()));
        }
        let event_type = required(headers, HEADER_TYPE)?;
        let source = required(headers, HEADER_SOURCE)?;
        let id = required(headers, HEADER_ID)?;

        let extensions = headers
            .iter()
            .filter(|(name, _)| !ATTRIBUTE_HEADERS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Self {
            event_type: event_type.to_string(),
            source: source.to_string(),
            id: id.to_string(),
            time: headers.get(HEADER_TIME).cloned(),
            datacontenttype: headers.get(HEADER_DATACONTENTTYPE).cloned(),
            extensions,
            data: body.to_vec(),
        })
    }

    /// Splits the envelope into transport headers and body.
    #[must_use]
    pub fn wrap(self) -> (Headers, Vec<u8>) {
        let mut headers = self.extensions;
        headers.insert(HEADER_SPECVERSION.to_string(), SPEC_VERSION.to_string());
        headers.insert(HEADER_TYPE.to_string(), self.event_type);
        headers.insert(HEADER_SOURCE.to_string(), self.source);
        headers.insert(HEADER_ID.to_string(), self.id);
        if let Some(time) = self.time {
            headers.insert(HEADER_TIME.to_string(), time);
        }
        if let Some(content_type) = self.datacontenttype {
            headers.insert(HEADER_DATACONTENTTYPE.to_string(), content_type);
        }
        (headers, self.data)
    }

    /// The envelope spec version. Always `1.0`.
    #[must_use]
    pub const fn specversion(&self) -> &'static str {
        SPEC_VERSION
    }

    /// The `type` attribute.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The `source` attribute.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The `id` attribute.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The raw `time` attribute, if present.
    #[must_use]
    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    /// The `time` attribute parsed as RFC 3339.
    ///
    /// `None` when the attribute is absent or not valid RFC 3339; an
    /// unparseable time never invalidates the envelope.
    #[must_use]
    pub fn parsed_time(&self) -> Option<DateTime<FixedOffset>> {
        self.time
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
    }

    /// The `datacontenttype` attribute, if present.
    #[must_use]
    pub fn datacontenttype(&self) -> Option<&str> {
        self.datacontenttype.as_deref()
    }

    /// Headers that are not envelope attributes.
    #[must_use]
    pub const fn extensions(&self) -> &Headers {
        &self.extensions
    }

    /// The event data, byte for byte as it travelled in the message body.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

fn required<'h>(headers: &'h Headers, name: &'static str) -> Result<&'h str, EnvelopeError> {
    headers
        .get(name)
        .map(String::as_str)
        .ok_or(EnvelopeError::MissingAttribute(name))
}
