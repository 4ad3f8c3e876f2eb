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

use std::any::Any;
use std::fmt::Debug;

use crate::common::codec::{DecodedPayload, DeserializationFailure, PayloadType, SerializationFailure};

/// Strategy that turns payload bytes into typed values and back.
///
/// Exactly one codec is active per runtime. When
/// [`CourierSettings`](crate::common::CourierSettings) supplies none, the
/// bundled [`JsonCodec`](crate::common::codec::JsonCodec) is used.
///
/// A codec is shared by every worker and is called for many messages at once,
/// so implementations must not keep per-call mutable state outside local
/// variables.
///
/// # Example
///
/// ```rust,ignore
/// use std::any::Any;
/// use courier::prelude::*;
///
/// #[derive(Debug)]
/// struct PlainTextCodec;
///
/// impl PayloadCodec for PlainTextCodec {
///     fn content_type(&self) -> &str {
///         "text/plain"
///     }
///
///     fn encode(&self, value: &dyn Any, target: &PayloadType) -> Result<Vec<u8>, SerializationFailure> {
///         value
///             .downcast_ref::<Note>()
///             .map(|note| note.0.clone().into_bytes())
///             .ok_or(SerializationFailure::TypeMismatch { expected: target.type_name().to_string() })
///     }
///
///     fn decode(&self, bytes: &[u8], target: &PayloadType, _envelope_type: &str) -> Result<DecodedPayload, DeserializationFailure> {
///         let text = String::from_utf8(bytes.to_vec())
///             .map_err(|e| DeserializationFailure::malformed(target.type_name(), e))?;
///         Ok(Box::new(Note(text)))
///     }
/// }
/// ```
pub trait PayloadCodec: Debug + Send + Sync {
    /// Value written to the envelope's `datacontenttype` attribute on publish.
    fn content_type(&self) -> &str;

    /// Encodes `value`, which is an instance of the type `target` describes.
    ///
    /// # Errors
    ///
    /// Returns [`SerializationFailure`] when the value cannot be encoded.
    fn encode(&self, value: &dyn Any, target: &PayloadType) -> Result<Vec<u8>, SerializationFailure>;

    /// Decodes `bytes` into an instance of the type `target` describes.
    ///
    /// `envelope_type` is the envelope's `type` attribute, for codecs that
    /// branch on it. Returning a value of any other type is treated by the
    /// dispatch engine as a [`DeserializationFailure::TypeMismatch`].
    ///
    /// # Errors
    ///
    /// Returns [`DeserializationFailure`] when the bytes cannot be decoded.
    fn decode(
        &self,
        bytes: &[u8],
        target: &PayloadType,
        envelope_type: &str,
    ) -> Result<DecodedPayload, DeserializationFailure>;
}
