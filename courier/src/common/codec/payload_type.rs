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

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::shape::{self, Shape};

/// Decoded payload, type-erased until the dispatch engine downcasts it.
pub type DecodedPayload = Box<dyn Any + Send + Sync>;

/// Type alias for the JSON decoder captured when a type token is built.
type JsonDecoderFn = Arc<dyn Fn(&[u8]) -> Result<DecodedPayload, String> + Send + Sync>;

/// Type alias for the JSON encoder captured when a type token is built.
///
/// Returns `None` when the value is not of the token's type.
type JsonEncoderFn = Arc<dyn Fn(&dyn Any) -> Option<Result<Vec<u8>, String>> + Send + Sync>;

/// Explicit type token for a payload type.
///
/// Every subscriber binding is created with one of these, so the target type
/// is stored up front instead of being recovered later. A token built with
/// [`PayloadType::of`] also captures the type's serde shape and JSON adapters
/// for the default codec; [`PayloadType::opaque`] is for types only a custom
/// codec knows how to build.
#[derive(Clone)]
pub struct PayloadType {
    type_id: TypeId,
    type_name: &'static str,
    shape: Option<Shape>,
    json_decoder: Option<JsonDecoderFn>,
    json_encoder: Option<JsonEncoderFn>,
}

impl fmt::Debug for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadType")
            .field("type_name", &self.type_name)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

impl PartialEq for PayloadType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for PayloadType {}

impl PayloadType {
    /// Builds the token for a serde-capable type.
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let json_decoder: JsonDecoderFn = Arc::new(|bytes: &[u8]| {
            let value: T = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
            Ok(Box::new(value) as DecodedPayload)
        });
        let json_encoder: JsonEncoderFn = Arc::new(|value: &dyn Any| {
            value
                .downcast_ref::<T>()
                .map(|concrete| serde_json::to_vec(concrete).map_err(|e| e.to_string()))
        });
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            shape: Some(shape::probe::<T>()),
            json_decoder: Some(json_decoder),
            json_encoder: Some(json_encoder),
        }
    }

    /// Builds the token for a type with no serde implementation.
    ///
    /// Only a custom [`PayloadCodec`](crate::traits::PayloadCodec) can carry
    /// such a type; the default codec rejects it at registration.
    #[must_use]
    pub fn opaque<T: Send + Sync + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            shape: None,
            json_decoder: None,
            json_encoder: None,
        }
    }

    /// The `TypeId` of the payload type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The Rust type name of the payload type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The serde shape, or `None` for opaque tokens.
    #[must_use]
    pub const fn shape(&self) -> Option<Shape> {
        self.shape
    }

    /// `true` when the token was built with [`PayloadType::opaque`].
    #[must_use]
    pub const fn is_opaque(&self) -> bool {
        self.shape.is_none()
    }

    /// `true` when the token describes `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Decodes JSON bytes into the payload type.
    ///
    /// Returns `None` for opaque tokens. Custom codecs that fall back to JSON
    /// for some types can call this directly.
    pub fn decode_json(&self, bytes: &[u8]) -> Option<Result<DecodedPayload, String>> {
        self.json_decoder.as_ref().map(|decode| decode(bytes))
    }

    /// Encodes a value of the payload type as JSON.
    ///
    /// Returns `None` for opaque tokens or when `value` is not of this type.
    pub fn encode_json(&self, value: &dyn Any) -> Option<Result<Vec<u8>, String>> {
        self.json_encoder.as_ref().and_then(|encode| encode(value))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Reading {
        sensor: String,
        value: f64,
    }

    struct Handle;

    #[test]
    fn serde_token_captures_shape_and_adapters() {
        let token = PayloadType::of::<Reading>();
        assert!(token.is::<Reading>());
        assert!(!token.is_opaque());
        assert_eq!(token.shape(), Some(Shape::Record));
        assert!(token.type_name().ends_with("Reading"));

        let reading = Reading {
            sensor: "t-1".to_string(),
            value: 21.5,
        };
        let bytes = token.encode_json(&reading).unwrap().unwrap();
        let decoded = token.decode_json(&bytes).unwrap().unwrap();
        assert_eq!(decoded.downcast_ref::<Reading>(), Some(&reading));
    }

    #[test]
    fn encoder_refuses_other_types() {
        let token = PayloadType::of::<Reading>();
        assert!(token.encode_json(&42_u32).is_none());
    }

    #[test]
    fn opaque_token_has_no_adapters() {
        let token = PayloadType::opaque::<Handle>();
        assert!(token.is_opaque());
        assert!(token.shape().is_none());
        assert!(token.decode_json(b"{}").is_none());
        assert!(token.encode_json(&Handle).is_none());
        assert_ne!(token, PayloadType::of::<Reading>());
    }
}
