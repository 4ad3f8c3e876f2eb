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

use crate::common::codec::{DecodedPayload, DeserializationFailure, PayloadType, SerializationFailure};
use crate::traits::PayloadCodec;

/// Content type reported by [`JsonCodec`].
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// The bundled payload codec, backed by `serde_json`.
///
/// Handles every type accepted by the type validator, using the JSON adapters
/// captured in its [`PayloadType`].
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn content_type(&self) -> &str {
        JSON_CONTENT_TYPE
    }

    fn encode(&self, value: &dyn Any, target: &PayloadType) -> Result<Vec<u8>, SerializationFailure> {
        if target.is_opaque() {
            return Err(SerializationFailure::Unsupported {
                type_name: target.type_name().to_string(),
            });
        }
        match target.encode_json(value) {
            Some(encoded) => encoded.map_err(|e| SerializationFailure::encode(target.type_name(), e)),
            None => Err(SerializationFailure::TypeMismatch {
                expected: target.type_name().to_string(),
            }),
        }
    }

    fn decode(
        &self,
        bytes: &[u8],
        target: &PayloadType,
        _envelope_type: &str,
    ) -> Result<DecodedPayload, DeserializationFailure> {
        match target.decode_json(bytes) {
            Some(decoded) => decoded.map_err(|e| DeserializationFailure::malformed(target.type_name(), e)),
            None => Err(DeserializationFailure::Unsupported {
                type_name: target.type_name().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fmt::Debug;

    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct OrderData {
        order_id: String,
        quantity: u32,
        lines: Vec<String>,
        notes: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Command {
        Start,
        Stop { reason: String },
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Temperature(f64);

    fn round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + Debug + Send + Sync + 'static,
    {
        let codec = JsonCodec;
        let token = PayloadType::of::<T>();
        let bytes = codec.encode(value, &token).expect("encode");
        let decoded = codec.decode(&bytes, &token, "any.type").expect("decode");
        assert_eq!(decoded.downcast_ref::<T>(), Some(value));
    }

    #[test]
    fn reports_json_content_type() {
        assert_eq!(JsonCodec.content_type(), "application/json");
    }

    #[test]
    fn round_trips_representative_values() {
        round_trip(&OrderData::default());
        round_trip(&OrderData {
            order_id: "o-17".to_string(),
            quantity: 3,
            lines: vec!["sku-1".to_string(), "sku-2".to_string()],
            notes: Some(String::new()),
        });
        round_trip(&Command::Start);
        round_trip(&Command::Stop {
            reason: String::new(),
        });
        round_trip(&Temperature(0.0));
        round_trip(&BTreeMap::<String, i64>::new());
    }

    #[test]
    fn malformed_bytes_name_the_target_type() {
        let token = PayloadType::of::<OrderData>();
        let err = JsonCodec.decode(b"{\"order_id\":", &token, "t").unwrap_err();
        assert!(matches!(err, DeserializationFailure::Malformed { .. }));
        assert!(err.type_name().ends_with("OrderData"));
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let token = PayloadType::of::<OrderData>();
        let err = JsonCodec.decode(b"[1,2,3]", &token, "t").unwrap_err();
        assert!(matches!(err, DeserializationFailure::Malformed { .. }));
    }

    #[test]
    fn opaque_types_are_unsupported() {
        struct Socket;
        let token = PayloadType::opaque::<Socket>();
        assert!(matches!(
            JsonCodec.decode(b"{}", &token, "t"),
            Err(DeserializationFailure::Unsupported { .. })
        ));
        assert!(matches!(
            JsonCodec.encode(&Socket, &token),
            Err(SerializationFailure::Unsupported { .. })
        ));
    }

    #[test]
    fn encoding_a_value_of_another_type_is_a_mismatch() {
        let token = PayloadType::of::<OrderData>();
        let err = JsonCodec.encode(&Temperature(1.0), &token).unwrap_err();
        assert!(matches!(err, SerializationFailure::TypeMismatch { .. }));
    }
}
