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

//! Codec failure types.

use std::fmt;

/// A payload could not be turned into bytes.
///
/// Raised on the publish path and surfaced to the caller; it is never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializationFailure {
    /// The underlying serializer failed.
    Encode {
        /// Rust type name of the value being encoded.
        type_name: String,
        /// Message from the serializer.
        message: String,
    },
    /// The value handed to the codec is not of the declared payload type.
    TypeMismatch {
        /// Type name the payload type token declares.
        expected: String,
    },
    /// The codec has no way to encode this payload type.
    Unsupported {
        /// Rust type name of the payload type.
        type_name: String,
    },
}

impl SerializationFailure {
    /// Convenience constructor for serializer errors.
    pub fn encode(type_name: impl Into<String>, error: impl fmt::Display) -> Self {
        Self::Encode {
            type_name: type_name.into(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for SerializationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode { type_name, message } => {
                write!(f, "failed to encode '{type_name}': {message}")
            }
            Self::TypeMismatch { expected } => {
                write!(f, "value passed for encoding is not a '{expected}'")
            }
            Self::Unsupported { type_name } => {
                write!(f, "the active codec cannot encode '{type_name}'")
            }
        }
    }
}

impl std::error::Error for SerializationFailure {}

/// Payload bytes could not be turned into the target type.
///
/// Always recovered inside the dispatch engine as a negative acknowledgment;
/// handler code never sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeserializationFailure {
    /// The bytes do not parse as the target type.
    Malformed {
        /// Rust type name of the target type.
        type_name: String,
        /// Message from the deserializer.
        message: String,
    },
    /// The codec produced a value of a different type than the binding expects.
    TypeMismatch {
        /// Rust type name of the binding's target type.
        expected: String,
    },
    /// The codec has no way to decode this payload type.
    Unsupported {
        /// Rust type name of the target type.
        type_name: String,
    },
}

impl DeserializationFailure {
    /// Convenience constructor for deserializer errors.
    pub fn malformed(type_name: impl Into<String>, error: impl fmt::Display) -> Self {
        Self::Malformed {
            type_name: type_name.into(),
            message: error.to_string(),
        }
    }

    /// Rust type name of the target type involved in the failure.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Malformed { type_name, .. } | Self::Unsupported { type_name } => type_name,
            Self::TypeMismatch { expected } => expected,
        }
    }
}

impl fmt::Display for DeserializationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { type_name, message } => {
                write!(f, "failed to decode '{type_name}': {message}")
            }
            Self::TypeMismatch { expected } => {
                write!(f, "codec returned a value that is not a '{expected}'")
            }
            Self::Unsupported { type_name } => {
                write!(f, "the active codec cannot decode '{type_name}'")
            }
        }
    }
}

impl std::error::Error for DeserializationFailure {}
