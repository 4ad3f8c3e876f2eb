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

//! Registration-time check that a payload type can travel through the
//! default JSON codec.

use std::fmt;

use super::payload_type::PayloadType;
use super::shape::Shape;

/// Result of validating a payload type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The default codec can round-trip the type.
    Valid,
    /// The type is rejected.
    Invalid {
        /// What is wrong with the type.
        reason: String,
        /// How to fix it, including a code example.
        remediation: String,
    },
}

impl Validation {
    /// `true` for [`Validation::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => f.write_str("valid"),
            Self::Invalid {
                reason,
                remediation,
            } => write!(f, "{reason}\n{remediation}"),
        }
    }
}

/// Checks `payload_type` against the default codec's requirements.
///
/// Bare primitives and sequence types are rejected because they cannot carry
/// the field names the default codec relies on for forward-compatible payloads.
/// Opaque tokens are rejected because the default codec has no way to build a
/// value of the type.
#[must_use]
pub fn validate(payload_type: &PayloadType) -> Validation {
    let name = short_name(payload_type.type_name());
    match payload_type.shape() {
        None => Validation::Invalid {
            reason: format!(
                "type '{name}' has no serde implementation the default codec can construct it through"
            ),
            remediation: format!(
                "derive the serde traits, or annotate the type with #[courier_payload]:\n\n\
                 #[derive(serde::Serialize, serde::Deserialize)]\n\
                 struct {name} {{ /* fields */ }}\n\n\
                 or launch the runtime with a custom PayloadCodec that understands '{name}'"
            ),
        },
        Some(Shape::Primitive) => Validation::Invalid {
            reason: format!(
                "primitive type '{name}' is not supported; wrap it in a single-field structure"
            ),
            remediation: format!(
                "#[courier_payload]\n\
                 struct {wrapper} {{\n    value: {name},\n}}",
                wrapper = wrapper_name(without_options(name))
            ),
        },
        Some(Shape::Sequence) => Validation::Invalid {
            reason: format!(
                "array type '{name}' is not supported; wrap it in a structure with a sequence field"
            ),
            remediation: format!(
                "#[courier_payload]\n\
                 struct Items {{\n    items: {name},\n}}"
            ),
        },
        Some(_) => Validation::Valid,
    }
}

// Drops module paths outside generic arguments: `app::orders::Order` -> `Order`,
// `alloc::vec::Vec<u8>` -> `Vec<u8>`.
fn short_name(type_name: &str) -> &str {
    let head_end = type_name.find(['<', '[', '(']).unwrap_or(type_name.len());
    match type_name[..head_end].rfind("::") {
        Some(idx) => &type_name[idx + 2..],
        None => type_name,
    }
}

// `Option<Option<i32>>` -> `i32`
fn without_options(name: &str) -> &str {
    let mut name = name;
    while let Some(inner) = name
        .strip_prefix("Option<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        name = short_name(inner);
    }
    name
}

fn wrapper_name(primitive: &str) -> String {
    let mut chars = primitive.chars();
    match chars.next() {
        Some(first) => format!("{}{}Value", first.to_ascii_uppercase(), chars.as_str()),
        None => "Value".to_string(),
    }
}
