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

use std::fmt;

/// Reasons a subscription cannot be registered. All of them are startup
/// failures; none is ever produced while messages are flowing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The default codec cannot carry the payload type.
    InvalidPayloadType {
        /// Rust type name of the rejected type.
        type_name: String,
        /// What is wrong with it.
        reason: String,
        /// How to fix it.
        remediation: String,
    },
    /// Another binding already owns the subject.
    DuplicateSubject(String),
    /// The subject pattern is malformed.
    InvalidSubject {
        /// The rejected pattern.
        subject: String,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// The runtime has been shut down.
    ShutDown,
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPayloadType {
                type_name,
                reason,
                remediation,
            } => write!(
                f,
                "Cannot subscribe with payload type '{type_name}': {reason}\n{remediation}"
            ),
            Self::DuplicateSubject(subject) => {
                write!(f, "A subscriber is already registered for subject '{subject}'")
            }
            Self::InvalidSubject { subject, reason } => {
                write!(f, "Invalid subject '{subject}': {reason}")
            }
            Self::ShutDown => write!(f, "The runtime has been shut down"),
        }
    }
}

impl std::error::Error for RegistrationError {}
