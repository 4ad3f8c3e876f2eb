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

//! Subject-keyed table of subscriber bindings.
//!
//! Bindings are registered at startup and read concurrently by every worker
//! afterwards. Lookups try the exact subject first and then wildcard patterns:
//! `*` matches exactly one dot-separated token and `>` matches one or more
//! trailing tokens.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, error};

use crate::common::codec::{validate, CodecSlot, Validation};
use crate::dispatch::{RegistrationError, SubscriberBinding};

/// Registered bindings, keyed by subject pattern.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    bindings: DashMap<String, Arc<SubscriberBinding>>,
}

impl BindingRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `binding`.
    ///
    /// While the default codec is active the binding's payload type must pass
    /// validation. A custom codec is trusted to handle whatever types it is
    /// given.
    ///
    /// # Errors
    ///
    /// Fails if the codec has been torn down, the subject is malformed or
    /// already taken, or the payload type is rejected.
    pub fn register(
        &self,
        binding: SubscriberBinding,
        codec: &CodecSlot,
    ) -> Result<Arc<SubscriberBinding>, RegistrationError> {
        if codec.is_torn_down() {
            return Err(RegistrationError::ShutDown);
        }
        check_subject(binding.subject())?;

        if codec.is_default() {
            if let Validation::Invalid {
                reason,
                remediation,
            } = validate(binding.payload_type())
            {
                error!(
                    subject = binding.subject(),
                    type_name = binding.payload_type().type_name(),
                    "{}",
                    reason
                );
                return Err(RegistrationError::InvalidPayloadType {
                    type_name: binding.payload_type().type_name().to_string(),
                    reason,
                    remediation,
                });
            }
        }

        let subject = binding.subject().to_string();
        let binding = Arc::new(binding);
        match self.bindings.entry(subject) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                Err(RegistrationError::DuplicateSubject(entry.key().clone()))
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                debug!(
                    subject = entry.key().as_str(),
                    type_name = binding.payload_type().type_name(),
                    mode = %binding.mode(),
                    "Registered subscriber"
                );
                entry.insert(Arc::clone(&binding));
                Ok(binding)
            }
        }
    }

    /// Finds the binding for a concrete subject.
    ///
    /// An exact registration wins. Otherwise the matching pattern with the
    /// most literal tokens is chosen, ties broken by the pattern text so the
    /// result does not depend on registration order.
    #[must_use]
    pub fn resolve(&self, subject: &str) -> Option<Arc<SubscriberBinding>> {
        if let Some(binding) = self.bindings.get(subject) {
            return Some(Arc::clone(binding.value()));
        }
        self.bindings
            .iter()
            .filter(|entry| subject_matches(entry.key(), subject))
            .max_by(|a, b| {
                literal_tokens(a.key())
                    .cmp(&literal_tokens(b.key()))
                    .then_with(|| b.key().cmp(a.key()))
            })
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Registered subject patterns, sorted.
    #[must_use]
    pub fn subjects(&self) -> Vec<String> {
        let mut subjects: Vec<String> = self.bindings.iter().map(|e| e.key().clone()).collect();
        subjects.sort();
        subjects
    }

    /// Number of registered bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// `true` when the concrete `subject` matches `pattern`.
#[must_use]
pub fn subject_matches(pattern: &str, subject: &str) -> bool {
    let mut pattern_tokens = pattern.split('.');
    let mut subject_tokens = subject.split('.');
    loop {
        match (pattern_tokens.next(), subject_tokens.next()) {
            (Some(">"), Some(_)) => return true,
            (Some("*"), Some(_)) => {}
            (Some(p), Some(s)) if p == s => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

fn literal_tokens(pattern: &str) -> usize {
    pattern.split('.').filter(|t| *t != "*" && *t != ">").count()
}

fn check_subject(subject: &str) -> Result<(), RegistrationError> {
    let invalid = |reason| {
        Err(RegistrationError::InvalidSubject {
            subject: subject.to_string(),
            reason,
        })
    };
    if subject.is_empty() {
        return invalid("subject is empty");
    }
    if subject.chars().any(char::is_whitespace) {
        return invalid("subject contains whitespace");
    }
    let tokens: Vec<&str> = subject.split('.').collect();
    for (idx, token) in tokens.iter().enumerate() {
        if token.is_empty() {
            return invalid("subject contains an empty token");
        }
        if *token == ">" && idx + 1 != tokens.len() {
            return invalid("'>' may only appear as the last token");
        }
        if token.len() > 1 && (token.contains('*') || token.contains('>')) {
            return invalid("wildcards must occupy a whole token");
        }
    }
    Ok(())
}
