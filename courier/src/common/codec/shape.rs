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

//! Static shape probing for payload types.
//!
//! A type's `Deserialize` implementation announces its wire shape through the
//! first `deserialize_*` method it calls. [`probe`] drives the implementation
//! through a deserializer that records that first call and stops, so the
//! shape is known without any input bytes or a value of the type.

use std::cell::Cell;
use std::fmt;

use serde::de::{self, DeserializeOwned, Visitor};
use serde::Deserializer;

/// Wire shape of a payload type as seen by serde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// bool, integers, floats, char.
    Primitive,
    /// Strings.
    Text,
    /// Sequences, tuples, fixed arrays and byte buffers.
    Sequence,
    /// Structs, tuple structs and maps.
    Record,
    /// Enums.
    Enum,
    /// Single-field tuple structs.
    Newtype,
    /// Unit and unit structs.
    Unit,
    /// Types that accept whatever the input describes (e.g. `serde_json::Value`).
    SelfDescribing,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Primitive => "primitive",
            Self::Text => "text",
            Self::Sequence => "sequence",
            Self::Record => "record",
            Self::Enum => "enum",
            Self::Newtype => "newtype",
            Self::Unit => "unit",
            Self::SelfDescribing => "self-describing",
        };
        f.write_str(name)
    }
}

/// Returns the wire shape `T` asks serde for.
#[must_use]
pub fn probe<T: DeserializeOwned>() -> Shape {
    let recorded = Cell::new(None);
    let _ = T::deserialize(ShapeProbe {
        recorded: &recorded,
    });
    recorded.get().unwrap_or(Shape::SelfDescribing)
}

#[derive(Debug)]
struct ProbeStop;

impl fmt::Display for ProbeStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("shape probe stop")
    }
}

impl std::error::Error for ProbeStop {}

impl de::Error for ProbeStop {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        Self
    }
}

struct ShapeProbe<'a> {
    recorded: &'a Cell<Option<Shape>>,
}

impl ShapeProbe<'_> {
    fn stop<V>(self, shape: Shape) -> Result<V, ProbeStop> {
        if self.recorded.get().is_none() {
            self.recorded.set(Some(shape));
        }
        Err(ProbeStop)
    }
}

macro_rules! record_shape {
    ($($method:ident => $shape:expr),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
                self.stop($shape)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for ShapeProbe<'_> {
    type Error = ProbeStop;

    record_shape! {
        deserialize_any => Shape::SelfDescribing,
        deserialize_bool => Shape::Primitive,
        deserialize_i8 => Shape::Primitive,
        deserialize_i16 => Shape::Primitive,
        deserialize_i32 => Shape::Primitive,
        deserialize_i64 => Shape::Primitive,
        deserialize_i128 => Shape::Primitive,
        deserialize_u8 => Shape::Primitive,
        deserialize_u16 => Shape::Primitive,
        deserialize_u32 => Shape::Primitive,
        deserialize_u64 => Shape::Primitive,
        deserialize_u128 => Shape::Primitive,
        deserialize_f32 => Shape::Primitive,
        deserialize_f64 => Shape::Primitive,
        deserialize_char => Shape::Primitive,
        deserialize_str => Shape::Text,
        deserialize_string => Shape::Text,
        deserialize_bytes => Shape::Sequence,
        deserialize_byte_buf => Shape::Sequence,
        deserialize_unit => Shape::Unit,
        deserialize_seq => Shape::Sequence,
        deserialize_map => Shape::Record,
        deserialize_identifier => Shape::Text,
        deserialize_ignored_any => Shape::SelfDescribing,
    }

    // `Option<T>` travels as a bare `T` or null, so the inner type decides.
    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_some(self)
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.stop(Shape::Unit)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.stop(Shape::Newtype)
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.stop(Shape::Sequence)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.stop(Shape::Record)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.stop(Shape::Record)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.stop(Shape::Enum)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize)]
    #[allow(dead_code)]
    struct Order {
        id: u64,
    }

    #[derive(Deserialize)]
    #[allow(dead_code)]
    struct Celsius(f64);

    #[derive(Deserialize)]
    #[allow(dead_code)]
    enum Status {
        Open,
        Closed,
    }

    #[derive(Deserialize)]
    struct Heartbeat;

    #[test]
    fn primitives() {
        assert_eq!(probe::<bool>(), Shape::Primitive);
        assert_eq!(probe::<i32>(), Shape::Primitive);
        assert_eq!(probe::<u128>(), Shape::Primitive);
        assert_eq!(probe::<f64>(), Shape::Primitive);
        assert_eq!(probe::<char>(), Shape::Primitive);
    }

    #[test]
    fn sequences() {
        assert_eq!(probe::<Vec<u8>>(), Shape::Sequence);
        assert_eq!(probe::<[i32; 3]>(), Shape::Sequence);
        assert_eq!(probe::<(String, u8)>(), Shape::Sequence);
    }

    #[test]
    fn user_types() {
        assert_eq!(probe::<Order>(), Shape::Record);
        assert_eq!(probe::<Celsius>(), Shape::Newtype);
        assert_eq!(probe::<Status>(), Shape::Enum);
        assert_eq!(probe::<Heartbeat>(), Shape::Unit);
        assert_eq!(probe::<HashMap<String, i64>>(), Shape::Record);
    }

    #[test]
    fn wrappers_and_dynamic_types() {
        assert_eq!(probe::<String>(), Shape::Text);
        assert_eq!(probe::<Option<Order>>(), Shape::Record);
        assert_eq!(probe::<Option<i32>>(), Shape::Primitive);
        assert_eq!(probe::<Option<Vec<u8>>>(), Shape::Sequence);
        assert_eq!(probe::<Option<Option<bool>>>(), Shape::Primitive);
        assert_eq!(probe::<Box<Order>>(), Shape::Record);
        assert_eq!(probe::<serde_json::Value>(), Shape::SelfDescribing);
    }
}
