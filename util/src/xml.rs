use serde::{de, ser::SerializeMap, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Key under which quick-xml delivers character data.
const TEXT: &str = "$text";

/// Key under which unnamed content items are kept.
const VALUE: &str = "$value";

/// Content of an untyped (`anyType`) element.
///
/// Attributes are kept as children named `@name` and child elements under
/// their local name. Children stay in document order, so the value
/// serializes back to equivalent XML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnyValue {
    pub text: String,
    pub children: Vec<(String, AnyValue)>,
}

impl AnyValue {
    pub fn from_text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child<S: Into<String>>(mut self, name: S, child: AnyValue) -> Self {
        self.children.push((name.into(), child));
        self
    }

    /// The first child element or attribute called `name`.
    pub fn get(&self, name: &str) -> Option<&AnyValue> {
        self.all(name).next()
    }

    /// Every child element or attribute called `name`.
    pub fn all<'s: 'n, 'n>(&'s self, name: &'n str) -> impl Iterator<Item = &'s AnyValue> + 'n {
        self.children
            .iter()
            .filter(move |(child, _)| child == name)
            .map(|(_, value)| value)
    }
}

impl Serialize for AnyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.children.is_empty() {
            return serializer.serialize_str(&self.text);
        }

        let text = !self.text.is_empty();
        let mut map = serializer.serialize_map(Some(self.children.len() + usize::from(text)))?;

        if text {
            map.serialize_entry(TEXT, &self.text)?;
        }

        for (name, child) in &self.children {
            map.serialize_entry(name, child)?;
        }

        map.end()
    }
}

struct AnyValueVisitor;

impl<'de> de::Visitor<'de> for AnyValueVisitor {
    type Value = AnyValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any XML content")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<AnyValue, E> {
        Ok(AnyValue::from_text(value))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<AnyValue, E> {
        Ok(AnyValue::from_text(value))
    }

    fn visit_unit<E: de::Error>(self) -> Result<AnyValue, E> {
        Ok(AnyValue::default())
    }

    fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<AnyValue, A::Error> {
        let mut value = AnyValue::default();

        while let Some(key) = map.next_key::<String>()? {
            if key == TEXT {
                value.text.push_str(&map.next_value::<String>()?);
            } else {
                let child = map.next_value::<AnyValue>()?;
                value.children.push((key, child));
            }
        }

        Ok(value)
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<AnyValue, A::Error> {
        let mut value = AnyValue::default();

        while let Some(item) = seq.next_element::<AnyValue>()? {
            value.children.push((VALUE.to_owned(), item));
        }

        Ok(value)
    }
}

impl<'de> Deserialize<'de> for AnyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AnyValueVisitor)
    }
}

/// Stamps a value with the `xsi:type` of its concrete type before it is
/// sent, so that servers can tell derived types from their bases.
pub trait WireTypeAnnotatable {
    fn annotate_wire_types(&mut self);
}

impl WireTypeAnnotatable for AnyValue {
    fn annotate_wire_types(&mut self) {}
}

impl<T: WireTypeAnnotatable> WireTypeAnnotatable for Option<T> {
    fn annotate_wire_types(&mut self) {
        if let Some(value) = self {
            value.annotate_wire_types();
        }
    }
}

impl<T: WireTypeAnnotatable> WireTypeAnnotatable for Vec<T> {
    fn annotate_wire_types(&mut self) {
        for value in self {
            value.annotate_wire_types();
        }
    }
}

impl<T: WireTypeAnnotatable + ?Sized> WireTypeAnnotatable for Box<T> {
    fn annotate_wire_types(&mut self) {
        (**self).annotate_wire_types();
    }
}

/// Lists carried one element level down: `<outer><inner/><inner/></outer>`.
///
/// Used through [`nested_wire!`](crate::nested_wire), which fixes the
/// inner element name for a `#[serde(with = ..)]` module.
pub mod nested {
    use serde::{
        de::{self, IgnoredAny, MapAccess, Visitor},
        ser::SerializeStruct,
        Deserialize, Deserializer, Serialize, Serializer,
    };
    use std::{fmt, marker::PhantomData};

    pub fn serialize<T: Serialize, S: Serializer>(
        inner: &'static str,
        items: &[T],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Nested", 1)?;
        state.serialize_field(inner, items)?;
        state.end()
    }

    struct NestedVisitor<T> {
        inner: &'static str,
        items: PhantomData<T>,
    }

    impl<'de, T: Deserialize<'de>> Visitor<'de> for NestedVisitor<T> {
        type Value = Vec<T>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a list of <{}> elements", self.inner)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Vec<T>, E> {
            Ok(Vec::new())
        }

        fn visit_str<E: de::Error>(self, _: &str) -> Result<Vec<T>, E> {
            Ok(Vec::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Vec<T>, A::Error> {
            let mut items = Vec::new();

            while let Some(key) = map.next_key::<String>()? {
                if key == self.inner {
                    items.extend(map.next_value::<Vec<T>>()?);
                } else {
                    map.next_value::<IgnoredAny>()?;
                }
            }

            Ok(items)
        }
    }

    pub fn deserialize<'de, T: Deserialize<'de>, D: Deserializer<'de>>(
        inner: &'static str,
        deserializer: D,
    ) -> Result<Vec<T>, D::Error> {
        deserializer.deserialize_map(NestedVisitor {
            inner,
            items: PhantomData,
        })
    }
}

/// Declares a `#[serde(with = ..)]` module for a nested list whose items
/// are named `$inner` on the wire.
#[macro_export]
macro_rules! nested_wire {
    ($module:ident, $inner:literal) => {
        #[allow(dead_code)]
        mod $module {
            pub fn serialize<T: $crate::serde::Serialize, S: $crate::serde::Serializer>(
                items: &[T],
                serializer: S,
            ) -> Result<S::Ok, S::Error> {
                $crate::xml::nested::serialize($inner, items, serializer)
            }

            pub fn deserialize<
                'de,
                T: $crate::serde::Deserialize<'de>,
                D: $crate::serde::Deserializer<'de>,
            >(
                deserializer: D,
            ) -> Result<Vec<T>, D::Error> {
                $crate::xml::nested::deserialize($inner, deserializer)
            }
        }
    };
}
