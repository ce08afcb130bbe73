use super::session::Session;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use wsdl2rs_wsdl::types::{NamespacedName, SOAP_ENCODING_NAMESPACE, XSD_NAMESPACE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F64,
    Bool,
    String,
    Bytes,
}

/// Date and time types carried as their lexical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Marker {
    Date,
    Time,
    DateTime,
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    Primitive(Primitive),
    Marker(Marker),
    Any,
}

/// The Rust side of a schema type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RustType {
    Primitive(Primitive),
    Marker(Marker),
    Any,
    /// A generated simple type.
    Simple(String),
    /// A generated complex type, possibly not declared yet.
    Named(String),
}

fn builtin(name: &str) -> Option<Builtin> {
    use Primitive as P;

    let builtin = match name.to_ascii_lowercase().as_str() {
        "int" => Builtin::Primitive(P::I32),
        "integer" | "long" | "negativeinteger" | "nonpositiveinteger" => Builtin::Primitive(P::I64),
        "short" => Builtin::Primitive(P::I16),
        "byte" => Builtin::Primitive(P::I8),
        "unsignedlong" | "nonnegativeinteger" | "positiveinteger" => Builtin::Primitive(P::U64),
        "unsignedint" => Builtin::Primitive(P::U32),
        "unsignedshort" => Builtin::Primitive(P::U16),
        "unsignedbyte" => Builtin::Primitive(P::U8),
        "decimal" | "float" | "double" => Builtin::Primitive(P::F64),
        "boolean" => Builtin::Primitive(P::Bool),
        "string" | "anyuri" | "token" | "qname" | "normalizedstring" | "language" | "id"
        | "ncname" | "name" | "idref" | "idrefs" | "nmtoken" | "nmtokens" | "entity"
        | "entities" | "notation" | "gday" | "gmonth" | "gmonthday" | "gyear" | "gyearmonth" => {
            Builtin::Primitive(P::String)
        }
        "hexbinary" | "base64binary" => Builtin::Primitive(P::Bytes),
        "date" => Builtin::Marker(Marker::Date),
        "time" => Builtin::Marker(Marker::Time),
        "datetime" => Builtin::Marker(Marker::DateTime),
        "duration" => Builtin::Marker(Marker::Duration),
        "anytype" | "anysimpletype" | "anysequence" => Builtin::Any,
        _ => return None,
    };

    Some(builtin)
}

impl Primitive {
    pub fn tokens(self) -> TokenStream {
        match self {
            Self::I8 => quote!(i8),
            Self::I16 => quote!(i16),
            Self::I32 => quote!(i32),
            Self::I64 => quote!(i64),
            Self::U8 => quote!(u8),
            Self::U16 => quote!(u16),
            Self::U32 => quote!(u32),
            Self::U64 => quote!(u64),
            Self::F64 => quote!(f64),
            Self::Bool => quote!(bool),
            Self::String => quote!(String),
            Self::Bytes => quote!(Vec<u8>),
        }
    }
}

impl Marker {
    pub const ALL: [Marker; 4] = [Self::Date, Self::Time, Self::DateTime, Self::Duration];

    pub fn ident(self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Time => "Time",
            Self::DateTime => "DateTime",
            Self::Duration => "Duration",
        }
    }

    pub fn xml_name(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "dateTime",
            Self::Duration => "duration",
        }
    }
}

impl RustType {
    pub fn tokens(&self) -> TokenStream {
        match self {
            Self::Primitive(primitive) => primitive.tokens(),
            Self::Marker(marker) => {
                let ident = format_ident!("{}", marker.ident());
                quote!(#ident)
            }
            Self::Any => quote!(wsdl2rs_util::xml::AnyValue),
            Self::Simple(ident) | Self::Named(ident) => {
                let ident = format_ident!("{}", ident);
                quote!(#ident)
            }
        }
    }

    /// Complex types are boxed when held by value, which keeps recursive
    /// types finite.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Self::Named(..))
    }

    /// Identifier used for union variants.
    pub fn variant_name(&self) -> String {
        match self {
            Self::Primitive(primitive) => format!("{:?}", primitive),
            Self::Marker(marker) => marker.ident().to_owned(),
            Self::Any => "Any".to_owned(),
            Self::Simple(ident) | Self::Named(ident) => ident.clone(),
        }
    }
}

impl Session<'_> {
    fn use_builtin(&mut self, builtin: Builtin) -> RustType {
        match builtin {
            Builtin::Primitive(primitive) => RustType::Primitive(primitive),
            Builtin::Marker(marker) => {
                self.use_marker(marker);
                RustType::Marker(marker)
            }
            Builtin::Any => RustType::Any,
        }
    }

    /// Maps a schema type reference. `referrer` names the declaration that
    /// holds the reference and is reported if the type is never defined.
    pub fn map_type(&mut self, name: &NamespacedName, referrer: &str) -> RustType {
        let local = name.name.as_str();
        let schema_qualified = name.is_in(XSD_NAMESPACE) || name.is_in(SOAP_ENCODING_NAMESPACE);
        let builtin = builtin(local);

        if let (true, Some(builtin)) = (schema_qualified, builtin) {
            return self.use_builtin(builtin);
        }

        if let Some(ident) = self.simple_ident(local) {
            return RustType::Simple(ident.to_owned());
        }

        if let Some(builtin) = builtin {
            let shadowed = !schema_qualified
                && name.namespace.is_some()
                && self.table.complex_types.contains_key(local);

            if !shadowed {
                return self.use_builtin(builtin);
            }
        }

        RustType::Named(self.reference(local, referrer))
    }

    /// Maps the type of the global element `name`.
    pub fn map_element(&mut self, name: &NamespacedName, referrer: &str) -> RustType {
        match self.table.element(&name.name) {
            Some(element) => match (&element.ty, &element.inline) {
                (Some(ty), _) => self.map_type(ty, referrer),
                (None, Some(..)) => RustType::Named(self.reference(&name.name, referrer)),
                (None, None) => RustType::Primitive(Primitive::String),
            },
            None => RustType::Named(self.reference(&name.name, referrer)),
        }
    }

    /// Maps a SOAP-encoding `arrayType` value such as `tns:Item[]`.
    pub fn map_array_item(&mut self, array_type: &str, referrer: &str) -> RustType {
        let name = array_type
            .split_once('[')
            .map_or(array_type, |(name, _)| name);
        let name = self.resolve_prefixed(name);
        self.map_type(&name, referrer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsdl2rs_wsdl::{decode_definitions, types::Definitions};

    fn definitions() -> Definitions {
        decode_definitions(
            br#"<definitions xmlns:tns="urn:t" xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:t">
              <types>
                <xs:schema targetNamespace="urn:t">
                  <xs:simpleType name="Color"><xs:restriction base="xs:string"/></xs:simpleType>
                  <xs:simpleType name="string"><xs:restriction base="xs:string"/></xs:simpleType>
                  <xs:complexType name="token"/>
                  <xs:complexType name="Order"/>
                </xs:schema>
              </types>
            </definitions>"# as &[u8],
        )
        .unwrap()
    }

    #[test]
    fn primitives() {
        let definitions = definitions();
        let mut session = Session::new(&definitions);

        let xsd = |name: &str| NamespacedName::with_namespace(name, XSD_NAMESPACE);

        assert_eq!(
            session.map_type(&xsd("int"), "test"),
            RustType::Primitive(Primitive::I32)
        );
        assert_eq!(
            session.map_type(&xsd("unsignedLong"), "test"),
            RustType::Primitive(Primitive::U64)
        );
        assert_eq!(
            session.map_type(&xsd("base64Binary"), "test"),
            RustType::Primitive(Primitive::Bytes)
        );
        assert_eq!(session.map_type(&xsd("anyType"), "test"), RustType::Any);
        assert_eq!(
            session.map_type(&NamespacedName::new("BOOLEAN"), "test"),
            RustType::Primitive(Primitive::Bool)
        );
    }

    #[test]
    fn schema_qualified_names_skip_the_cache() {
        let definitions = definitions();
        let mut session = Session::new(&definitions);

        assert_eq!(
            session.map_type(&NamespacedName::with_namespace("string", XSD_NAMESPACE), "test"),
            RustType::Primitive(Primitive::String)
        );
        assert_eq!(
            session.map_type(&NamespacedName::with_namespace("string", "urn:t"), "test"),
            RustType::Simple("StringType".into())
        );
        assert_eq!(
            session.map_type(&NamespacedName::with_namespace("Color", "urn:t"), "test"),
            RustType::Simple("Color".into())
        );
    }

    #[test]
    fn foreign_complex_types_shadow_primitives() {
        let definitions = definitions();
        let mut session = Session::new(&definitions);

        assert_eq!(
            session.map_type(&NamespacedName::with_namespace("token", "urn:t"), "test"),
            RustType::Named("Token".into())
        );
        assert_eq!(
            session.map_type(&NamespacedName::new("token"), "test"),
            RustType::Primitive(Primitive::String)
        );
    }

    #[test]
    fn markers_are_recorded() {
        let definitions = definitions();
        let mut session = Session::new(&definitions);

        assert!(session.markers().next().is_none());
        assert_eq!(
            session.map_type(&NamespacedName::with_namespace("dateTime", XSD_NAMESPACE), "test"),
            RustType::Marker(Marker::DateTime)
        );
        assert_eq!(session.markers().collect::<Vec<_>>(), vec![Marker::DateTime]);
    }

    #[test]
    fn unknown_names_are_forward_references() {
        let definitions = definitions();
        let mut session = Session::new(&definitions);

        assert_eq!(
            session.map_type(&NamespacedName::with_namespace("Order", "urn:t"), "Holder"),
            RustType::Named("Order".into())
        );
        assert!(session.check_references().is_ok());

        assert_eq!(
            session.map_type(&NamespacedName::with_namespace("Missing-type", "urn:t"), "Holder"),
            RustType::Named("MissingType".into())
        );
        match session.check_references() {
            Err(wsdl2rs_wsdl::error::Error::UndefinedType { referrer, name }) => {
                assert_eq!(referrer, "Holder");
                assert_eq!(name, "Missing-type");
            }
            result => panic!("unexpected {:?}", result),
        }
    }

    #[test]
    fn array_items() {
        let definitions = definitions();
        let mut session = Session::new(&definitions);

        assert_eq!(
            session.map_array_item("xs:string[]", "test"),
            RustType::Primitive(Primitive::String)
        );
        assert_eq!(
            session.map_array_item("tns:Order[]", "test"),
            RustType::Named("Order".into())
        );
    }
}
