use std::{collections::BTreeMap, fmt};

pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const SOAP_ENCODING_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/encoding/";
pub const SOAP11_BINDING_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
pub const SOAP12_BINDING_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap12/";

/// Prefix to namespace URI declarations captured from `xmlns` attributes.
///
/// The default namespace (`xmlns="..."`) is stored under the empty prefix.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Namespaces(BTreeMap<String, String>);

/// A `prefix:local` reference with the namespace its prefix resolved to
/// at the point of declaration.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct NamespacedName {
    pub prefix: Option<String>,
    pub namespace: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub reference: Option<NamespacedName>,
    pub ty: Option<NamespacedName>,
    pub inline: Option<Box<ComplexType>>,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    pub nillable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Any {
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub reference: Option<NamespacedName>,
    pub ty: Option<NamespacedName>,
    /// SOAP-encoding `arrayType` hint, kept verbatim (`tns:Item[]`).
    pub array_type: Option<String>,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupItem {
    Element(Element),
    Choice(Group),
    Sequence(Group),
    Any(Any),
}

/// Ordered content of a `sequence` or `choice`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub items: Vec<GroupItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Particle {
    All(Vec<Element>),
    Sequence(Group),
    Choice(Group),
}

/// Body of a `complexContent` extension or restriction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Derivation {
    pub base: NamespacedName,
    pub particle: Option<Particle>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleContent {
    pub base: NamespacedName,
    pub restricted: bool,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Empty,
    All(Vec<Element>),
    Sequence(Group),
    Choice(Group),
    Extension(Derivation),
    Restriction(Derivation),
    Simple(SimpleContent),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexType {
    pub name: String,
    pub is_abstract: bool,
    pub documentation: Option<String>,
    pub content: Content,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Restriction {
    pub base: Option<NamespacedName>,
    pub enumeration: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimpleTypeKind {
    Restriction(Restriction),
    Union(Vec<NamespacedName>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleType {
    pub name: String,
    pub documentation: Option<String>,
    pub kind: SimpleTypeKind,
}

/// Root-level `import` or schema-level `import`/`include`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Import {
    pub namespace: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub target_namespace: Option<String>,
    pub namespaces: Namespaces,
    pub imports: Vec<Import>,
    pub includes: Vec<Import>,
    pub simple_types: Vec<SimpleType>,
    pub complex_types: Vec<ComplexType>,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    Type(NamespacedName),
    Element(NamespacedName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub kind: PartKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub name: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub documentation: Option<String>,
    pub parameter_order: Vec<String>,
    pub input: Option<NamespacedName>,
    pub output: Option<NamespacedName>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortType {
    pub name: String,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingBody {
    pub encoding_use: Option<String>,
    pub parts: Option<String>,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingOperation {
    pub name: String,
    pub soap11_action: Option<String>,
    pub soap12_action: Option<String>,
    pub style: Option<String>,
    pub input: Option<BindingBody>,
    pub output: Option<BindingBody>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub ty: Option<NamespacedName>,
    pub style: Option<String>,
    pub transport: Option<String>,
    pub operations: Vec<BindingOperation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub binding: Option<NamespacedName>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub documentation: Option<String>,
    pub ports: Vec<Port>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definitions {
    pub name: Option<String>,
    pub target_namespace: Option<String>,
    pub namespaces: Namespaces,
    pub imports: Vec<Import>,
    pub schema: Schema,
    pub messages: Vec<Message>,
    pub port_type: PortType,
    pub binding: Binding,
    pub service: Service,
}

impl Namespaces {
    pub fn insert<P: Into<String>, U: Into<String>>(&mut self, prefix: P, uri: U) {
        self.0.insert(prefix.into(), uri.into());
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.0.get(prefix).map(String::as_str)
    }

    /// Key-wise merge, entries from `other` win.
    pub fn merge(&mut self, other: &Namespaces) {
        for (prefix, uri) in &other.0 {
            self.0.insert(prefix.clone(), uri.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl NamespacedName {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            prefix: None,
            namespace: None,
            name: name.into(),
        }
    }

    pub fn with_namespace<S: Into<String>, N: Into<String>>(name: S, namespace: N) -> Self {
        Self {
            prefix: None,
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    pub fn is_in(&self, namespace: &str) -> bool {
        self.namespace.as_deref() == Some(namespace)
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl Default for MaxOccurs {
    fn default() -> Self {
        Self::Bounded(1)
    }
}

impl MaxOccurs {
    pub fn is_repeated(self) -> bool {
        self != Self::Bounded(1)
    }
}

impl Element {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            reference: None,
            ty: None,
            inline: None,
            min_occurs: 1,
            max_occurs: MaxOccurs::default(),
            nillable: false,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.nillable || self.min_occurs == 0
    }
}

impl ComplexType {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            is_abstract: false,
            documentation: None,
            content: Content::Empty,
            attributes: Vec::new(),
        }
    }
}

impl Group {
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.items.iter().filter_map(|item| match item {
            GroupItem::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn any(&self) -> impl Iterator<Item = &Any> {
        self.items.iter().filter_map(|item| match item {
            GroupItem::Any(any) => Some(any),
            _ => None,
        })
    }
}

impl Schema {
    /// Concatenates the declarations of `other` onto this schema.
    pub fn merge(&mut self, other: Schema) {
        if self.target_namespace.is_none() {
            self.target_namespace = other.target_namespace;
        }

        self.namespaces.merge(&other.namespaces);
        self.imports.extend(other.imports);
        self.includes.extend(other.includes);
        self.simple_types.extend(other.simple_types);
        self.complex_types.extend(other.complex_types);
        self.elements.extend(other.elements);
    }
}

impl BindingOperation {
    pub fn has_soap_action(&self) -> bool {
        self.soap11_action.is_some() || self.soap12_action.is_some()
    }
}

impl Binding {
    pub fn is_rpc(&self, operation: &BindingOperation) -> bool {
        operation.style.as_deref().or(self.style.as_deref()) == Some("rpc")
    }

    pub fn operation(&self, name: &str) -> Option<&BindingOperation> {
        self.operations.iter().find(|operation| operation.name == name)
    }
}
