use log::{trace, warn};
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use std::fmt::Display;

use super::{
    error::Error,
    types::{
        Any, Attribute, Binding, BindingBody, BindingOperation, ComplexType, Content,
        Definitions, Derivation, Element, GroupItem, Group, Import, MaxOccurs, Message,
        NamespacedName, Namespaces, Operation, Part, PartKind, Particle, Port, PortType,
        Restriction, Schema, Service, SimpleContent, SimpleType, SimpleTypeKind,
        SOAP12_BINDING_NAMESPACE,
    },
};

type Result<T> = std::result::Result<T, Error>;

/// A decoded document: either a whole interface description or a bare
/// schema fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Definitions(Definitions),
    Schema(Schema),
}

fn xml_error<E: Display>(error: E) -> Error {
    Error::malformed(error.to_string())
}

fn decode_text<B>(reader: &Reader<B>, bytes: &[u8]) -> Result<String> {
    let decoded = reader.decoder().decode(bytes).map_err(xml_error)?;
    let unescaped = quick_xml::escape::unescape(&decoded).map_err(xml_error)?;
    Ok(unescaped.into_owned())
}

fn get_attributes<B, const N: usize>(
    reader: &Reader<B>,
    start: &BytesStart<'_>,
    names: [&'static str; N],
) -> Result<[Option<String>; N]> {
    const INIT: Option<String> = None;
    let mut result = [INIT; N];

    for attribute in start.attributes() {
        let attribute = attribute.map_err(xml_error)?;
        let key = reader
            .decoder()
            .decode(attribute.key.as_ref())
            .map_err(xml_error)?;

        let local = match split_namespaced_name(&key) {
            (Some("xmlns"), _) | (None, "xmlns") => continue,
            (_, local) => local,
        };

        for (index, name) in names.iter().enumerate() {
            if local == *name {
                result[index] = Some(decode_text(reader, &attribute.value)?);
                break;
            }
        }
    }

    Ok(result)
}

fn split_namespaced_name(prefixed_name: &str) -> (Option<&str>, &str) {
    match prefixed_name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, prefixed_name),
    }
}

fn parse_flag(value: Option<String>) -> bool {
    matches!(value.as_deref().map(str::trim), Some("true" | "1"))
}

fn parse_occurs(min: Option<String>, max: Option<String>) -> Result<(u32, MaxOccurs)> {
    let min_occurs = match min {
        Some(min) => min
            .trim()
            .parse()
            .map_err(|_| Error::malformed(format!("invalid minOccurs {:?}", min)))?,
        None => 1,
    };

    let max_occurs = match max.as_deref().map(str::trim) {
        None => MaxOccurs::default(),
        Some("unbounded") => MaxOccurs::Unbounded,
        Some(max) => MaxOccurs::Bounded(
            max.parse()
                .map_err(|_| Error::malformed(format!("invalid maxOccurs {:?}", max)))?,
        ),
    };

    Ok((min_occurs, max_occurs))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Namespace scopes opened by the elements currently being decoded.
#[derive(Default)]
struct CurrentNamespaces {
    target: Vec<Option<String>>,
    scopes: Vec<Namespaces>,
}

impl CurrentNamespaces {
    fn push_scope(&mut self, scope: Namespaces) {
        self.scopes.push(scope);
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn push_target_namespace(&mut self, namespace: Option<String>) {
        self.target.push(namespace);
    }

    fn pop_target_namespace(&mut self) {
        self.target.pop();
    }

    fn target(&self) -> Option<&str> {
        self.target.last().and_then(|target| target.as_deref())
    }

    fn lookup(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some("http://www.w3.org/XML/1998/namespace");
        }

        self.scopes.iter().rev().find_map(|scope| scope.get(prefix))
    }

    fn resolve(&self, prefixed_name: &str) -> NamespacedName {
        let (prefix, name) = split_namespaced_name(prefixed_name.trim());

        let namespace = match prefix {
            Some(prefix) => {
                let namespace = self.lookup(prefix);
                if namespace.is_none() {
                    trace!("prefix {} of {} is not bound", prefix, prefixed_name);
                }
                namespace
            }

            None => self.lookup("").or_else(|| self.target()),
        };

        NamespacedName {
            prefix: prefix.map(ToOwned::to_owned),
            namespace: namespace.map(ToOwned::to_owned),
            name: name.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    Definitions,
    Schema,
}

#[derive(Debug)]
enum ParseState {
    Definitions,
    Types,
    Schema(Schema),

    SimpleType(SimpleType),
    ComplexType(ComplexType),
    ComplexContent(Option<Content>),
    SimpleContent(Option<SimpleContent>),
    Derivation {
        base: Option<NamespacedName>,
        restriction: bool,
        enumeration: Vec<String>,
        particle: Option<Particle>,
        attributes: Vec<Attribute>,
    },
    Sequence(Group),
    Choice(Group),
    All(Vec<Element>),
    Element(Element),

    Annotation(Option<String>),
    Documentation(String),

    Message(Message),
    PortType(PortType),
    Operation(Operation),

    Binding(Binding),
    BindingOperation(BindingOperation),
    BindingInput(Option<BindingBody>),
    BindingOutput(Option<BindingBody>),

    Service(Service),
    Port(Port),

    Other(String),
}

fn set_documentation(state: &mut ParseState, text: String) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }

    match state {
        ParseState::Annotation(documentation) => *documentation = Some(text.to_owned()),
        ParseState::Operation(operation) => operation.documentation = Some(text.to_owned()),
        ParseState::ComplexType(ty) => ty.documentation = Some(text.to_owned()),
        ParseState::SimpleType(ty) => ty.documentation = Some(text.to_owned()),
        ParseState::Service(service) => service.documentation = Some(text.to_owned()),
        _ => (),
    }
}

struct Parser {
    root: Option<Root>,
    definitions: Definitions,
    namespaces: CurrentNamespaces,
}

impl Parser {
    fn new() -> Self {
        Self {
            root: None,
            definitions: Default::default(),
            namespaces: Default::default(),
        }
    }

    fn parse(mut self, bytes: &[u8]) -> Result<Document> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);

        let mut stack = Vec::new();
        let mut buffer = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buffer).map_err(xml_error)?;

            match event {
                Event::Start(start) => self.handle_start(&mut stack, &reader, &start)?,
                Event::End(..) => self.handle_end(&mut stack)?,

                Event::Empty(start) => {
                    self.handle_start(&mut stack, &reader, &start)?;
                    self.handle_end(&mut stack)?;
                }

                Event::Text(text) => {
                    let text = decode_text(&reader, &text)?;
                    self.handle_text(&mut stack, text);
                }

                Event::CData(data) => {
                    let text = reader
                        .decoder()
                        .decode(&data)
                        .map_err(xml_error)?
                        .into_owned();
                    self.handle_text(&mut stack, text);
                }

                Event::Eof => break,

                _ => (),
            }

            buffer.clear();
        }

        if !stack.is_empty() {
            return Err(Error::malformed(format!(
                "unexpected end of document with {} open element(s)",
                stack.len()
            )));
        }

        match self.root {
            Some(Root::Definitions) => Ok(Document::Definitions(self.definitions)),
            Some(Root::Schema) => Ok(Document::Schema(self.definitions.schema)),
            None => Err(Error::malformed("document has no root element")),
        }
    }

    fn schema(
        &mut self,
        reader: &Reader<&[u8]>,
        start: &BytesStart<'_>,
        scope: Namespaces,
    ) -> Result<Schema> {
        let [target] = get_attributes(reader, start, ["targetNamespace"])?;
        let target = target.or_else(|| self.namespaces.target().map(ToOwned::to_owned));
        self.namespaces.push_target_namespace(target.clone());

        Ok(Schema {
            target_namespace: target,
            namespaces: scope,
            ..Default::default()
        })
    }

    fn import(
        &self,
        reader: &Reader<&[u8]>,
        start: &BytesStart<'_>,
        location_attribute: &'static str,
    ) -> Result<Import> {
        let [namespace, location] =
            get_attributes(reader, start, ["namespace", location_attribute])?;

        Ok(Import {
            namespace,
            location: non_empty(location),
        })
    }

    fn element(&self, reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Element> {
        let [name, reference, ty, min, max, nillable] = get_attributes(
            reader,
            start,
            ["name", "ref", "type", "minOccurs", "maxOccurs", "nillable"],
        )?;

        let reference = reference.map(|reference| self.namespaces.resolve(&reference));
        let name = name
            .or_else(|| reference.as_ref().map(|reference| reference.name.clone()))
            .unwrap_or_default();

        let (min_occurs, max_occurs) = parse_occurs(min, max)?;

        Ok(Element {
            name,
            reference,
            ty: ty.map(|ty| self.namespaces.resolve(&ty)),
            inline: None,
            min_occurs,
            max_occurs,
            nillable: parse_flag(nillable),
        })
    }

    fn attribute(&self, reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Attribute> {
        let [name, reference, ty, array_type, usage] =
            get_attributes(reader, start, ["name", "ref", "type", "arrayType", "use"])?;

        let reference = reference.map(|reference| self.namespaces.resolve(&reference));
        let name = name
            .or_else(|| reference.as_ref().map(|reference| reference.name.clone()))
            .unwrap_or_default();

        Ok(Attribute {
            name,
            reference,
            ty: ty.map(|ty| self.namespaces.resolve(&ty)),
            array_type,
            required: usage.as_deref() == Some("required"),
        })
    }

    fn derivation(
        &self,
        reader: &Reader<&[u8]>,
        start: &BytesStart<'_>,
        restriction: bool,
    ) -> Result<ParseState> {
        let [base] = get_attributes(reader, start, ["base"])?;

        Ok(ParseState::Derivation {
            base: base.map(|base| self.namespaces.resolve(&base)),
            restriction,
            enumeration: Vec::new(),
            particle: None,
            attributes: Vec::new(),
        })
    }

    fn complex_type(&self, reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<ParseState> {
        let [name, is_abstract] = get_attributes(reader, start, ["name", "abstract"])?;

        let mut ty = ComplexType::new(name.unwrap_or_default());
        ty.is_abstract = parse_flag(is_abstract);
        Ok(ParseState::ComplexType(ty))
    }

    fn simple_type(&self, reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<ParseState> {
        let [name] = get_attributes(reader, start, ["name"])?;

        Ok(ParseState::SimpleType(SimpleType {
            name: name.unwrap_or_default(),
            documentation: None,
            kind: SimpleTypeKind::Restriction(Restriction::default()),
        }))
    }

    fn any(&self, reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Any> {
        let [min, max] = get_attributes(reader, start, ["minOccurs", "maxOccurs"])?;
        let (min_occurs, max_occurs) = parse_occurs(min, max)?;
        Ok(Any {
            min_occurs,
            max_occurs,
        })
    }

    fn binding_body(&self, reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<BindingBody> {
        let [encoding_use, parts, namespace] =
            get_attributes(reader, start, ["use", "parts", "namespace"])?;

        Ok(BindingBody {
            encoding_use,
            parts,
            namespace,
        })
    }

    fn handle_start(
        &mut self,
        stack: &mut Vec<ParseState>,
        reader: &Reader<&[u8]>,
        start: &BytesStart<'_>,
    ) -> Result<()> {
        let qualified = reader
            .decoder()
            .decode(start.name().as_ref())
            .map_err(xml_error)?
            .into_owned();
        let (prefix, local_name) = split_namespaced_name(&qualified);

        let mut scope = Namespaces::default();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(xml_error)?;
            let key = reader
                .decoder()
                .decode(attribute.key.as_ref())
                .map_err(xml_error)?;

            match split_namespaced_name(&key) {
                (Some("xmlns"), prefix) => {
                    scope.insert(prefix, decode_text(reader, &attribute.value)?)
                }
                (None, "xmlns") => scope.insert("", decode_text(reader, &attribute.value)?),
                _ => (),
            }
        }

        self.namespaces.push_scope(scope.clone());
        let namespace = self
            .namespaces
            .lookup(prefix.unwrap_or(""))
            .map(ToOwned::to_owned);

        let mut state = stack.pop();
        let mut new_state = ParseState::Other(local_name.to_owned());

        match &mut state {
            None => {
                if self.root.is_some() {
                    return Err(Error::malformed(format!(
                        "unexpected second root element {}",
                        qualified
                    )));
                }

                match local_name {
                    "definitions" => {
                        let [name, target] =
                            get_attributes(reader, start, ["name", "targetNamespace"])?;

                        self.root = Some(Root::Definitions);
                        self.namespaces.push_target_namespace(target.clone());
                        self.definitions.name = name;
                        self.definitions.target_namespace = target;
                        self.definitions.namespaces = scope;

                        new_state = ParseState::Definitions;
                    }

                    "schema" => {
                        self.root = Some(Root::Schema);
                        new_state = ParseState::Schema(self.schema(reader, start, scope)?);
                    }

                    _ => {
                        return Err(Error::malformed(format!(
                            "unexpected root element {}",
                            qualified
                        )))
                    }
                }
            }

            Some(ParseState::Definitions) => match local_name {
                "import" => {
                    let import = self.import(reader, start, "location")?;
                    self.definitions.imports.push(import);
                }

                "types" => new_state = ParseState::Types,

                "message" => {
                    let [name] = get_attributes(reader, start, ["name"])?;
                    new_state = ParseState::Message(Message {
                        name: name.unwrap_or_default(),
                        parts: Vec::new(),
                    });
                }

                "portType" => {
                    let [name] = get_attributes(reader, start, ["name"])?;
                    new_state = ParseState::PortType(PortType {
                        name: name.unwrap_or_default(),
                        operations: Vec::new(),
                    });
                }

                "binding" => {
                    let [name, ty] = get_attributes(reader, start, ["name", "type"])?;
                    new_state = ParseState::Binding(Binding {
                        name: name.unwrap_or_default(),
                        ty: ty.map(|ty| self.namespaces.resolve(&ty)),
                        ..Default::default()
                    });
                }

                "service" => {
                    let [name] = get_attributes(reader, start, ["name"])?;
                    new_state = ParseState::Service(Service {
                        name: name.unwrap_or_default(),
                        ..Default::default()
                    });
                }

                _ => trace!("skipping {} inside definitions", qualified),
            },

            Some(ParseState::Types) => match local_name {
                "schema" => new_state = ParseState::Schema(self.schema(reader, start, scope)?),
                _ => trace!("skipping {} inside types", qualified),
            },

            Some(ParseState::Schema(schema)) => match local_name {
                "import" => schema
                    .imports
                    .push(self.import(reader, start, "schemaLocation")?),
                "include" => schema
                    .includes
                    .push(self.import(reader, start, "schemaLocation")?),
                "simpleType" => new_state = self.simple_type(reader, start)?,
                "complexType" => new_state = self.complex_type(reader, start)?,
                "element" => new_state = ParseState::Element(self.element(reader, start)?),
                _ => trace!("skipping {} inside schema", qualified),
            },

            Some(ParseState::SimpleType(ty)) => match local_name {
                "restriction" => new_state = self.derivation(reader, start, true)?,
                "union" => {
                    let [members] = get_attributes(reader, start, ["memberTypes"])?;
                    let members = members
                        .as_deref()
                        .unwrap_or_default()
                        .split_whitespace()
                        .map(|member| self.namespaces.resolve(member))
                        .collect();
                    ty.kind = SimpleTypeKind::Union(members);
                }
                "annotation" => new_state = ParseState::Annotation(None),
                "list" => warn!("list simple type {} is decoded as its item type", ty.name),
                _ => trace!("skipping {} inside simpleType", qualified),
            },

            Some(ParseState::ComplexType(ty)) => match local_name {
                "sequence" => new_state = ParseState::Sequence(Group::default()),
                "choice" => new_state = ParseState::Choice(Group::default()),
                "all" => new_state = ParseState::All(Vec::new()),
                "complexContent" => new_state = ParseState::ComplexContent(None),
                "simpleContent" => new_state = ParseState::SimpleContent(None),
                "attribute" => ty.attributes.push(self.attribute(reader, start)?),
                "annotation" => new_state = ParseState::Annotation(None),
                _ => trace!("skipping {} inside complexType", qualified),
            },

            Some(ParseState::ComplexContent(..) | ParseState::SimpleContent(..)) => {
                match local_name {
                    "extension" => new_state = self.derivation(reader, start, false)?,
                    "restriction" => new_state = self.derivation(reader, start, true)?,
                    _ => trace!("skipping {} inside content", qualified),
                }
            }

            Some(ParseState::Derivation {
                enumeration,
                attributes,
                ..
            }) => match local_name {
                "enumeration" => {
                    let [value] = get_attributes(reader, start, ["value"])?;
                    enumeration.extend(value);
                }
                "attribute" => attributes.push(self.attribute(reader, start)?),
                "sequence" => new_state = ParseState::Sequence(Group::default()),
                "choice" => new_state = ParseState::Choice(Group::default()),
                "all" => new_state = ParseState::All(Vec::new()),
                _ => trace!("skipping {} inside derivation", qualified),
            },

            Some(ParseState::Sequence(group) | ParseState::Choice(group)) => match local_name {
                "element" => new_state = ParseState::Element(self.element(reader, start)?),
                "sequence" => new_state = ParseState::Sequence(Group::default()),
                "choice" => new_state = ParseState::Choice(Group::default()),
                "any" => group.items.push(GroupItem::Any(self.any(reader, start)?)),
                _ => trace!("skipping {} inside group", qualified),
            },

            Some(ParseState::All(..)) => match local_name {
                "element" => new_state = ParseState::Element(self.element(reader, start)?),
                _ => trace!("skipping {} inside all", qualified),
            },

            Some(ParseState::Element(..)) => match local_name {
                "complexType" => new_state = self.complex_type(reader, start)?,
                "simpleType" => new_state = self.simple_type(reader, start)?,
                _ => trace!("skipping {} inside element", qualified),
            },

            Some(ParseState::Annotation(..)) => {
                if local_name == "documentation" {
                    new_state = ParseState::Documentation(String::new());
                }
            }

            Some(ParseState::Documentation(..)) => (),

            Some(ParseState::Message(message)) => match local_name {
                "part" => {
                    let [name, ty, element] =
                        get_attributes(reader, start, ["name", "type", "element"])?;
                    let name = name.unwrap_or_default();

                    let kind = match (ty, element) {
                        (Some(ty), _) => PartKind::Type(self.namespaces.resolve(&ty)),
                        (None, Some(element)) => {
                            PartKind::Element(self.namespaces.resolve(&element))
                        }
                        (None, None) => {
                            return Err(Error::malformed(format!(
                                "part {:?} of message {:?} has neither type nor element",
                                name, message.name
                            )))
                        }
                    };

                    message.parts.push(Part { name, kind });
                }
                _ => trace!("skipping {} inside message", qualified),
            },

            Some(ParseState::PortType(..)) => match local_name {
                "operation" => {
                    let [name, order] = get_attributes(reader, start, ["name", "parameterOrder"])?;
                    new_state = ParseState::Operation(Operation {
                        name: name.unwrap_or_default(),
                        parameter_order: order
                            .as_deref()
                            .unwrap_or_default()
                            .split_whitespace()
                            .map(ToOwned::to_owned)
                            .collect(),
                        ..Default::default()
                    });
                }
                _ => trace!("skipping {} inside portType", qualified),
            },

            Some(ParseState::Operation(operation)) => match local_name {
                "input" | "output" => {
                    let [message] = get_attributes(reader, start, ["message"])?;
                    let message = message.map(|message| self.namespaces.resolve(&message));

                    if local_name == "input" {
                        operation.input = message;
                    } else {
                        operation.output = message;
                    }
                }
                "documentation" => new_state = ParseState::Documentation(String::new()),
                _ => trace!("skipping {} inside operation", qualified),
            },

            Some(ParseState::Binding(binding)) => match local_name {
                "binding" => {
                    let [style, transport] = get_attributes(reader, start, ["style", "transport"])?;
                    binding.style = style;
                    binding.transport = transport;
                }
                "operation" => {
                    let [name] = get_attributes(reader, start, ["name"])?;
                    new_state = ParseState::BindingOperation(BindingOperation {
                        name: name.unwrap_or_default(),
                        ..Default::default()
                    });
                }
                _ => trace!("skipping {} inside binding", qualified),
            },

            Some(ParseState::BindingOperation(operation)) => match local_name {
                "operation" => {
                    let [action, style] = get_attributes(reader, start, ["soapAction", "style"])?;
                    let action = non_empty(action);

                    if namespace.as_deref() == Some(SOAP12_BINDING_NAMESPACE) {
                        operation.soap12_action = action;
                    } else {
                        operation.soap11_action = action;
                    }

                    if style.is_some() {
                        operation.style = style;
                    }
                }
                "input" => new_state = ParseState::BindingInput(None),
                "output" => new_state = ParseState::BindingOutput(None),
                _ => trace!("skipping {} inside binding operation", qualified),
            },

            Some(ParseState::BindingInput(body) | ParseState::BindingOutput(body)) => {
                if local_name == "body" {
                    *body = Some(self.binding_body(reader, start)?);
                }
            }

            Some(ParseState::Service(..)) => match local_name {
                "port" => {
                    let [name, binding] = get_attributes(reader, start, ["name", "binding"])?;
                    new_state = ParseState::Port(Port {
                        name: name.unwrap_or_default(),
                        binding: binding.map(|binding| self.namespaces.resolve(&binding)),
                        address: None,
                    });
                }
                "documentation" => new_state = ParseState::Documentation(String::new()),
                _ => trace!("skipping {} inside service", qualified),
            },

            Some(ParseState::Port(port)) => {
                if local_name == "address" {
                    let [location] = get_attributes(reader, start, ["location"])?;
                    port.address = location;
                }
            }

            Some(ParseState::Other(name)) => trace!("skipping {} inside {}", qualified, name),
        }

        stack.extend(state);
        stack.push(new_state);

        Ok(())
    }

    fn handle_end(&mut self, stack: &mut Vec<ParseState>) -> Result<()> {
        let finished_state = stack
            .pop()
            .ok_or_else(|| Error::malformed("unexpected closing tag"))?;
        self.namespaces.pop_scope();

        let mut next_state = stack.pop();

        match (finished_state, next_state.as_mut()) {
            (ParseState::Definitions, None) => self.namespaces.pop_target_namespace(),

            (ParseState::Schema(schema), _) => {
                self.namespaces.pop_target_namespace();
                self.definitions.schema.merge(schema);
            }

            (ParseState::SimpleType(ty), Some(ParseState::Schema(schema))) => {
                schema.simple_types.push(ty)
            }

            // An inline simple type only narrows the value space of its
            // element, so the element keeps the restriction base.
            (ParseState::SimpleType(ty), Some(ParseState::Element(element))) => {
                if element.ty.is_none() {
                    if let SimpleTypeKind::Restriction(restriction) = ty.kind {
                        element.ty = restriction.base;
                    }
                }
            }

            (ParseState::ComplexType(ty), Some(ParseState::Schema(schema))) => {
                schema.complex_types.push(ty)
            }

            (ParseState::ComplexType(ty), Some(ParseState::Element(element))) => {
                element.inline = Some(Box::new(ty))
            }

            (ParseState::ComplexContent(content), Some(ParseState::ComplexType(ty))) => {
                ty.content = content.unwrap_or(Content::Empty)
            }

            (ParseState::SimpleContent(Some(content)), Some(ParseState::ComplexType(ty))) => {
                ty.content = Content::Simple(content)
            }

            (
                ParseState::Derivation {
                    base,
                    restriction,
                    enumeration,
                    particle,
                    attributes,
                },
                Some(parent),
            ) => match parent {
                ParseState::SimpleType(ty) => {
                    ty.kind = SimpleTypeKind::Restriction(Restriction { base, enumeration })
                }

                ParseState::ComplexContent(content) => {
                    let derivation = Derivation {
                        base: base.ok_or_else(|| {
                            Error::malformed("complexContent derivation without base")
                        })?,
                        particle,
                        attributes,
                    };

                    *content = Some(if restriction {
                        Content::Restriction(derivation)
                    } else {
                        Content::Extension(derivation)
                    });
                }

                ParseState::SimpleContent(content) => {
                    *content = Some(SimpleContent {
                        base: base.ok_or_else(|| {
                            Error::malformed("simpleContent derivation without base")
                        })?,
                        restricted: restriction,
                        attributes,
                    });
                }

                _ => (),
            },

            (ParseState::Sequence(group), Some(parent)) => match parent {
                ParseState::ComplexType(ty) => ty.content = Content::Sequence(group),
                ParseState::Derivation { particle, .. } => {
                    *particle = Some(Particle::Sequence(group))
                }
                ParseState::Sequence(outer) | ParseState::Choice(outer) => {
                    outer.items.push(GroupItem::Sequence(group))
                }
                _ => (),
            },

            (ParseState::Choice(group), Some(parent)) => match parent {
                ParseState::ComplexType(ty) => ty.content = Content::Choice(group),
                ParseState::Derivation { particle, .. } => *particle = Some(Particle::Choice(group)),
                ParseState::Sequence(outer) | ParseState::Choice(outer) => {
                    outer.items.push(GroupItem::Choice(group))
                }
                _ => (),
            },

            (ParseState::All(elements), Some(parent)) => match parent {
                ParseState::ComplexType(ty) => ty.content = Content::All(elements),
                ParseState::Derivation { particle, .. } => *particle = Some(Particle::All(elements)),
                _ => (),
            },

            (ParseState::Element(element), Some(parent)) => match parent {
                ParseState::Schema(schema) => schema.elements.push(element),
                ParseState::Sequence(group) | ParseState::Choice(group) => {
                    group.items.push(GroupItem::Element(element))
                }
                ParseState::All(elements) => elements.push(element),
                _ => (),
            },

            (ParseState::Annotation(Some(text)), Some(parent)) => set_documentation(parent, text),

            (ParseState::Documentation(text), Some(parent)) => set_documentation(parent, text),

            (ParseState::Message(message), _) => self.definitions.messages.push(message),

            (ParseState::PortType(port_type), _) => {
                if self.definitions.port_type.name.is_empty() {
                    self.definitions.port_type = port_type;
                } else {
                    warn!("ignoring additional port type {}", port_type.name);
                }
            }

            (ParseState::Operation(operation), Some(ParseState::PortType(port_type))) => {
                port_type.operations.push(operation)
            }

            (ParseState::Binding(binding), _) => {
                if self.definitions.binding.name.is_empty() {
                    self.definitions.binding = binding;
                } else {
                    warn!("ignoring additional binding {}", binding.name);
                }
            }

            (ParseState::BindingOperation(operation), Some(ParseState::Binding(binding))) => {
                binding.operations.push(operation)
            }

            (ParseState::BindingInput(body), Some(ParseState::BindingOperation(operation))) => {
                operation.input = body
            }

            (ParseState::BindingOutput(body), Some(ParseState::BindingOperation(operation))) => {
                operation.output = body
            }

            (ParseState::Service(service), _) => {
                if self.definitions.service.name.is_empty() {
                    self.definitions.service = service;
                }
            }

            (ParseState::Port(port), Some(ParseState::Service(service))) => {
                service.ports.push(port)
            }

            _ => (),
        }

        stack.extend(next_state);
        Ok(())
    }

    fn handle_text(&mut self, stack: &mut [ParseState], text: String) {
        if let Some(ParseState::Documentation(documentation)) = stack.last_mut() {
            if !documentation.is_empty() {
                documentation.push(' ');
            }
            documentation.push_str(text.trim());
        }
    }
}

/// Decodes any supported document root.
pub fn decode(bytes: &[u8]) -> Result<Document> {
    Parser::new().parse(bytes)
}

/// Decodes a document that must be rooted at `definitions`.
pub fn decode_definitions(bytes: &[u8]) -> Result<Definitions> {
    match decode(bytes)? {
        Document::Definitions(definitions) => Ok(definitions),
        Document::Schema(..) => Err(Error::malformed(
            "expected root element definitions, found schema",
        )),
    }
}

/// Decodes a schema fragment. A whole interface description is accepted
/// as well, yielding its embedded schema.
pub fn decode_schema(bytes: &[u8]) -> Result<Schema> {
    match decode(bytes)? {
        Document::Schema(schema) => Ok(schema),
        Document::Definitions(definitions) => {
            let mut schema = definitions.schema;
            let mut namespaces = definitions.namespaces;
            namespaces.merge(&schema.namespaces);
            schema.namespaces = namespaces;
            Ok(schema)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{XSD_NAMESPACE, SOAP11_BINDING_NAMESPACE};

    const PING: &str = r#"<?xml version="1.0"?>
<definitions name="Ping"
    targetNamespace="urn:ping"
    xmlns:tns="urn:ping"
    xmlns:xsd="http://www.w3.org/2001/XMLSchema"
    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns="http://schemas.xmlsoap.org/wsdl/">
  <types>
    <xsd:schema targetNamespace="urn:ping" xmlns:enc="http://schemas.xmlsoap.org/soap/encoding/">
      <xsd:simpleType name="Color">
        <xsd:restriction base="xsd:string">
          <xsd:enumeration value="RED"/>
          <xsd:enumeration value="GREEN"/>
        </xsd:restriction>
      </xsd:simpleType>
      <xsd:complexType name="Base">
        <xsd:annotation><xsd:documentation>A base &amp; type.</xsd:documentation></xsd:annotation>
        <xsd:sequence>
          <xsd:element name="id" type="xsd:int"/>
          <xsd:element name="tags" type="xsd:string" minOccurs="0" maxOccurs="unbounded"/>
          <xsd:choice>
            <xsd:element name="a" type="xsd:string"/>
            <xsd:element name="b" type="xsd:string"/>
          </xsd:choice>
        </xsd:sequence>
        <xsd:attribute name="lang" type="xsd:string" use="required"/>
      </xsd:complexType>
      <xsd:complexType name="Derived">
        <xsd:complexContent>
          <xsd:extension base="tns:Base">
            <xsd:sequence>
              <xsd:element name="extra" type="xsd:boolean" nillable="true"/>
            </xsd:sequence>
          </xsd:extension>
        </xsd:complexContent>
      </xsd:complexType>
      <xsd:element name="Wrapper">
        <xsd:complexType>
          <xsd:sequence>
            <xsd:element ref="tns:Item" maxOccurs="5"/>
          </xsd:sequence>
        </xsd:complexType>
      </xsd:element>
    </xsd:schema>
  </types>
  <message name="PingRequest"><part name="status" type="xsd:string"/></message>
  <message name="PingResponse"><part name="ok" type="xsd:boolean"/></message>
  <portType name="PingPort">
    <operation name="Ping" parameterOrder="status">
      <documentation>Pings the service.</documentation>
      <input message="tns:PingRequest"/>
      <output message="tns:PingResponse"/>
    </operation>
  </portType>
  <binding name="PingBinding" type="tns:PingPort">
    <soap:binding style="rpc" transport="http://schemas.xmlsoap.org/soap/http"/>
    <operation name="Ping">
      <soap:operation soapAction="Ping"/>
      <input><soap:body use="encoded" namespace="urn:ping"/></input>
      <output><soap:body use="encoded" namespace="urn:ping"/></output>
    </operation>
  </binding>
  <service name="PingService">
    <port name="PingPort" binding="tns:PingBinding">
      <soap:address location="http://localhost/ping"/>
    </port>
  </service>
</definitions>
"#;

    #[test]
    fn decodes_definitions() {
        let definitions = decode_definitions(PING.as_bytes()).unwrap();

        assert_eq!(definitions.target_namespace.as_deref(), Some("urn:ping"));
        assert_eq!(definitions.namespaces.get("tns"), Some("urn:ping"));
        assert_eq!(definitions.namespaces.get("soap"), Some(SOAP11_BINDING_NAMESPACE));
        assert_eq!(
            definitions.schema.namespaces.get("enc"),
            Some("http://schemas.xmlsoap.org/soap/encoding/")
        );

        assert_eq!(definitions.messages.len(), 2);
        assert_eq!(
            definitions.messages[0].parts[0].kind,
            PartKind::Type(NamespacedName {
                prefix: Some("xsd".into()),
                namespace: Some(XSD_NAMESPACE.into()),
                name: "string".into(),
            })
        );

        let operation = &definitions.port_type.operations[0];
        assert_eq!(operation.name, "Ping");
        assert_eq!(operation.parameter_order, vec!["status".to_owned()]);
        assert_eq!(operation.documentation.as_deref(), Some("Pings the service."));
        assert_eq!(operation.output.as_ref().unwrap().name, "PingResponse");

        let binding = &definitions.binding;
        assert_eq!(binding.ty.as_ref().unwrap().name, "PingPort");
        assert_eq!(binding.style.as_deref(), Some("rpc"));
        assert_eq!(binding.operations[0].soap11_action.as_deref(), Some("Ping"));
        assert_eq!(binding.operations[0].soap12_action, None);

        assert_eq!(
            definitions.service.ports[0].address.as_deref(),
            Some("http://localhost/ping")
        );
    }

    #[test]
    fn decodes_schema_content() {
        let definitions = decode_definitions(PING.as_bytes()).unwrap();
        let schema = &definitions.schema;

        match &schema.simple_types[0].kind {
            SimpleTypeKind::Restriction(restriction) => {
                assert_eq!(restriction.base.as_ref().unwrap().name, "string");
                assert_eq!(restriction.enumeration, vec!["RED", "GREEN"]);
            }
            kind => panic!("unexpected {:?}", kind),
        }

        let base = &schema.complex_types[0];
        assert_eq!(base.documentation.as_deref(), Some("A base & type."));
        assert!(base.attributes[0].required);

        let group = match &base.content {
            Content::Sequence(group) => group,
            content => panic!("unexpected {:?}", content),
        };

        let elements = group.elements().collect::<Vec<_>>();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[1].min_occurs, 0);
        assert_eq!(elements[1].max_occurs, MaxOccurs::Unbounded);
        assert!(matches!(group.items[2], GroupItem::Choice(..)));

        match &schema.complex_types[1].content {
            Content::Extension(derivation) => {
                assert_eq!(derivation.base.name, "Base");
                assert_eq!(derivation.base.namespace.as_deref(), Some("urn:ping"));
                assert!(matches!(derivation.particle, Some(Particle::Sequence(..))));
            }
            content => panic!("unexpected {:?}", content),
        }

        let wrapper = &schema.elements[0];
        let inline = wrapper.inline.as_ref().unwrap();
        let group = match &inline.content {
            Content::Sequence(group) => group,
            content => panic!("unexpected {:?}", content),
        };

        let item = group.elements().next().unwrap();
        assert_eq!(item.name, "Item");
        assert_eq!(item.reference.as_ref().unwrap().name, "Item");
        assert_eq!(item.max_occurs, MaxOccurs::Bounded(5));
    }

    #[test]
    fn rejects_unexpected_root() {
        let error = decode_definitions(b"<html><body/></html>").unwrap_err();
        assert!(matches!(error, Error::MalformedDocument(..)));
    }

    #[test]
    fn rejects_truncated_document() {
        let error = decode_definitions(b"<definitions><types>").unwrap_err();
        assert!(matches!(error, Error::MalformedDocument(..)));
    }

    #[test]
    fn rejects_mismatched_tags() {
        let error = decode_definitions(b"<definitions><types></message></definitions>").unwrap_err();
        assert!(matches!(error, Error::MalformedDocument(..)));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(decode(b""), Err(Error::MalformedDocument(..))));
    }

    #[test]
    fn decodes_legacy_encoding() {
        let mut bytes =
            b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><definitions name=\"Caf".to_vec();
        bytes.push(0xe9);
        bytes.extend_from_slice(b"\"/>");

        let definitions = decode_definitions(&bytes).unwrap();
        assert_eq!(definitions.name.as_deref(), Some("Café"));
    }

    #[test]
    fn decodes_soap12_action() {
        let document = r#"<definitions xmlns:soap12="http://schemas.xmlsoap.org/wsdl/soap12/">
            <binding name="B" type="P">
              <soap12:binding transport="http://schemas.xmlsoap.org/soap/http"/>
              <operation name="Op">
                <soap12:operation soapAction="urn:Op" style="document"/>
              </operation>
            </binding>
          </definitions>"#;

        let definitions = decode_definitions(document.as_bytes()).unwrap();
        let operation = &definitions.binding.operations[0];
        assert_eq!(operation.soap12_action.as_deref(), Some("urn:Op"));
        assert_eq!(operation.soap11_action, None);
        assert_eq!(operation.style.as_deref(), Some("document"));
    }

    #[test]
    fn decodes_bare_schema() {
        let document = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:s">
            <xs:include schemaLocation="other.xsd"/>
            <xs:simpleType name="Either"><xs:union memberTypes="xs:int xs:string"/></xs:simpleType>
          </xs:schema>"#;

        let schema = decode_schema(document.as_bytes()).unwrap();
        assert_eq!(schema.target_namespace.as_deref(), Some("urn:s"));
        assert_eq!(schema.includes[0].location.as_deref(), Some("other.xsd"));
        match &schema.simple_types[0].kind {
            SimpleTypeKind::Union(members) => assert_eq!(members.len(), 2),
            kind => panic!("unexpected {:?}", kind),
        }

        assert!(decode_definitions(document.as_bytes()).is_err());
    }
}
