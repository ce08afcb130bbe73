use super::{
    mapper::{Marker, Primitive, RustType},
    sanitize,
    session::{Names, Session},
};
use log::{debug, warn};
use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet},
};
use wsdl2rs_wsdl::{
    error::Error,
    types::{
        Attribute, ComplexType, Content, Element, Group, GroupItem, NamespacedName, Particle,
        SimpleContent, SimpleType, SimpleTypeKind, SOAP_ENCODING_NAMESPACE, XSD_NAMESPACE,
        XSI_NAMESPACE,
    },
};

pub trait Codegen {
    fn codegen(&self, session: &mut Session<'_>) -> Result<TokenStream, Error>;
}

/// A schema declaration together with the identifier it is generated as.
pub struct Named<'t, T> {
    pub ident: &'t str,
    pub item: &'t T,
}

/// How a complex type is rendered.
pub enum Shape<'t> {
    /// Abstract types carry arbitrary content.
    Abstract,
    /// SOAP-encoded array restriction, with its `arrayType` hint.
    Array(&'t str),
    /// A group holding nothing but a single wildcard.
    AnySequence,
    Struct,
}

pub fn shape(ty: &ComplexType) -> Shape<'_> {
    if ty.is_abstract {
        return Shape::Abstract;
    }

    match &ty.content {
        Content::Restriction(derivation) if is_soap_array(&derivation.base) => {
            match derivation.attributes.as_slice() {
                [Attribute {
                    array_type: Some(array_type),
                    ..
                }] => Shape::Array(array_type),
                _ => Shape::Struct,
            }
        }

        Content::Sequence(group) | Content::Choice(group)
            if ty.attributes.is_empty()
                && matches!(group.items.as_slice(), [GroupItem::Any(..)]) =>
        {
            Shape::AnySequence
        }

        _ => Shape::Struct,
    }
}

fn is_soap_array(base: &NamespacedName) -> bool {
    base.name == "Array" && (base.namespace.is_none() || base.is_in(SOAP_ENCODING_NAMESPACE))
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + word.len() + 1 > width {
            lines.push(std::mem::take(&mut line));
        }

        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }

    if !line.is_empty() {
        lines.push(line);
    }

    lines
}

/// Doc attributes carrying `documentation`, or a generated note when the
/// schema has none.
pub fn doc_attributes(ident: &str, documentation: Option<&str>) -> TokenStream {
    let text = match documentation.map(str::trim).filter(|text| !text.is_empty()) {
        Some(text) => text.to_owned(),
        None => format!("`{}` was auto-generated from WSDL.", ident),
    };

    let lines = wrap(&text, 80).into_iter().map(|line| format!(" {}", line));
    quote! { #(#[doc = #lines])* }
}

pub fn serde_derives() -> TokenStream {
    quote! {
        #[derive(Debug, Clone, Default, PartialEq, wsdl2rs_util::serde::Serialize, wsdl2rs_util::serde::Deserialize)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Optional,
    Many,
    /// A list wrapped in one extra element level on the wire, whose items
    /// are named by the payload.
    Nested(String),
}

#[derive(Debug, Clone)]
pub struct Field {
    pub ident: String,
    pub wire: String,
    pub ty: RustType,
    pub cardinality: Cardinality,
}

impl Field {
    /// The field declaration, plus the wire helper module a nested list
    /// needs. Helper module names are claimed from `modules`.
    pub fn codegen(&self, owner: &str, modules: &mut Names) -> (TokenStream, TokenStream) {
        let ident = format_ident!("{}", self.ident);
        let wire = &self.wire;
        let ty = self.ty.tokens();
        let boxed = if self.ty.is_aggregate() {
            quote!(Box<#ty>)
        } else {
            ty.clone()
        };

        let (ty, serde, helper) = match &self.cardinality {
            Cardinality::One => (boxed, quote!(rename = #wire), quote!()),
            Cardinality::Optional => (
                quote!(Option<#boxed>),
                quote!(rename = #wire, default, skip_serializing_if = "Option::is_none"),
                quote!(),
            ),
            Cardinality::Many => (quote!(Vec<#ty>), quote!(rename = #wire, default), quote!()),
            Cardinality::Nested(inner) => {
                let wanted = format!("{}_{}_wire", sanitize::field_name(owner), self.ident);
                let module = modules.claim(&wanted, "_");
                let module_ident = format_ident!("{}", module);

                (
                    quote!(Vec<#ty>),
                    quote!(rename = #wire, default, with = #module),
                    quote!(wsdl2rs_util::nested_wire!(#module_ident, #inner);),
                )
            }
        };

        (quote! { #[serde(#serde)] pub #ident: #ty, }, helper)
    }

    pub fn annotation(&self, session: &Session<'_>) -> Option<TokenStream> {
        match &self.ty {
            RustType::Named(ty) if session.is_annotatable(ty) => {
                let ident = format_ident!("{}", self.ident);
                Some(quote! {
                    wsdl2rs_util::xml::WireTypeAnnotatable::annotate_wire_types(&mut self.#ident);
                })
            }
            _ => None,
        }
    }
}

/// Looks through an element reference to the global element it names.
fn resolve_reference<'e>(
    session: &Session<'e>,
    referrer: &str,
    element: &'e Element,
) -> Result<&'e Element, Error> {
    match &element.reference {
        Some(reference) => session
            .table
            .element(&reference.name)
            .ok_or_else(|| Error::UndefinedType {
                referrer: referrer.to_owned(),
                name: reference.name.clone(),
            }),
        None => Ok(element),
    }
}

/// An anonymous sequence whose only member is a repeated element.
fn collapsible(ty: &ComplexType) -> Option<&Element> {
    match &ty.content {
        Content::Sequence(group) if ty.attributes.is_empty() => match group.items.as_slice() {
            [GroupItem::Element(inner)] if inner.max_occurs.is_repeated() && inner.inline.is_none() => {
                Some(inner)
            }
            _ => None,
        },
        _ => None,
    }
}

/// Collects the flattened fields of one struct.
struct StructBuilder {
    owner: String,
    referrer: String,
    fields: Vec<Field>,
    wires: BTreeSet<String>,
    idents: Names,
}

impl StructBuilder {
    fn new(owner: &str, referrer: &str) -> Self {
        Self {
            owner: owner.to_owned(),
            referrer: referrer.to_owned(),
            fields: Vec::new(),
            wires: BTreeSet::new(),
            idents: Names::default(),
        }
    }

    fn push(&mut self, field: Field) -> Option<String> {
        if !self.wires.insert(field.wire.clone()) {
            debug!("{}: skipping repeated field {}", self.owner, field.wire);
            return None;
        }

        let ident = self.idents.claim(&field.ident, "_");
        self.fields.push(Field {
            ident: ident.clone(),
            ..field
        });

        Some(ident)
    }

    fn collect(
        &mut self,
        session: &mut Session<'_>,
        ty: &ComplexType,
        bases: &mut Vec<String>,
    ) -> Result<(), Error> {
        match &ty.content {
            Content::Extension(derivation) => {
                self.base(session, &derivation.base, bases)?;
                self.attributes(session, &derivation.attributes);
                self.attributes(session, &ty.attributes);
                if let Some(particle) = &derivation.particle {
                    self.particle(session, particle)?;
                }
            }

            Content::Restriction(derivation) => {
                self.attributes(session, &derivation.attributes);
                self.attributes(session, &ty.attributes);
                if let Some(particle) = &derivation.particle {
                    self.particle(session, particle)?;
                }
            }

            Content::Simple(simple) => {
                self.simple_content(session, simple, bases)?;
                self.attributes(session, &simple.attributes);
                self.attributes(session, &ty.attributes);
            }

            Content::All(elements) => {
                self.attributes(session, &ty.attributes);
                for element in elements {
                    self.element(session, element, false)?;
                }
            }

            Content::Sequence(group) => {
                self.attributes(session, &ty.attributes);
                self.group(session, group, false)?;
            }

            Content::Choice(group) => {
                self.attributes(session, &ty.attributes);
                self.group(session, group, true)?;
            }

            Content::Empty => self.attributes(session, &ty.attributes),
        }

        Ok(())
    }

    /// Flattens the fields of the complex type `base`.
    fn base(
        &mut self,
        session: &mut Session<'_>,
        base: &NamespacedName,
        bases: &mut Vec<String>,
    ) -> Result<(), Error> {
        if base.is_in(XSD_NAMESPACE) {
            return Ok(());
        }

        if bases.contains(&base.name) {
            warn!("{}: ignoring cyclic base type {}", self.owner, base.name);
            return Ok(());
        }

        if let Some(ty) = session.table.complex_type(&base.name).cloned() {
            bases.push(base.name.clone());
            self.collect(session, &ty, bases)?;
            bases.pop();
            return Ok(());
        }

        if session.simple_ident(&base.name).is_some() {
            let ty = session.map_type(base, &self.referrer);
            self.text(ty);
            return Ok(());
        }

        Err(Error::UndefinedType {
            referrer: self.referrer.clone(),
            name: base.name.clone(),
        })
    }

    fn text(&mut self, ty: RustType) {
        self.push(Field {
            ident: "value".to_owned(),
            wire: "$text".to_owned(),
            ty,
            cardinality: Cardinality::One,
        });
    }

    fn simple_content(
        &mut self,
        session: &mut Session<'_>,
        simple: &SimpleContent,
        bases: &mut Vec<String>,
    ) -> Result<(), Error> {
        let base = &simple.base;

        if !base.is_in(XSD_NAMESPACE) && session.table.complex_types.contains_key(&base.name) {
            return self.base(session, base, bases);
        }

        let ty = session.map_type(base, &self.referrer);
        self.text(ty);
        Ok(())
    }

    fn attributes(&mut self, session: &mut Session<'_>, attributes: &[Attribute]) {
        for attribute in attributes {
            let (wire, name) = match &attribute.reference {
                Some(reference) => (format!("@{}", reference), reference.name.clone()),
                None => (format!("@{}", attribute.name), attribute.name.clone()),
            };

            if name.is_empty() {
                continue;
            }

            let ty = match &attribute.ty {
                Some(ty) => session.map_type(ty, &self.referrer),
                None => RustType::Primitive(Primitive::String),
            };

            self.push(Field {
                ident: sanitize::field_name(&name),
                wire,
                ty,
                cardinality: if attribute.required {
                    Cardinality::One
                } else {
                    Cardinality::Optional
                },
            });
        }
    }

    fn particle(&mut self, session: &mut Session<'_>, particle: &Particle) -> Result<(), Error> {
        match particle {
            Particle::All(elements) => {
                for element in elements {
                    self.element(session, element, false)?;
                }
                Ok(())
            }
            Particle::Sequence(group) => self.group(session, group, false),
            Particle::Choice(group) => self.group(session, group, true),
        }
    }

    fn group(&mut self, session: &mut Session<'_>, group: &Group, choice: bool) -> Result<(), Error> {
        for item in &group.items {
            match item {
                GroupItem::Element(element) => self.element(session, element, choice)?,
                GroupItem::Sequence(group) => self.group(session, group, choice)?,
                GroupItem::Choice(group) => self.group(session, group, true)?,
                GroupItem::Any(..) => debug!("{}: skipping wildcard content", self.owner),
            }
        }

        Ok(())
    }

    fn element_type(&self, session: &mut Session<'_>, site: &Element, target: &Element) -> RustType {
        match (&target.ty, &target.inline) {
            (Some(ty), _) => session.map_type(ty, &self.referrer),

            (None, Some(..))
                if site.reference.is_some()
                    && session.table.complex_types.contains_key(&target.name) =>
            {
                RustType::Named(session.reference(&target.name, &self.referrer))
            }

            (None, Some(inline)) => {
                let wanted = format!("{}{}", self.owner, sanitize::type_name(&target.name));
                let mut ty = ComplexType::clone(inline);
                ty.name = wanted.clone();
                RustType::Named(session.declare_inline(&wanted, ty))
            }

            (None, None) => RustType::Primitive(Primitive::String),
        }
    }

    fn element(
        &mut self,
        session: &mut Session<'_>,
        element: &Element,
        choice: bool,
    ) -> Result<(), Error> {
        let target = resolve_reference(session, &self.referrer, element)?;
        let ident = sanitize::field_name(&target.name);

        // A repeated wrapper keeps its own struct so every occurrence holds a list.
        if element.reference.is_none() && !element.max_occurs.is_repeated() {
            if let Some(inner) = target.inline.as_deref().and_then(collapsible) {
                let inner_target = resolve_reference(session, &self.referrer, inner)?;
                let ty = self.element_type(session, inner, inner_target);

                self.push(Field {
                    ident,
                    wire: target.name.clone(),
                    ty,
                    cardinality: Cardinality::Nested(inner_target.name.clone()),
                });
                return Ok(());
            }
        }

        let ty = self.element_type(session, element, target);
        let cardinality = if element.max_occurs.is_repeated() {
            Cardinality::Many
        } else if choice || element.is_optional() || target.nillable {
            Cardinality::Optional
        } else {
            Cardinality::One
        };

        self.push(Field {
            ident,
            wire: target.name.clone(),
            ty,
            cardinality,
        });

        Ok(())
    }

    /// Attribute fields announcing the concrete type of an extension.
    fn wire_type_fields(&mut self) -> Vec<(String, &'static str)> {
        ["@xsi:type", "@xmlns:objtype", "@xmlns:xsi"]
            .into_iter()
            .filter_map(|wire| {
                let ident = sanitize::field_name(wire);
                self.push(Field {
                    ident,
                    wire: wire.to_owned(),
                    ty: RustType::Primitive(Primitive::String),
                    cardinality: Cardinality::Optional,
                })
                .map(|ident| (ident, wire))
            })
            .collect()
    }
}

impl Codegen for Named<'_, ComplexType> {
    fn codegen(&self, session: &mut Session<'_>) -> Result<TokenStream, Error> {
        let ident = format_ident!("{}", self.ident);
        let doc = doc_attributes(self.ident, self.item.documentation.as_deref());

        match shape(self.item) {
            Shape::Abstract => {
                return Ok(quote! {
                    #doc
                    pub type #ident = wsdl2rs_util::xml::AnyValue;
                })
            }

            Shape::Array(array_type) => {
                let item = session.map_array_item(array_type, &self.item.name).tokens();
                return Ok(quote! {
                    #doc
                    pub type #ident = Vec<#item>;
                });
            }

            Shape::AnySequence => {
                return Ok(quote! {
                    #doc
                    pub type #ident = Vec<wsdl2rs_util::xml::AnyValue>;
                })
            }

            Shape::Struct => (),
        }

        let mut builder = StructBuilder::new(self.ident, &self.item.name);
        builder.collect(session, self.item, &mut Vec::new())?;

        let mut annotations = Vec::new();

        if matches!(self.item.content, Content::Extension(..)) {
            let type_name = match session.target_namespace() {
                Some(..) => format!("objtype:{}", self.item.name),
                None => self.item.name.clone(),
            };

            for (field, wire) in builder.wire_type_fields() {
                let value = match wire {
                    "@xsi:type" => type_name.clone(),
                    "@xmlns:objtype" => match session.target_namespace() {
                        Some(namespace) => namespace.to_owned(),
                        None => continue,
                    },
                    _ => XSI_NAMESPACE.to_owned(),
                };

                let field = format_ident!("{}", field);
                annotations.push(quote! { self.#field = Some(#value.to_owned()); });
            }
        }

        let mut fields = Vec::new();
        let mut helpers = Vec::new();
        for field in &builder.fields {
            let (declaration, helper) = field.codegen(self.ident, &mut session.module_names);
            fields.push(declaration);
            helpers.push(helper);
            annotations.extend(field.annotation(session));
        }

        let derives = serde_derives();

        Ok(quote! {
            #(#helpers)*

            #doc
            #derives
            #[serde(crate = "wsdl2rs_util::serde")]
            pub struct #ident {
                #(#fields)*
            }

            impl wsdl2rs_util::xml::WireTypeAnnotatable for #ident {
                fn annotate_wire_types(&mut self) {
                    #(#annotations)*
                }
            }
        })
    }
}

/// Follows plain restrictions down to the type values are stored as.
fn underlying(session: &mut Session<'_>, base: &NamespacedName, referrer: &str) -> RustType {
    let mut base = Cow::Borrowed(base);

    for _ in 0..16 {
        if base.is_in(XSD_NAMESPACE) {
            break;
        }

        match session.table.simple_type(&base.name).map(|ty| &ty.kind) {
            Some(SimpleTypeKind::Restriction(restriction)) if restriction.enumeration.is_empty() => {
                match &restriction.base {
                    Some(next) => base = Cow::Owned(next.clone()),
                    None => return RustType::Primitive(Primitive::String),
                }
            }
            _ => break,
        }
    }

    session.map_type(&base, referrer)
}

fn integer_range(primitive: Primitive) -> (i128, i128) {
    match primitive {
        Primitive::I8 => (i8::MIN.into(), i8::MAX.into()),
        Primitive::I16 => (i16::MIN.into(), i16::MAX.into()),
        Primitive::I32 => (i32::MIN.into(), i32::MAX.into()),
        Primitive::U8 => (0, u8::MAX.into()),
        Primitive::U16 => (0, u16::MAX.into()),
        Primitive::U32 => (0, u32::MAX.into()),
        Primitive::U64 => (0, u64::MAX.into()),
        _ => (i64::MIN.into(), i64::MAX.into()),
    }
}

/// Body of `validate` for enumerated values of type `base`.
fn validator(base: &RustType, values: &[String]) -> Option<TokenStream> {
    let primitive = match base {
        RustType::Primitive(primitive) => *primitive,
        _ => return None,
    };

    match primitive {
        Primitive::String => Some(quote! { matches!(self.0.as_str(), #(#values)|*) }),

        Primitive::Bool => {
            let values = values
                .iter()
                .map(|value| match value.trim() {
                    "true" | "1" => Some(quote!(true)),
                    "false" | "0" => Some(quote!(false)),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?;
            Some(quote! { [#(#values),*].contains(&self.0) })
        }

        Primitive::F64 => {
            let values = values
                .iter()
                .map(|value| {
                    value
                        .trim()
                        .parse::<f64>()
                        .ok()
                        .filter(|value| value.is_finite())
                        .map(Literal::f64_unsuffixed)
                })
                .collect::<Option<Vec<_>>>()?;
            Some(quote! { [#(#values),*].contains(&self.0) })
        }

        Primitive::Bytes => None,

        integer => {
            let (min, max) = integer_range(integer);
            let values = values
                .iter()
                .map(|value| {
                    value
                        .trim()
                        .parse::<i128>()
                        .ok()
                        .filter(|value| (min..=max).contains(value))
                        .map(Literal::i128_unsuffixed)
                })
                .collect::<Option<Vec<_>>>()?;
            Some(quote! { [#(#values),*].contains(&self.0) })
        }
    }
}

impl Codegen for Named<'_, SimpleType> {
    fn codegen(&self, session: &mut Session<'_>) -> Result<TokenStream, Error> {
        let ident = format_ident!("{}", self.ident);
        let doc = doc_attributes(self.ident, self.item.documentation.as_deref());
        let referrer = &self.item.name;

        match &self.item.kind {
            SimpleTypeKind::Restriction(restriction) => {
                let base = match &restriction.base {
                    Some(base) => match session.map_type(base, referrer) {
                        RustType::Simple(name) if name == self.ident => {
                            RustType::Primitive(Primitive::String)
                        }
                        base => base,
                    },
                    None => RustType::Primitive(Primitive::String),
                };
                let base_tokens = base.tokens();

                if restriction.enumeration.is_empty() {
                    return Ok(quote! {
                        #doc
                        pub type #ident = #base_tokens;
                    });
                }

                let stored = match &restriction.base {
                    Some(name) => underlying(session, name, referrer),
                    None => base,
                };

                let validate = match validator(&stored, &restriction.enumeration) {
                    Some(body) => quote! {
                        impl #ident {
                            /// Whether the value is one of the enumerated literals.
                            pub fn validate(&self) -> bool {
                                #body
                            }
                        }
                    },
                    None => {
                        warn!(
                            "{}: enumeration over {:?} cannot be validated",
                            self.item.name, stored
                        );
                        quote!()
                    }
                };

                let derives = serde_derives();

                Ok(quote! {
                    #doc
                    #derives
                    #[serde(crate = "wsdl2rs_util::serde", transparent)]
                    pub struct #ident(pub #base_tokens);

                    #validate
                })
            }

            SimpleTypeKind::Union(members) => {
                let mut types = Vec::new();
                for member in members {
                    let ty = session.map_type(member, referrer);
                    if !types.contains(&ty) {
                        types.push(ty);
                    }
                }

                if types.is_empty() {
                    return Ok(quote! {
                        #doc
                        pub type #ident = wsdl2rs_util::xml::AnyValue;
                    });
                }

                let mut names = Names::default();
                let variants = types
                    .iter()
                    .map(|ty| format_ident!("{}", names.claim(&ty.variant_name(), "")))
                    .collect::<Vec<_>>();
                let types = types
                    .iter()
                    .map(|ty| {
                        let tokens = ty.tokens();
                        if ty.is_aggregate() {
                            quote!(Box<#tokens>)
                        } else {
                            tokens
                        }
                    })
                    .collect::<Vec<_>>();
                let first = &variants[0];

                Ok(quote! {
                    #doc
                    #[derive(Debug, Clone, PartialEq, wsdl2rs_util::serde::Serialize, wsdl2rs_util::serde::Deserialize)]
                    #[serde(crate = "wsdl2rs_util::serde", untagged)]
                    pub enum #ident {
                        #(#variants(#types),)*
                    }

                    impl Default for #ident {
                        fn default() -> Self {
                            Self::#first(Default::default())
                        }
                    }
                })
            }
        }
    }
}

impl Codegen for Marker {
    fn codegen(&self, _: &mut Session<'_>) -> Result<TokenStream, Error> {
        let ident = format_ident!("{}", self.ident());
        let doc = format!(
            " XML Schema `{}` value, kept in its lexical form.",
            self.xml_name()
        );
        let derives = serde_derives();

        Ok(quote! {
            #[doc = #doc]
            #derives
            #[serde(crate = "wsdl2rs_util::serde", transparent)]
            pub struct #ident(pub String);
        })
    }
}

/// Generates every simple and complex type, including the anonymous types
/// discovered along the way, keyed and ordered by identifier.
pub fn codegen_types(session: &mut Session<'_>) -> Result<BTreeMap<String, TokenStream>, Error> {
    let mut declarations = BTreeMap::new();

    let simple_types = session
        .table
        .simple_types
        .iter()
        .map(|(name, ty)| {
            let ident = session
                .simple_ident(name)
                .map_or_else(|| sanitize::type_name(name), str::to_owned);
            (ident, *ty)
        })
        .collect::<Vec<_>>();

    for (ident, item) in simple_types {
        let tokens = Named {
            ident: &ident,
            item,
        }
        .codegen(session)?;
        declarations.insert(ident, tokens);
    }

    let complex_types = session
        .table
        .complex_types
        .iter()
        .map(|(name, ty)| (session.complex_ident(name), ty.clone()))
        .collect::<Vec<_>>();

    for (ident, item) in complex_types {
        let tokens = Named {
            ident: &ident,
            item: item.as_ref(),
        }
        .codegen(session)?;
        declarations.insert(ident, tokens);
    }

    loop {
        let inline_types = session.take_inline_types();
        if inline_types.is_empty() {
            break;
        }

        for (ident, item) in inline_types {
            let tokens = Named {
                ident: &ident,
                item: &item,
            }
            .codegen(session)?;
            declarations.insert(ident, tokens);
        }
    }

    Ok(declarations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docs_are_wrapped() {
        let lines = wrap("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn generated_note_without_documentation() {
        let tokens = doc_attributes("Order", Some("  ")).to_string();
        assert!(tokens.contains("`Order` was auto-generated from WSDL."));
    }

    #[test]
    fn shapes() {
        let mut ty = ComplexType::new("Base");
        ty.is_abstract = true;
        assert!(matches!(shape(&ty), Shape::Abstract));

        let ty = ComplexType {
            content: Content::Sequence(Group {
                items: vec![GroupItem::Any(wsdl2rs_wsdl::types::Any {
                    min_occurs: 0,
                    max_occurs: wsdl2rs_wsdl::types::MaxOccurs::Unbounded,
                })],
            }),
            ..ComplexType::new("Anything")
        };
        assert!(matches!(shape(&ty), Shape::AnySequence));

        let array = |attributes| ComplexType {
            content: Content::Restriction(wsdl2rs_wsdl::types::Derivation {
                base: NamespacedName::with_namespace("Array", SOAP_ENCODING_NAMESPACE),
                particle: None,
                attributes,
            }),
            ..ComplexType::new("ArrayOfItem")
        };

        let hinted = Attribute {
            array_type: Some("tns:Item[]".into()),
            ..Default::default()
        };
        assert!(matches!(shape(&array(vec![hinted.clone()])), Shape::Array("tns:Item[]")));
        assert!(matches!(
            shape(&array(vec![hinted.clone(), hinted])),
            Shape::Struct
        ));
        assert!(matches!(shape(&array(vec![])), Shape::Struct));
    }

    #[test]
    fn validators() {
        let values = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();

        let string = validator(
            &RustType::Primitive(Primitive::String),
            &values(&["RED", "GREEN"]),
        )
        .unwrap()
        .to_string();
        assert!(string.contains("\"RED\" | \"GREEN\""));

        assert!(validator(&RustType::Primitive(Primitive::I32), &values(&["1", "-2"])).is_some());
        assert!(validator(&RustType::Primitive(Primitive::U8), &values(&["-1"])).is_none());
        assert!(validator(&RustType::Primitive(Primitive::U8), &values(&["x"])).is_none());
        assert!(validator(&RustType::Primitive(Primitive::Bool), &values(&["true"])).is_some());
        assert!(validator(&RustType::Primitive(Primitive::Bytes), &values(&["AA=="])).is_none());
        assert!(validator(&RustType::Simple("Other".into()), &values(&["x"])).is_none());
    }

    #[test]
    fn nested_helpers_claim_distinct_modules() {
        let nested = |ident: &str| Field {
            ident: ident.to_owned(),
            wire: ident.to_owned(),
            ty: RustType::Primitive(Primitive::String),
            cardinality: Cardinality::Nested("entry".to_owned()),
        };

        let mut modules = Names::default();
        let (first, first_helper) = nested("baz").codegen("FooBar", &mut modules);
        let (second, second_helper) = nested("bar_baz").codegen("Foo", &mut modules);

        assert!(first.to_string().contains("\"foo_bar_baz_wire\""));
        assert!(first_helper.to_string().contains("foo_bar_baz_wire ,"));
        assert!(second.to_string().contains("\"foo_bar_baz_wire_2\""));
        assert!(second_helper.to_string().contains("foo_bar_baz_wire_2 ,"));
    }
}
