use log::debug;
use std::{borrow::Cow, collections::BTreeMap};
use wsdl2rs_wsdl::types::{
    BindingOperation, ComplexType, Content, Definitions, Element, Group, GroupItem, Message,
    Operation, Particle, SimpleType,
};

/// Lookup tables over one resolved document, keyed by local name.
#[derive(Debug, Default)]
pub struct SymbolTable<'a> {
    pub simple_types: BTreeMap<String, &'a SimpleType>,
    pub complex_types: BTreeMap<String, Cow<'a, ComplexType>>,
    pub elements: BTreeMap<String, &'a Element>,
    /// Port type operations in document order.
    pub operations: Vec<&'a Operation>,
    pub messages: BTreeMap<String, &'a Message>,
    pub soap_operations: BTreeMap<String, &'a BindingOperation>,
}

impl<'a> SymbolTable<'a> {
    pub fn build(definitions: &'a Definitions) -> Self {
        let schema = &definitions.schema;
        let mut table = Self::default();

        // Top-level elements declaring an anonymous type name that type.
        for element in &schema.elements {
            if let (None, Some(inline)) = (&element.ty, &element.inline) {
                let mut ty = ComplexType::clone(inline);
                ty.name = element.name.clone();
                table
                    .complex_types
                    .insert(element.name.clone(), Cow::Owned(ty));
            }
        }

        for ty in &schema.simple_types {
            table.simple_types.insert(ty.name.clone(), ty);
        }

        for ty in &schema.complex_types {
            table.complex_types.insert(ty.name.clone(), Cow::Borrowed(ty));
        }

        table.register_elements(&schema.elements);
        for ty in &schema.complex_types {
            table.register_content(ty);
        }

        table.operations = definitions.port_type.operations.iter().collect();

        for message in &definitions.messages {
            table.messages.insert(message.name.clone(), message);
        }

        for operation in &definitions.binding.operations {
            table.soap_operations.insert(operation.name.clone(), operation);
        }

        debug!(
            "cached {} simple type(s), {} complex type(s), {} element(s), {} operation(s), {} message(s), {} SOAP operation(s)",
            table.simple_types.len(),
            table.complex_types.len(),
            table.elements.len(),
            table.operations.len(),
            table.messages.len(),
            table.soap_operations.len(),
        );

        table
    }

    fn register_elements(&mut self, elements: &'a [Element]) {
        for element in elements {
            self.register_element(element);
        }
    }

    fn register_element(&mut self, element: &'a Element) {
        if element.name.is_empty() || element.reference.is_some() {
            return;
        }

        if self.elements.contains_key(&element.name) {
            return;
        }

        self.elements.insert(element.name.clone(), element);

        if let Some(inline) = &element.inline {
            self.register_content(inline);
        }
    }

    fn register_content(&mut self, ty: &'a ComplexType) {
        match &ty.content {
            Content::All(elements) => self.register_elements(elements),
            Content::Sequence(group) | Content::Choice(group) => self.register_group(group),
            Content::Extension(derivation) | Content::Restriction(derivation) => {
                match &derivation.particle {
                    Some(Particle::All(elements)) => self.register_elements(elements),
                    Some(Particle::Sequence(group) | Particle::Choice(group)) => {
                        self.register_group(group)
                    }
                    None => (),
                }
            }
            Content::Simple(..) | Content::Empty => (),
        }
    }

    fn register_group(&mut self, group: &'a Group) {
        for item in &group.items {
            match item {
                GroupItem::Element(element) => self.register_element(element),
                GroupItem::Sequence(group) | GroupItem::Choice(group) => self.register_group(group),
                GroupItem::Any(..) => (),
            }
        }
    }

    pub fn simple_type(&self, name: &str) -> Option<&'a SimpleType> {
        self.simple_types.get(name).copied()
    }

    pub fn complex_type(&self, name: &str) -> Option<&ComplexType> {
        self.complex_types.get(name).map(AsRef::as_ref)
    }

    pub fn element(&self, name: &str) -> Option<&'a Element> {
        self.elements.get(name).copied()
    }

    pub fn message(&self, name: &str) -> Option<&'a Message> {
        self.messages.get(name).copied()
    }

    pub fn soap_operation(&self, name: &str) -> Option<&'a BindingOperation> {
        self.soap_operations.get(name).copied()
    }
}
