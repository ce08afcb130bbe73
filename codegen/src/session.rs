use super::{
    cache::SymbolTable,
    codegen::{shape, Shape},
    mapper::Marker,
    sanitize,
};
use std::collections::{BTreeMap, BTreeSet};
use wsdl2rs_wsdl::{
    error::Error,
    types::{ComplexType, Definitions, NamespacedName},
};

/// Identifiers already handed out within one generated scope.
#[derive(Debug, Default)]
pub struct Names(BTreeSet<String>);

impl Names {
    pub fn reserve<S: Into<String>>(&mut self, name: S) {
        self.0.insert(name.into());
    }

    /// Claims `wanted`, or `wanted` followed by the first free counter.
    pub fn claim(&mut self, wanted: &str, separator: &str) -> String {
        let mut candidate = wanted.to_owned();
        let mut counter = 1;

        while !self.0.insert(candidate.clone()) {
            counter += 1;
            candidate = format!("{}{}{}", wanted, separator, counter);
        }

        candidate
    }

    /// Claims `wanted`, appending `suffix` until the name is free.
    pub fn claim_with_suffix(&mut self, wanted: &str, suffix: &str) -> String {
        let mut candidate = wanted.to_owned();

        while !self.0.insert(candidate.clone()) {
            candidate.push_str(suffix);
        }

        candidate
    }
}

/// State shared by every generator over one document.
pub struct Session<'a> {
    pub definitions: &'a Definitions,
    pub table: SymbolTable<'a>,
    pub type_names: Names,
    /// Names of generated wire helper modules.
    pub module_names: Names,
    simple_idents: BTreeMap<String, String>,
    complex_idents: BTreeMap<String, String>,
    annotatable: BTreeSet<String>,
    referenced: BTreeMap<String, String>,
    markers: BTreeSet<Marker>,
    inline_types: Vec<(String, ComplexType)>,
}

impl<'a> Session<'a> {
    pub fn new(definitions: &'a Definitions) -> Self {
        let table = SymbolTable::build(definitions);
        let mut type_names = Names::default();

        for marker in Marker::ALL {
            type_names.reserve(marker.ident());
        }

        let simple_idents = table
            .simple_types
            .keys()
            .map(|name| {
                let ident = type_names.claim(&sanitize::type_name(name), "");
                (name.clone(), ident)
            })
            .collect::<BTreeMap<_, _>>();

        let complex_idents = table
            .complex_types
            .keys()
            .map(|name| {
                let ident = type_names.claim(&sanitize::type_name(name), "");
                (name.clone(), ident)
            })
            .collect::<BTreeMap<_, _>>();

        let annotatable = table
            .complex_types
            .iter()
            .filter(|(_, ty)| matches!(shape(ty), Shape::Struct))
            .filter_map(|(name, _)| complex_idents.get(name).cloned())
            .collect();

        Self {
            definitions,
            table,
            type_names,
            module_names: Names::default(),
            simple_idents,
            complex_idents,
            annotatable,
            referenced: BTreeMap::new(),
            markers: BTreeSet::new(),
            inline_types: Vec::new(),
        }
    }

    pub fn simple_ident(&self, name: &str) -> Option<&str> {
        self.simple_idents.get(name).map(String::as_str)
    }

    pub fn complex_ident(&self, name: &str) -> String {
        self.complex_idents
            .get(name)
            .cloned()
            .unwrap_or_else(|| sanitize::type_name(name))
    }

    /// Records a reference to the complex type `name` and returns its
    /// identifier.
    pub fn reference(&mut self, name: &str, referrer: &str) -> String {
        self.referenced
            .entry(name.to_owned())
            .or_insert_with(|| referrer.to_owned());

        self.complex_ident(name)
    }

    /// Fails on the first referenced complex type that no schema declares.
    pub fn check_references(&self) -> Result<(), Error> {
        match self
            .referenced
            .iter()
            .find(|(name, _)| !self.table.complex_types.contains_key(name.as_str()))
        {
            Some((name, referrer)) => Err(Error::UndefinedType {
                referrer: referrer.clone(),
                name: name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Whether values of type `ident` carry a wire type annotation hook.
    pub fn is_annotatable(&self, ident: &str) -> bool {
        self.annotatable.contains(ident)
    }

    pub fn mark_annotatable(&mut self, ident: &str) {
        self.annotatable.insert(ident.to_owned());
    }

    pub fn use_marker(&mut self, marker: Marker) {
        self.markers.insert(marker);
    }

    pub fn markers(&self) -> impl Iterator<Item = Marker> + '_ {
        self.markers.iter().copied()
    }

    /// Names an anonymous complex type and queues it for generation.
    pub fn declare_inline(&mut self, wanted: &str, ty: ComplexType) -> String {
        let ident = self.type_names.claim(&sanitize::type_name(wanted), "");

        if matches!(shape(&ty), Shape::Struct) {
            self.mark_annotatable(&ident);
        }

        self.inline_types.push((ident.clone(), ty));
        ident
    }

    pub fn take_inline_types(&mut self) -> Vec<(String, ComplexType)> {
        std::mem::take(&mut self.inline_types)
    }

    /// Resolves a `prefix:name` attribute value against the schema and
    /// document namespace declarations.
    pub fn resolve_prefixed(&self, value: &str) -> NamespacedName {
        let (prefix, name) = match value.split_once(':') {
            Some((prefix, name)) => (Some(prefix), name),
            None => (None, value),
        };

        let namespace = prefix.and_then(|prefix| {
            self.definitions
                .schema
                .namespaces
                .get(prefix)
                .or_else(|| self.definitions.namespaces.get(prefix))
        });

        NamespacedName {
            prefix: prefix.map(str::to_owned),
            namespace: namespace.map(str::to_owned),
            name: name.to_owned(),
        }
    }

    pub fn target_namespace(&self) -> Option<&'a str> {
        self.definitions
            .target_namespace
            .as_deref()
            .or(self.definitions.schema.target_namespace.as_deref())
    }
}
