use log::{debug, info};
use std::collections::BTreeSet;
use url::Url;

use super::{
    error::Error,
    fetch::Transport,
    parser::{self, Document},
    types::{Definitions, Import, Schema},
};

/// Merges every document reachable through `import` and `include`
/// directives into the document that declares them.
///
/// Each location is fetched at most once per resolver, so cyclic imports
/// terminate. Nested imports are followed depth-first in document order.
pub struct ImportResolver<'a, T: Transport + ?Sized> {
    transport: &'a T,
    visited: BTreeSet<String>,
}

fn normalize(location: &Url) -> String {
    let mut location = location.clone();
    location.set_fragment(None);
    location.to_string()
}

fn unresolved(location: &str, error: Error) -> Error {
    match error {
        Error::UnsupportedLocation(..) | Error::UnresolvedImport { .. } => error,
        error => Error::UnresolvedImport {
            location: location.to_owned(),
            source: Box::new(error),
        },
    }
}

fn clear_directives(schema: &mut Schema) {
    schema.imports.clear();
    schema.includes.clear();
}

/// Root-level merge: messages are appended, a non-empty port type, binding
/// or service replaces the current one.
fn merge_definitions(definitions: &mut Definitions, imported: Definitions) {
    if definitions.target_namespace.is_none() {
        definitions.target_namespace = imported.target_namespace;
    }

    definitions.namespaces.merge(&imported.namespaces);
    definitions.messages.extend(imported.messages);
    definitions.schema.merge(imported.schema);

    if !imported.port_type.name.is_empty() {
        definitions.port_type = imported.port_type;
    }

    if !imported.binding.name.is_empty() {
        definitions.binding = imported.binding;
    }

    if !imported.service.name.is_empty() {
        definitions.service = imported.service;
    }
}

impl<'a, T: Transport + ?Sized> ImportResolver<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self {
            transport,
            visited: BTreeSet::new(),
        }
    }

    /// Resolves all imports of `definitions`, which was itself read from
    /// `location`.
    pub fn resolve(&mut self, definitions: &mut Definitions, location: &Url) -> Result<(), Error> {
        self.visited.insert(normalize(location));
        self.resolve_definitions(definitions, location)?;

        info!(
            "resolved imports from {} location(s): {} simple type(s), {} complex type(s), {} element(s)",
            self.visited.len(),
            definitions.schema.simple_types.len(),
            definitions.schema.complex_types.len(),
            definitions.schema.elements.len(),
        );

        Ok(())
    }

    /// Resolves the directives of a standalone schema fragment.
    pub fn resolve_schema(&mut self, schema: &mut Schema, location: &Url) -> Result<(), Error> {
        self.visited.insert(normalize(location));
        self.resolve_schema_directives(schema, location)
    }

    fn next_location(&mut self, import: &Import, base: &Url) -> Result<Option<Url>, Error> {
        let location = match &import.location {
            Some(location) => location,
            None => return Ok(None),
        };

        let url = base
            .join(location)
            .map_err(|error| unresolved(location, error.into()))?;

        if self.visited.insert(normalize(&url)) {
            Ok(Some(url))
        } else {
            debug!("skipping already imported {}", url);
            Ok(None)
        }
    }

    fn fetch(&self, location: &Url) -> Result<Document, Error> {
        let bytes = self
            .transport
            .fetch(location)
            .map_err(|error| unresolved(location.as_str(), error))?;

        parser::decode(&bytes).map_err(|error| unresolved(location.as_str(), error))
    }

    fn resolve_definitions(&mut self, definitions: &mut Definitions, base: &Url) -> Result<(), Error> {
        let imports = definitions.imports.clone();

        for import in &imports {
            let location = match self.next_location(import, base)? {
                Some(location) => location,
                None => continue,
            };

            debug!("importing definitions from {}", location);

            match self.fetch(&location)? {
                Document::Definitions(mut imported) => {
                    self.resolve_definitions(&mut imported, &location)?;
                    imported.imports.clear();
                    clear_directives(&mut imported.schema);
                    merge_definitions(definitions, imported);
                }

                Document::Schema(mut schema) => {
                    self.resolve_schema_directives(&mut schema, &location)?;
                    clear_directives(&mut schema);
                    definitions.schema.merge(schema);
                }
            }
        }

        let mut schema = std::mem::take(&mut definitions.schema);
        let result = self.resolve_schema_directives(&mut schema, base);
        definitions.schema = schema;
        result
    }

    fn resolve_schema_directives(&mut self, schema: &mut Schema, base: &Url) -> Result<(), Error> {
        let directives = schema
            .imports
            .iter()
            .chain(&schema.includes)
            .cloned()
            .collect::<Vec<_>>();

        for directive in &directives {
            let location = match self.next_location(directive, base)? {
                Some(location) => location,
                None => continue,
            };

            debug!("importing schema from {}", location);

            let mut fragment = match self.fetch(&location)? {
                Document::Schema(fragment) => fragment,
                Document::Definitions(definitions) => {
                    let mut fragment = definitions.schema;
                    fragment.namespaces.merge(&definitions.namespaces);
                    fragment
                }
            };

            self.resolve_schema_directives(&mut fragment, &location)?;
            clear_directives(&mut fragment);
            schema.merge(fragment);
        }

        Ok(())
    }
}
