use log::info;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use wsdl2rs_wsdl::{self as wsdl, types::Definitions};

pub use wsdl2rs_wsdl::error::{self, Error};

mod cache;
mod codegen;
pub mod config;
pub mod emit;
mod mapper;
mod operations;
pub mod sanitize;
mod session;

use codegen::Codegen;
pub use config::{GeneratorConfig, ModuleName};
pub use emit::{Formatter, FormatterKind, Prettyplease, Rustfmt};

pub fn from_url<S: AsRef<str>>(url: S) -> Result<TokenStream, Error> {
    let definitions = wsdl::parse(url)?;
    from_definitions(&definitions, &GeneratorConfig::default())
}

/// Generated code for `definitions` as a single checked token stream.
pub fn from_definitions(
    definitions: &Definitions,
    config: &GeneratorConfig,
) -> Result<TokenStream, Error> {
    let declarations = declarations(definitions, config)?;
    let tokens = quote! { #(#declarations)* };
    emit::check(&tokens.to_string())?;
    Ok(tokens)
}

/// Generated code for `definitions` as formatted source text.
pub fn generate(
    definitions: &Definitions,
    config: &GeneratorConfig,
    formatter: &dyn Formatter,
) -> Result<String, Error> {
    emit::emit(&declarations(definitions, config)?, formatter)
}

fn constants(session: &session::Session<'_>) -> Vec<TokenStream> {
    let mut constants = Vec::new();

    if let Some(namespace) = session.target_namespace() {
        constants.push(quote! {
            /// Target namespace of the service.
            pub const NAMESPACE: &str = #namespace;
        });
    }

    let address = session
        .definitions
        .service
        .ports
        .iter()
        .find_map(|port| port.address.as_deref());

    if let Some(address) = address {
        constants.push(quote! {
            /// Address of the first port the service declares.
            pub const DEFAULT_ENDPOINT: &str = #address;
        });
    }

    constants
}

/// Every generated declaration, in output order.
///
/// With a SOAP binding the interface comes first, then the types, the
/// client and any unbound operations. Without one, the operation stubs
/// precede the types. Date and time markers always come last.
pub fn declarations(
    definitions: &Definitions,
    config: &GeneratorConfig,
) -> Result<Vec<TokenStream>, Error> {
    let mut session = session::Session::new(definitions);

    operations::check_binding(&session)?;
    let operations = operations::codegen_operations(&mut session)?;
    let mut types = codegen::codegen_types(&mut session)?;
    session.check_references()?;

    types.extend(operations.wrappers);

    let mut declarations = constants(&session);
    let function_count = operations.functions.len();

    match (operations.interface, operations.client) {
        (Some(interface), Some(client)) => {
            declarations.push(interface);
            declarations.extend(types.into_values());
            declarations.push(client);
            declarations.extend(operations.functions);
        }
        _ => {
            declarations.extend(operations.functions);
            declarations.extend(types.into_values());
        }
    }

    for marker in session.markers().collect::<Vec<_>>() {
        declarations.push(marker.codegen(&mut session)?);
    }

    info!(
        "generated {} declaration(s), {} unbound operation(s)",
        declarations.len(),
        function_count
    );

    match config.module_name(&definitions.binding.name) {
        Some(module) => {
            let module = format_ident!("{}", module);
            Ok(vec![quote! {
                pub mod #module {
                    #(#declarations)*
                }
            }])
        }
        None => Ok(declarations),
    }
}
