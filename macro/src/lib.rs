extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote_spanned;
use std::{env, path::PathBuf};
use syn::{parse_macro_input, LitStr};
use wsdl2rs_codegen::{self as codegen, GeneratorConfig};
use wsdl2rs_wsdl::{self as wsdl, error::Error};

/// Relative paths are taken from the invoking crate's manifest directory,
/// not from wherever the compiler happens to run.
fn resolve(location: &str) -> String {
    if url_like(location) {
        return location.to_owned();
    }

    match env::var_os("CARGO_MANIFEST_DIR") {
        Some(dir) => PathBuf::from(dir).join(location).display().to_string(),
        None => location.to_owned(),
    }
}

fn url_like(location: &str) -> bool {
    location
        .split_once("://")
        .map_or(false, |(scheme, _)| !scheme.is_empty())
}

fn expand(location: &str) -> Result<proc_macro2::TokenStream, Error> {
    let definitions = wsdl::parse(resolve(location))?;
    codegen::from_definitions(&definitions, &GeneratorConfig::default())
}

/// Expands to the client generated for the WSDL document at the given
/// path or URL.
///
/// ```ignore
/// wsdl2rs_macro::wsdl2rs!("service.wsdl");
/// ```
#[proc_macro]
pub fn wsdl2rs(input: TokenStream) -> TokenStream {
    let location = parse_macro_input!(input as LitStr);

    match expand(&location.value()) {
        Ok(tokens) => tokens.into(),
        Err(error) => {
            let message = format!("wsdl2rs: {}", error);
            quote_spanned!(location.span() => compile_error!(#message);).into()
        }
    }
}
