use super::{
    codegen::{doc_attributes, serde_derives},
    mapper::RustType,
    sanitize,
    session::{Names, Session},
};
use log::debug;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use wsdl2rs_wsdl::{
    error::Error,
    types::{BindingOperation, NamespacedName, Operation, Part, PartKind},
};

/// The ident reserved for the request context parameter.
const CONTEXT: &str = "ctx";

/// The client constructor, which operations may not shadow.
const CONSTRUCTOR: &str = "new";

#[derive(Debug, Clone, PartialEq)]
struct Param {
    ident: String,
    wire: String,
    ty: RustType,
}

impl Param {
    fn declaration(&self) -> TokenStream {
        let ident = format_ident!("{}", self.ident);
        let ty = self.ty.tokens();
        quote!(#ident: #ty)
    }

    fn ident(&self) -> proc_macro2::Ident {
        format_ident!("{}", self.ident)
    }
}

struct Signature<'a> {
    operation: &'a Operation,
    name: String,
    inputs: Vec<Param>,
    outputs: Vec<Param>,
}

/// Everything generated from the port type.
#[derive(Default)]
pub struct Operations {
    pub interface: Option<TokenStream>,
    pub wrappers: Vec<(String, TokenStream)>,
    pub client: Option<TokenStream>,
    pub functions: Vec<TokenStream>,
}

/// A binding that names a port type must name the one being generated.
pub fn check_binding(session: &Session<'_>) -> Result<(), Error> {
    let binding = &session.definitions.binding;
    let port_type = &session.definitions.port_type;

    match &binding.ty {
        Some(required) if required.name != port_type.name => Err(Error::BindingMismatch {
            binding: binding.name.clone(),
            required: required.name.clone(),
            defined: port_type.name.clone(),
        }),
        _ => Ok(()),
    }
}

fn message_parts<'a>(
    session: &Session<'a>,
    operation: &Operation,
    message: Option<&NamespacedName>,
) -> Result<Vec<&'a Part>, Error> {
    let message = match message {
        Some(message) => message,
        None => return Ok(Vec::new()),
    };

    let mut parts = session
        .table
        .message(&message.name)
        .ok_or_else(|| Error::UndefinedMessage {
            operation: operation.name.clone(),
            message: message.name.clone(),
        })?
        .parts
        .iter()
        .collect::<Vec<_>>();

    if !operation.parameter_order.is_empty() {
        parts.sort_by_key(|part| {
            operation
                .parameter_order
                .iter()
                .position(|name| *name == part.name)
                .unwrap_or(usize::MAX)
        });
    }

    Ok(parts)
}

fn params(session: &mut Session<'_>, operation: &Operation, parts: &[&Part]) -> Vec<Param> {
    let mut idents = Names::default();

    parts
        .iter()
        .map(|part| {
            let (wire, ty) = match &part.kind {
                PartKind::Type(ty) => (part.name.clone(), session.map_type(ty, &operation.name)),
                PartKind::Element(element) => (
                    element.name.clone(),
                    session.map_element(element, &operation.name),
                ),
            };

            let mut ident = sanitize::field_name(&part.name);
            if ident == CONTEXT {
                ident.push('_');
            }

            Param {
                ident: idents.claim(&ident, "_"),
                wire,
                ty,
            }
        })
        .collect()
}

/// Renames outputs sharing an ident with an input.
fn resolve_conflicts(inputs: &[Param], outputs: &mut [Param]) {
    let mut idents = Names::default();

    for output in outputs.iter_mut() {
        while output.ident == CONTEXT || inputs.iter().any(|input| input.ident == output.ident) {
            output.ident = sanitize::field_name(&format!(
                "resp{}",
                sanitize::type_name(&output.ident)
            ));
        }

        output.ident = idents.claim(&output.ident, "_");
    }
}

fn signature<'a>(
    session: &mut Session<'_>,
    functions: &mut Names,
    operation: &'a Operation,
) -> Result<Signature<'a>, Error> {
    let input_parts = message_parts(session, operation, operation.input.as_ref())?;
    let output_parts = message_parts(session, operation, operation.output.as_ref())?;

    let inputs = params(session, operation, &input_parts);
    let mut outputs = params(session, operation, &output_parts);
    resolve_conflicts(&inputs, &mut outputs);

    Ok(Signature {
        operation,
        name: functions.claim_with_suffix(&sanitize::field_name(&operation.name), "_func"),
        inputs,
        outputs,
    })
}

impl Signature<'_> {
    fn declaration(&self) -> TokenStream {
        let name = format_ident!("{}", self.name);
        let params = self.inputs.iter().map(Param::declaration);
        let result = self.result();

        quote! {
            fn #name(&self, ctx: &wsdl2rs_util::soap::Context, #(#params),*) -> Result<#result, wsdl2rs_util::soap::Error>
        }
    }

    fn result(&self) -> TokenStream {
        match self.outputs.as_slice() {
            [] => quote!(()),
            [output] => output.ty.tokens(),
            outputs => {
                let types = outputs.iter().map(|output| output.ty.tokens());
                quote!((#(#types),*))
            }
        }
    }

    fn doc(&self) -> TokenStream {
        doc_attributes(&self.name, self.operation.documentation.as_deref())
    }

    /// Free function standing in for an operation without a binding.
    fn stub(&self) -> TokenStream {
        let doc = self.doc();
        let name = format_ident!("{}", self.name);
        let params = self.inputs.iter().map(Param::declaration);
        let idents = self.inputs.iter().map(Param::ident);
        let result = self.result();
        let operation = &self.operation.name;

        quote! {
            #doc
            pub fn #name(ctx: &wsdl2rs_util::soap::Context, #(#params),*) -> Result<#result, wsdl2rs_util::soap::Error> {
                let _ = (ctx, #(#idents),*);
                Err(wsdl2rs_util::soap::Error::not_implemented(#operation))
            }
        }
    }
}

fn wrapper(
    session: &Session<'_>,
    ident: &str,
    params: &[Param],
    response: bool,
) -> TokenStream {
    let ident = format_ident!("{}", ident);
    let derives = serde_derives();
    let container = if response {
        quote!(#[serde(crate = "wsdl2rs_util::serde", default)])
    } else {
        quote!(#[serde(crate = "wsdl2rs_util::serde")])
    };

    let fields = params.iter().map(|param| {
        let wire = &param.wire;
        let declaration = param.declaration();
        quote! {
            #[serde(rename = #wire)]
            #declaration,
        }
    });

    let annotations = params.iter().filter_map(|param| match &param.ty {
        RustType::Named(ty) if session.is_annotatable(ty) => {
            let field = param.ident();
            Some(quote! {
                wsdl2rs_util::xml::WireTypeAnnotatable::annotate_wire_types(&mut self.#field);
            })
        }
        _ => None,
    });

    quote! {
        #derives
        #container
        struct #ident {
            #(#fields)*
        }

        impl wsdl2rs_util::xml::WireTypeAnnotatable for #ident {
            fn annotate_wire_types(&mut self) {
                #(#annotations)*
            }
        }
    }
}

fn is_annotatable(session: &Session<'_>, ty: &RustType) -> bool {
    matches!(ty, RustType::Named(ty) if session.is_annotatable(ty))
}

/// Client method dispatching one bound operation.
fn method(
    session: &mut Session<'_>,
    signature: &Signature<'_>,
    binding: &BindingOperation,
    wrappers: &mut Vec<(String, TokenStream)>,
) -> TokenStream {
    let operation = &signature.operation.name;
    let rpc = session.definitions.binding.is_rpc(binding);
    let declaration = signature.declaration();
    let doc = signature.doc();

    let (request, element) = if rpc || signature.inputs.len() != 1 {
        let name = session
            .type_names
            .claim(&format!("Operation{}Request", sanitize::type_name(operation)), "");
        wrappers.push((
            name.clone(),
            wrapper(session, &name, &signature.inputs, false),
        ));

        let ident = format_ident!("{}", name);
        let fields = signature.inputs.iter().map(Param::ident);
        (
            quote! {
                let mut request = #ident { #(#fields),* };
                wsdl2rs_util::xml::WireTypeAnnotatable::annotate_wire_types(&mut request);
            },
            operation.clone(),
        )
    } else {
        let input = &signature.inputs[0];
        let ident = input.ident();
        let request = if is_annotatable(session, &input.ty) {
            quote! {
                let mut request = #ident;
                wsdl2rs_util::xml::WireTypeAnnotatable::annotate_wire_types(&mut request);
            }
        } else {
            quote! { let request = #ident; }
        };

        (request, input.wire.clone())
    };

    let (response, result) = match signature.outputs.as_slice() {
        [] => (
            quote!(wsdl2rs_util::serde::de::IgnoredAny),
            quote! {
                let _ = response;
                Ok(())
            },
        ),

        [output] if !rpc => (output.ty.tokens(), quote!(Ok(response))),

        outputs => {
            let name = session
                .type_names
                .claim(&format!("Operation{}Response", sanitize::type_name(operation)), "");
            wrappers.push((name.clone(), wrapper(session, &name, outputs, true)));

            let ident = format_ident!("{}", name);
            let fields = outputs.iter().map(Param::ident).collect::<Vec<_>>();
            let value = match fields.as_slice() {
                [field] => quote!(#field),
                fields => quote!((#(#fields),*)),
            };
            (
                quote!(#ident),
                quote! {
                    let #ident { #(#fields),* } = response;
                    Ok(#value)
                },
            )
        }
    };

    let call = match (&binding.soap12_action, &binding.soap11_action) {
        (Some(action), _) => quote!(round_trip_soap12(ctx, #action, #element, &request)),
        (None, Some(action)) => quote!(round_trip_with_action(ctx, #action, #element, &request)),
        (None, None) => quote!(round_trip(ctx, #element, &request)),
    };

    quote! {
        #doc
        #declaration {
            #request
            let response: #response = self.client.#call?;
            #result
        }
    }
}

/// Generates the port type interface, its SOAP client and stubs for the
/// operations no binding covers.
pub fn codegen_operations(session: &mut Session<'_>) -> Result<Operations, Error> {
    let definitions = session.definitions;
    let mut functions = Names::default();
    functions.reserve(CONSTRUCTOR);

    let mut signatures = Vec::new();
    for operation in session.table.operations.clone() {
        signatures.push(signature(session, &mut functions, operation)?);
    }

    let mut operations = Operations::default();
    let bound = !session.table.soap_operations.is_empty();
    let mut declarations = Vec::new();
    let mut methods = Vec::new();

    for signature in &signatures {
        match session.table.soap_operation(&signature.operation.name) {
            Some(binding) if bound => {
                let declaration = signature.declaration();
                let doc = signature.doc();
                declarations.push(quote! { #doc #declaration; });
                methods.push(method(session, signature, binding, &mut operations.wrappers));
            }
            _ => {
                debug!("{} has no SOAP binding", signature.operation.name);
                operations.functions.push(signature.stub());
            }
        }
    }

    if !methods.is_empty() {
        let port_type = &definitions.port_type.name;
        let interface = session.type_names.claim(&sanitize::type_name(port_type), "");
        let client = session.type_names.claim(&format!("{}Client", interface), "");

        let interface_doc = doc_attributes(&interface, None);
        let client_doc = doc_attributes(&client, definitions.service.documentation.as_deref());
        let interface = format_ident!("{}", interface);
        let client = format_ident!("{}", client);

        operations.interface = Some(quote! {
            #interface_doc
            pub trait #interface {
                #(#declarations)*
            }
        });

        operations.client = Some(quote! {
            #client_doc
            pub struct #client<R> {
                client: R,
            }

            impl<R> #client<R> {
                pub fn new(client: R) -> Self {
                    Self { client }
                }
            }

            impl<R: wsdl2rs_util::soap::RoundTripper> #interface for #client<R> {
                #(#methods)*
            }
        });
    }

    Ok(operations)
}
