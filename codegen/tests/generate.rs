use quote::{quote, ToTokens};
use syn::{
    Fields, ImplItem, Item, ItemEnum, ItemFn, ItemImpl, ItemStruct, ItemTrait, ItemType, TraitItem,
};
use wsdl2rs_codegen::{
    self as codegen, Error, FormatterKind, GeneratorConfig, ModuleName, Prettyplease,
};
use std::collections::BTreeMap;
use url::Url;
use wsdl2rs_wsdl::{self as wsdl, fetch::Transport, types::Definitions};

fn fixture(name: &str) -> String {
    format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn load(name: &str) -> Definitions {
    wsdl::parse(fixture(name)).unwrap()
}

fn generate(definitions: &Definitions) -> syn::File {
    let tokens = codegen::from_definitions(definitions, &GeneratorConfig::default()).unwrap();
    syn::parse2(tokens).unwrap()
}

fn text<T: ToTokens>(tokens: T) -> String {
    tokens.to_token_stream().to_string()
}

/// Token text without whitespace, so spacing between punctuation never
/// matters to a comparison.
fn squash<T: ToTokens>(tokens: T) -> String {
    text(tokens).split_whitespace().collect()
}

fn find_struct<'f>(file: &'f syn::File, name: &str) -> &'f ItemStruct {
    file.items
        .iter()
        .find_map(|item| match item {
            Item::Struct(item) if item.ident == name => Some(item),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no struct {}", name))
}

fn find_trait<'f>(file: &'f syn::File, name: &str) -> &'f ItemTrait {
    file.items
        .iter()
        .find_map(|item| match item {
            Item::Trait(item) if item.ident == name => Some(item),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no trait {}", name))
}

fn find_enum<'f>(file: &'f syn::File, name: &str) -> &'f ItemEnum {
    file.items
        .iter()
        .find_map(|item| match item {
            Item::Enum(item) if item.ident == name => Some(item),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no enum {}", name))
}

fn find_alias<'f>(file: &'f syn::File, name: &str) -> &'f ItemType {
    file.items
        .iter()
        .find_map(|item| match item {
            Item::Type(item) if item.ident == name => Some(item),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no type alias {}", name))
}

fn find_fn<'f>(file: &'f syn::File, name: &str) -> Option<&'f ItemFn> {
    file.items.iter().find_map(|item| match item {
        Item::Fn(item) if item.sig.ident == name => Some(item),
        _ => None,
    })
}

fn impls_of<'f>(file: &'f syn::File, name: &str) -> Vec<&'f ItemImpl> {
    file.items
        .iter()
        .filter_map(|item| match item {
            Item::Impl(item) if squash(&item.self_ty) == squash_str(name) => Some(item),
            _ => None,
        })
        .collect()
}

fn squash_str(text: &str) -> String {
    text.split_whitespace().collect()
}

fn attributes_text(attributes: &[syn::Attribute]) -> String {
    text(quote!(#(#attributes)*))
}

fn field_names(item: &ItemStruct) -> Vec<String> {
    item.fields
        .iter()
        .filter_map(|field| field.ident.as_ref().map(ToString::to_string))
        .collect()
}

fn find_field<'i>(item: &'i ItemStruct, name: &str) -> &'i syn::Field {
    item.fields
        .iter()
        .find(|field| field.ident.as_ref().map_or(false, |ident| ident == name))
        .unwrap_or_else(|| panic!("{} has no field {}", item.ident, name))
}

/// The field's type with whitespace removed, as in `Option<Box<Order>>`.
fn field_type(item: &ItemStruct, name: &str) -> String {
    squash(&find_field(item, name).ty)
}

/// Names of the wire helper modules declared through `nested_wire!`.
fn helper_modules(file: &syn::File) -> Vec<String> {
    file.items
        .iter()
        .filter_map(|item| match item {
            Item::Macro(item)
                if item
                    .mac
                    .path
                    .segments
                    .last()
                    .map_or(false, |segment| segment.ident == "nested_wire") =>
            {
                item.mac.tokens.clone().into_iter().next().map(text)
            }
            _ => None,
        })
        .collect()
}

fn item_name(item: &Item) -> Option<String> {
    match item {
        Item::Const(item) => Some(item.ident.to_string()),
        Item::Struct(item) => Some(item.ident.to_string()),
        Item::Trait(item) => Some(item.ident.to_string()),
        Item::Type(item) => Some(item.ident.to_string()),
        Item::Fn(item) => Some(item.sig.ident.to_string()),
        Item::Mod(item) => Some(item.ident.to_string()),
        _ => None,
    }
}

const PING_UNBOUND: &str = r#"<definitions name="Ping" targetNamespace="urn:ping"
    xmlns="http://schemas.xmlsoap.org/wsdl/"
    xmlns:tns="urn:ping"
    xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <types>
    <xsd:schema targetNamespace="urn:ping">
      <xsd:complexType name="Status">
        <xsd:sequence><xsd:element name="code" type="xsd:int"/></xsd:sequence>
      </xsd:complexType>
    </xsd:schema>
  </types>
  <message name="PingRequest"><part name="status" type="tns:Status"/></message>
  <portType name="PingPort">
    <operation name="Ping"><input message="tns:PingRequest"/></operation>
  </portType>
</definitions>"#;

/// Serves the fixtures from memory under an HTTP base.
struct MemoryTransport {
    documents: BTreeMap<&'static str, &'static str>,
}

impl MemoryTransport {
    fn new() -> Self {
        let documents = BTreeMap::from([
            (
                "http://example.com/svc/orders.wsdl",
                include_str!("data/orders.wsdl"),
            ),
            (
                "http://example.com/svc/orders.xsd",
                include_str!("data/orders.xsd"),
            ),
        ]);
        Self { documents }
    }
}

impl Transport for MemoryTransport {
    fn fetch(&self, location: &Url) -> Result<Vec<u8>, Error> {
        match self.documents.get(location.as_str()) {
            Some(document) => Ok(document.as_bytes().to_vec()),
            None => Err(Error::UnsupportedLocation(location.to_string())),
        }
    }
}

fn decode(document: &str) -> Definitions {
    wsdl::decode_definitions(document.as_bytes()).unwrap()
}

#[test]
fn rpc_operations_get_a_client() {
    let file = generate(&load("ping.wsdl"));

    let names = file.items.iter().filter_map(item_name).collect::<Vec<_>>();
    assert_eq!(names[..3], ["NAMESPACE", "DEFAULT_ENDPOINT", "PingPort"]);

    let interface = find_trait(&file, "PingPort");
    let method = interface
        .items
        .iter()
        .find_map(|item| match item {
            TraitItem::Fn(method) if method.sig.ident == "ping" => Some(method),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        squash(&method.sig.output),
        "->Result<bool,wsdl2rs_util::soap::Error>"
    );
    assert!(attributes_text(&method.attrs).contains("Checks that the service is alive."));

    let request = find_struct(&file, "OperationPingRequest");
    assert_eq!(field_type(request, "status"), "String");
    let response = find_struct(&file, "OperationPingResponse");
    assert_eq!(field_type(response, "ok"), "bool");

    find_struct(&file, "PingPortClient");
    let client = impls_of(&file, "PingPortClient<R>")
        .into_iter()
        .map(text)
        .collect::<String>();
    assert!(client.contains("round_trip_with_action"), "{}", client);
    assert!(client.contains("\"urn:ping#Ping\""), "{}", client);
    assert!(client.contains("\"Ping\""), "{}", client);
}

#[test]
fn schema_types_become_structs() {
    let file = generate(&load("orders.wsdl"));

    let color = find_struct(&file, "Color");
    assert!(matches!(color.fields, Fields::Unnamed(..)));
    assert!(attributes_text(&color.attrs).contains("Paint colors."));
    let validates = impls_of(&file, "Color").into_iter().any(|item| {
        item.items
            .iter()
            .any(|item| matches!(item, ImplItem::Fn(method) if method.sig.ident == "validate"))
    });
    assert!(validates);

    assert!(field_names(find_struct(&file, "Empty")).is_empty());

    let order = find_struct(&file, "Order");
    assert_eq!(
        field_names(order),
        ["color", "items", "note", "tags", "parent", "owner", "placed"]
    );
    assert_eq!(field_type(order, "color"), "Color");
    assert_eq!(field_type(order, "items"), "Vec<String>");
    assert_eq!(field_type(order, "note"), "Option<String>");
    assert_eq!(field_type(order, "tags"), "Vec<String>");
    assert_eq!(field_type(order, "parent"), "Option<Box<Order>>");
    assert_eq!(field_type(order, "owner"), "Box<Base>");
    assert_eq!(field_type(order, "placed"), "DateTime");

    assert_eq!(helper_modules(&file), ["order_items_wire"]);

    assert_eq!(field_type(find_struct(&file, "GetOrder"), "id"), "i32");
}

#[test]
fn extensions_flatten_their_base() {
    let file = generate(&load("orders.wsdl"));

    let derived = find_struct(&file, "Derived");
    assert_eq!(
        field_names(derived),
        ["id", "label", "xsi_type", "xmlns_objtype", "xmlns_xsi"]
    );
    assert_eq!(field_type(derived, "xsi_type"), "Option<String>");

    let annotation = impls_of(&file, "Derived")
        .into_iter()
        .map(text)
        .collect::<String>();
    assert!(annotation.contains("\"objtype:Derived\""), "{}", annotation);
    assert!(annotation.contains("\"urn:orders\""), "{}", annotation);
    assert!(
        annotation.contains("\"http://www.w3.org/2001/XMLSchema-instance\""),
        "{}",
        annotation
    );

    assert_eq!(field_names(find_struct(&file, "Base")), ["id"]);
}

#[test]
fn document_operations_use_their_binding() {
    let file = generate(&load("orders.wsdl"));

    let interface = find_trait(&file, "OrderPort");
    let declared = squash(interface);
    assert!(declared.contains("parameters:GetOrder"), "{}", declared);
    assert!(declared.contains("GetOrderResponse"), "{}", declared);
    assert!(!declared.contains("cancel"), "{}", declared);

    let client = impls_of(&file, "OrderPortClient<R>")
        .into_iter()
        .map(text)
        .collect::<String>();
    assert!(client.contains("round_trip_soap12"), "{}", client);
    assert!(client.contains("\"urn:orders#GetOrder\""), "{}", client);

    let cancel = find_fn(&file, "cancel").unwrap();
    assert!(text(&cancel.block).contains("not_implemented"));

    assert!(matches!(
        file.items.last(),
        Some(Item::Struct(item)) if item.ident == "DateTime"
    ));
}

#[test]
fn unbound_operations_come_first() {
    let file = generate(&decode(PING_UNBOUND));

    let names = file.items.iter().filter_map(item_name).collect::<Vec<_>>();
    assert_eq!(names, ["NAMESPACE", "ping", "Status"]);

    let ping = find_fn(&file, "ping").unwrap();
    assert!(squash(&ping.sig).contains("status:Status"));
}

#[test]
fn output_is_deterministic() {
    let definitions = load("orders.wsdl");
    let config = GeneratorConfig::default();

    let first = codegen::generate(&definitions, &config, &Prettyplease).unwrap();
    let second = codegen::generate(&definitions, &config, &Prettyplease).unwrap();
    assert_eq!(first, second);

    let reloaded = codegen::generate(&load("orders.wsdl"), &config, &Prettyplease).unwrap();
    assert_eq!(first, reloaded);
}

#[test]
fn imports_resolve_through_any_transport() {
    let url = Url::parse("http://example.com/svc/orders.wsdl").unwrap();
    let definitions = wsdl::load(&url, &MemoryTransport::new()).unwrap();
    let config = GeneratorConfig::default();

    assert_eq!(
        codegen::generate(&definitions, &config, &Prettyplease).unwrap(),
        codegen::generate(&load("orders.wsdl"), &config, &Prettyplease).unwrap()
    );

    let url = Url::parse("http://example.com/elsewhere/orders.wsdl").unwrap();
    assert!(wsdl::load(&url, &MemoryTransport::new()).is_err());
}

#[test]
fn output_can_be_wrapped_in_a_module() {
    let definitions = load("orders.wsdl");

    for (module, expected) in [
        (ModuleName::Named("Order Service".into()), "order_service"),
        (ModuleName::FromBinding, "orderbinding"),
    ] {
        let config = GeneratorConfig {
            module: Some(module),
        };
        let tokens = codegen::from_definitions(&definitions, &config).unwrap();
        let file: syn::File = syn::parse2(tokens).unwrap();

        assert_eq!(file.items.len(), 1);
        assert_eq!(item_name(&file.items[0]).as_deref(), Some(expected));
    }

    let formatter = FormatterKind::Prettyplease.formatter();
    let config = GeneratorConfig {
        module: Some(ModuleName::FromBinding),
    };
    let code = codegen::generate(&definitions, &config, formatter.as_ref()).unwrap();
    assert!(code.starts_with("pub mod orderbinding {"), "{}", code);
}

#[test]
fn missing_messages_are_reported() {
    let definitions = decode(
        r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/" xmlns:tns="urn:t">
          <portType name="Port">
            <operation name="Lost"><input message="tns:Nowhere"/></operation>
          </portType>
        </definitions>"#,
    );

    match codegen::declarations(&definitions, &GeneratorConfig::default()) {
        Err(Error::UndefinedMessage { operation, message }) => {
            assert_eq!(operation, "Lost");
            assert_eq!(message, "Nowhere");
        }
        result => panic!("unexpected {:?}", result.map(|_| ())),
    }

    let definitions = decode(
        r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/" xmlns:tns="urn:t"
            xmlns:xsd="http://www.w3.org/2001/XMLSchema">
          <message name="Here"><part name="id" type="xsd:int"/></message>
          <portType name="Port">
            <operation name="HalfLost">
              <input message="tns:Here"/>
              <output message="tns:Gone"/>
            </operation>
          </portType>
        </definitions>"#,
    );

    match codegen::declarations(&definitions, &GeneratorConfig::default()) {
        Err(Error::UndefinedMessage { operation, message }) => {
            assert_eq!(operation, "HalfLost");
            assert_eq!(message, "Gone");
        }
        result => panic!("unexpected {:?}", result.map(|_| ())),
    }
}

#[test]
fn bindings_must_match_the_port_type() {
    let definitions = decode(
        r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"
            xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/" xmlns:tns="urn:t">
          <portType name="Port"/>
          <binding name="Binding" type="tns:OtherPort">
            <soap:binding style="document"/>
          </binding>
        </definitions>"#,
    );

    assert!(matches!(
        codegen::declarations(&definitions, &GeneratorConfig::default()),
        Err(Error::BindingMismatch { required, defined, .. })
            if required == "OtherPort" && defined == "Port"
    ));
}

#[test]
fn undefined_types_are_reported() {
    let definitions = decode(
        r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/" targetNamespace="urn:t"
            xmlns:tns="urn:t" xmlns:xsd="http://www.w3.org/2001/XMLSchema">
          <types>
            <xsd:schema targetNamespace="urn:t">
              <xsd:complexType name="Holder">
                <xsd:sequence><xsd:element name="thing" type="tns:Missing"/></xsd:sequence>
              </xsd:complexType>
            </xsd:schema>
          </types>
        </definitions>"#,
    );

    match codegen::declarations(&definitions, &GeneratorConfig::default()) {
        Err(Error::UndefinedType { name, .. }) => assert_eq!(name, "Missing"),
        result => panic!("unexpected {:?}", result.map(|_| ())),
    }

    let definitions = decode(
        r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/" targetNamespace="urn:t"
            xmlns:tns="urn:t" xmlns:xsd="http://www.w3.org/2001/XMLSchema">
          <types>
            <xsd:schema targetNamespace="urn:t">
              <xsd:complexType name="Holder">
                <xsd:sequence><xsd:element ref="tns:absent"/></xsd:sequence>
              </xsd:complexType>
            </xsd:schema>
          </types>
        </definitions>"#,
    );

    assert!(matches!(
        codegen::declarations(&definitions, &GeneratorConfig::default()),
        Err(Error::UndefinedType { name, .. }) if name == "absent"
    ));
}

#[test]
fn repeated_wrappers_keep_their_own_struct() {
    let file = generate(&load("shapes.wsdl"));

    let holder = find_struct(&file, "Holder");
    assert_eq!(field_type(holder, "groups"), "Vec<HolderGroups>");
    assert_eq!(field_type(holder, "single"), "Vec<String>");

    let groups = find_struct(&file, "HolderGroups");
    assert_eq!(field_names(groups), ["item"]);
    assert_eq!(field_type(groups, "item"), "Vec<String>");

    let groups_attributes = squash_str(&attributes_text(&find_field(holder, "groups").attrs));
    assert!(!groups_attributes.contains("with="), "{}", groups_attributes);
    let single_attributes = squash_str(&attributes_text(&find_field(holder, "single").attrs));
    assert!(
        single_attributes.contains("with=\"holder_single_wire\""),
        "{}",
        single_attributes
    );
}

#[test]
fn schema_shapes_map_to_rust_types() {
    let file = generate(&load("shapes.wsdl"));

    let bounded = find_struct(&file, "Crate");
    assert_eq!(field_type(bounded, "slot"), "Vec<String>");
    assert_eq!(field_type(bounded, "label"), "String");

    let pick = find_struct(&file, "Pick");
    assert_eq!(field_type(pick, "left"), "Option<i32>");
    assert_eq!(field_type(pick, "right"), "Option<String>");

    let either = find_enum(&file, "Either");
    assert!(squash_str(&attributes_text(&either.attrs)).contains("untagged"));
    let variants = either
        .variants
        .iter()
        .map(|variant| variant.ident.to_string())
        .collect::<Vec<_>>();
    assert_eq!(variants, ["I32", "String"]);
    let default = impls_of(&file, "Either")
        .into_iter()
        .find(|item| item.trait_.as_ref().map_or(false, |(_, path, _)| squash(path) == "Default"))
        .map(squash)
        .unwrap();
    assert!(default.contains("Self::I32(Default::default())"), "{}", default);

    assert_eq!(squash(&find_alias(&file, "ArrayOfItem").ty), "Vec<Item>");
    assert_eq!(
        squash(&find_alias(&file, "Shape").ty),
        "wsdl2rs_util::xml::AnyValue"
    );
    assert_eq!(field_names(find_struct(&file, "Item")), ["name"]);
}

#[test]
fn helper_modules_never_collide() {
    let file = generate(&load("shapes.wsdl"));

    let mut modules = helper_modules(&file);
    modules.sort();
    assert_eq!(
        modules,
        ["foo_bar_baz_wire", "foo_bar_baz_wire_2", "holder_single_wire"]
    );

    let with = |owner: &str, field: &str| {
        let attributes = squash_str(&attributes_text(
            &find_field(find_struct(&file, owner), field).attrs,
        ));
        modules
            .iter()
            .find(|module| attributes.contains(&format!("with=\"{}\"", module)))
            .cloned()
            .unwrap_or_else(|| panic!("{}.{} has no helper: {}", owner, field, attributes))
    };

    assert_ne!(with("Foo", "bar_baz"), with("FooBar", "baz"));
}
