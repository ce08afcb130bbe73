use log::{debug, trace};
use reqwest::{blocking::Client as Reqwest, header::CONTENT_TYPE};
use serde::{
    de::{value::UnitDeserializer, DeserializeOwned},
    Deserialize, Serialize,
};
use std::time::Duration;
use thiserror::Error;

const SOAP11_ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const SOAP12_ENVELOPE_NAMESPACE: &str = "http://www.w3.org/2003/05/soap-envelope";

/// How much of an unexpected response body is kept for the error.
const ERROR_BODY_LIMIT: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Operation {0} is not implemented")]
    NotImplemented(String),

    #[error("Unable to serialize request")]
    SerializeError(#[from] quick_xml::SeError),

    #[error("Unable to deserialize response")]
    DeserializeError(#[from] quick_xml::DeError),

    #[error("Response body is empty")]
    EmptyBody,

    #[error("SOAP fault {code}: {message}")]
    Fault { code: String, message: String },

    #[error("Server responded with status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Unable to send request")]
    ReqwestError(#[from] reqwest::Error),
}

impl Error {
    pub fn not_implemented<S: Into<String>>(operation: S) -> Self {
        Self::NotImplemented(operation.into())
    }
}

/// Per-call settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub timeout: Option<Duration>,
    /// Extra HTTP headers.
    pub headers: Vec<(String, String)>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Sends one request payload wrapped in a SOAP envelope and decodes the
/// payload of the response.
///
/// `element` names the payload root on the wire.
pub trait RoundTripper {
    fn round_trip<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        ctx: &Context,
        element: &str,
        request: &Req,
    ) -> Result<Resp, Error> {
        self.round_trip_with_action(ctx, element, element, request)
    }

    /// SOAP 1.1 exchange carrying `action` in the `SOAPAction` header.
    fn round_trip_with_action<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        ctx: &Context,
        action: &str,
        element: &str,
        request: &Req,
    ) -> Result<Resp, Error>;

    /// SOAP 1.2 exchange carrying `action` in the content type.
    fn round_trip_soap12<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        ctx: &Context,
        action: &str,
        element: &str,
        request: &Req,
    ) -> Result<Resp, Error>;
}

impl<T: RoundTripper + ?Sized> RoundTripper for &T {
    fn round_trip<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        ctx: &Context,
        element: &str,
        request: &Req,
    ) -> Result<Resp, Error> {
        (**self).round_trip(ctx, element, request)
    }

    fn round_trip_with_action<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        ctx: &Context,
        action: &str,
        element: &str,
        request: &Req,
    ) -> Result<Resp, Error> {
        (**self).round_trip_with_action(ctx, action, element, request)
    }

    fn round_trip_soap12<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        ctx: &Context,
        action: &str,
        element: &str,
        request: &Req,
    ) -> Result<Resp, Error> {
        (**self).round_trip_soap12(ctx, action, element, request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Soap11,
    Soap12,
}

impl Version {
    fn namespace(self) -> &'static str {
        match self {
            Self::Soap11 => SOAP11_ENVELOPE_NAMESPACE,
            Self::Soap12 => SOAP12_ENVELOPE_NAMESPACE,
        }
    }
}

/// Username and password carried in a SOAP header, qualified by `ns`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthHeader {
    #[serde(rename = "@xmlns:ns")]
    pub namespace: String,
    #[serde(rename = "ns:username")]
    pub username: String,
    #[serde(rename = "ns:password")]
    pub password: String,
}

impl AuthHeader {
    pub fn new<N, U, P>(namespace: N, username: U, password: P) -> Self
    where
        N: Into<String>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            namespace: namespace.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Serializes `request` as `element` inside an envelope, declaring
/// `namespace` as the payload's default namespace when given.
///
/// `header` is written verbatim into `soapenv:Header`.
pub fn envelope<Req: Serialize>(
    version: Version,
    header: Option<&str>,
    namespace: Option<&str>,
    element: &str,
    request: &Req,
) -> Result<String, Error> {
    let mut payload = quick_xml::se::to_string_with_root(element, request)?;

    if let Some(namespace) = namespace {
        let at = element.len() + 1;
        if payload.is_char_boundary(at) {
            payload.insert_str(
                at,
                &format!(" xmlns=\"{}\"", quick_xml::escape::escape(namespace)),
            );
        }
    }

    let header = header
        .map(|header| format!("<soapenv:Header>{}</soapenv:Header>", header))
        .unwrap_or_default();

    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><soapenv:Envelope xmlns:soapenv=\"{}\">{}<soapenv:Body>{}</soapenv:Body></soapenv:Envelope>",
        version.namespace(),
        header,
        payload
    ))
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "Body")]
    body: Body<T>,
}

#[derive(Debug, Deserialize)]
struct Body<T> {
    #[serde(rename = "$value")]
    content: Option<T>,
}

#[derive(Debug, Deserialize)]
struct FaultEnvelope {
    #[serde(rename = "Body")]
    body: FaultBody,
}

#[derive(Debug, Default, Deserialize)]
struct FaultBody {
    #[serde(rename = "Fault", default)]
    fault: Option<Fault>,
}

/// Fault details, covering both SOAP 1.1 and SOAP 1.2 layouts.
#[derive(Debug, Default, Deserialize)]
struct Fault {
    #[serde(rename = "faultcode", default)]
    code: Option<String>,
    #[serde(rename = "faultstring", default)]
    message: Option<String>,
    #[serde(rename = "Code", default)]
    code12: Option<FaultCode>,
    #[serde(rename = "Reason", default)]
    reason: Option<FaultReason>,
}

#[derive(Debug, Default, Deserialize)]
struct FaultCode {
    #[serde(rename = "Value", default)]
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct FaultReason {
    #[serde(rename = "Text", default)]
    text: String,
}

fn fault(response: &str) -> Option<Error> {
    let envelope = quick_xml::de::from_str::<FaultEnvelope>(response).ok()?;
    let fault = envelope.body.fault?;

    Some(Error::Fault {
        code: fault
            .code
            .or(fault.code12.map(|code| code.value))
            .unwrap_or_default(),
        message: fault
            .message
            .or(fault.reason.map(|reason| reason.text))
            .unwrap_or_default(),
    })
}

/// Decodes the payload of a response envelope, surfacing faults as errors.
pub fn parse_response<Resp: DeserializeOwned>(response: &str) -> Result<Resp, Error> {
    if let Some(fault) = fault(response) {
        return Err(fault);
    }

    let envelope = quick_xml::de::from_str::<Envelope<Resp>>(response)?;
    match envelope.body.content {
        Some(content) => Ok(content),
        None => Resp::deserialize(UnitDeserializer::<quick_xml::DeError>::new())
            .map_err(|_| Error::EmptyBody),
    }
}

/// Keeps the start of an unexpected body, dropping bytes that are not UTF-8.
fn error_body(bytes: &[u8]) -> String {
    let bytes = &bytes[..bytes.len().min(ERROR_BODY_LIMIT)];
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect()
}

/// Blocking HTTP transport for generated clients.
#[derive(Debug, Clone)]
pub struct Client {
    client: Reqwest,
    url: String,
    namespace: Option<String>,
    header: Option<String>,
}

impl Client {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self::with_client(Reqwest::new(), url)
    }

    pub fn with_client<S: Into<String>>(client: Reqwest, url: S) -> Self {
        Self {
            client,
            url: url.into(),
            namespace: None,
            header: None,
        }
    }

    /// Declares `namespace` as the default namespace of request payloads.
    pub fn with_namespace<S: Into<String>>(mut self, namespace: S) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sends `header`, serialized as `element`, with every request.
    pub fn with_soap_header<H: Serialize>(
        mut self,
        element: &str,
        header: &H,
    ) -> Result<Self, Error> {
        self.header = Some(quick_xml::se::to_string_with_root(element, header)?);
        Ok(self)
    }

    fn send<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        ctx: &Context,
        version: Version,
        action: &str,
        element: &str,
        request: &Req,
    ) -> Result<Resp, Error> {
        let body = envelope(
            version,
            self.header.as_deref(),
            self.namespace.as_deref(),
            element,
            request,
        )?;
        debug!("sending {} to {}", element, self.url);
        trace!("request envelope: {}", body);

        let mut builder = self.client.post(&self.url).body(body);

        builder = match version {
            Version::Soap11 => builder
                .header(CONTENT_TYPE, "text/xml; charset=utf-8")
                .header("SOAPAction", format!("\"{}\"", action)),
            Version::Soap12 => builder.header(
                CONTENT_TYPE,
                format!("application/soap+xml; charset=utf-8; action=\"{}\"", action),
            ),
        };

        for (name, value) in &ctx.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(timeout) = ctx.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send()?;
        let status = response.status();
        let bytes = response.bytes()?;
        trace!("response {}: {}", status, String::from_utf8_lossy(&bytes));

        if !status.is_success() {
            let body = error_body(&bytes);
            return Err(fault(&body).unwrap_or(Error::HttpStatus {
                status: status.as_u16(),
                body,
            }));
        }

        parse_response(&String::from_utf8_lossy(&bytes))
    }
}

impl RoundTripper for Client {
    fn round_trip_with_action<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        ctx: &Context,
        action: &str,
        element: &str,
        request: &Req,
    ) -> Result<Resp, Error> {
        self.send(ctx, Version::Soap11, action, element, request)
    }

    fn round_trip_soap12<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        ctx: &Context,
        action: &str,
        element: &str,
        request: &Req,
    ) -> Result<Resp, Error> {
        self.send(ctx, Version::Soap12, action, element, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Ping {
        #[serde(rename = "status")]
        status: String,
    }

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct PingResponse {
        #[serde(rename = "ok")]
        ok: bool,
    }

    #[test]
    fn envelopes_carry_the_payload() {
        let request = Ping {
            status: "up".into(),
        };

        let body = envelope(Version::Soap11, None, Some("urn:ping"), "Ping", &request).unwrap();
        assert!(body.contains(SOAP11_ENVELOPE_NAMESPACE));
        assert!(body.contains("<Ping xmlns=\"urn:ping\"><status>up</status></Ping>"), "{}", body);

        let body = envelope(Version::Soap12, None, None, "Ping", &request).unwrap();
        assert!(body.contains(SOAP12_ENVELOPE_NAMESPACE));
        assert!(body.contains("<Ping><status>up</status></Ping>"), "{}", body);
        assert!(!body.contains("soapenv:Header"));
    }

    #[test]
    fn headers_precede_the_body() {
        let header = quick_xml::se::to_string_with_root(
            "ns:AuthHeader",
            &AuthHeader::new("urn:auth", "alice", "s3cret"),
        )
        .unwrap();
        assert_eq!(
            header,
            "<ns:AuthHeader xmlns:ns=\"urn:auth\"><ns:username>alice</ns:username><ns:password>s3cret</ns:password></ns:AuthHeader>"
        );

        let request = Ping {
            status: "up".into(),
        };

        let body = envelope(Version::Soap11, Some(&header), None, "Ping", &request).unwrap();
        let expected = format!(
            "<soapenv:Header>{}</soapenv:Header><soapenv:Body><Ping><status>up</status></Ping></soapenv:Body>",
            header
        );
        assert!(body.contains(&expected), "{}", body);
    }

    #[test]
    fn clients_keep_their_header() {
        let client = Client::new("http://localhost/ping")
            .with_soap_header("ns:AuthHeader", &AuthHeader::new("urn:auth", "bob", "pw"))
            .unwrap();

        let header = client.header.as_deref().unwrap();
        assert!(header.starts_with("<ns:AuthHeader xmlns:ns=\"urn:auth\">"), "{}", header);
        assert!(header.contains("<ns:username>bob</ns:username>"), "{}", header);
    }

    #[test]
    fn responses_are_unwrapped() {
        let response: PingResponse = parse_response(
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
                 <soap:Body><PingResponse><ok>true</ok></PingResponse></soap:Body>
               </soap:Envelope>"#,
        )
        .unwrap();

        assert_eq!(response, PingResponse { ok: true });
    }

    #[test]
    fn empty_bodies_satisfy_ignored_responses() {
        let response = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body/></soap:Envelope>"#;

        assert!(parse_response::<serde::de::IgnoredAny>(response).is_ok());
        assert!(matches!(
            parse_response::<PingResponse>(response),
            Err(Error::EmptyBody)
        ));
    }

    #[test]
    fn responses_need_not_be_default() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Strict {
            #[serde(rename = "ok")]
            ok: bool,
        }

        let response: Strict = parse_response(
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><Strict><ok>false</ok></Strict></soap:Body></soap:Envelope>"#,
        )
        .unwrap();
        assert_eq!(response, Strict { ok: false });

        let empty = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body></soap:Body></soap:Envelope>"#;
        assert!(matches!(
            parse_response::<Strict>(empty),
            Err(Error::EmptyBody)
        ));
    }

    #[test]
    fn faults_become_errors() {
        let response = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
            <soap:Body>
              <soap:Fault><faultcode>soap:Server</faultcode><faultstring>down</faultstring></soap:Fault>
            </soap:Body>
          </soap:Envelope>"#;

        match parse_response::<PingResponse>(response) {
            Err(Error::Fault { code, message }) => {
                assert_eq!(code, "soap:Server");
                assert_eq!(message, "down");
            }
            result => panic!("unexpected {:?}", result),
        }
    }

    #[test]
    fn error_bodies_drop_invalid_bytes() {
        assert_eq!(error_body(b"bad \xff gateway"), "bad  gateway");
        assert_eq!(error_body(&vec![b'x'; ERROR_BODY_LIMIT + 10]).len(), ERROR_BODY_LIMIT);
    }

    #[test]
    fn not_implemented_names_the_operation() {
        let error = Error::not_implemented("Ping");
        assert_eq!(error.to_string(), "Operation Ping is not implemented");
    }
}
