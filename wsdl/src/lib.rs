use std::path::Path;
use url::Url;

mod parser;

pub mod error;
pub mod fetch;
pub mod import;
pub mod types;

pub use parser::{decode, decode_definitions, decode_schema, Document};

/// Interprets `location` as an absolute URL, or as a filesystem path when
/// it has no scheme.
pub fn location<S: AsRef<str>>(location: S) -> Result<Url, error::Error> {
    match Url::parse(location.as_ref()) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::from_file_path(
            Path::new(location.as_ref())
                .canonicalize()
                .map_err(|err| error::Error::PathConversionError(Some(err)))?,
        )
        .map_err(|()| error::Error::PathConversionError(None)),
        Err(err) => Err(err.into()),
    }
}

/// Fetches, decodes and import-resolves the interface description at `url`.
pub fn load<T: fetch::Transport + ?Sized>(
    url: &Url,
    transport: &T,
) -> Result<types::Definitions, error::Error> {
    let bytes = transport.fetch(url)?;
    from_bytes(&bytes, url, transport)
}

/// Decodes `bytes` and resolves their imports relative to `url`.
pub fn from_bytes<T: fetch::Transport + ?Sized>(
    bytes: &[u8],
    url: &Url,
    transport: &T,
) -> Result<types::Definitions, error::Error> {
    let mut definitions = decode_definitions(bytes)?;
    import::ImportResolver::new(transport).resolve(&mut definitions, url)?;
    Ok(definitions)
}

pub fn parse<S: AsRef<str>>(url: S) -> Result<types::Definitions, error::Error> {
    let url = location(url)?;
    let transport = fetch::DefaultTransport::new(&Default::default())?;
    load(&url, &transport)
}
