use log::debug;
use reqwest::blocking::Client;
use std::{fs, path::PathBuf};
use url::Url;

use super::error::Error;

/// Retrieves the raw bytes behind a document location.
pub trait Transport {
    fn fetch(&self, location: &Url) -> Result<Vec<u8>, Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub certificate: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportConfig {
    /// Accept invalid TLS certificates.
    pub insecure: bool,
    pub identity: Option<ClientIdentity>,
}

/// Reads `file://` locations from disk and `http(s)://` locations with a
/// blocking HTTP client.
pub struct DefaultTransport {
    client: Client,
}

impl DefaultTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        let mut builder = Client::builder().danger_accept_invalid_certs(config.insecure);

        if let Some(identity) = &config.identity {
            let certificate = fs::read(&identity.certificate)?;
            let key = fs::read(&identity.key)?;
            builder = builder.identity(reqwest::Identity::from_pkcs8_pem(&certificate, &key)?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Transport for DefaultTransport {
    fn fetch(&self, location: &Url) -> Result<Vec<u8>, Error> {
        debug!("fetching {}", location);

        match location.scheme() {
            "file" => {
                let path = location
                    .to_file_path()
                    .map_err(|()| Error::PathConversionError(None))?;
                Ok(fs::read(path)?)
            }

            "http" | "https" => {
                let response = self
                    .client
                    .get(location.clone())
                    .send()?
                    .error_for_status()?;
                Ok(response.bytes()?.to_vec())
            }

            _ => Err(Error::UnsupportedLocation(location.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempdir::TempDir;

    #[test]
    fn reads_local_files() {
        let dir = TempDir::new("wsdl2rs-fetch").unwrap();
        let path = dir.path().join("service.wsdl");
        File::create(&path)
            .unwrap()
            .write_all(b"<definitions/>")
            .unwrap();

        let transport = DefaultTransport::new(&TransportConfig::default()).unwrap();
        let bytes = transport.fetch(&Url::from_file_path(&path).unwrap()).unwrap();
        assert_eq!(bytes, b"<definitions/>");
    }

    #[test]
    fn rejects_unsupported_schemes() {
        let transport = DefaultTransport::new(&TransportConfig::default()).unwrap();
        let error = transport
            .fetch(&Url::parse("ftp://example.com/service.wsdl").unwrap())
            .unwrap_err();
        assert!(matches!(error, Error::UnsupportedLocation(..)));
    }

    #[test]
    fn missing_files_are_io_errors() {
        let dir = TempDir::new("wsdl2rs-fetch").unwrap();
        let transport = DefaultTransport::new(&TransportConfig::default()).unwrap();
        let error = transport
            .fetch(&Url::from_file_path(dir.path().join("missing.xsd")).unwrap())
            .unwrap_err();
        assert!(matches!(error, Error::IoError(..)));
    }
}
