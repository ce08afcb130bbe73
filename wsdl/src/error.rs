use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Unable to resolve import {location}: {source}")]
    UnresolvedImport {
        location: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Unsupported location {0}")]
    UnsupportedLocation(String),

    #[error("Operation {operation:?} wants message {message:?} but it's not defined")]
    UndefinedMessage { operation: String, message: String },

    #[error("{referrer} references type {name:?} but it's not defined")]
    UndefinedType { referrer: String, name: String },

    #[error("Binding {binding:?} requires port type {required:?} but {defined:?} is defined")]
    BindingMismatch {
        binding: String,
        required: String,
        defined: String,
    },

    #[error("Generated bad code: {message}\n{listing}")]
    GeneratedSyntaxError { message: String, listing: String },

    #[error("Unable to run formatter {name}")]
    FormatterUnavailable {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Formatter {name} failed: {stderr}")]
    FormatterFailed { name: String, stderr: String },

    #[error("Unable to parse provided URL")]
    UrlParseError(#[from] url::ParseError),

    #[error("Unable to convert provided path")]
    PathConversionError(Option<std::io::Error>),

    #[error("Unable to read input")]
    IoError(#[from] std::io::Error),

    #[error("Unable to get file from server")]
    ReqwestError(#[from] reqwest::Error),
}

impl Error {
    pub(crate) fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedDocument(message.into())
    }
}
