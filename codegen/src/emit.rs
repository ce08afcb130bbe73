use log::debug;
use proc_macro2::TokenStream;
use std::{
    env,
    ffi::OsString,
    io::Write,
    process::{Command, Stdio},
    str::FromStr,
};
use wsdl2rs_wsdl::error::Error;

/// Turns checked source into its final text.
pub trait Formatter {
    fn name(&self) -> &str;

    fn format(&self, file: &syn::File, source: &str) -> Result<String, Error>;
}

/// Formats in-process.
#[derive(Debug, Clone, Copy, Default)]
pub struct Prettyplease;

impl Formatter for Prettyplease {
    fn name(&self) -> &str {
        "prettyplease"
    }

    fn format(&self, file: &syn::File, _: &str) -> Result<String, Error> {
        Ok(prettyplease::unparse(file))
    }
}

/// Pipes the source through an external `rustfmt`, taken from `$RUSTFMT`
/// when set.
#[derive(Debug, Clone)]
pub struct Rustfmt {
    program: OsString,
}

impl Rustfmt {
    pub fn new<S: Into<OsString>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Rustfmt {
    fn default() -> Self {
        Self::new(env::var_os("RUSTFMT").unwrap_or_else(|| "rustfmt".into()))
    }
}

impl Formatter for Rustfmt {
    fn name(&self) -> &str {
        "rustfmt"
    }

    fn format(&self, _: &syn::File, source: &str) -> Result<String, Error> {
        debug!("formatting with {:?}", self.program);

        let unavailable = |source: std::io::Error| Error::FormatterUnavailable {
            name: self.program.to_string_lossy().into_owned(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(["--edition", "2021"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(unavailable)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(source.as_bytes())?;
        }

        let output = child.wait_with_output()?;

        if !output.status.success() {
            return Err(Error::FormatterFailed {
                name: self.name().to_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|error| Error::FormatterFailed {
            name: self.name().to_owned(),
            stderr: error.to_string(),
        })
    }
}

/// Formatter choice as named on a command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatterKind {
    #[default]
    Prettyplease,
    Rustfmt,
}

impl FormatterKind {
    pub fn formatter(self) -> Box<dyn Formatter> {
        match self {
            Self::Prettyplease => Box::new(Prettyplease),
            Self::Rustfmt => Box::new(Rustfmt::default()),
        }
    }
}

impl FromStr for FormatterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prettyplease" => Ok(Self::Prettyplease),
            "rustfmt" => Ok(Self::Rustfmt),
            other => Err(format!(
                "unknown formatter {:?}, expected prettyplease or rustfmt",
                other
            )),
        }
    }
}

fn listing(source: &str) -> String {
    source
        .lines()
        .enumerate()
        .map(|(index, line)| format!("{:5}\t{}", index + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses `source` as a complete file, reporting failures with a numbered
/// listing of the offending text.
pub fn check(source: &str) -> Result<syn::File, Error> {
    syn::parse_file(source).map_err(|error| {
        let start = error.span().start();
        Error::GeneratedSyntaxError {
            message: format!("{}:{}: {}", start.line, start.column, error),
            listing: listing(source),
        }
    })
}

/// Joins the declarations, checks the result parses and formats it.
pub fn emit(declarations: &[TokenStream], formatter: &dyn Formatter) -> Result<String, Error> {
    let source = declarations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n\n");

    let file = check(&source)?;
    formatter.format(&file, &source)
}
