use std::{
    env, fs,
    io::{self, Read, Write},
    path::PathBuf,
    process,
};

use log::{info, LevelFilter};
use structopt::StructOpt;
use thiserror::Error;
use url::Url;

use wsdl2rs_codegen::{self as codegen, FormatterKind, GeneratorConfig, ModuleName};
use wsdl2rs_wsdl::{
    self as wsdl,
    fetch::{ClientIdentity, DefaultTransport, TransportConfig},
};

/// Location meaning standard input or standard output.
const STDIO: &str = "-";

#[derive(Debug, Error)]
enum Error {
    #[error("{0}")]
    GenerateError(#[from] wsdl::error::Error),

    #[error("Unable to read input or write output: {0}")]
    IoError(#[from] io::Error),
}

#[derive(StructOpt)]
#[structopt(about = "Generates Rust SOAP clients from WSDL documents")]
struct Args {
    /// WSDL file path or URL, `-` reads standard input
    #[structopt(short, long, default_value = "-")]
    input: String,

    /// Output file, `-` writes standard output
    #[structopt(short, long, default_value = "-")]
    output: String,

    /// Wrap the generated code in a module of this name
    #[structopt(long, conflicts_with = "module-from-binding")]
    module: Option<String>,

    /// Wrap the generated code in a module named after the binding
    #[structopt(long)]
    module_from_binding: bool,

    /// Accept invalid TLS certificates when fetching
    #[structopt(long)]
    insecure: bool,

    /// PEM client certificate used when fetching
    #[structopt(long, parse(from_os_str), requires = "key")]
    cert: Option<PathBuf>,

    /// PEM private key for the client certificate
    #[structopt(long, parse(from_os_str), requires = "cert")]
    key: Option<PathBuf>,

    /// Formatter for the generated code: prettyplease or rustfmt
    #[structopt(long, default_value = "prettyplease")]
    formatter: FormatterKind,

    /// More logging, repeat for more
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

impl Args {
    fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            insecure: self.insecure,
            identity: match (&self.cert, &self.key) {
                (Some(certificate), Some(key)) => Some(ClientIdentity {
                    certificate: certificate.clone(),
                    key: key.clone(),
                }),
                _ => None,
            },
        }
    }

    fn generator_config(&self) -> GeneratorConfig {
        let module = match (&self.module, self.module_from_binding) {
            (Some(module), _) => Some(ModuleName::Named(module.clone())),
            (None, true) => Some(ModuleName::FromBinding),
            (None, false) => None,
        };

        GeneratorConfig { module }
    }

    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn read_input(input: &str, transport: &DefaultTransport) -> Result<wsdl::types::Definitions, Error> {
    if input != STDIO {
        let url = wsdl::location(input)?;
        return Ok(wsdl::load(&url, transport)?);
    }

    let mut bytes = Vec::new();
    io::stdin().lock().read_to_end(&mut bytes)?;

    // Relative imports in standard input resolve against the working directory.
    let base = Url::from_directory_path(env::current_dir()?)
        .map_err(|()| wsdl::error::Error::PathConversionError(None))?
        .join(STDIO)
        .map_err(wsdl::error::Error::from)?;

    Ok(wsdl::from_bytes(&bytes, &base, transport)?)
}

fn write_output(output: &str, code: &str) -> Result<(), Error> {
    if output == STDIO {
        io::stdout().lock().write_all(code.as_bytes())?;
    } else {
        fs::write(output, code)?;
    }

    Ok(())
}

fn run(args: &Args) -> Result<(), Error> {
    let transport = DefaultTransport::new(&args.transport_config())?;
    let definitions = read_input(&args.input, &transport)?;

    let formatter = args.formatter.formatter();
    let code = codegen::generate(&definitions, &args.generator_config(), formatter.as_ref())?;

    // Nothing is written unless generation and formatting succeeded.
    write_output(&args.output, &code)?;
    info!("wrote {} byte(s) to {}", code.len(), args.output);

    Ok(())
}

fn report(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(error) = source {
        message.push_str(": ");
        message.push_str(&error.to_string());
        source = error.source();
    }

    message
}

#[paw::main]
fn main(args: Args) {
    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    if let Err(error) = run(&args) {
        eprintln!("wsdl2rs: {}", report(&error));
        process::exit(1);
    }
}
