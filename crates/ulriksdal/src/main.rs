#![forbid(unsafe_code)]

//! Ulriksdal CLI: build and check signed SAML 2.0 Responses.

use clap::error::ErrorKind;
use clap::{ArgGroup, CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;
use ulriksdal_core::{algorithm, Error};
use ulriksdal_dsig::verify::VerifyResult;
use ulriksdal_dsig::DsigContext;
use ulriksdal_saml::{post, AttributeMap, PostForm, SamlError, SsoRequest};

#[derive(Parser)]
#[command(
    name = "ulriksdal",
    about = "Ulriksdal: signed SAML 2.0 Responses for the HTTP-POST binding",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and sign a SAML Response
    #[command(group(ArgGroup::new("format").args(["xml", "form"])))]
    Response {
        /// Entity ID of the Identity Provider
        #[arg(long)]
        issuer: String,

        /// Entity ID of the Service Provider
        #[arg(long)]
        audience: String,

        /// NameID of the authenticated user
        #[arg(long)]
        subject: String,

        /// Assertion consumer service URL
        #[arg(long)]
        recipient: String,

        /// Assertion lifetime in minutes
        #[arg(long = "expiration-minutes", default_value_t = ulriksdal_saml::DEFAULT_EXPIRATION_MINUTES)]
        expiration_minutes: u32,

        /// Attribute to assert (NAME=VALUE, repeatable, kept in order)
        #[arg(long = "attr", value_name = "NAME=VALUE")]
        attrs: Vec<String>,

        /// Signing certificate (PEM or DER)
        #[arg(long)]
        cert: PathBuf,

        /// Private key of the certificate (PEM or DER)
        #[arg(short = 'k', long)]
        key: PathBuf,

        /// Publish this name in KeyInfo
        #[arg(long = "key-name")]
        key_name: Option<String>,

        /// Digest algorithm for the assertion reference
        #[arg(long, value_enum, default_value_t = DigestArg::Sha256)]
        digest: DigestArg,

        /// Leave the certificate out of the signature
        #[arg(long = "no-key-info")]
        no_key_info: bool,

        /// Print the signed XML instead of base64
        #[arg(long)]
        xml: bool,

        /// Print an auto-submitting HTML form
        #[arg(long)]
        form: bool,

        /// RelayState for the HTML form
        #[arg(long = "relay-state", requires = "form")]
        relay_state: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Verify the signature of a Response (base64 or XML)
    Verify {
        /// Input file
        file: PathBuf,

        /// Verify with this certificate instead of the embedded one
        #[arg(long)]
        cert: Option<PathBuf>,

        /// Register additional ID attribute names
        #[arg(long = "id-attr")]
        id_attr: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List supported algorithms and key types
    Info,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DigestArg {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestArg {
    fn uri(self) -> &'static str {
        match self {
            DigestArg::Sha1 => algorithm::SHA1,
            DigestArg::Sha256 => algorithm::SHA256,
            DigestArg::Sha384 => algorithm::SHA384,
            DigestArg::Sha512 => algorithm::SHA512,
        }
    }
}

enum OutputFormat {
    Base64,
    Xml,
    Form { relay_state: Option<String> },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Response {
            issuer,
            audience,
            subject,
            recipient,
            expiration_minutes,
            attrs,
            cert,
            key,
            key_name,
            digest,
            no_key_info,
            xml,
            form,
            relay_state,
            output,
            verbose,
        } => {
            init_logging(verbose);
            let format = if xml {
                OutputFormat::Xml
            } else if form {
                OutputFormat::Form { relay_state }
            } else {
                OutputFormat::Base64
            };
            let attributes = match parse_attributes(&attrs) {
                Ok(attributes) => attributes,
                Err(msg) => Cli::command().error(ErrorKind::ValueValidation, msg).exit(),
            };
            let request = SsoRequest {
                issuer,
                expiration_minutes,
                audience,
                subject,
                recipient,
                attributes,
            };
            let ctx = DsigContext::default()
                .with_digest_method(digest.uri())
                .with_key_info(!no_key_info);
            cmd_response(&ctx, &request, &cert, &key, key_name, format, output)
        }

        Commands::Verify {
            file,
            cert,
            id_attr,
            verbose,
        } => {
            init_logging(verbose);
            cmd_verify(&file, cert.as_deref(), &id_attr)
        }

        Commands::Info => cmd_info(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` wins over the default level.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_response(
    ctx: &DsigContext,
    request: &SsoRequest,
    cert: &Path,
    key: &Path,
    key_name: Option<String>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<(), SamlError> {
    let mut credential = ulriksdal_keys::loader::load_credential_files(cert, key)?;
    if let Some(name) = key_name {
        credential.name = Some(name);
    }

    let signed = ulriksdal_saml::signed_response_xml(ctx, request, &credential)?;
    let out = match format {
        OutputFormat::Xml => signed,
        OutputFormat::Base64 => post::encode(&signed),
        OutputFormat::Form { relay_state } => {
            let form = PostForm::new(request.recipient.trim(), post::encode(&signed));
            match relay_state {
                Some(state) => form.with_relay_state(state).to_html(),
                None => form.to_html(),
            }
        }
    };
    write_output(output, out.as_bytes())?;
    Ok(())
}

fn cmd_verify(file: &Path, cert: Option<&Path>, id_attr: &[String]) -> Result<(), SamlError> {
    let input = read_file(file)?;
    let xml = if input.trim_start().starts_with('<') {
        input
    } else {
        post::decode(&input)?
    };

    let key = cert
        .map(ulriksdal_keys::loader::load_key_file)
        .transpose()?;
    let mut ctx = DsigContext::default();
    for attr in id_attr {
        ctx.add_id_attr(attr);
    }

    tracing::debug!(file = %file.display(), "verifying");
    match ulriksdal_dsig::verify::verify(&ctx, &xml, key.as_ref())? {
        VerifyResult::Valid => {
            println!("OK");
            Ok(())
        }
        VerifyResult::Invalid { reason } => {
            eprintln!("INVALID: {reason}");
            process::exit(1);
        }
    }
}

fn cmd_info() -> Result<(), SamlError> {
    println!("Ulriksdal: signed SAML 2.0 Responses");
    println!();
    println!("Supported digest algorithms:");
    for uri in algorithm::DIGESTS {
        println!("  {uri}");
    }
    println!();
    println!("Supported signature algorithms:");
    for uri in algorithm::SIGNATURES {
        println!("  {uri}");
    }
    println!();
    println!("Supported transforms and canonicalization:");
    for uri in algorithm::TRANSFORMS {
        println!("  {uri}");
    }
    println!();
    println!("Supported key formats:");
    println!("  PEM, DER (RSA PKCS#1/PKCS#8, EC P-256/P-384 SEC1/PKCS#8, X.509)");
    Ok(())
}

// ── Utility functions ────────────────────────────────────────────────

/// Parse `NAME=VALUE` pairs in command-line order.
fn parse_attributes(specs: &[String]) -> Result<AttributeMap, String> {
    let mut map = AttributeMap::new();
    for spec in specs {
        match spec.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                map.insert(name.trim(), value);
            }
            _ => return Err(format!("invalid --attr '{spec}' (expected NAME=VALUE)")),
        }
    }
    Ok(map)
}

fn read_file(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|e| Error::Other(format!("{}: {e}", path.display())))
}

fn write_output(path: Option<PathBuf>, data: &[u8]) -> Result<(), Error> {
    match path {
        Some(p) => std::fs::write(&p, data).map_err(|e| Error::Other(format!("{}: {e}", p.display()))),
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout();
            stdout
                .write_all(data)
                .and_then(|()| stdout.write_all(b"\n"))
                .map_err(|e| Error::Other(format!("stdout: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn attributes_keep_command_line_order() {
        let specs = vec!["role=admin".to_owned(), "email=a=b@example.com".to_owned()];
        let map = parse_attributes(&specs).unwrap();
        let pairs: Vec<(&str, &str)> = map.iter().collect();
        assert_eq!(pairs, [("role", "admin"), ("email", "a=b@example.com")]);
        assert_eq!(
            parse_attributes(&["novalue".to_owned()]).unwrap_err(),
            "invalid --attr 'novalue' (expected NAME=VALUE)"
        );
        assert!(parse_attributes(&["=x".to_owned()]).is_err());
    }

    #[test]
    fn response_flags_parse() {
        let cli = Cli::try_parse_from([
            "ulriksdal", "response",
            "--issuer", "https://idp.example.com",
            "--audience", "https://sp.example.com",
            "--subject", "alice@example.com",
            "--recipient", "https://sp.example.com/acs",
            "--attr", "role=admin",
            "--cert", "cert.pem", "--key", "key.pem",
            "--digest", "sha512", "--form", "--relay-state", "abc",
        ])
        .unwrap();
        match cli.command {
            Commands::Response { digest, form, relay_state, expiration_minutes, .. } => {
                assert!(digest == DigestArg::Sha512);
                assert!(form);
                assert_eq!(relay_state.as_deref(), Some("abc"));
                assert_eq!(expiration_minutes, 5);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn xml_and_form_are_exclusive() {
        let result = Cli::try_parse_from([
            "ulriksdal", "response",
            "--issuer", "i", "--audience", "a", "--subject", "s", "--recipient", "r",
            "--cert", "c", "--key", "k", "--xml", "--form",
        ]);
        assert!(result.is_err());
    }
}
