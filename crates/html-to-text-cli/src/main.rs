//! Command-line interface for the html-to-text converter.
//!
//! Reads HTML from a file, an HTTP URL, or standard input, converts it to
//! Markdown-structured plain text, and writes the result to standard output
//! or a file.

mod fetch;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use encoding_rs::Encoding;
use html_to_text::{convert_to_writer, ConversionError, ConversionOptions};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(
    name = "html-to-text",
    version,
    about = "Convert HTML documents into Markdown-structured plain text"
)]
struct Cli {
    /// HTML file to convert; reads standard input when omitted or "-"
    input: Option<PathBuf>,

    /// Fetch the HTML document from an HTTP URL instead of a file
    #[arg(long, conflicts_with = "input", value_name = "URL")]
    url: Option<String>,

    /// Write output to a file instead of standard output
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Emit typographic characters as literal Unicode instead of ASCII
    /// approximations
    #[arg(long)]
    unicode: bool,

    /// Put link references after each paragraph instead of at the end of
    /// the document
    #[arg(long)]
    links_each_paragraph: bool,

    /// Character encoding of the input document (e.g. utf-8, windows-1252)
    #[arg(long, value_name = "LABEL")]
    encoding: Option<String>,

    /// User-Agent header sent with --url requests
    #[arg(long, requires = "url", value_name = "AGENT")]
    user_agent: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Generate a shell completion script and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    generate_completion: Option<Shell>,

    /// Generate a man page and exit
    #[arg(long)]
    generate_man: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Error reading file {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        source: io::Error,
    },
    #[error("Error reading standard input: {0}")]
    ReadStdin(io::Error),
    #[error("Error fetching {url}: {source}")]
    Fetch {
        url: String,
        source: fetch::FetchError,
    },
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),
    #[error("Error writing {}: {source}", .path.display())]
    WriteFile {
        path: PathBuf,
        source: io::Error,
    },
    #[error("Error writing output: {0}")]
    Convert(#[from] ConversionError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Some(shell) = cli.generate_completion {
        clap_complete::generate(
            shell,
            &mut Cli::command(),
            "html-to-text",
            &mut io::stdout(),
        );
        return ExitCode::SUCCESS;
    }
    if cli.generate_man {
        let man = clap_mangen::Man::new(Cli::command());
        if let Err(error) = man.render(&mut io::stdout()) {
            eprintln!("Error generating man page: {error}");
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let (bytes, content_type) = read_input(cli)?;
    let html = decode_html(&bytes, cli.encoding.as_deref(), content_type.as_deref())?;

    let options = ConversionOptions::default()
        .with_unicode(cli.unicode)
        .with_links_each_paragraph(cli.links_each_paragraph);

    match &cli.output {
        Some(path) => {
            let file = fs::File::create(path).map_err(|source| CliError::WriteFile {
                path: path.clone(),
                source,
            })?;
            convert_to_writer(&html, &options, io::BufWriter::new(file))?;
        }
        None => {
            let stdout = io::stdout();
            convert_to_writer(&html, &options, io::BufWriter::new(stdout.lock()))?;
        }
    }
    Ok(())
}

fn read_input(cli: &Cli) -> Result<(Vec<u8>, Option<String>), CliError> {
    if let Some(url) = &cli.url {
        let user_agent = cli
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("html-to-text/{}", env!("CARGO_PKG_VERSION")));
        let document = fetch::fetch(url, &user_agent).map_err(|source| CliError::Fetch {
            url: url.clone(),
            source,
        })?;
        log::debug!("fetched {} bytes from {url}", document.body.len());
        return Ok((document.body, document.content_type));
    }

    match cli.input.as_deref() {
        Some(path) if path != Path::new("-") => {
            let bytes = fs::read(path).map_err(|source| CliError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;
            Ok((bytes, None))
        }
        _ => {
            let mut bytes = Vec::new();
            io::stdin()
                .read_to_end(&mut bytes)
                .map_err(CliError::ReadStdin)?;
            Ok((bytes, None))
        }
    }
}

/// Decode raw input bytes using, in priority order: the `--encoding` flag,
/// the charset from an HTTP `Content-Type` header, then UTF-8.
fn decode_html(
    bytes: &[u8],
    encoding_flag: Option<&str>,
    content_type: Option<&str>,
) -> Result<String, CliError> {
    let encoding = if let Some(label) = encoding_flag {
        Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| CliError::UnknownEncoding(label.to_string()))?
    } else if let Some(label) = content_type.and_then(charset_from_content_type) {
        // A bogus server-provided charset falls back to UTF-8 rather than
        // failing the whole fetch.
        Encoding::for_label(label.as_bytes()).unwrap_or(encoding_rs::UTF_8)
    } else {
        encoding_rs::UTF_8
    };
    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        log::debug!("input contained byte sequences invalid for {}", actual.name());
    }
    Ok(text.into_owned())
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}
