use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use gff_core::{
    DecodeOptions, Document, EncodeOptions, FileType, VectorLayout, decode_with, encode,
    encode_with,
};
use gff_render::{TextRenderOptions, document_from_json, render_json, render_text, render_value};
use log::{debug, info};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum VectorsArg {
    OrientationFirst,
    VectorFirst,
}

impl From<VectorsArg> for VectorLayout {
    fn from(arg: VectorsArg) -> Self {
        match arg {
            VectorsArg::OrientationFirst => VectorLayout::OrientationFirst,
            VectorsArg::VectorFirst => VectorLayout::VectorFirst,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(value_name = "FILE")]
    path: PathBuf,
    #[arg(long)]
    json: bool,
    /// Expected file type; GFF accepts any.
    #[arg(long, value_name = "TAG", default_value = "GFF", value_parser = parse_file_type)]
    tag: FileType,
    #[arg(long, value_enum)]
    vectors: Option<VectorsArg>,
    #[arg(long, value_name = "PATH")]
    get: Vec<String>,
    #[arg(long, value_name = "PATH=VALUE", allow_hyphen_values = true)]
    set: Vec<String>,
    /// Read FILE as canonical JSON and encode it to --output.
    #[arg(long = "from-json")]
    from_json: bool,
    #[arg(long)]
    verify: bool,
    #[arg(long)]
    layout: bool,
    #[arg(long = "show-ids")]
    show_ids: bool,
    #[arg(long = "preserve-layout")]
    preserve_layout: bool,
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
}

fn parse_file_type(s: &str) -> Result<FileType, String> {
    s.parse()
}

struct Edit {
    path: String,
    value: String,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_module("gff_core", level)
        .filter_module("aurora_gff", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    if !cli.set.is_empty() && cli.output.is_none() {
        eprintln!("--set flags require --output <PATH>");
        process::exit(2);
    }
    if cli.from_json && cli.output.is_none() {
        eprintln!("--from-json requires --output <PATH>");
        process::exit(2);
    }
    let edits: Vec<Edit> = cli
        .set
        .iter()
        .map(|arg| match arg.split_once('=') {
            Some((path, value)) => Edit {
                path: path.to_string(),
                value: value.to_string(),
            },
            None => {
                eprintln!("invalid --set {arg:?}: expected PATH=VALUE");
                process::exit(2);
            }
        })
        .collect();

    match run(&cli, &edits) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

/// Returns `false` when `--verify` found a mismatch.
fn run(cli: &Cli, edits: &[Edit]) -> anyhow::Result<bool> {
    let bytes =
        fs::read(&cli.path).with_context(|| format!("reading {}", cli.path.display()))?;

    let mut document = if cli.from_json {
        let json: serde_json::Value = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing JSON from {}", cli.path.display()))?;
        let mut document = document_from_json(&json)
            .with_context(|| format!("importing {}", cli.path.display()))?;
        if let Some(vectors) = cli.vectors {
            document.set_vector_layout(vectors.into());
        }
        document
    } else {
        let options = DecodeOptions {
            vector_layout: cli.vectors.map(VectorLayout::from),
            ..DecodeOptions::expecting(cli.tag)
        };
        decode_with(&bytes, &options)
            .with_context(|| format!("decoding {}", cli.path.display()))?
    };
    debug!(
        "loaded {} {} with {} top-level fields",
        document.file_type(),
        document.version(),
        document.root().len()
    );

    let mut reported = false;
    let mut verified = true;

    if cli.layout {
        print_layout(&document);
        reported = true;
    }
    if cli.verify {
        verified = verify(&document)?;
        reported = true;
    }
    for path in &cli.get {
        let value = document
            .get(path)
            .with_context(|| format!("reading field {path}"))?;
        println!("{path}={}", render_value(value));
        reported = true;
    }

    for edit in edits {
        document
            .set_from_text(&edit.path, &edit.value)
            .with_context(|| format!("applying --set {}={}", edit.path, edit.value))?;
    }

    if let Some(output) = &cli.output {
        write_document(&document, output, cli.preserve_layout)?;
    } else if !reported {
        if cli.json {
            let json = serde_json::to_string_pretty(&render_json(&document))
                .context("serializing JSON")?;
            println!("{json}");
        } else {
            let options = TextRenderOptions {
                show_struct_ids: cli.show_ids,
            };
            print!("{}", render_text(&document, options));
        }
    }

    Ok(verified)
}

fn print_layout(document: &Document) {
    let Some(source) = document.source() else {
        println!("layout unavailable");
        return;
    };
    for section in &source.layout.sections {
        println!(
            "{:<14} offset={:<8} size={}",
            section.id.as_str(),
            section.range.start,
            section.range.len()
        );
    }
    println!(
        "contiguous={}",
        if source.layout.is_contiguous() {
            "yes"
        } else {
            "no"
        }
    );
}

/// Re-encode and re-decode; report structural equality and, for decoded
/// input, whether the layout-preserving encoder reproduces the source.
fn verify(document: &Document) -> anyhow::Result<bool> {
    let canonical = encode(document).context("re-encoding")?;
    let options = DecodeOptions {
        vector_layout: Some(document.vector_layout()),
        ..DecodeOptions::expecting(document.file_type())
    };
    let again = decode_with(&canonical, &options).context("re-decoding")?;

    let structural = again == *document;
    println!("structural={}", if structural { "ok" } else { "mismatch" });
    let mut ok = structural;

    if let Some(source) = document.source() {
        let strict = encode_with(document, &EncodeOptions::preserving_layout())
            .context("re-encoding with preserved layout")?;
        let byte_exact = strict == source.bytes;
        println!("byte_exact={}", if byte_exact { "ok" } else { "mismatch" });
        println!(
            "canonical_bytes={}",
            if canonical == source.bytes {
                "identical"
            } else {
                "differ"
            }
        );
        ok &= byte_exact;
    }

    Ok(ok)
}

fn write_document(document: &Document, output: &Path, preserve_layout: bool) -> anyhow::Result<()> {
    let bytes = encode_with(document, &EncodeOptions { preserve_layout })
        .with_context(|| format!("encoding {}", output.display()))?;
    fs::write(output, &bytes).with_context(|| format!("writing {}", output.display()))?;
    info!("wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}
