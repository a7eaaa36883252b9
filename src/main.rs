use clap::{Parser, ValueEnum};
use spanmark::{RenderOptions, SoftBreakBehavior};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// A lossless CommonMark parser and renderer.
#[derive(Parser)]
#[command(name = "spanmark", version)]
struct Cli {
    /// Input files; reads standard input when none are given.
    files: Vec<PathBuf>,

    /// Output format.
    #[arg(short = 't', long = "to", value_enum, default_value = "html")]
    to: Format,

    /// Write output to a file instead of standard output.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip HTML blocks and raw inline HTML.
    #[arg(long)]
    ignore_raw: bool,

    /// How soft line breaks are rendered.
    #[arg(long, value_enum, default_value = "preserve")]
    soft_break: SoftBreak,

    /// Escape raw tags on the GFM tagfilter blacklist.
    #[arg(long)]
    gfm_tag_filter: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Html,
    Commonmark,
}

#[derive(Clone, Copy, ValueEnum)]
enum SoftBreak {
    Preserve,
    Space,
    Harden,
}

fn run(cli: &Cli) -> io::Result<()> {
    let mut input = Vec::new();
    if cli.files.is_empty() {
        io::stdin().read_to_end(&mut input)?;
    } else {
        for path in &cli.files {
            input.extend_from_slice(&fs::read(path)?);
        }
    }

    let options = RenderOptions {
        ignore_raw: cli.ignore_raw,
        soft_break: match cli.soft_break {
            SoftBreak::Preserve => SoftBreakBehavior::Preserve,
            SoftBreak::Space => SoftBreakBehavior::Space,
            SoftBreak::Harden => SoftBreakBehavior::Harden,
        },
        tag_filter: if cli.gfm_tag_filter {
            Some(Arc::new(spanmark::gfm_tag_filter))
        } else {
            None
        },
    };

    let (roots, refmap) = spanmark::parse(&input);

    let mut out: Vec<u8> = Vec::new();
    match cli.to {
        Format::Html => spanmark::render_html(&mut out, &roots, &refmap, &options)?,
        Format::Commonmark => spanmark::format_document(&mut out, &roots)?,
    }

    match &cli.output {
        Some(path) => fs::write(path, &out),
        None => io::stdout().write_all(&out),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("spanmark: {}", err);
        process::exit(1);
    }
}
