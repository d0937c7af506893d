//! quire - inspect EPUB publications

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use quire::{Publication, ResolvedView};

#[derive(Parser)]
#[command(name = "quire")]
#[command(version, about = "Inspect EPUB publications", long_about = None)]
#[command(after_help = "EXAMPLES:
    quire info book.epub              Show title, author and description
    quire toc book.epub               Print the table of contents as JSON
    quire renditions book.epub        List rendition keys
    quire cover book.epub cover.png   Extract the cover as PNG")]
struct Cli {
    /// Rendition key to inspect (default: the default rendition)
    #[arg(short, long, global = true)]
    rendition: Option<String>,

    /// Log fallback decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show bibliographic information
    Info { input: String },
    /// Print the navigation tree as JSON
    Toc { input: String },
    /// List declared renditions
    Renditions { input: String },
    /// Write the cover image as PNG
    Cover { input: String, output: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "quire=debug" } else { "quire=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn run(cli: &Cli) -> quire::Result<()> {
    match &cli.command {
        Command::Info { input } => {
            let publication = Publication::open(input)?;
            let view = select(&publication, cli.rendition.as_deref())?;
            show_info(input, &view);
        }
        Command::Toc { input } => {
            let publication = Publication::open(input)?;
            let view = select(&publication, cli.rendition.as_deref())?;
            println!("{}", view.table_of_contents()?.to_json_pretty()?);
        }
        Command::Renditions { input } => {
            let publication = Publication::open(input)?;
            for rendition in publication.renditions() {
                println!("{}\t{}", rendition.key, rendition.package_path());
            }
        }
        Command::Cover { input, output } => {
            let publication = Publication::open(input)?;
            let view = select(&publication, cli.rendition.as_deref())?;
            match view.cover_bytes()? {
                Some(png) => std::fs::write(output, png)?,
                None => eprintln!("no cover found"),
            }
        }
    }
    Ok(())
}

fn select<'a>(publication: &'a Publication, key: Option<&str>) -> quire::Result<ResolvedView<'a>> {
    match key {
        Some(key) => publication.select_rendition(key),
        None => Ok(publication.view()),
    }
}

fn show_info(path: &str, view: &ResolvedView<'_>) {
    println!("File: {path}");
    println!("Rendition: {}", view.key());
    println!("Title: {}", view.title());
    println!("Author: {}", view.author());
    let language = view.language();
    if !language.is_empty() {
        println!("Language: {language}");
    }
    if let Some(uid) = view.uid() {
        println!("Identifier: {uid}");
    }
    let description = view.description();
    let description = description.trim();
    if !description.is_empty() {
        match description.char_indices().nth(200) {
            Some((cut, _)) => println!("Description: {}...", &description[..cut]),
            None => println!("Description: {description}"),
        }
    }
    println!("Spine items: {}", view.spine().len());
    if let Ok(toc) = view.table_of_contents() {
        println!("TOC entries: {}", toc.len());
    }
    println!("Images: {}", view.image_ids().len());
}
