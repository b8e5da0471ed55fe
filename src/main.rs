//! voxbook - EPUB and PDF to audiobook converter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use env_logger::{Builder, Env};

use voxbook::convert::{
    CommandSynthesizer, ConvertConfig, Converter, DEFAULT_LANGUAGES, DEFAULT_MAX_CHUNK_CHARS,
    VoiceCatalog,
};
use voxbook::epub::{EpubArchive, parse_package};
use voxbook::{Error, ExtractOptions, extract, normalize, split_chunks};

#[derive(Parser)]
#[command(name = "voxbook")]
#[command(version, about = "EPUB and PDF to audiobook converter", long_about = None)]
#[command(after_help = "EXAMPLES:
    voxbook chapters book.epub                        List chapters
    voxbook text book.pdf --max-chars 5000            Print synthesis chunks
    voxbook voices voices.json --lang es              List Spanish voices
    voxbook convert book.epub out/book.mp3 --voice es-ES-AlvaroNeural --split")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// More log output (-v, -vv); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// List the chapters of a document
    Chapters {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Print chapters, with content, as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the cleaned text of a document
    Text {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Split the text into synthesis chunks of at most N characters
        #[arg(long, value_name = "N")]
        max_chars: Option<usize>,

        /// Print the chunks as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// List voices from a voice catalog (JSON)
    Voices {
        #[arg(value_name = "CATALOG")]
        catalog: PathBuf,

        /// Language codes to keep
        #[arg(long, value_delimiter = ',', value_name = "CODES")]
        lang: Vec<String>,
    },

    /// Convert a document to audio
    Convert(ConvertArgs),
}

#[derive(Args)]
struct ConvertArgs {
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output audio file; chapter files are named after it
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Voice name or short name
    #[arg(long)]
    voice: String,

    /// Voice catalog to check the voice against
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Write one file per chapter
    #[arg(long)]
    split: bool,

    /// Chapter numbers to convert (1-based), implies --split
    #[arg(long, value_delimiter = ',', value_name = "LIST")]
    chapters: Vec<usize>,

    /// Maximum characters per synthesis request
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_CHUNK_CHARS)]
    max_chars: usize,

    /// Text-to-speech program; audio is read from its stdout
    #[arg(long, value_name = "PROGRAM", default_value = "edge-tts")]
    tts_program: String,

    /// Argument template for the program ({voice} and {text} are substituted)
    #[arg(long = "tts-arg", value_name = "ARG", allow_hyphen_values = true)]
    tts_args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let result = match cli.command {
        Command::Chapters { input, json } => list_chapters(&input, json),
        Command::Text {
            input,
            max_chars,
            json,
        } => print_text(&input, max_chars, json),
        Command::Voices { catalog, lang } => list_voices(&catalog, &lang),
        Command::Convert(args) => convert(args, cli.quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn is_epub(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("epub"))
}

fn list_chapters(input: &Path, json: bool) -> Result<(), Error> {
    let options = ExtractOptions::new().with_split_chapters(true);
    let chapters = extract(input, &options)?.into_chapters(&input.display().to_string());

    if json {
        let out = serde_json::to_string_pretty(&chapters)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    println!("File: {}", input.display());
    if is_epub(input) {
        let mut archive = EpubArchive::open(input)?;
        let meta = parse_package(&mut archive)?.metadata;
        if !meta.title.is_empty() {
            println!("Title: {}", meta.title);
        }
        if !meta.authors.is_empty() {
            println!("Authors: {}", meta.authors.join(", "));
        }
        if !meta.language.is_empty() {
            println!("Language: {}", meta.language);
        }
    }
    println!("Chapters: {}", chapters.len());
    for (i, chapter) in chapters.iter().enumerate() {
        println!(
            "{:>4}. {} ({} chars)",
            i + 1,
            chapter.title,
            chapter.content.chars().count()
        );
    }
    Ok(())
}

fn print_text(input: &Path, max_chars: Option<usize>, json: bool) -> Result<(), Error> {
    let text = extract(input, &ExtractOptions::new())?.into_text();

    let chunks = match max_chars {
        Some(0) => return Err(Error::InvalidInput("--max-chars must be positive".into())),
        Some(max) => split_chunks(&voxbook::text::normalize_paragraphs(&text), max),
        None => vec![normalize(&text)],
    };

    if json {
        let out = serde_json::to_string_pretty(&chunks)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        println!("{out}");
    } else {
        println!("{}", chunks.join("\n\n----\n\n"));
    }
    Ok(())
}

fn list_voices(catalog: &Path, languages: &[String]) -> Result<(), Error> {
    let catalog = VoiceCatalog::load(catalog)?;
    let voices = if languages.is_empty() {
        catalog.filter_languages(DEFAULT_LANGUAGES)
    } else {
        catalog.filter_languages(languages)
    };

    for voice in voices.voices() {
        println!(
            "{:<32} {:<8} {:<8} {}",
            voice.short_name, voice.gender, voice.language, voice.name
        );
    }
    Ok(())
}

fn convert(args: ConvertArgs, quiet: bool) -> Result<(), Error> {
    let voice = match &args.catalog {
        Some(path) => VoiceCatalog::load(path)?.require(&args.voice)?.short_name.clone(),
        None => args.voice.clone(),
    };

    let mut config = ConvertConfig::new(voice)
        .with_max_chunk_chars(args.max_chars)
        .with_split_chapters(args.split || !args.chapters.is_empty());
    if !args.chapters.is_empty() {
        config = config.with_selected_chapters(args.chapters);
    }

    let synthesizer = if args.tts_args.is_empty() {
        CommandSynthesizer::default().with_program(&args.tts_program)
    } else {
        CommandSynthesizer::new(&args.tts_program, args.tts_args)
    };

    let converter = Converter::new(synthesizer, config);
    let files = converter.convert_file(&args.input, &args.output, |done, total| {
        if !quiet {
            eprint!("\r{done}/{total}");
        }
    })?;
    if !quiet {
        eprintln!();
        for file in &files {
            println!("{}", file.display());
        }
    }
    Ok(())
}
