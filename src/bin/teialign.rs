//! Command-line interface for teialign
//!
//! Usage:
//!   teialign align `<source>` `<target>` [options]  - Align two TEI documents
//!   teialign defaults                             - Print the default aligner config

use clap::{Arg, ArgAction, Command};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::process;

use teialign::tei::align::AlignConfig;
use teialign::tei::group::UuidMinter;
use teialign::tei::model;
use teialign::tei::pipeline::{annotate, AnnotateRequest};
use teialign::tei::segment::RuleSplitter;

static LANG_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2}$").expect("language pattern"));

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("teialign")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Aligns two TEI documents into one annotated parallel corpus")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("align")
                .about("Align two TEI documents")
                .arg(
                    Arg::new("source")
                        .help("Path to the source TEI file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("target")
                        .help("Path to the target TEI file")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new("source-lang")
                        .long("source-lang")
                        .short('s')
                        .help("ISO 639-1 code of the source language (default: from the TEI header)"),
                )
                .arg(
                    Arg::new("target-lang")
                        .long("target-lang")
                        .short('t')
                        .help("ISO 639-1 code of the target language (default: from the TEI header)"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .help("Path to a JSON aligner configuration (see 'teialign defaults')"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Write the corpus here instead of stdout"),
                )
                .arg(
                    Arg::new("summary")
                        .long("summary")
                        .help("Print a JSON alignment summary to stderr")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("defaults").about("Print the default aligner configuration as JSON"),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("align", align_matches)) => {
            let source = align_matches.get_one::<String>("source").unwrap();
            let target = align_matches.get_one::<String>("target").unwrap();
            let source_lang = align_matches.get_one::<String>("source-lang");
            let target_lang = align_matches.get_one::<String>("target-lang");
            let config = align_matches.get_one::<String>("config");
            let output = align_matches.get_one::<String>("output");
            let summary = align_matches.get_flag("summary");
            handle_align_command(
                source,
                target,
                source_lang.map(String::as_str),
                target_lang.map(String::as_str),
                config.map(String::as_str),
                output.map(String::as_str),
                summary,
            );
        }
        Some(("defaults", _)) => handle_defaults_command(),
        _ => unreachable!("subcommand is required"),
    }
}

fn handle_align_command(
    source_path: &str,
    target_path: &str,
    source_lang: Option<&str>,
    target_lang: Option<&str>,
    config_path: Option<&str>,
    output_path: Option<&str>,
    summary: bool,
) {
    for lang in [source_lang, target_lang].into_iter().flatten() {
        if !LANG_CODE.is_match(lang) {
            eprintln!("Error: '{}' is not a two-letter lowercase language code", lang);
            process::exit(2);
        }
    }

    let source_xml = read_file(source_path);
    let target_xml = read_file(target_path);
    let config = match config_path {
        Some(path) => match serde_json::from_str::<AlignConfig>(&read_file(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: failed to read config '{}': {}", path, e);
                process::exit(2);
            }
        },
        None => AlignConfig::default(),
    };

    let mut request = AnnotateRequest::new(&source_xml, &target_xml);
    request.source_lang = source_lang;
    request.target_lang = target_lang;
    request.config = config;

    let aligner = model::handle();
    let splitter = RuleSplitter::new();
    let mut minter = UuidMinter::new();
    let out = match annotate(&request, aligner.as_ref(), &splitter, &mut minter) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if summary {
        let summary = serde_json::json!({
            "source_language": out.source_lang,
            "target_language": out.target_lang,
            "source_title": out.source_title,
            "target_title": out.target_title,
            "alignment_count": out.group_count,
            "source_units": out.source_units,
            "target_units": out.target_units,
            "processing_time_ms": out.elapsed_ms as u64,
        });
        eprintln!("{}", summary);
    }

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(Path::new(path), &out.xml) {
                eprintln!("Error: failed to write '{}': {}", path, e);
                process::exit(1);
            }
        }
        None => print!("{}", out.xml),
    }
}

fn handle_defaults_command() {
    match serde_json::to_string_pretty(&AlignConfig::default()) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn read_file(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", path, e);
            process::exit(1);
        }
    }
}
