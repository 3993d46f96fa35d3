//! Command-line interface for the markers map compiler
//! Compiles a RelaxNG schema file into the markers map and writes it as
//! JSON, optionally patching it into a template file.
//!
//! Usage:
//!   markers `<schema.rng>` [--schema-version `<v>`] [--output `<file>`]
//!   markers `<schema.rng>` --template `<file>`      - Patch a template in place

mod provenance;
mod template;

use std::fs;
use std::path::Path;

use clap::{Arg, ArgAction, Command};
use markers_compiler::{compile, CompileOptions, MarkersMap};

fn main() {
    let matches = Command::new("markers")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compiles the USX schema into the markers map")
        .arg_required_else_help(true)
        .arg(
            Arg::new("schema")
                .help("Path to the RelaxNG schema file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("schema-version")
                .long("schema-version")
                .help("Schema version to record (default: latest git tag of the schema repo)"),
        )
        .arg(
            Arg::new("commit")
                .long("commit")
                .help("Commit to record (default: HEAD of the schema repo, '-dirty' suffixed)"),
        )
        .arg(
            Arg::new("base")
                .long("base")
                .help("Previously compiled map (JSON) to layer this schema onto"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Write the map to this file instead of stdout"),
        )
        .arg(
            Arg::new("template")
                .long("template")
                .help("Patch the markers-map region of this file in place"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Suppress warnings and the skipped-definition report")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let schema_path = matches
        .get_one::<String>("schema")
        .expect("schema is required");
    let quiet = matches.get_flag("quiet");

    let schema_text = fs::read_to_string(schema_path).unwrap_or_else(|e| {
        eprintln!("Cannot read schema '{}': {}", schema_path, e);
        std::process::exit(1);
    });

    let schema_dir = Path::new(schema_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let version = matches
        .get_one::<String>("schema-version")
        .cloned()
        .or_else(|| provenance::schema_version(&schema_dir))
        .unwrap_or_else(|| {
            eprintln!("No schema version found; pass --schema-version or tag the schema repo");
            std::process::exit(1);
        });
    let commit = matches
        .get_one::<String>("commit")
        .cloned()
        .or_else(|| provenance::commit_id(&schema_dir))
        .unwrap_or_else(|| "unknown".to_string());

    let base = matches.get_one::<String>("base").map(|path| load_base(path));

    let output = compile(
        &schema_text,
        CompileOptions {
            version,
            commit,
            base,
        },
    )
    .unwrap_or_else(|e| {
        eprintln!("Compilation failed: {}", e);
        std::process::exit(1);
    });

    if !quiet {
        for diagnostic in &output.diagnostics {
            eprintln!("{}", diagnostic);
        }
        if !output.skipped_definitions.is_empty() {
            let skipped: Vec<&str> = output
                .skipped_definitions
                .iter()
                .map(String::as_str)
                .collect();
            eprintln!("Definitions without markers: {}", skipped.join(", "));
        }
    }

    let json = serde_json::to_string_pretty(&output.map).unwrap_or_else(|e| {
        eprintln!("Cannot serialize the map: {}", e);
        std::process::exit(1);
    });

    let output_path = matches.get_one::<String>("output");
    let template_path = matches.get_one::<String>("template");

    if let Some(path) = output_path {
        write_file(path, &json);
    }
    if let Some(path) = template_path {
        patch_template(path, &json);
    }
    if output_path.is_none() && template_path.is_none() {
        println!("{}", json);
    }
}

fn load_base(path: &str) -> MarkersMap {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Cannot read base map '{}': {}", path, e);
        std::process::exit(1);
    });
    serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("Base map '{}' is not a valid markers map: {}", path, e);
        std::process::exit(1);
    })
}

fn write_file(path: &str, content: &str) {
    fs::write(path, content).unwrap_or_else(|e| {
        eprintln!("Cannot write '{}': {}", path, e);
        std::process::exit(1);
    });
}

fn patch_template(path: &str, json: &str) {
    let current = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Cannot read template '{}': {}", path, e);
        std::process::exit(1);
    });
    let patched = template::patch(&current, json).unwrap_or_else(|e| {
        eprintln!("Cannot patch template '{}': {}", path, e);
        std::process::exit(1);
    });
    write_file(path, &patched);
}
