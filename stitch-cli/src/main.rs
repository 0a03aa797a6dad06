//! stitch - Annotation reconciliation CLI
//!
//! Offline commands for a text-entity-extraction annotation pipeline:
//! scan text for phone numbers, merge predicted spans into labeled
//! manifests without overlaps, undo platform offset corruption, compute
//! word-vector document embeddings, and boil email archives down to text.
//!
//! # Usage
//!
//! ```bash
//! # Build a manifest from phone numbers found in a directory of text files
//! stitch scan ./texts --uri-prefix gs://bucket/
//!
//! # Append phone numbers found in each referenced text to a manifest copy
//! stitch add-phones dataset.jsonl ./texts --gcs-root gs://bucket/
//!
//! # Merge predicted spans into a manifest, rejecting overlaps
//! stitch merge dataset.jsonl ./texts --gcs-root gs://bucket/ -a
//!
//! # Chunked prediction over one file
//! stitch predict big.txt -j --strip-newlines
//!
//! # Sum GloVe vectors over a document
//! stitch embed mail.txt --embeddings glove.6B.300d.txt
//!
//! # Extract distinct words from an email archive
//! stitch read-emails ./maildir ./texts
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use is_terminal::IsTerminal;

use stitch::{
    annotate_document, document_embedding, is_modified_path, modified_path, read_manifest,
    resolve_text_path, scan_phone_numbers, write_manifest, Annotation, Document, ManifestEntry,
    NewlineHandling, NewlineStrip, PhoneScanner, PipelineConfig, TextPreparer, WordEmbeddings,
    DEFAULT_MAX_CHUNK_LEN,
};

/// Annotation reconciliation toolkit.
#[derive(Parser)]
#[command(name = "stitch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory of text files for phone numbers and build a manifest.
    Scan {
        /// Directory holding the text files.
        input_dir: PathBuf,
        /// Storage prefix for manifest URIs (joined with each file name).
        #[arg(long, default_value = "")]
        uri_prefix: String,
    },
    /// Append phone numbers found in each referenced text to a manifest copy.
    AddPhones {
        /// Input JSON-lines manifest.
        manifest: PathBuf,
        /// Directory holding the referenced text files.
        datasets_dir: PathBuf,
        /// Storage root stripped from manifest URIs during resolution.
        #[arg(long, default_value = "")]
        gcs_root: String,
    },
    /// Merge predicted spans into a manifest, rejecting overlaps.
    Merge {
        /// Input JSON-lines manifest.
        manifest: PathBuf,
        /// Directory holding the referenced text files.
        datasets_dir: PathBuf,
        /// Storage root stripped from manifest URIs during resolution.
        #[arg(long, default_value = "")]
        gcs_root: String,
        /// Shift offsets to compensate for doubled newlines on ingestion.
        #[arg(short = 'a', long)]
        adjust_offsets: bool,
        /// Per-request char cap.
        #[arg(long, default_value_t = DEFAULT_MAX_CHUNK_LEN)]
        max_chunk_len: usize,
    },
    /// Run chunked prediction over one text file.
    Predict {
        /// Input text file.
        input: PathBuf,
        /// Write a JSON-lines manifest instead of printing matches.
        #[arg(short = 'j', long)]
        jsonl: bool,
        /// Shift offsets to compensate for doubled newlines on ingestion.
        #[arg(short = 'a', long, conflicts_with = "strip_newlines")]
        adjust_offsets: bool,
        /// Rewrite the file with newlines replaced by spaces instead.
        #[arg(short = 'n', long)]
        strip_newlines: bool,
        /// Prepend the file name as the first line of the content.
        #[arg(long)]
        add_header: bool,
        /// Storage prefix for manifest URIs.
        #[arg(long, default_value = "")]
        uri_prefix: String,
        /// Per-request char cap.
        #[arg(long, default_value_t = DEFAULT_MAX_CHUNK_LEN)]
        max_chunk_len: usize,
    },
    /// Sum word vectors over a document and report the embedding.
    Embed {
        /// Input text file.
        input: PathBuf,
        /// GloVe-format embeddings file (`word v1 v2 ...` per line).
        #[arg(long)]
        embeddings: PathBuf,
    },
    /// Extract distinct words from every email under a directory.
    ReadEmails {
        /// Directory of RFC822 messages (walked recursively).
        input_dir: PathBuf,
        /// Directory receiving one `<index>.txt` per message.
        output_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", color("31", "error:"));
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> stitch::Result<()> {
    match command {
        Command::Scan {
            input_dir,
            uri_prefix,
        } => scan_dir(&input_dir, &uri_prefix),
        Command::AddPhones {
            manifest,
            datasets_dir,
            gcs_root,
        } => add_phones(&manifest, &datasets_dir, &gcs_root),
        Command::Merge {
            manifest,
            datasets_dir,
            gcs_root,
            adjust_offsets,
            max_chunk_len,
        } => merge(
            &manifest,
            &datasets_dir,
            &gcs_root,
            adjust_offsets,
            max_chunk_len,
        ),
        Command::Predict {
            input,
            jsonl,
            adjust_offsets,
            strip_newlines,
            add_header,
            uri_prefix,
            max_chunk_len,
        } => predict(
            &input,
            jsonl,
            adjust_offsets,
            strip_newlines,
            add_header,
            &uri_prefix,
            max_chunk_len,
        ),
        Command::Embed { input, embeddings } => embed(&input, &embeddings),
        Command::ReadEmails {
            input_dir,
            output_dir,
        } => {
            let written = stitch::ingest::extract_mailbox_dir(&input_dir, &output_dir)?;
            println!("wrote {written} text files to {}", output_dir.display());
            Ok(())
        }
    }
}

/// Colorize text with ANSI escape codes (only when stderr is a terminal).
fn color(code: &str, text: &str) -> String {
    if io::stderr().is_terminal() {
        format!("\x1b[{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

/// Join a storage prefix and a file name into a manifest URI.
fn join_uri(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{name}", prefix.trim_end_matches('/'))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn scan_dir(input_dir: &Path, uri_prefix: &str) -> stitch::Result<()> {
    let mut paths: Vec<PathBuf> = fs::read_dir(input_dir)?
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && !is_modified_path(p))
        .collect();
    paths.sort();

    let mut entries = Vec::new();
    for path in paths {
        let orig_text = fs::read_to_string(&path)?;
        let stripped = TextPreparer {
            add_header: false,
            newline: NewlineStrip::Remove,
        }
        .prepare(&orig_text, &file_name(&path));
        println!(
            "length: {} -> {}",
            orig_text.chars().count(),
            stripped.text.chars().count()
        );

        let annotations = scan_phone_numbers(&stripped.text);
        for ann in &annotations {
            if let Some(number) = ann.slice(&stripped.text) {
                println!("{number}");
            }
        }
        if annotations.is_empty() {
            continue;
        }

        // Point the manifest at what will actually be ingested: the
        // newline-free copy when stripping changed the text.
        let uri_name = if stripped.changed {
            let out_path = modified_path(&path);
            fs::write(&out_path, &stripped.text)?;
            file_name(&out_path)
        } else {
            file_name(&path)
        };
        entries.push(ManifestEntry::new(join_uri(uri_prefix, &uri_name), annotations));
    }

    let output_path = input_dir.join("output.jsonl");
    write_manifest(&output_path, &entries)?;
    println!("wrote {} entries to {}", entries.len(), output_path.display());
    Ok(())
}

fn print_annotation(ann: &Annotation, text: &str) {
    let value: String = ann
        .slice(text)
        .unwrap_or_default()
        .chars()
        .filter(|&c| c != '\n' && c != '\r')
        .collect();
    println!(
        "  {} [{}:{}]: {value}",
        ann.display_name, ann.start_offset, ann.end_offset
    );
}

fn add_phones(manifest: &Path, datasets_dir: &Path, gcs_root: &str) -> stitch::Result<()> {
    let mut entries = read_manifest(manifest)?;
    for entry in &mut entries {
        let path = resolve_text_path(&entry.text_gcs_uri, gcs_root, datasets_dir);
        println!("{}", path.display());
        let text = fs::read_to_string(&path)?;
        println!("length: {}", text.chars().count());

        // This flow appends every hit unconditionally; overlap rejection
        // belongs to the merge flow.
        entry
            .text_segment_annotations
            .extend(scan_phone_numbers(&text));
        for ann in &entry.text_segment_annotations {
            print_annotation(ann, &text);
        }
    }
    let output_path = modified_path(manifest);
    write_manifest(&output_path, &entries)?;
    println!("wrote {}", output_path.display());
    Ok(())
}

fn merge(
    manifest: &Path,
    datasets_dir: &Path,
    gcs_root: &str,
    adjust_offsets: bool,
    max_chunk_len: usize,
) -> stitch::Result<()> {
    let config = PipelineConfig {
        max_chunk_len,
        newline_handling: if adjust_offsets {
            NewlineHandling::AdjustOffsets
        } else {
            NewlineHandling::Keep
        },
        ..PipelineConfig::default()
    };
    let predictor = PhoneScanner::new();

    let mut entries = read_manifest(manifest)?;
    for entry in &mut entries {
        let path = resolve_text_path(&entry.text_gcs_uri, gcs_root, datasets_dir);
        println!("{}", path.display());
        let text = fs::read_to_string(&path)?;
        println!("length: {}", text.chars().count());

        let mut doc = Document::new(
            entry.text_gcs_uri.clone(),
            text,
            std::mem::take(&mut entry.text_segment_annotations),
        );
        let stats = annotate_document(&mut doc, &predictor, &config)?;
        println!(
            "accepted {} of {} predicted spans ({} rejected as overlapping)",
            stats.accepted, stats.predicted, stats.rejected
        );
        for ann in &doc.annotations {
            print_annotation(ann, &doc.text);
        }
        entry.text_segment_annotations = doc
            .annotations
            .into_iter()
            .map(Annotation::without_confidence)
            .collect();
    }

    let output_path = modified_path(manifest);
    write_manifest(&output_path, &entries)?;
    println!("wrote {}", output_path.display());
    Ok(())
}

fn predict(
    input: &Path,
    jsonl: bool,
    adjust_offsets: bool,
    strip_newlines: bool,
    add_header: bool,
    uri_prefix: &str,
    max_chunk_len: usize,
) -> stitch::Result<()> {
    let content = fs::read_to_string(input)?;
    let preparer = TextPreparer {
        add_header,
        newline: if strip_newlines {
            NewlineStrip::Space
        } else {
            NewlineStrip::Keep
        },
    };
    let prepared = preparer.prepare(&content, &input.to_string_lossy());

    // A rewritten file is persisted and becomes the document of record.
    let (effective_path, text) = if prepared.changed {
        let out_path = modified_path(input);
        fs::write(&out_path, &prepared.text)?;
        (out_path, prepared.text)
    } else {
        (input.to_path_buf(), prepared.text)
    };

    println!("File is {} characters", text.chars().count());

    let config = PipelineConfig {
        max_chunk_len,
        newline_handling: if adjust_offsets {
            NewlineHandling::AdjustOffsets
        } else if strip_newlines {
            NewlineHandling::StripNewlines
        } else {
            NewlineHandling::Keep
        },
        ..PipelineConfig::default()
    };
    let uri = join_uri(uri_prefix, &file_name(&effective_path));
    let mut doc = Document::new(uri.clone(), text, Vec::new());
    let stats = annotate_document(&mut doc, &PhoneScanner::new(), &config)?;
    println!(
        "found {} annotations in {} chunks",
        stats.accepted, stats.chunks
    );

    if jsonl {
        let output_path = effective_path.with_extension("jsonl");
        let annotations = doc
            .annotations
            .into_iter()
            .map(Annotation::without_confidence)
            .collect();
        write_manifest(&output_path, &[ManifestEntry::new(uri, annotations)])?;
        println!("wrote {}", output_path.display());
    } else {
        for ann in &doc.annotations {
            let confidence = ann.confidence.unwrap_or(1.0) * 100.0;
            let value = ann.slice(&doc.text).unwrap_or_default();
            println!(
                "{} ({confidence:.1}) [{}:{}]: {value}",
                ann.display_name, ann.start_offset, ann.end_offset
            );
        }
    }
    Ok(())
}

fn embed(input: &Path, embeddings_path: &Path) -> stitch::Result<()> {
    let embeddings = WordEmbeddings::load_glove(embeddings_path)?;
    let text = fs::read_to_string(input)?;
    println!("initial word count: {}", text.split_whitespace().count());
    let processed = stitch::process_text(&text);
    println!("word count after processing: {}", processed.len());

    let doc_embedding = document_embedding(&text, &embeddings);
    let norm = doc_embedding
        .iter()
        .map(|&v| f64::from(v) * f64::from(v))
        .sum::<f64>()
        .sqrt();
    println!(
        "document embedding: dim {}, L2 norm {norm:.4}",
        doc_embedding.len()
    );
    Ok(())
}
