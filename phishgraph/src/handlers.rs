use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use phishgraph_core::{
    Dictionary, FeaturePipeline, FeatureRecord, PageSnapshot, PipelineConfig, build_graph,
};
use phishgraph_fetch::{
    CollectOptions, CollectProgress, FetchError, Fetcher, collect, normalize_url,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A collected page, optionally labelled (1 phishing, 0 legitimate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledPage {
    #[serde(flatten)]
    pub page: PageSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<u8>,
}

pub const DEFAULT_DICTIONARY_PATH: &str = "~/.config/phishgraph/dictionary.json";

// Helper functions

/// Non-empty, trimmed lines of a file.
pub fn load_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Load and normalize URLs from a file, skipping lines that are not URLs.
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>> {
    let urls: Vec<String> = load_lines(path)?
        .into_iter()
        .filter_map(|line| {
            let url = normalize_url(&line);
            if url.is_none() {
                warn!("Skipping invalid URL '{}'", line);
            }
            url
        })
        .collect();

    if urls.is_empty() {
        bail!("No valid URLs found in {}", path.display());
    }

    Ok(urls)
}

/// Pipeline configuration from an optional JSON file plus flag overrides.
pub fn load_config(
    config_path: Option<&Path>,
    max_words: Option<usize>,
    max_nodes: Option<usize>,
) -> Result<PipelineConfig> {
    let mut config = match config_path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(max_words) = max_words {
        config = config.with_max_words(max_words);
    }
    if let Some(max_nodes) = max_nodes {
        config = config.with_max_nodes(max_nodes);
    }

    config.validate()?;
    Ok(config)
}

/// Read `{url, html, label}` JSON lines. Blank lines are skipped.
pub fn load_pages(path: &Path) -> Result<Vec<LabeledPage>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut pages = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let page: LabeledPage = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid page record", path.display(), number + 1))?;
        pages.push(page);
    }
    Ok(pages)
}

/// Encode pages in parallel. Output order matches input order.
pub fn encode_pages(pipeline: &FeaturePipeline, pages: &[LabeledPage]) -> Vec<FeatureRecord> {
    pages
        .par_iter()
        .map(|labeled| {
            let features = pipeline.encode(&labeled.page);
            FeatureRecord::from_features(&labeled.page.url, labeled.label, &features)
        })
        .collect()
}

pub fn write_jsonl<W, T>(writer: &mut W, items: &[T]) -> Result<()>
where
    W: Write,
    T: Serialize,
{
    for item in items {
        serde_json::to_writer(&mut *writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Load the dictionary and build a pipeline around it.
///
/// Without a config file the pipeline adopts the dictionary's vocab size;
/// with one, the two must agree.
fn load_pipeline(args: &ArgMatches) -> Result<FeaturePipeline> {
    let dictionary_path = expand_path(
        args.get_one::<String>("dictionary")
            .map(String::as_str)
            .unwrap_or(DEFAULT_DICTIONARY_PATH),
    );
    let config_path = args.get_one::<PathBuf>("config");
    let mut config = load_config(
        config_path.map(PathBuf::as_path),
        args.get_one::<usize>("max-words").copied(),
        args.get_one::<usize>("max-nodes").copied(),
    )?;

    let dictionary = Dictionary::load(&dictionary_path)
        .with_context(|| format!("Failed to load dictionary {}", dictionary_path.display()))?;
    if config_path.is_none() {
        config = config.with_vocab_size(dictionary.vocab_size());
    }

    Ok(FeaturePipeline::new(config, Arc::new(dictionary))?)
}

fn print_status(quiet: bool, msg: String) {
    if !quiet {
        println!("{} {}", "✓".green().bold(), msg);
    }
}

pub fn handle_dictionary(args: &ArgMatches, quiet: bool) -> Result<()> {
    let urls_file = args
        .get_one::<PathBuf>("urls-file")
        .context("--urls-file is required")?;
    let output = expand_path(
        args.get_one::<String>("output")
            .map(String::as_str)
            .unwrap_or(DEFAULT_DICTIONARY_PATH),
    );
    let vocab_size = *args.get_one::<usize>("vocab-size").unwrap_or(&10_000);

    let urls = load_lines(urls_file)?;
    if urls.is_empty() {
        bail!("No URLs found in {}", urls_file.display());
    }

    let dictionary = Dictionary::from_urls(&urls, vocab_size)?;
    dictionary
        .save(&output)
        .with_context(|| format!("Failed to write dictionary {}", output.display()))?;

    print_status(
        quiet,
        format!(
            "Dictionary of {} tokens built from {} URLs: {}",
            dictionary.len().to_string().cyan(),
            urls.len().to_string().cyan(),
            output.display().to_string().bright_white()
        ),
    );
    Ok(())
}

pub async fn handle_encode(args: &ArgMatches) -> Result<()> {
    let url = args.get_one::<String>("url").context("--url is required")?;
    let pipeline = load_pipeline(args)?;

    let page = if let Some(html_file) = args.get_one::<PathBuf>("html-file") {
        let html = fs::read_to_string(html_file)
            .with_context(|| format!("Failed to read {}", html_file.display()))?;
        PageSnapshot::new(url.clone(), Some(html))
    } else if args.get_flag("fetch") {
        let timeout = *args.get_one::<u64>("timeout").unwrap_or(&20);
        let fetcher = Fetcher::with_timeout(timeout)?;
        fetcher
            .fetch(url)
            .await
            .with_context(|| format!("Failed to fetch {}", url))?
            .into_page()
    } else {
        PageSnapshot::url_only(url.clone())
    };

    let features = pipeline.encode(&page);
    if features.is_low_confidence() {
        warn!("Graph input for {} is empty ({})", page.url, features.verdict);
    }

    let record = FeatureRecord::from_features(&page.url, None, &features);
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer(&mut handle, &record)?;
    writeln!(handle)?;
    Ok(())
}

pub async fn handle_collect(args: &ArgMatches, quiet: bool) -> Result<()> {
    let urls_file = args
        .get_one::<PathBuf>("urls-file")
        .context("--urls-file is required")?;
    let output = args
        .get_one::<PathBuf>("output")
        .context("--output is required")?;
    let threads = *args.get_one::<usize>("threads").unwrap_or(&32);
    let batch_size = *args.get_one::<usize>("batch-size").unwrap_or(&1000);
    let limit = args.get_one::<usize>("limit").copied();
    let timeout = *args.get_one::<u64>("timeout").unwrap_or(&20);

    let urls = load_urls_from_file(urls_file)?;
    let total = urls.len();

    if !quiet {
        println!("\nCollecting {} URL(s)", total);
        println!("Workers: {}", threads);
        println!("Batch size: {}\n", batch_size);
    }

    let progress_bar = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting collection...");
        Some(Arc::new(pb))
    };

    let mut options = CollectOptions::new(urls);
    options.concurrency = threads;
    options.batch_size = batch_size;
    options.limit = limit;
    if let Some(ref pb) = progress_bar {
        let pb_clone = pb.clone();
        options.progress_callback = Some(Arc::new(move |progress: CollectProgress| {
            pb_clone.set_message(format!(
                "Batch {}: {}/{} processed, {} accessible",
                progress.batch, progress.processed, total, progress.fetched
            ));
        }));
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output)
        .with_context(|| format!("Failed to open {}", output.display()))?;
    let mut writer = BufWriter::new(file);

    let fetcher = Fetcher::with_timeout(timeout)?;
    let stats = collect(&fetcher, options, |pages| {
        write_jsonl(&mut writer, &pages).map_err(|e| FetchError::Other(format!("{e:#}")))
    })
    .await?;

    if let Some(ref pb) = progress_bar {
        pb.finish_and_clear();
    }

    info!(
        "Collection finished: {} processed, {} fetched, {} failed",
        stats.processed, stats.fetched, stats.failed
    );
    print_status(
        quiet,
        format!(
            "Collected {} page(s) from {} URL(s) ({} failed): {}",
            stats.fetched.to_string().cyan(),
            stats.processed.to_string().cyan(),
            stats.failed.to_string().yellow(),
            output.display().to_string().bright_white()
        ),
    );
    Ok(())
}

pub fn handle_dataset(args: &ArgMatches, quiet: bool) -> Result<()> {
    let input = args
        .get_one::<PathBuf>("input")
        .context("--input is required")?;
    let output = args
        .get_one::<PathBuf>("output")
        .context("--output is required")?;

    let pipeline = load_pipeline(args)?;
    let pages = load_pages(input)?;
    info!("Encoding {} pages from {}", pages.len(), input.display());

    let records = encode_pages(&pipeline, &pages);
    let low_confidence = records.iter().filter(|r| r.low_confidence).count();

    let file =
        File::create(output).with_context(|| format!("Failed to create {}", output.display()))?;
    write_jsonl(&mut BufWriter::new(file), &records)?;

    print_status(
        quiet,
        format!(
            "Encoded {} page(s) ({} without usable HTML): {}",
            records.len().to_string().cyan(),
            low_confidence.to_string().yellow(),
            output.display().to_string().bright_white()
        ),
    );
    Ok(())
}

pub fn handle_graph(args: &ArgMatches) -> Result<()> {
    let html_file = args
        .get_one::<PathBuf>("html-file")
        .context("--html-file is required")?;
    let html = fs::read_to_string(html_file)
        .with_context(|| format!("Failed to read {}", html_file.display()))?;

    let graph = build_graph(&html);
    info!(
        "{}: {} nodes, {} edges",
        html_file.display(),
        graph.node_count(),
        graph.edge_count()
    );
    println!("{}", graph.to_dot());
    Ok(())
}
