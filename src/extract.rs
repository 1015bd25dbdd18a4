use crate::config::{PAGE_BATCH_SIZE, PROGRESS_INTERVAL};
use crate::frequency::FrequencyTable;
use crate::models::Page;
use crate::parser::WikiReader;
use crate::pipeline::TextPipeline;
use crate::stats::RunStats;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::io::BufRead;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CountOptions {
    /// Stop after this many pages (checked between pages, never mid-page).
    /// `Some(0)` means no limit.
    pub page_limit: Option<u64>,
    /// Worker threads for tokenization; 1 keeps everything on the calling thread
    pub threads: usize,
    pub show_progress: bool,
}

impl Default for CountOptions {
    fn default() -> Self {
        Self {
            page_limit: None,
            threads: 1,
            show_progress: false,
        }
    }
}

/// Result of one pass over a dump.
#[derive(Debug, Default, Clone)]
pub struct WordCounts {
    pub table: FrequencyTable,
    pub stats: RunStats,
}

impl WordCounts {
    fn merge(mut self, other: WordCounts) -> WordCounts {
        self.table.merge(other.table);
        self.stats.merge(&other.stats);
        self
    }
}

/// Streams every page of `reader` through `pipeline` and aggregates the words.
///
/// A page that fails to decode aborts the whole run; nothing partial is returned.
pub fn count_words<R: BufRead>(
    mut reader: WikiReader<R>,
    pipeline: &TextPipeline,
    options: &CountOptions,
) -> Result<WordCounts> {
    let pb = progress_bar(options.show_progress)?;

    let counts = if options.threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.threads)
            .thread_name(|i| format!("wikifreq-worker-{}", i))
            .build()
            .context("Failed to build worker pool")?;
        count_batched(&mut reader, pipeline, options, &pool, &pb)?
    } else {
        count_sequential(&mut reader, pipeline, options, &pb)?
    };

    pb.finish_and_clear();

    info!(
        pages = counts.stats.pages,
        redirects = counts.stats.redirects,
        words = counts.stats.words,
        unique_words = counts.table.len(),
        "Counting complete"
    );

    Ok(counts)
}

fn count_sequential<R: BufRead>(
    reader: &mut WikiReader<R>,
    pipeline: &TextPipeline,
    options: &CountOptions,
    pb: &ProgressBar,
) -> Result<WordCounts> {
    let mut counts = WordCounts::default();

    while !limit_reached(options.page_limit, counts.stats.pages) {
        let Some(page) = pull_page(reader, counts.stats.pages)? else {
            break;
        };
        counts.stats.pages += 1;
        pipeline.process_page(&page, &mut counts.table, &mut counts.stats);

        if counts.stats.pages % PROGRESS_INTERVAL == 0 {
            pb.set_message(counts.stats.progress_message());
        }
    }

    Ok(counts)
}

/// Pages are still pulled one at a time from the single cursor; only the
/// tokenization of a batch is spread over the pool.
fn count_batched<R: BufRead>(
    reader: &mut WikiReader<R>,
    pipeline: &TextPipeline,
    options: &CountOptions,
    pool: &rayon::ThreadPool,
    pb: &ProgressBar,
) -> Result<WordCounts> {
    let mut counts = WordCounts::default();
    let mut batch: Vec<Page> = Vec::with_capacity(PAGE_BATCH_SIZE);
    let mut exhausted = false;

    while !exhausted {
        batch.clear();
        while batch.len() < PAGE_BATCH_SIZE {
            let pulled = counts.stats.pages + batch.len() as u64;
            if limit_reached(options.page_limit, pulled) {
                exhausted = true;
                break;
            }
            match pull_page(reader, pulled)? {
                Some(page) => batch.push(page),
                None => {
                    exhausted = true;
                    break;
                }
            }
        }
        if batch.is_empty() {
            break;
        }

        let partial = pool.install(|| {
            batch
                .par_iter()
                .map(|page| {
                    let mut local = WordCounts::default();
                    pipeline.process_page(page, &mut local.table, &mut local.stats);
                    local
                })
                .reduce(WordCounts::default, WordCounts::merge)
        });

        let before = counts.stats.pages;
        counts = counts.merge(partial);
        counts.stats.pages += batch.len() as u64;
        debug!(pages = batch.len(), "Batch tokenized");

        if counts.stats.pages / PROGRESS_INTERVAL != before / PROGRESS_INTERVAL {
            pb.set_message(counts.stats.progress_message());
        }
    }

    Ok(counts)
}

fn pull_page<R: BufRead>(reader: &mut WikiReader<R>, pulled: u64) -> Result<Option<Page>> {
    let offset = reader.byte_offset();
    reader
        .next_page()
        .with_context(|| format!("Failed to decode page {} (near byte {})", pulled + 1, offset))
}

fn limit_reached(limit: Option<u64>, pages: u64) -> bool {
    match limit {
        Some(limit) if limit > 0 && pages >= limit => {
            info!(pages, "Page limit reached");
            true
        }
        _ => false,
    }
}

fn progress_bar(visible: bool) -> Result<ProgressBar> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(200));
    Ok(pb)
}
