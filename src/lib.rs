//! Wikifreq: Wikipedia dump to word-frequency list pipeline
//!
//! This crate streams a (possibly compressed, possibly remote) MediaWiki XML dump and
//! produces a ranked list of word frequencies:
//!
//! 1. **Input** -- Open a local file or HTTP(S) URL, wrapping it in a bzip2/gzip decoder
//!    based on the name's suffix
//! 2. **Page extraction** -- Pull one `<page>` subtree at a time off an event-based XML
//!    cursor; the full dump is never materialized
//! 3. **Normalization** -- Per line: unescape and strip scaffolding (line rules), drop
//!    structural noise (classifier), strip markup and split into words (token rules)
//! 4. **Aggregation and ranking** -- Count words in a single table, then sort by
//!    descending count with the word itself as tie-break
//!
//! # Architecture
//!
//! - **Streaming XML parsing** -- Memory is bounded by the largest page plus the vocabulary
//! - **Ordered rewrite rules** -- Compiled once into an immutable [`rules::RuleSet`] that is
//!   shared by the classifier and tokenizer; no process-wide state
//! - **Optional parallel tokenization** -- Pages are still read in order, batches are
//!   tokenized on a rayon pool and merged; accumulation is commutative so results match
//!   the single-threaded run exactly
//!
//! # Key Modules
//!
//! - [`input`] -- Local/remote stream opening and decompression
//! - [`parser`] -- Streaming `<page>` cursor over quick-xml
//! - [`rules`] -- Line and token rewrite rules
//! - [`classify`] -- Structural-noise line classifier
//! - [`tokenize`] -- Token rules, case folding and splitting
//! - [`pipeline`] -- Line rules → classifier → tokenizer for one page
//! - [`extract`] -- Run driver: page limit, progress, sequential or batched counting
//! - [`frequency`] -- Word-count table
//! - [`rank`] -- Ordering and TSV/JSON output
//! - [`models`] -- Core data types (Page, PageType, RankedEntry)
//! - [`stats`] -- Run counters and number formatting
//! - [`config`] -- Constants
//!
//! # Example Usage
//!
//! ```bash
//! # Count the first 10,000 pages of the Swedish dump, straight from the mirror
//! wikifreq count --page-limit 10000 https://dumps.wikimedia.org/svwiki/latest/svwiki-latest-pages-articles-multistream.xml.bz2
//!
//! # Every word seen at least 5 times, as JSON
//! wikifreq count --min-freq 5 --format json -o freq.json svwiki.xml.bz2
//!
//! # See what the normalizer makes of some raw lines
//! wikifreq tokenize lines.txt
//! ```

pub mod classify;
pub mod config;
pub mod extract;
pub mod frequency;
pub mod input;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod rank;
pub mod rules;
pub mod stats;
pub mod tokenize;
