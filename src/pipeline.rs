use crate::classify::LineClassifier;
use crate::frequency::FrequencyTable;
use crate::models::Page;
use crate::rules::{RuleOptions, RuleSet};
use crate::stats::RunStats;
use crate::tokenize::Tokenizer;
use anyhow::{Context, Result};
use std::sync::Arc;

/// What became of one raw line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Skipped,
    Tokens(Vec<String>),
}

/// Line rules → classifier → tokenizer, sharing one compiled rule set.
#[derive(Debug, Clone)]
pub struct TextPipeline {
    rules: Arc<RuleSet>,
    classifier: LineClassifier,
    tokenizer: Tokenizer,
}

impl TextPipeline {
    pub fn new(options: &RuleOptions) -> Result<Self> {
        let rules = Arc::new(RuleSet::new(options).context("Failed to compile rewrite rules")?);
        let classifier = LineClassifier::new(options).context("Failed to compile line classifier")?;
        Ok(Self::from_parts(rules, classifier))
    }

    pub fn from_parts(rules: Arc<RuleSet>, classifier: LineClassifier) -> Self {
        let tokenizer = Tokenizer::new(Arc::clone(&rules));
        Self {
            rules,
            classifier,
            tokenizer,
        }
    }

    pub fn process_line(&self, raw: &str) -> LineOutcome {
        let line = self.rules.rewrite_line(raw);
        if self.classifier.skip(&line) {
            LineOutcome::Skipped
        } else {
            LineOutcome::Tokens(self.tokenizer.tokenize(&line))
        }
    }

    /// Feeds every physical line of `text` through the pipeline into `table`.
    pub fn process_text(&self, text: &str, table: &mut FrequencyTable, stats: &mut RunStats) {
        for line in text.split('\n') {
            self.count_line(line, table, stats);
        }
    }

    /// Redirects only bump the redirect counter. Other pages contribute their
    /// title as an extra first line, followed by the body.
    pub fn process_page(&self, page: &Page, table: &mut FrequencyTable, stats: &mut RunStats) {
        if page.is_redirect() {
            stats.redirects += 1;
            return;
        }
        if !page.title.is_empty() {
            self.count_line(&page.title, table, stats);
        }
        self.process_text(&page.text, table, stats);
    }

    fn count_line(&self, raw: &str, table: &mut FrequencyTable, stats: &mut RunStats) {
        stats.lines += 1;
        match self.process_line(raw) {
            LineOutcome::Skipped => stats.lines_skipped += 1,
            LineOutcome::Tokens(words) => {
                stats.words += words.len() as u64;
                table.accumulate(words);
            }
        }
    }
}
