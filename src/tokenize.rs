use crate::rules::RuleSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Tokenizer {
    rules: Arc<RuleSet>,
}

impl Tokenizer {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    /// Runs the token rules, folds case and splits on spaces. Every returned
    /// word is non-empty and free of whitespace.
    pub fn tokenize(&self, line: &str) -> Vec<String> {
        let normalized = self.rules.rewrite_tokens(line);
        normalized
            .trim()
            .to_lowercase()
            .split(' ')
            .map(str::trim)
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect()
    }
}
