use crate::rules::RuleOptions;
use anyhow::Result;
use regex::Regex;

/// Drops table rows, tag-only lines, entity soup, redirect tags and
/// user-page links before the token rules run. Anchored and cheap; prose that
/// happens to start with one of the noise characters is lost with it.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    noise: Regex,
    markers: Vec<String>,
}

impl LineClassifier {
    pub fn new(options: &RuleOptions) -> Result<Self> {
        let noise = Regex::new(r"^(?:!|\||\{\||&|<)")?;
        let mut markers: Vec<String> = options
            .user_prefixes
            .iter()
            .map(|prefix| format!("[[{}", prefix))
            .collect();
        markers.push("<comment>".to_string());
        Ok(Self { noise, markers })
    }

    /// True when the (already line-rewritten) line should not be tokenized.
    pub fn skip(&self, line: &str) -> bool {
        let line = line.trim();
        if line.starts_with("<page") || line.starts_with("<text") {
            return false;
        }
        self.noise.is_match(line) || self.markers.iter().any(|m| line.contains(m.as_str()))
    }
}
