use crate::config::{DEFAULT_CATEGORY_PREFIXES, DEFAULT_USER_PREFIXES};
use anyhow::{Context, Result};
use regex::Regex;
use std::borrow::Cow;

/// A single pattern/replacement step. Replacements may reference capture groups as `${n}`.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: String,
}

impl RewriteRule {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .with_context(|| format!("Invalid rewrite pattern: {}", pattern))?;
        Ok(Self {
            pattern,
            replacement: replacement.to_string(),
        })
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern.replace_all(text, self.replacement.as_str())
    }
}

/// Settings that differ between language editions of a dump.
#[derive(Debug, Clone)]
pub struct RuleOptions {
    pub category_prefixes: Vec<String>,
    pub user_prefixes: Vec<String>,
    /// Also strip bare `https://` URLs. Off by default: only `http://` URLs are
    /// removed, and an `https` URL breaks up into its host words.
    pub strip_https: bool,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            category_prefixes: DEFAULT_CATEGORY_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            user_prefixes: DEFAULT_USER_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            strip_https: false,
        }
    }
}

/// The ordered rule lists. Each rule sees the output of the one before it,
/// so reordering changes what survives (comments and tags must go before links
/// are reduced, links before punctuation is collapsed).
///
/// Token rewriting is split in two: the markup rules run once, then the
/// punctuation cleanup rules repeat until the text stops changing. A single
/// cleanup pass can leave a colon that only meets a space once brackets around
/// it have collapsed, as in `(se:)`.
#[derive(Debug, Clone)]
pub struct RuleSet {
    line: Vec<RewriteRule>,
    token: Vec<RewriteRule>,
    cleanup: Vec<RewriteRule>,
}

impl RuleSet {
    pub fn new(options: &RuleOptions) -> Result<Self> {
        let line = vec![
            RewriteRule::new("&lt;", "<")?,
            RewriteRule::new("&gt;", ">")?,
            RewriteRule::new("&quot;", "\"")?,
            RewriteRule::new("&amp;", "&")?,
            RewriteRule::new(r"^ *<text[^>]*>", "")?,
            RewriteRule::new("#REDIRECT ", "")?,
            RewriteRule::new(r"^ *:;?", "")?,
        ];

        let url = if options.strip_https {
            r"https?://\S+"
        } else {
            r"http://\S+"
        };
        let mut token = vec![
            RewriteRule::new(url, "")?,
            RewriteRule::new("&lt;!--", "<!--")?,
            RewriteRule::new("--&gt;", "-->")?,
            RewriteRule::new(r"<!--[^>]+-->", "")?,
            // Greedy to end of line: a second reference on the same line takes
            // the prose between them down with it.
            RewriteRule::new(r"(?:&lt;|<)/?ref(?: |&gt;|>).*$", "")?,
            RewriteRule::new("&quot;", "\"")?,
            RewriteRule::new("&amp;", "&")?,
            RewriteRule::new(r"^ *\* *", "")?,
            RewriteRule::new(r"&[a-z]+;", "")?,
            RewriteRule::new(r"<[^>]+>", "")?,
            RewriteRule::new(r"\{\{[^}]+(?:\}\}|$)", "")?,
            RewriteRule::new(r"[{}]", "")?,
        ];

        if let Some(rule) = namespace_rule(&options.category_prefixes)? {
            token.push(rule);
        }

        token.extend([
            RewriteRule::new(r"\[\[[A-Za-z]+:(?:[^|\]]+\|)+", "[[")?,
            RewriteRule::new(r"\[\[([^|\]]+)\|?\]\]", "${1}")?,
            RewriteRule::new(r"\[\[[^|\]]+\|([^|\]]+)\]\]", "${1}")?,
            RewriteRule::new(r"\[\[[^|\]]+(?:\|[^|\]]+)*\|([^|\]]+)\]\]", "${1}")?,
            RewriteRule::new(r"[\[\]]+", "")?,
            RewriteRule::new("==+", "")?,
        ]);

        let cleanup = vec![
            RewriteRule::new(" ' ", " ")?,
            RewriteRule::new(": | :", " ")?,
            RewriteRule::new(
                r##"[\]\[!"\x{201D}#$%&()*+,./;<=>?@\^_`{|}~\s\x{A0}\x{2013}]+"##,
                " ",
            )?,
            RewriteRule::new(r"(?: |^)'+|'+(?: |$)", " ")?,
            RewriteRule::new(" *- | - *", " ")?,
        ];

        Ok(Self {
            line,
            token,
            cleanup,
        })
    }

    /// Entity unescaping and scaffolding removal, done before a line is classified.
    pub fn rewrite_line(&self, line: &str) -> String {
        apply_all(&self.line, line)
    }

    /// Markup stripping and punctuation collapsing, done on lines that survive classification.
    pub fn rewrite_tokens(&self, line: &str) -> String {
        let mut text = apply_all(&self.token, line);
        // Every cleanup rule either shortens the text or turns a mark into a
        // space, so this terminates.
        loop {
            let next = apply_all(&self.cleanup, &text);
            if next == text {
                return text;
            }
            text = next;
        }
    }

    pub fn line_rules(&self) -> &[RewriteRule] {
        &self.line
    }

    pub fn token_rules(&self) -> &[RewriteRule] {
        &self.token
    }
}

fn namespace_rule(prefixes: &[String]) -> Result<Option<RewriteRule>> {
    if prefixes.is_empty() {
        return Ok(None);
    }
    let alternation = prefixes
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    RewriteRule::new(&format!(r"\[\[(?:{}):", alternation), "[[").map(Some)
}

fn apply_all(rules: &[RewriteRule], input: &str) -> String {
    let mut text = input.to_string();
    for rule in rules {
        let next = match rule.apply(&text) {
            Cow::Borrowed(_) => continue,
            Cow::Owned(replaced) => replaced,
        };
        text = next;
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        RuleSet::new(&RuleOptions::default()).unwrap()
    }

    #[test]
    fn line_rules_unescape_entities() {
        let result = rules().rewrite_line("&lt;ref name=&quot;a&quot;&gt; x &amp;amp;");
        assert_eq!(result, "<ref name=\"a\"> x &amp;");
    }

    #[test]
    fn line_rules_strip_text_open_tag() {
        let result = rules().rewrite_line("  <text xml:space=\"preserve\">Body starts");
        assert_eq!(result, "Body starts");
    }

    #[test]
    fn line_rules_strip_redirect_keyword() {
        let result = rules().rewrite_line("#REDIRECT [[Target]]");
        assert_eq!(result, "[[Target]]");
    }

    #[test]
    fn line_rules_strip_indent_markers() {
        assert_eq!(rules().rewrite_line(":; quoted"), " quoted");
        assert_eq!(rules().rewrite_line("  :indented"), "indented");
    }

    #[test]
    fn token_rules_strip_http_urls() {
        let result = rules().rewrite_tokens("see http://example.org/a?b=c and now");
        assert_eq!(result, "see and now");
    }

    #[test]
    fn https_urls_break_into_words_by_default() {
        let result = rules().rewrite_tokens("se https://x.se nu");
        assert_eq!(result, "se https x se nu");
    }

    #[test]
    fn https_urls_are_stripped_when_enabled() {
        let options = RuleOptions {
            strip_https: true,
            ..RuleOptions::default()
        };
        let rules = RuleSet::new(&options).unwrap();
        assert_eq!(rules.rewrite_tokens("se https://x.se nu"), "se nu");
        assert_eq!(rules.rewrite_tokens("se http://x.se nu"), "se nu");
    }

    #[test]
    fn token_rules_remove_inline_comments() {
        let result = rules().rewrite_tokens("before&lt;!--hidden--&gt; after");
        assert_eq!(result, "before after");
    }

    #[test]
    fn reference_rule_is_greedy_to_end_of_line() {
        // The prose between two references is lost together with them.
        let result = rules().rewrite_tokens("one<ref>a</ref> two<ref>b</ref> three");
        assert_eq!(result, "one");
    }

    #[test]
    fn token_rules_drop_named_entities() {
        let result = rules().rewrite_tokens("8&nbsp;839&nbsp;247");
        assert_eq!(result, "8839247");
    }

    #[test]
    fn token_rules_remove_templates() {
        assert_eq!(rules().rewrite_tokens("a {{cite|x}} b"), "a b");
        assert_eq!(rules().rewrite_tokens("a {{Infobox"), "a ");
    }

    #[test]
    fn link_without_pipe_keeps_target() {
        assert_eq!(rules().rewrite_tokens("[[Stockholm]]"), "Stockholm");
    }

    #[test]
    fn link_with_one_pipe_keeps_label() {
        assert_eq!(rules().rewrite_tokens("[[Mentorskap|mentor]]"), "mentor");
    }

    #[test]
    fn link_with_several_pipes_keeps_last_segment() {
        assert_eq!(rules().rewrite_tokens("[[a|b|c]]"), "c");
    }

    #[test]
    fn namespaced_link_with_pipes_keeps_caption() {
        let result = rules().rewrite_tokens("[[Fil:Bild.jpg|miniatyr|Bildtext]]");
        assert_eq!(result, "Bildtext");
    }

    #[test]
    fn category_prefix_is_normalized() {
        assert_eq!(rules().rewrite_tokens("[[Kategori:Fåglar]]"), "Fåglar");
    }

    #[test]
    fn custom_category_prefixes() {
        let options = RuleOptions {
            category_prefixes: vec!["Category".to_string()],
            ..RuleOptions::default()
        };
        let rules = RuleSet::new(&options).unwrap();
        assert_eq!(rules.rewrite_tokens("[[Category:Birds]]"), "Birds");
    }

    #[test]
    fn empty_category_prefixes_drop_the_rule() {
        let options = RuleOptions {
            category_prefixes: Vec::new(),
            ..RuleOptions::default()
        };
        let trimmed = RuleSet::new(&options).unwrap();
        assert_eq!(trimmed.token_rules().len(), rules().token_rules().len() - 1);
        assert_eq!(trimmed.rewrite_tokens("[[Kategori:Fåglar]]"), "Kategori:Fåglar");
    }

    #[test]
    fn prefixes_are_escaped() {
        let options = RuleOptions {
            category_prefixes: vec!["C.t".to_string()],
            ..RuleOptions::default()
        };
        let rules = RuleSet::new(&options).unwrap();
        assert_eq!(rules.rewrite_tokens("[[Cat:x]]"), "Cat:x");
        assert_eq!(rules.rewrite_tokens("[[C.t:y]]"), "y");
    }

    #[test]
    fn headings_and_punctuation_collapse() {
        let result = rules().rewrite_tokens("== Historia ==");
        assert_eq!(result, " Historia ");
    }

    #[test]
    fn en_dash_and_no_break_space_collapse() {
        let result = rules().rewrite_tokens("1808\u{2013}1809\u{a0}år");
        assert_eq!(result, "1808 1809 år");
    }

    #[test]
    fn quote_apostrophes_are_stripped_but_inner_ones_kept() {
        let result = rules().rewrite_tokens("''Bentley's Miscellany''");
        assert_eq!(result, " Bentley's Miscellany ");
    }

    #[test]
    fn spaced_hyphens_collapse() {
        assert_eq!(rules().rewrite_tokens("a - b"), "a b");
        assert_eq!(rules().rewrite_tokens("1700-talet"), "1700-talet");
    }

    #[test]
    fn colon_freed_by_collapsed_brackets_is_removed() {
        assert_eq!(rules().rewrite_tokens("(se:) vidare"), " se vidare");
        assert_eq!(rules().rewrite_tokens("[[a]]:\tb"), "a b");
    }

    #[test]
    fn apostrophes_and_hyphens_left_by_one_pass_are_removed() {
        assert_eq!(rules().rewrite_tokens("a' 'b"), "a b");
        assert_eq!(rules().rewrite_tokens("x --b"), "x b");
    }

    #[test]
    fn rules_never_fail_on_arbitrary_markup() {
        let rules = rules();
        for input in ["", "[[", "]]]]", "{{{{", "<<>>", "&;", "'''", "|-|"] {
            let _ = rules.rewrite_line(input);
            let _ = rules.rewrite_tokens(input);
        }
    }
}
