use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageType {
    Article,
    Redirect(String),
}

/// One decoded `<page>` subtree. Lives only until its text has been tokenized.
#[derive(Debug, Clone)]
pub struct Page {
    pub title: String,
    pub page_type: PageType,
    pub text: String,
}

impl Page {
    pub fn is_redirect(&self) -> bool {
        matches!(self.page_type, PageType::Redirect(_))
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match &self.page_type {
            PageType::Redirect(target) => Some(target.as_str()),
            PageType::Article => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub word: String,
    pub count: u64,
}
