use crate::input;
use crate::models::{Page, PageType};
use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::io::BufRead;

/// Which `<page>` child the text events currently belong to.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Text,
    Other,
}

/// Pull cursor over a dump: each call to [`WikiReader::next_page`] scans to the
/// next `<page>` and decodes only that subtree, so memory stays bounded by the
/// largest page rather than the dump.
pub struct WikiReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl WikiReader<Box<dyn BufRead>> {
    /// Opens a local path or URL, decompressing by file suffix.
    pub fn open(source: &str) -> Result<Self> {
        let stream = input::open_source(source)?;
        Ok(Self::from_reader(stream))
    }
}

impl<R: BufRead> WikiReader<R> {
    pub fn from_reader(inner: R) -> Self {
        Self {
            reader: Reader::from_reader(inner),
            buf: Vec::with_capacity(64 * 1024),
        }
    }

    /// Byte offset in the decoded stream, for error reporting.
    pub fn byte_offset(&self) -> usize {
        self.reader.buffer_position()
    }

    /// `Ok(None)` at end of stream. Documents without `<page>` elements simply
    /// produce no pages.
    pub fn next_page(&mut self) -> Result<Option<Page>> {
        loop {
            self.buf.clear();
            let at_page = match self
                .reader
                .read_event_into(&mut self.buf)
                .context("Malformed XML while scanning for <page>")?
            {
                Event::Start(e) => e.local_name().as_ref() == b"page",
                Event::Eof => return Ok(None),
                _ => false,
            };
            if at_page {
                return self.decode_page().map(Some);
            }
        }
    }

    fn decode_page(&mut self) -> Result<Page> {
        let mut title = String::new();
        let mut redirect: Option<String> = None;
        let mut text = String::new();

        let mut field = Field::Other;
        // Open elements below <page>.
        let mut depth = 0usize;
        let mut in_revision = false;

        loop {
            self.buf.clear();
            match self
                .reader
                .read_event_into(&mut self.buf)
                .context("Malformed XML inside <page>")?
            {
                Event::Start(e) => {
                    let name = e.local_name();
                    match (depth, name.as_ref()) {
                        (0, b"title") => {
                            title.clear();
                            field = Field::Title;
                        }
                        (0, b"redirect") => redirect = redirect_title(&e)?,
                        (0, b"revision") => in_revision = true,
                        (1, b"text") if in_revision => {
                            text.clear();
                            field = Field::Text;
                        }
                        _ => field = Field::Other,
                    }
                    depth += 1;
                }
                Event::Empty(e) => {
                    if depth == 0 && e.local_name().as_ref() == b"redirect" {
                        redirect = redirect_title(&e)?;
                    }
                }
                Event::Text(e) => {
                    let target = match field {
                        Field::Title => &mut title,
                        Field::Text => &mut text,
                        Field::Other => continue,
                    };
                    target.push_str(&e.unescape().context("Invalid character data in page")?);
                }
                Event::CData(e) => {
                    let target = match field {
                        Field::Title => &mut title,
                        Field::Text => &mut text,
                        Field::Other => continue,
                    };
                    target.push_str(std::str::from_utf8(&e).context("CDATA is not valid UTF-8")?);
                }
                Event::End(_) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    field = Field::Other;
                    if depth == 0 {
                        in_revision = false;
                    }
                }
                Event::Eof => bail!("Stream ended inside <page> (title: {:?})", title),
                _ => {}
            }
        }

        let page_type = match redirect {
            Some(target) if !target.is_empty() => PageType::Redirect(target),
            _ => PageType::Article,
        };
        Ok(Page {
            title,
            page_type,
            text,
        })
    }
}

fn redirect_title(e: &BytesStart<'_>) -> Result<Option<String>> {
    match e
        .try_get_attribute("title")
        .context("Invalid attribute on <redirect>")?
    {
        Some(attr) => Ok(Some(
            attr.unescape_value()
                .context("Invalid redirect title")?
                .into_owned(),
        )),
        None => Ok(None),
    }
}

impl<R: BufRead> Iterator for WikiReader<R> {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_page().transpose()
    }
}
