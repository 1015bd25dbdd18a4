use crate::config::READ_BUFFER_SIZE;
use anyhow::{bail, Context, Result};
use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Bzip2,
    Gzip,
}

impl Compression {
    /// Chosen from the resource name's suffix; query strings and fragments of
    /// URLs are ignored.
    pub fn detect(source: &str) -> Self {
        let path = source.split(['?', '#']).next().unwrap_or(source);
        if path.ends_with(".bz2") {
            Compression::Bzip2
        } else if path.ends_with(".gz") {
            Compression::Gzip
        } else {
            Compression::None
        }
    }
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Opens a dump for streaming. Failing to reach the resource is reported here,
/// before any page is read.
pub fn open_source(source: &str) -> Result<Box<dyn BufRead>> {
    let raw: Box<dyn Read> = if is_remote(source) {
        Box::new(fetch(source)?)
    } else {
        let file =
            File::open(source).with_context(|| format!("Failed to open dump file: {}", source))?;
        Box::new(file)
    };

    let compression = Compression::detect(source);
    debug!(source, ?compression, "Opened input stream");
    Ok(decompress(raw, compression))
}

pub fn decompress<R: Read + 'static>(raw: R, compression: Compression) -> Box<dyn BufRead> {
    match compression {
        // Multistream dumps are many concatenated bzip2 streams.
        Compression::Bzip2 => Box::new(BufReader::with_capacity(
            READ_BUFFER_SIZE,
            MultiBzDecoder::new(raw),
        )),
        Compression::Gzip => Box::new(BufReader::with_capacity(
            READ_BUFFER_SIZE,
            MultiGzDecoder::new(raw),
        )),
        Compression::None => Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, raw)),
    }
}

fn fetch(url: &str) -> Result<reqwest::blocking::Response> {
    info!(url, "Fetching dump");
    let response = reqwest::blocking::Client::builder()
        .timeout(None)
        .build()
        .context("Failed to build HTTP client")?
        .get(url)
        .send()
        .with_context(|| format!("Failed to fetch: {}", url))?;

    let status = response.status();
    if !status.is_success() {
        bail!("{} {}", status, url);
    }
    Ok(response)
}
