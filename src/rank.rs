use crate::frequency::FrequencyTable;
use crate::models::RankedEntry;
use anyhow::{Context, Result};
use csv::{QuoteStyle, WriterBuilder};
use rayon::slice::ParallelSliceMut;
use std::io::Write;

/// Orders words by descending count. Equal counts are ordered by the word's
/// bytes, ascending, so the output is reproducible across runs.
pub fn rank(table: FrequencyTable) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = table
        .into_counts()
        .into_iter()
        .map(|(word, count)| RankedEntry { word, count })
        .collect();
    entries.par_sort_unstable_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    entries
}

/// Length of the ranked prefix whose counts meet `min_freq`.
pub fn cutoff(entries: &[RankedEntry], min_freq: u64) -> usize {
    entries.partition_point(|entry| entry.count >= min_freq)
}

/// Writes `count<TAB>word` lines for every entry with `count >= min_freq`.
/// Returns the number of lines written.
pub fn write_tsv<W: Write>(writer: W, entries: &[RankedEntry], min_freq: u64) -> Result<usize> {
    let kept = &entries[..cutoff(entries, min_freq)];
    let mut out = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .from_writer(writer);

    let mut count_buf = itoa::Buffer::new();
    for entry in kept {
        out.write_record([count_buf.format(entry.count), entry.word.as_str()])
            .with_context(|| format!("Failed to write entry for: {}", entry.word))?;
    }
    out.flush().context("Failed to flush frequency list")?;
    Ok(kept.len())
}

/// Writes the entries with `count >= min_freq` as a JSON array of `{"word", "count"}`.
pub fn write_json<W: Write>(mut writer: W, entries: &[RankedEntry], min_freq: u64) -> Result<usize> {
    let kept = &entries[..cutoff(entries, min_freq)];
    serde_json::to_writer_pretty(&mut writer, kept).context("Failed to serialize frequency list")?;
    writeln!(writer)?;
    writer.flush().context("Failed to flush frequency list")?;
    Ok(kept.len())
}
