use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

/// Counters collected while counting words. Reported at the end of a run,
/// never used to steer it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub pages: u64,
    pub redirects: u64,
    pub lines: u64,
    pub lines_skipped: u64,
    pub words: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, other: &RunStats) {
        self.pages += other.pages;
        self.redirects += other.redirects;
        self.lines += other.lines;
        self.lines_skipped += other.lines_skipped;
        self.words += other.words;
    }

    /// One-line progress message, e.g. `  12.35K pgs,    0.48M lns,    3.10M wds`.
    pub fn progress_message(&self) -> String {
        format!(
            "{} pgs, {} lns, {} wds",
            abbreviate(self.pages),
            abbreviate(self.lines),
            abbreviate(self.words)
        )
    }
}

/// Compact, fixed-width rendering used for progress output.
pub fn abbreviate(n: u64) -> String {
    match n {
        n if n > 100_000 => format!("{:7.2}M", n as f64 / 1_000_000.0),
        n if n > 1_000 => format!("{:7.2}K", n as f64 / 1_000.0),
        n => format!("{:7}.00", n),
    }
}

/// Pretty-printed JSON followed by a newline. The writer is flushed before
/// returning so a failed final write is reported.
pub fn write_json_report<W: Write, T: Serialize>(mut writer: W, report: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, report).context("Failed to serialize report")?;
    writeln!(writer).context("Failed to write report")?;
    writer.flush().context("Failed to flush report")?;
    Ok(())
}

/// Decimal rendering with `,` between groups of three digits.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, BufWriter};

    /// Accepts writes, fails on flush.
    struct UnflushableSink(Vec<u8>);

    impl Write for UnflushableSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::other("disk full"))
        }
    }

    #[test]
    fn json_report_is_written_with_trailing_newline() {
        let stats = RunStats {
            pages: 3,
            words: 12,
            ..RunStats::default()
        };
        let mut out = Vec::new();
        write_json_report(&mut out, &stats).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("}\n"));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["pages"], 3);
        assert_eq!(parsed["words"], 12);
        assert_eq!(parsed["lines_skipped"], 0);
    }

    #[test]
    fn json_report_surfaces_flush_failure() {
        let stats = RunStats::new();
        let err = write_json_report(BufWriter::new(UnflushableSink(Vec::new())), &stats).unwrap_err();
        assert!(format!("{:#}", err).contains("disk full"));
    }

    #[test]
    fn default_values_are_zero() {
        let stats = RunStats::new();
        assert_eq!(stats.pages, 0);
        assert_eq!(stats.redirects, 0);
        assert_eq!(stats.lines, 0);
        assert_eq!(stats.lines_skipped, 0);
        assert_eq!(stats.words, 0);
    }

    #[test]
    fn merge_adds_every_counter() {
        let mut stats = RunStats {
            pages: 1,
            redirects: 2,
            lines: 3,
            lines_skipped: 4,
            words: 5,
        };
        stats.merge(&RunStats {
            pages: 10,
            redirects: 20,
            lines: 30,
            lines_skipped: 40,
            words: 50,
        });
        assert_eq!(
            stats,
            RunStats {
                pages: 11,
                redirects: 22,
                lines: 33,
                lines_skipped: 44,
                words: 55,
            }
        );
    }

    #[test]
    fn abbreviate_small_numbers() {
        assert_eq!(abbreviate(0), "      0.00");
        assert_eq!(abbreviate(1000), "   1000.00");
    }

    #[test]
    fn abbreviate_thousands_and_millions() {
        assert_eq!(abbreviate(12_346), "  12.35K");
        assert_eq!(abbreviate(100_000), " 100.00K");
        assert_eq!(abbreviate(3_100_000), "   3.10M");
    }

    #[test]
    fn group_thousands_inserts_separators() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(group_thousands(12_345_678_901), "12,345,678,901");
    }

    #[test]
    fn progress_message_format() {
        let stats = RunStats {
            pages: 12,
            lines: 2_000,
            words: 150_000,
            ..RunStats::default()
        };
        assert_eq!(
            stats.progress_message(),
            "     12.00 pgs,    2.00K lns,    0.15M wds"
        );
    }
}
