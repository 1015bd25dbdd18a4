use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;
use wikifreq::config::{DEFAULT_MIN_FREQ, WRITE_BUFFER_SIZE};
use wikifreq::extract::{count_words, CountOptions};
use wikifreq::parser::WikiReader;
use wikifreq::pipeline::{LineOutcome, TextPipeline};
use wikifreq::rank;
use wikifreq::rules::RuleOptions;
use wikifreq::stats::{group_thousands, write_json_report, RunStats};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "wikifreq")]
#[command(about = "Turn Wikipedia dumps into ranked word-frequency lists")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count words in a dump and print them by descending frequency
    Count(CountArgs),
    /// Normalize raw dump lines and print the resulting words
    Tokenize(TokenizeArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// `count<TAB>word`, one per line
    Tsv,
    /// JSON array of {"word", "count"}
    Json,
}

#[derive(Args)]
struct RuleArgs {
    /// Category namespace name rewritten to a plain link (repeatable)
    #[arg(long = "category-prefix", value_name = "NAME")]
    category_prefixes: Vec<String>,

    /// User namespace name whose links mark a line as noise (repeatable)
    #[arg(long = "user-prefix", value_name = "NAME")]
    user_prefixes: Vec<String>,

    /// Strip https:// URLs as well as http:// ones
    #[arg(long)]
    strip_https: bool,
}

impl RuleArgs {
    fn rule_options(&self) -> RuleOptions {
        let mut options = RuleOptions::default();
        if !self.category_prefixes.is_empty() {
            options.category_prefixes = self.category_prefixes.clone();
        }
        if !self.user_prefixes.is_empty() {
            options.user_prefixes = self.user_prefixes.clone();
        }
        options.strip_https = self.strip_https;
        options
    }
}

#[derive(Args)]
struct CountArgs {
    /// Dump to read: local path or http(s) URL, plain .xml or .xml.bz2/.xml.gz
    source: String,

    /// Limit number of pages to read (0 = no limit)
    #[arg(long)]
    page_limit: Option<u64>,

    /// Lowest count written to the output
    #[arg(long, default_value_t = DEFAULT_MIN_FREQ)]
    min_freq: u64,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
    format: OutputFormat,

    /// Worker threads for tokenization (1 = single-threaded)
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Also write run statistics as JSON to this path
    #[arg(long)]
    stats_json: Option<String>,

    /// Don't show the progress spinner
    #[arg(short, long)]
    quiet: bool,

    #[command(flatten)]
    rules: RuleArgs,
}

#[derive(Args)]
struct TokenizeArgs {
    /// File with one raw line per line (defaults to stdin)
    input: Option<String>,

    #[command(flatten)]
    rules: RuleArgs,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    source: &'a str,
    #[serde(flatten)]
    stats: RunStats,
    unique_words: usize,
    words_written: usize,
    load_secs: f64,
    write_secs: f64,
}

fn run_count(args: CountArgs) -> Result<()> {
    info!(
        source = %args.source,
        page_limit = ?args.page_limit,
        min_freq = args.min_freq,
        threads = args.threads,
        "Starting word count"
    );

    let pipeline = TextPipeline::new(&args.rules.rule_options())?;
    let options = CountOptions {
        page_limit: args.page_limit,
        threads: args.threads.max(1),
        show_progress: !args.quiet,
    };

    let start_loading = Instant::now();
    let reader = WikiReader::open(&args.source)?;
    let counts = count_words(reader, &pipeline, &options)?;
    let load_duration = start_loading.elapsed();

    let unique_words = counts.table.len();
    let stats = counts.stats;

    let start_writing = Instant::now();
    let ranked = rank::rank(counts.table);
    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create output file: {}", path))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let sink = BufWriter::with_capacity(WRITE_BUFFER_SIZE, sink);
    let words_written = match args.format {
        OutputFormat::Tsv => rank::write_tsv(sink, &ranked, args.min_freq)?,
        OutputFormat::Json => rank::write_json(sink, &ranked, args.min_freq)?,
    };
    let write_duration = start_writing.elapsed();

    if let Some(path) = &args.stats_json {
        let summary = RunSummary {
            source: &args.source,
            stats,
            unique_words,
            words_written,
            load_secs: load_duration.as_secs_f64(),
            write_secs: write_duration.as_secs_f64(),
        };
        let file =
            File::create(path).with_context(|| format!("Failed to create stats file: {}", path))?;
        write_json_report(BufWriter::new(file), &summary)
            .with_context(|| format!("Failed to write stats file: {}", path))?;
    }

    print_summary(&stats, unique_words, words_written, load_duration, write_duration);
    Ok(())
}

fn print_summary(
    stats: &RunStats,
    unique_words: usize,
    words_written: usize,
    load_duration: Duration,
    write_duration: Duration,
) {
    eprintln!();
    eprintln!("=== Summary ===");
    eprintln!("Load time:          {:.2}s", load_duration.as_secs_f64());
    eprintln!("Write time:         {:.2}s", write_duration.as_secs_f64());
    eprintln!(
        "Total time:         {:.2}s",
        (load_duration + write_duration).as_secs_f64()
    );
    eprintln!();
    eprintln!("Pages:           {:>14}", group_thousands(stats.pages));
    eprintln!("Redirects:       {:>14}", group_thousands(stats.redirects));
    eprintln!("Lines:           {:>14}", group_thousands(stats.lines));
    eprintln!("Skipped lines:   {:>14}", group_thousands(stats.lines_skipped));
    eprintln!("Words:           {:>14}", group_thousands(stats.words));
    eprintln!("Unique words:    {:>14}", group_thousands(unique_words as u64));
    eprintln!("Words written:   {:>14}", group_thousands(words_written as u64));
}

fn run_tokenize(args: TokenizeArgs) -> Result<()> {
    let pipeline = TextPipeline::new(&args.rules.rule_options())?;
    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open input file: {}", path))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let mut out = BufWriter::new(io::stdout().lock());

    for line in input.lines() {
        let line = line.context("Failed to read input line")?;
        match pipeline.process_line(&line) {
            LineOutcome::Skipped => writeln!(out)?,
            LineOutcome::Tokens(words) => writeln!(out, "{}", words.join(" "))?,
        }
    }
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        Commands::Count(args) => run_count(args),
        Commands::Tokenize(args) => run_tokenize(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
