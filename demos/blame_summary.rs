//! Blame a repository and print how many characters each author owns.
//!
//! ```text
//! cargo run --example blame_summary -- /path/to/repo --revision HEAD --ignore vendor/
//! cargo run --example blame_summary -- /path/to/repo --file src/lib.rs --range 0:200
//! ```

use anyhow::{Context, Result, bail};
use charblame::types::AuthorHistogram;
use charblame::{BlameClient, Config};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "blame_summary", about = "Character-level blame summary")]
struct Args {
    /// Repository root
    repo: PathBuf,

    /// Revision to blame
    #[arg(short, long, default_value = "HEAD")]
    revision: String,

    /// Skip paths containing this substring (repeatable)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Only blame this file
    #[arg(short, long)]
    file: Option<String>,

    /// Character range `start:end` to query within --file
    #[arg(long, requires = "file")]
    range: Option<String>,

    /// Worker pool size
    #[arg(short = 'j', long, env = "CHARBLAME_MAX_CONCURRENCY")]
    jobs: Option<usize>,
}

fn parse_range(range: &str) -> Result<(i64, i64)> {
    let Some((start, end)) = range.split_once(':') else {
        bail!("range must look like START:END, got {:?}", range);
    };
    Ok((
        start.trim().parse().context("invalid range start")?,
        end.trim().parse().context("invalid range end")?,
    ))
}

fn print_histogram(histogram: &AuthorHistogram) {
    let total: usize = histogram.values().sum();
    let mut rows: Vec<_> = histogram.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    for (author, chars) in rows {
        let pct = if total == 0 {
            0.0
        } else {
            *chars as f64 / total as f64 * 100.0
        };
        println!(
            "{:>10} {:>6.2}%  {} <{}>",
            chars, pct, author.name, author.email
        );
    }
    println!("{:>10} total", total);
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::new()?;
    if let Some(jobs) = args.jobs {
        config.blame.max_concurrency = jobs;
    }
    config.validate()?;
    let client = BlameClient::with_config(config);

    if let Some(path) = &args.file {
        let blame = client.blame_file(&args.repo, path, &args.revision)?;
        let (start, end) = match &args.range {
            Some(range) => parse_range(range)?,
            None => (0, blame.char_len() as i64),
        };
        println!("{} [{}, {}) at {}", path, start, end, args.revision);
        print_histogram(&client.query(&blame.hunks, &blame.commits, start, end)?);
        return Ok(());
    }

    let blame = client.blame_repository(&args.repo, &args.revision, &args.ignore)?;

    let mut totals = AuthorHistogram::new();
    for (path, hunks) in &blame.hunks {
        let len: usize = hunks.iter().map(|h| h.char_len()).sum();
        if len == 0 {
            continue;
        }
        let histogram = blame
            .query_file(path, 0, len as i64)
            .with_context(|| format!("failed to query {}", path))?;
        for (author, chars) in histogram {
            *totals.entry(author).or_insert(0) += chars;
        }
    }

    println!(
        "{} files, {} hunks, {} commits at {}",
        blame.file_count(),
        blame.total_hunks(),
        blame.commits.len(),
        args.revision
    );
    print_histogram(&totals);
    Ok(())
}
