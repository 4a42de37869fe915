use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::StringArray;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Write a synthetic recipient list for trying out the scheduler
#[derive(Parser)]
#[command(name = "generate_sample")]
struct Args {
    /// Output file; .csv or .parquet
    #[arg(default_value = "sample_data.parquet")]
    output: PathBuf,

    /// Number of recipients
    #[arg(long, default_value = "500")]
    count: usize,

    #[arg(long, default_value = "42")]
    seed: u64,
}

/// Domains with relative weights; a few large providers dominate, as in real
/// mailing lists.
const DOMAINS: &[(&str, u32)] = &[
    ("gmail.com", 30),
    ("outlook.com", 12),
    ("yahoo.com", 8),
    ("qq.com", 6),
    ("163.com", 4),
    ("example.edu.cn", 2),
    ("fastmail.com", 2),
    ("uni-example.de", 1),
    ("acme.io", 1),
];

fn pick_domain(rng: &mut ChaCha8Rng) -> &'static str {
    let total: u32 = DOMAINS.iter().map(|(_, w)| w).sum();
    let mut roll = rng.gen_range(0..total);
    for &(domain, weight) in DOMAINS {
        if roll < weight {
            return domain;
        }
        roll -= weight;
    }
    DOMAINS[0].0
}

fn generate(count: usize, rng: &mut ChaCha8Rng) -> Vec<String> {
    let names = ["alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi"];
    (0..count)
        .map(|i| {
            let name = names.choose(rng).copied().unwrap_or("user");
            format!("{name}.{i}@{}", pick_domain(rng))
        })
        .collect()
}

fn write_parquet(path: &Path, emails: &[String]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![Field::new("EMAIL", DataType::Utf8, false)]));
    let array = StringArray::from(emails.iter().map(|s| s.as_str()).collect::<Vec<_>>());
    let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(array)])
        .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn write_csv(path: &Path, emails: &[String]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating output file")?;
    writer.write_record(["EMAIL"])?;
    for email in emails {
        writer.write_record([email.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let emails = generate(args.count, &mut rng);

    let ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "parquet" | "pq" => write_parquet(&args.output, &emails)?,
        "csv" => write_csv(&args.output, &emails)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    log::info!("Wrote {} recipients to {}", emails.len(), args.output.display());
    Ok(())
}
