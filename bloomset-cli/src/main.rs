// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::collections::BTreeSet;
use std::fs;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use bloomset::bloom::BloomFilter;
use bloomset::bloom::Format;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use tracing_subscriber::EnvFilter;

const DEFAULT_ERROR_RATE: f64 = 0.0001;

#[derive(Parser)]
#[command(name = "bloomset", version, about = "Generate and inspect Bloom filter files")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Build a filter from a word list, plus its whitelist and specification files.
    Generate {
        /// Newline-separated keys to add to the filter
        #[arg(long)]
        input: PathBuf,
        /// Newline-separated keys checked for false positives
        #[arg(long)]
        validation: PathBuf,
        /// Prefix of the three output files
        #[arg(long)]
        output_prefix: String,
        /// Target false positive probability
        #[arg(long, default_value_t = DEFAULT_ERROR_RATE)]
        error_rate: f64,
    },

    /// Test keys against a filter file.
    Check {
        #[arg(long)]
        filter: PathBuf,
        /// Capacity to assume for legacy files
        #[arg(long)]
        max_items: Option<u64>,
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Print the format and parameters of a filter file as JSON.
    Info {
        #[arg(long)]
        filter: PathBuf,
        /// Capacity to assume for legacy files
        #[arg(long)]
        max_items: Option<u64>,
    },
}

#[derive(Serialize)]
struct Whitelist<'a> {
    data: Vec<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FilterSpec {
    total_entries: usize,
    error_rate: f64,
    sha256: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FilterInfo {
    format: &'static str,
    file_size: usize,
    max_items: u64,
    size_in_bits: u64,
    bits_per_block: u64,
    num_blocks: u64,
    hash_rounds: u64,
    num_inserted: u64,
    bits_used: u64,
    load_factor: f64,
    estimated_fpp: f64,
}

fn read_lines(path: &Path) -> Result<BTreeSet<String>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut lines = BTreeSet::new();
    for line in BufReader::new(file).lines() {
        lines.insert(line.with_context(|| format!("failed to read {}", path.display()))?);
    }
    Ok(lines)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))
}

fn sha256_hex(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

fn load_filter(path: &Path, max_items: Option<u64>) -> Result<(Format, usize, BloomFilter)> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let Some(format) = Format::detect(&bytes) else {
        bail!("{} is too short to be a filter file", path.display());
    };
    let filter = BloomFilter::deserialize(&bytes, max_items)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    Ok((format, bytes.len(), filter))
}

fn generate(input: &Path, validation: &Path, prefix: &str, error_rate: f64) -> Result<()> {
    let filter_path = PathBuf::from(format!("{prefix}-bloom.bin"));
    let whitelist_path = PathBuf::from(format!("{prefix}-whitelist.json"));
    let spec_path = PathBuf::from(format!("{prefix}-bloom-spec.json"));

    tracing::info!(input = %input.display(), "generating filter");
    let entries = read_lines(input)?;
    let mut filter = BloomFilter::new(entries.len() as u64, error_rate)
        .with_context(|| format!("cannot size a filter for {}", input.display()))?;
    for entry in entries.iter().filter(|entry| !entry.is_empty()) {
        filter.add(entry);
    }
    filter.write_to_file(&filter_path)?;
    tracing::info!(
        path = %filter_path.display(),
        entries = entries.len(),
        size_in_bits = filter.size_in_bits(),
        hash_rounds = filter.hash_rounds(),
        "wrote filter"
    );

    tracing::info!(validation = %validation.display(), "generating whitelist");
    let candidates = read_lines(validation)?;
    let data: Vec<&str> = candidates
        .iter()
        .filter(|key| filter.contains(key) && !entries.contains(*key))
        .map(String::as_str)
        .collect();
    tracing::info!(false_positives = data.len(), "checked validation keys");
    write_json(&whitelist_path, &Whitelist { data })?;

    tracing::info!("generating filter specification");
    let spec = FilterSpec {
        total_entries: entries.len(),
        error_rate,
        sha256: sha256_hex(&filter_path)?,
    };
    write_json(&spec_path, &spec)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Generate {
            input,
            validation,
            output_prefix,
            error_rate,
        } => generate(&input, &validation, &output_prefix, error_rate)?,
        Cmd::Check {
            filter,
            max_items,
            keys,
        } => {
            let (_, _, filter) = load_filter(&filter, max_items)?;
            let mut out = std::io::stdout().lock();
            for key in keys {
                writeln!(out, "{key}\t{}", filter.contains(&key))?;
            }
        }
        Cmd::Info { filter, max_items } => {
            let (format, file_size, filter) = load_filter(&filter, max_items)?;
            let settings = filter.settings();
            let info = FilterInfo {
                format: match format {
                    Format::Legacy => "legacy",
                    Format::Versioned => "versioned",
                },
                file_size,
                max_items: settings.max_items,
                size_in_bits: settings.size_in_bits,
                bits_per_block: settings.bits_per_block,
                num_blocks: settings.num_blocks,
                hash_rounds: settings.hash_rounds,
                num_inserted: settings.num_inserted,
                bits_used: filter.bits_used(),
                load_factor: filter.load_factor(),
                estimated_fpp: filter.estimated_fpp(),
            };
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }
    Ok(())
}
