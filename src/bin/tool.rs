//! sdbkv Tool Binary
//!
//! Builds tables from tab-separated text and inspects existing tables.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sdbkv::{Config, FileSink, KvIterator, Sink, Skiplist, Table, TableBuilder};
use tracing_subscriber::{fmt, EnvFilter};

/// sdbkv table tool
#[derive(Parser, Debug)]
#[command(name = "sdbkv-tool")]
#[command(about = "Build and inspect sdbkv tables")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a table from `key<TAB>value` lines (first value wins per key)
    Build {
        /// Input text file
        input: PathBuf,
        /// Table file to create
        output: PathBuf,
        /// Leaf region buffer size in MB
        #[arg(long, default_value = "4")]
        leaf_mb: usize,
    },
    /// Print every entry of a table
    Dump {
        file: PathBuf,
        /// Walk from the last entry to the first
        #[arg(short, long)]
        reverse: bool,
    },
    /// Look up one key
    Get { file: PathBuf, key: String },
    /// Print table layout statistics
    Stats { file: PathBuf },
}

fn main() {
    // Initialize tracing/logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,sdbkv=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let result = match args.command {
        Command::Build {
            input,
            output,
            leaf_mb,
        } => build(&input, &output, leaf_mb),
        Command::Dump { file, reverse } => dump(&file, reverse),
        Command::Get { file, key } => get(&file, &key),
        Command::Stats { file } => stats(&file),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn build(input: &Path, output: &Path, leaf_mb: usize) -> sdbkv::Result<()> {
    let config = Config::builder()
        .arena_block_size(16 * 1024 * 1024)
        .leaf_buffer_size(leaf_mb * 1024 * 1024)
        .build();

    let text = fs::read_to_string(input)?;
    let mut memtable = Skiplist::with_config(&config)?;
    let mut skipped = 0usize;
    for line in text.lines().filter(|l| !l.is_empty()) {
        let (key, value) = line.split_once('\t').unwrap_or((line, ""));
        if memtable.put(key.as_bytes(), value.as_bytes())?.is_some() {
            skipped += 1;
        }
    }
    tracing::info!(
        entries = memtable.len(),
        duplicates = skipped,
        "memtable loaded"
    );

    let mut sink = FileSink::create(output)?;
    let mut builder = TableBuilder::new(&mut sink, &config)?;
    for (key, value) in memtable.iter() {
        builder.add(key, value)?;
    }
    let info = builder.finish()?;
    sink.close()?;

    println!(
        "{}: {} entries, {} leaves, {} bytes",
        output.display(),
        info.num_entries,
        info.num_leaves,
        info.file_size
    );
    Ok(())
}

fn open(file: &Path) -> sdbkv::Result<Table> {
    Table::open_file(file, Config::default().comparator)
}

fn dump(file: &Path, reverse: bool) -> sdbkv::Result<()> {
    let table = open(file)?;
    let mut iter = table.iter();

    if reverse {
        iter.seek_to_last();
        iter.prev();
    } else {
        iter.seek_to_first();
    }
    while iter.valid() {
        println!(
            "{}\t{}",
            String::from_utf8_lossy(&iter.key()),
            String::from_utf8_lossy(&iter.value())
        );
        if reverse {
            iter.prev();
        } else {
            iter.next();
        }
    }
    iter.status()
}

fn get(file: &Path, key: &str) -> sdbkv::Result<()> {
    let table = open(file)?;
    match table.get(key.as_bytes())? {
        Some(value) => println!("{}", String::from_utf8_lossy(&value)),
        None => println!("(not found)"),
    }
    Ok(())
}

fn stats(file: &Path) -> sdbkv::Result<()> {
    let table = open(file)?;

    let mut entries = 0u64;
    let mut iter = table.iter();
    iter.seek_to_first();
    while iter.valid() {
        entries += 1;
        iter.next();
    }
    iter.status()?;

    println!("file:        {}", file.display());
    println!("entries:     {}", entries);
    println!("leaves:      {}", table.num_leaves());
    println!("leaf bytes:  {}", table.leaf_region_size());
    println!("index bytes: {}", table.index_size());
    let boundaries = table.leaf_boundaries();
    if let (Some(first), Some(last)) = (boundaries.first(), boundaries.last()) {
        println!(
            "leaf ends:   {} .. {}",
            String::from_utf8_lossy(first),
            String::from_utf8_lossy(last)
        );
    }
    Ok(())
}
