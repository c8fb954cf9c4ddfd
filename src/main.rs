//! Extract the attachments of every message in an mbox archive.
//!
//! ```bash
//! # Write attachments under ./attachments/<Year-Mon>/
//! mbox-attachments "All mail Including Spam and Trash.mbox"
//!
//! # Skip spam and trash, write beside the archive
//! mbox-attachments mail.mbox -i Spam Trash --beside-archive
//! ```
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use mbox_attachments::extract::{DEFAULT_OUTPUT_DIR, DEFAULT_SPAM_LABEL};
use mbox_attachments::mail::GMAIL_LABELS_HEADER;
use mbox_attachments::{Error, ExtractConfig, Extractor};

#[derive(Parser)]
#[command(name = "mbox-attachments")]
#[command(about = "Extract the attachments of an mbox archive", long_about = None)]
struct Cli {
    /// The mbox archive to read
    #[arg(value_name = "MBOX_FILE")]
    mbox_file: PathBuf,

    /// Skip messages carrying any of these labels
    #[arg(short, long, num_args = 0.., default_value = DEFAULT_SPAM_LABEL)]
    ignore_labels: Vec<String>,

    /// Directory to write attachments under
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR, conflicts_with = "beside_archive")]
    output_directory: PathBuf,

    /// Write attachments to <MBOX_FILE>_attachments
    #[arg(long)]
    beside_archive: bool,

    /// Header holding the labels of a message
    #[arg(long, default_value = GMAIL_LABELS_HEADER)]
    label_header: String,
}

impl Cli {
    fn config(&self) -> ExtractConfig {
        let output_dir = if self.beside_archive {
            let mut dir = self.mbox_file.clone().into_os_string();
            dir.push("_attachments");
            PathBuf::from(dir)
        } else {
            self.output_directory.clone()
        };

        ExtractConfig {
            output_dir,
            ignore_labels: self.ignore_labels.clone(),
            label_header: self.label_header.clone(),
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.config();
    info!(
        archive = %cli.mbox_file.display(),
        output_dir = %config.output_dir.display(),
        ignore_labels = ?config.ignore_labels,
        label_header = %config.label_header,
        "extracting attachments"
    );

    let stdout = io::stdout();
    let mut extractor = Extractor::new(config, stdout.lock());
    extractor
        .extract_archive(&cli.mbox_file)
        .with_context(|| format!("failed to extract {}", cli.mbox_file.display()))?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            match e.downcast_ref::<Error>() {
                Some(Error::MalformedArchive { .. }) => ExitCode::from(3),
                _ => ExitCode::from(1),
            }
        }
    }
}
