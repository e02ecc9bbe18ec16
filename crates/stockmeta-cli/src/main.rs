mod context;
mod generate;
mod istock;
mod records;
mod settings;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stockmeta", about = "Stock media metadata generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported media in a folder and select them
    Scan {
        /// Folder to scan
        folder: PathBuf,
    },
    /// Generate metadata for files (one at a time, stops at the first failure)
    Generate {
        /// Media files to process
        paths: Vec<PathBuf>,

        /// Process every supported file in this folder
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// Extra context passed to every prompt
        #[arg(long, default_value = "")]
        hint: String,
    },
    /// Print the stored metadata of a file
    Show {
        path: PathBuf,

        /// Print the raw JSON record
        #[arg(long)]
        json: bool,
    },
    /// Edit a text field or a keyword list
    Edit {
        path: PathBuf,

        /// Text field: title_en, title_tr, description_en, description_tr
        #[arg(long, conflicts_with = "keywords")]
        field: Option<String>,

        /// Keyword list platform: adobe, shutter, istock
        #[arg(long)]
        keywords: Option<String>,

        /// Keyword list language: en, tr
        #[arg(long, default_value = "en")]
        lang: String,

        /// New value (comma-separated for keyword lists)
        #[arg(long)]
        value: String,
    },
    /// Case-insensitive find & replace in titles, descriptions and keywords
    Replace {
        /// Text to find
        #[arg(long)]
        find: String,

        /// Replacement text
        #[arg(long, default_value = "")]
        with: String,

        /// Limit to these files (default: all records)
        paths: Vec<PathBuf>,
    },
    /// Translate the Turkish title or description into English
    Sync {
        path: PathBuf,

        /// title or description
        #[arg(long, default_value = "title")]
        field: String,
    },
    /// Manage the iStock term map
    Istock {
        #[command(subcommand)]
        action: istock::IstockAction,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: settings::SettingsAction,
    },
    /// Render cached thumbnails for a folder
    Thumbs {
        folder: PathBuf,

        /// Use the larger preview size
        #[arg(long)]
        preview: bool,
    },
    /// Export all records as CSV
    Export {
        /// Output file (default: <save_dir>/_metadata.csv)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Clear all records (settings and the iStock map are kept)
    Reset,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Scan { folder } => rt.block_on(generate::run_scan(folder))?,
        Commands::Generate {
            paths,
            folder,
            hint,
        } => rt.block_on(generate::run_generate(paths, folder, hint))?,
        Commands::Show { path, json } => rt.block_on(records::run_show(path, json))?,
        Commands::Edit {
            path,
            field,
            keywords,
            lang,
            value,
        } => rt.block_on(records::run_edit(path, field, keywords, lang, value))?,
        Commands::Replace { find, with, paths } => {
            rt.block_on(records::run_replace(find, with, paths))?
        }
        Commands::Sync { path, field } => rt.block_on(records::run_sync(path, field))?,
        Commands::Istock { action } => rt.block_on(istock::run(action))?,
        Commands::Settings { action } => settings::run(action)?,
        Commands::Thumbs { folder, preview } => {
            rt.block_on(generate::run_thumbs(folder, preview))?
        }
        Commands::Export { out } => rt.block_on(records::run_export(out))?,
        Commands::Reset => rt.block_on(records::run_reset())?,
    }

    Ok(())
}
