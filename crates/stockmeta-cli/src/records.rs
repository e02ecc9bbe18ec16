use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use stockmeta_pipeline::state::SyncField;
use stockmeta_pipeline::translate::Translator;
use stockmeta_storage::export::{DEFAULT_EXPORT_NAME, join_keywords, write_csv};
use stockmeta_types::{Lang, MetadataRecord, Platform, TextField};

use crate::context::{Providers, file_id, open_state};

pub async fn run_show(path: PathBuf, json: bool) -> Result<()> {
    let state = open_state().await?;
    let id = file_id(&path)?;
    let Some(record) = state.record(&id) else {
        bail!("No metadata for {} (run `stockmeta scan` or `generate` first)", path.display());
    };
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        print_record(record);
    }
    Ok(())
}

fn print_record(record: &MetadataRecord) {
    println!("{}", record.file_name);
    println!("  created:        {}", record.created_at.format("%Y-%m-%d %H:%M"));
    for field in TextField::ALL {
        println!("  {:<15} {}", format!("{field:?}:"), record.text(field));
    }
    for platform in Platform::ALL {
        for lang in [Lang::En, Lang::Tr] {
            let list = record.keywords(platform, lang);
            println!(
                "  {} {} ({}/{}): {}",
                platform.display_name(),
                lang.code().to_uppercase(),
                list.len(),
                platform.cap(),
                join_keywords(list)
            );
        }
    }
}

pub async fn run_edit(
    path: PathBuf,
    field: Option<String>,
    keywords: Option<String>,
    lang: String,
    value: String,
) -> Result<()> {
    let mut state = open_state().await?;
    let id = file_id(&path)?;

    match (field, keywords) {
        (Some(field), None) => {
            let field: TextField = field.parse().map_err(anyhow::Error::msg)?;
            state.set_text(&id, field, &value).await?;
        }
        (None, Some(platform)) => {
            let platform: Platform = platform.parse().map_err(anyhow::Error::msg)?;
            let lang: Lang = lang.parse().map_err(anyhow::Error::msg)?;
            let terms: Vec<String> = value.split(',').map(|t| t.trim().to_string()).collect();
            state.set_keywords(&id, platform, lang, &terms).await?;
        }
        _ => bail!("Pass exactly one of --field or --keywords"),
    }

    if let Some(record) = state.record(&id) {
        print_record(record);
    }
    Ok(())
}

pub async fn run_replace(find: String, with: String, paths: Vec<PathBuf>) -> Result<()> {
    let mut state = open_state().await?;
    let ids = paths
        .iter()
        .map(|p| file_id(p))
        .collect::<Result<Vec<_>>>()?;
    let changed = state.find_replace(&ids, &find, &with).await?;
    println!("Replaced \"{find}\" in {changed} field(s)");
    Ok(())
}

pub async fn run_sync(path: PathBuf, field: String) -> Result<()> {
    let field = match field.trim().to_ascii_lowercase().as_str() {
        "title" => SyncField::Title,
        "description" | "desc" => SyncField::Description,
        other => bail!("Unknown field '{other}', expected title or description"),
    };
    let mut state = open_state().await?;
    if !state.settings().has_api_key() {
        bail!("API key is missing (set groq_api_key or GROQ_API_KEY)");
    }
    let id = file_id(&path)?;
    let providers = Providers::from_settings(state.settings());
    let translator = Translator::new(&providers.vision);
    let text = state.sync_to_english(&id, field, &translator).await?;
    println!("{text}");
    Ok(())
}

pub async fn run_export(out: Option<PathBuf>) -> Result<()> {
    let state = open_state().await?;
    let path = match out {
        Some(path) => path,
        None => match &state.settings().save_dir {
            Some(dir) => dir.join(DEFAULT_EXPORT_NAME),
            None => bail!("No save directory known; pass --out or run `stockmeta scan <folder>`"),
        },
    };
    let rows = write_csv(&path, state.records().values())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Exported {rows} row(s) to {}", path.display());
    Ok(())
}

pub async fn run_reset() -> Result<()> {
    let mut state = open_state().await?;
    let count = state.records().len();
    state.reset().await?;
    println!("Cleared {count} record(s)");
    Ok(())
}
