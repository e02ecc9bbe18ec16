use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use crate::context::{file_id, open_state};

#[derive(Subcommand)]
pub enum IstockAction {
    /// List all term mappings
    List,
    /// Map a generic term to its iStock term
    Add { generic: String, term: String },
    /// Remove a mapping
    Remove { generic: String },
    /// Learn mappings from edits made to a file's iStock keywords
    Learn { path: PathBuf },
    /// Re-apply the map to a file's iStock keywords
    Apply { path: PathBuf },
}

pub async fn run(action: IstockAction) -> Result<()> {
    let mut state = open_state().await?;
    match action {
        IstockAction::List => {
            if state.istock_map().is_empty() {
                println!("No iStock mappings");
            }
            for (generic, term) in state.istock_map() {
                println!("  {generic} -> {term}");
            }
        }
        IstockAction::Add { generic, term } => {
            state.istock_set(&generic, &term).await?;
            println!("Mapped {} -> {}", generic.trim(), term.trim());
        }
        IstockAction::Remove { generic } => {
            if state.istock_remove(&generic).await? {
                println!("Removed {}", generic.trim());
            } else {
                println!("No mapping for {}", generic.trim());
            }
        }
        IstockAction::Learn { path } => {
            let learned = state.learn_istock(&file_id(&path)?).await?;
            println!("Learned {learned} mapping(s)");
        }
        IstockAction::Apply { path } => {
            let id = file_id(&path)?;
            state.apply_istock(&id).await?;
            if let Some(record) = state.record(&id) {
                println!("{}", record.istock_keywords_en.join(", "));
            }
        }
    }
    Ok(())
}
