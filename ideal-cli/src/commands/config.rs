//! `ideal config list|get|set`: dotted-key access to the project config.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use ideal_core::config;

use super::project_root;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// List every config key and its value.
    List,

    /// Print the value of one key, e.g. `workflow.templateRepo`.
    Get { key: String },

    /// Set a key and save the config.
    Set { key: String, value: String },
}

#[derive(Tabled)]
struct ConfigRow {
    #[tabled(rename = "key")]
    key: String,
    #[tabled(rename = "value")]
    value: String,
}

pub fn run(command: ConfigCommand) -> Result<()> {
    let root = project_root()?;
    let cfg = config::load(&root).context("failed to load project config")?;

    match command {
        ConfigCommand::List => {
            let rows: Vec<ConfigRow> = config::flatten(&cfg)?
                .into_iter()
                .map(|(key, value)| ConfigRow { key, value })
                .collect();
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{table}");
        }
        ConfigCommand::Get { key } => {
            let value = config::get(&cfg, &key)?;
            println!("{}", config::display_value(&value));
        }
        ConfigCommand::Set { key, value } => {
            let updated = config::set(&cfg, &key, &value)?;
            let validation = config::validate(&updated);
            if !validation.is_valid() {
                anyhow::bail!(
                    "refusing to save invalid config: {}",
                    validation.errors.join("; ")
                );
            }
            config::save(&root, &updated).context("failed to save project config")?;
            println!("{} {key} = {value}", "✓".green().bold());
        }
    }
    Ok(())
}
