//! `kiln schema`: print the JSON Schema of `kiln.config.json`.

use crate::cli::SchemaArgs;
use crate::config::KilnConfig;
use crate::error::{Result, ResultExt};
use crate::ui;

pub async fn execute(args: SchemaArgs) -> Result<()> {
    let mut schema = serde_json::to_string_pretty(&KilnConfig::json_schema())?;
    schema.push('\n');

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, schema)
                .await
                .with_path(&path)
                .with_hint("Create the parent directory first")?;
            ui::success(&format!("Wrote config schema to {}", path.display()));
        }
        None => print!("{}", schema),
    }
    Ok(())
}
