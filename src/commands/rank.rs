//! Rank command - one-shot query against the corpus

use anyhow::Result;

use refmatch::Config;

/// Execute rank command
pub fn execute(config: &Config, query: &str, json: bool) -> Result<()> {
    let engine = super::build_engine(config)?;
    let result = engine.find_references(query);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.formatted_text);
    }
    Ok(())
}
