//! Corpus commands - validate a source, precompute embeddings

use anyhow::{bail, Context, Result};
use std::path::Path;

use refmatch::Config;

/// Load the corpus and print what survived
pub fn check(config: &Config) -> Result<()> {
    let corpus = super::load_corpus(config)?;

    println!("Documents:  {}", corpus.len());
    println!("Excluded:   {} (missing title or citation)", corpus.excluded());
    println!(
        "Embedded:   {}/{}{}",
        corpus.embedded_count(),
        corpus.len(),
        corpus
            .dimension()
            .map(|d| format!(" ({} dims)", d))
            .unwrap_or_default()
    );

    let without_link = corpus.all().iter().filter(|d| d.link.is_empty()).count();
    if without_link > 0 {
        println!("No link:    {}", without_link);
    }
    Ok(())
}

/// Embed all documents and write them as a JSON corpus
pub fn embed(config: &Config, output: &Path) -> Result<()> {
    let corpus = super::load_corpus(config)?;
    let Some(provider) = super::provider(config) else {
        bail!("Embeddings are not enabled or not configured (see [embeddings] in config)");
    };

    let embedded = corpus
        .with_embeddings(provider.as_ref())
        .context("Failed to embed corpus")?;

    let json = serde_json::to_string_pretty(&embedded.to_records())?;
    std::fs::write(output, json)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "✅ Embedded {} documents with {} → {}",
        embedded.len(),
        provider.model_name(),
        output.display()
    );
    Ok(())
}
