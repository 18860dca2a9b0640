use crate::index::{IndexBuilder, WordIndex};
use crate::tokenizer::tokenize;
use anyhow::{bail, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Build the index from every readable UTF-8 file under `root`. Document
/// names are paths relative to `root`, which is what the result pages link
/// back through `/static/`. Runs once, single-threaded, before serving.
pub fn build_from_dir(root: &Path) -> Result<WordIndex> {
    if !root.is_dir() {
        bail!("corpus root {} is not a directory", root.display());
    }
    let mut builder = IndexBuilder::new();
    let mut skipped = 0usize;
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let text = match fs::read_to_string(entry.path()) {
            Ok(t) => t,
            Err(_) => {
                // binary or unreadable, not indexable
                skipped += 1;
                continue;
            }
        };
        let doc_name = entry
            .path()
            .strip_prefix(root)
            .unwrap_or_else(|_| entry.path())
            .to_string_lossy()
            .to_string();
        for word in tokenize(&text) {
            builder.record(&word, &doc_name);
        }
    }
    let index = builder.build();
    tracing::info!(
        docs = index.num_docs(),
        words = index.num_words(),
        skipped,
        "index built"
    );
    Ok(index)
}
