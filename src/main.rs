//! Builds the demo table, prints what a few identifiers match and
//! optionally writes the snapshot: `semantic-matcher-demo [snapshot.json]`.

use semantic_matcher::example_table;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_target(false)
        .init();

    let table = example_table()?;
    tracing::info!(edges = table.len(), sources = table.source_count(), "demo table built");

    for (semantic_id, score_limit) in [
        ("s-heppner.com/semanticID/one", 0.5),
        ("s-heppner.com/semanticID/one", 0.9),
        ("s-heppner.com/semanticID/two", 0.0),
    ] {
        let matches = table.local_matches(semantic_id, score_limit);
        println!("{semantic_id} (score > {score_limit}):");
        println!("{}", serde_json::to_string_pretty(&matches)?);
    }

    if let Some(path) = std::env::args().nth(1) {
        table.save(&path)?;
        tracing::info!(path = %path, "snapshot written");
    }

    Ok(())
}
