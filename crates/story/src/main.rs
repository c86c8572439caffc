mod page;
mod script;

use anyhow::{Context as _, Result};
use serde_json::Value;
use thingy_core::{EditorConfig, MemoryStorage, PathStore, RegionDescriptor};
use thingy_dom::Document;
use thingy_editor::EditorSession;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let storage = MemoryStorage::new();
    let defaults: Value = serde_json::from_str(page::DEFAULT_DATA).context("default data")?;
    PathStore::new(storage.clone()).save(page::TOP_LEVEL_KEY, &defaults)?;

    let document = Document::from_body_html(page::PAGE_HTML).context("parsing the demo page")?;
    let config = EditorConfig::from_json_str(page::EDITOR_CONFIG).context("editor config")?;
    let regions: Vec<RegionDescriptor> =
        serde_json::from_str(page::REGIONS).context("region descriptors")?;

    let mut session = EditorSession::builder(document)
        .config(config)
        .storage(storage)
        .build()?;
    session.make_regions_editable(&regions)?;

    script::run(&mut session)?;

    let document = session.document();
    println!("{}", document.inner_html(document.body()));
    let persisted = session
        .store()
        .get(page::TOP_LEVEL_KEY)
        .context("nothing was persisted")?;
    println!("{}", serde_json::to_string_pretty(&persisted)?);
    Ok(())
}
