use anyhow::Result;
use caldrop_core::page_slug;

pub fn run(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        anyhow::bail!("Title must not be empty");
    }
    println!("{}", page_slug(title));
    Ok(())
}
