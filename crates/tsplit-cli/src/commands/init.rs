use std::path::Path;

use anyhow::bail;
use tsplit_core::SplitConfig;
use tsplit_core::config::CONFIG_FILE_NAME;

pub fn init(path: &str, force: bool) -> anyhow::Result<()> {
    let output = Path::new(path).join(CONFIG_FILE_NAME);
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }

    std::fs::write(&output, SplitConfig::default().to_toml_string()?)?;
    println!("✓ Generated {}", output.display());
    Ok(())
}
