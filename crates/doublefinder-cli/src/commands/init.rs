//! Init 命令

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

use doublefinder_core::FinderConfig;

pub async fn run(config_path: &str, force: bool) -> Result<()> {
    // 展开路径
    let path = PathBuf::from(shellexpand::tilde(config_path).to_string());

    if path.exists() && !force {
        bail!(
            "{} already exists, pass --force to overwrite it",
            path.display()
        );
    }

    let config = FinderConfig::default();
    write_config(&path, &config).await?;

    println!("Configuration initialized at: {}", path.display());
    println!("\nDefault configuration:");
    println!("  Output format: {:?}", config.format);
    println!("  Query timeout: {}s", config.query_timeout_secs);
    println!("\nSet `fixture` to list devices from a JSON file instead of the OpenCL driver.");

    Ok(())
}

async fn write_config(path: &Path, config: &FinderConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let content = serde_json::to_string_pretty(config)?;
    tokio::fs::write(path, content).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("df").join("config.json");
        let path_str = path.to_string_lossy().to_string();

        run(&path_str, false).await.unwrap();
        assert_eq!(FinderConfig::load(&path).unwrap(), FinderConfig::default());
    }

    #[tokio::test]
    async fn test_init_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "format": "json" }"#).unwrap();
        let path_str = path.to_string_lossy().to_string();

        assert!(run(&path_str, false).await.is_err());
        run(&path_str, true).await.unwrap();
        assert_eq!(FinderConfig::load(&path).unwrap(), FinderConfig::default());
    }
}
