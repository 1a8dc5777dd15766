//! 配置管理
//!
//! 配置文件为 JSON，默认位于 `~/.doublefinder/config.json`。文件不存在时使用默认值。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{DoubleFinderError, Result};

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = DoubleFinderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(DoubleFinderError::Config(format!(
                "unknown output format: {other} (expected table or json)"
            ))),
        }
    }
}

/// 主配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    /// 输出格式
    pub format: OutputFormat,
    /// 是否显示平台列
    pub show_platform: bool,
    /// 保留的设备类别 (cpu/gpu/accelerator/other)，为空表示全部
    pub classes: Vec<String>,
    /// 只显示支持双精度的设备
    pub doubles_only: bool,
    /// 设备枚举超时 (秒)
    pub query_timeout_secs: u64,
    /// 夹具文件，设置后代替 OpenCL 驱动
    pub fixture: Option<PathBuf>,
}

fn default_query_timeout_secs() -> u64 {
    10
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            show_platform: false,
            classes: Vec::new(),
            doubles_only: false,
            query_timeout_secs: default_query_timeout_secs(),
            fixture: None,
        }
    }
}

impl FinderConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| DoubleFinderError::Config(format!("读取配置失败: {}", e)))?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| DoubleFinderError::Config(format!("解析配置失败: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| DoubleFinderError::Config(format!("创建目录失败: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| DoubleFinderError::Config(format!("序列化配置失败: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| DoubleFinderError::Config(format!("写入配置失败: {}", e)))?;

        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".doublefinder")
            .join("config.json")
    }

    pub fn validate(&self) -> Result<()> {
        if self.query_timeout_secs == 0 {
            return Err(DoubleFinderError::Config(
                "query_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
