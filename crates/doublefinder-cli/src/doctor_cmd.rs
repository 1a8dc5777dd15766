//! 健康检查命令
//!
//! 检查 OpenCL 运行环境：ICD 加载器、厂商驱动注册、编译特性、配置文件。

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use doublefinder_core::FinderConfig;
use doublefinder_device::DeviceFilter;

use crate::list_cmd::{self, DeviceSource};

/// 检查项结果
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub fix_hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.into(),
            fix_hint: None,
        }
    }

    fn warning(name: &str, message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.into(),
            fix_hint: Some(hint.into()),
        }
    }

    fn error(name: &str, message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.into(),
            fix_hint: Some(hint.into()),
        }
    }
}

/// 运行健康检查
pub async fn run(verbose: bool) -> Result<()> {
    println!("\nDoubleFinder OpenCL check\n");

    let mut results = vec![
        check_feature(),
        check_loader(),
        check_icd_vendors(),
        check_config_file(),
    ];
    if cfg!(feature = "opencl") {
        results.push(check_enumeration().await);
    }

    let mut warn_count = 0;
    let mut error_count = 0;

    for result in &results {
        let icon = match result.status {
            CheckStatus::Ok => "ok  ",
            CheckStatus::Warning => "warn",
            CheckStatus::Error => "FAIL",
        };

        println!("[{}] {}: {}", icon, result.name, result.message);

        if let Some(hint) = result.fix_hint.as_ref().filter(|_| verbose) {
            println!("       hint: {}", hint);
        }

        match result.status {
            CheckStatus::Ok => {}
            CheckStatus::Warning => warn_count += 1,
            CheckStatus::Error => error_count += 1,
        }
    }

    println!("\n{}", "─".repeat(50));
    println!(
        "{} checks, {} warnings, {} errors",
        results.len(),
        warn_count,
        error_count
    );
    if !verbose && (warn_count > 0 || error_count > 0) {
        println!("Run `doublefinder doctor -v` for hints.");
    }

    Ok(())
}

/// 检查编译特性
fn check_feature() -> CheckResult {
    if cfg!(feature = "opencl") {
        CheckResult::ok("OpenCL backend", "compiled in")
    } else {
        CheckResult::error(
            "OpenCL backend",
            "not compiled in, only fixtures can be listed",
            "rebuild with `cargo install doublefinder-cli --features opencl`",
        )
    }
}

fn loader_candidates() -> Vec<PathBuf> {
    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &["/System/Library/Frameworks/OpenCL.framework"]
    } else if cfg!(target_os = "windows") {
        &["C:\\Windows\\System32\\OpenCL.dll"]
    } else {
        &[
            "/usr/lib/libOpenCL.so.1",
            "/usr/lib64/libOpenCL.so.1",
            "/usr/lib/x86_64-linux-gnu/libOpenCL.so.1",
            "/usr/lib/aarch64-linux-gnu/libOpenCL.so.1",
            "/usr/local/lib/libOpenCL.so.1",
        ]
    };
    candidates.iter().map(PathBuf::from).collect()
}

/// 检查 ICD 加载器
fn check_loader() -> CheckResult {
    match loader_candidates().into_iter().find(|p| p.exists()) {
        Some(path) => CheckResult::ok("ICD loader", format!("found at {}", path.display())),
        None => CheckResult::warning(
            "ICD loader",
            "not found in the usual locations",
            "install an OpenCL ICD loader (e.g. ocl-icd-libopencl1)",
        ),
    }
}

fn vendor_dir() -> PathBuf {
    std::env::var_os("OCL_ICD_VENDORS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/etc/OpenCL/vendors"))
}

/// 检查厂商驱动注册 (.icd 文件)
fn check_icd_vendors() -> CheckResult {
    if cfg!(any(target_os = "macos", target_os = "windows")) {
        return CheckResult::ok("ICD vendors", "registered by the operating system");
    }
    check_icd_vendors_in(&vendor_dir())
}

pub fn check_icd_vendors_in(dir: &Path) -> CheckResult {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => {
            return CheckResult::warning(
                "ICD vendors",
                format!("{} does not exist", dir.display()),
                "install a vendor OpenCL driver (pocl, intel-opencl-icd, mesa-opencl-icd, ...)",
            );
        }
    };

    let mut vendors: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "icd"))
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    vendors.sort();

    if vendors.is_empty() {
        CheckResult::warning(
            "ICD vendors",
            format!("no .icd files in {}", dir.display()),
            "install a vendor OpenCL driver (pocl, intel-opencl-icd, mesa-opencl-icd, ...)",
        )
    } else {
        CheckResult::ok("ICD vendors", vendors.join(", "))
    }
}

/// 检查配置文件
fn check_config_file() -> CheckResult {
    let path = FinderConfig::default_path();
    if !path.exists() {
        return CheckResult::ok("Config", "not present, using defaults");
    }
    match FinderConfig::load(&path) {
        Ok(_) => CheckResult::ok("Config", format!("{} is valid", path.display())),
        Err(e) => CheckResult::error(
            "Config",
            e.to_string(),
            format!("fix or regenerate with `doublefinder init --force` ({})", path.display()),
        ),
    }
}

/// 配置中的枚举超时，配置不可用时取默认值
fn enumeration_timeout(path: &Path) -> Duration {
    let config = FinderConfig::load(path).unwrap_or_else(|e| {
        warn!("Using default enumeration timeout: {}", e);
        FinderConfig::default()
    });
    Duration::from_secs(config.query_timeout_secs)
}

/// 实际枚举一次
async fn check_enumeration() -> CheckResult {
    let timeout = enumeration_timeout(&FinderConfig::default_path());
    match list_cmd::scan(DeviceSource::OpenCl, DeviceFilter::default(), timeout).await {
        Ok(snapshot) if snapshot.is_empty() => CheckResult::warning(
            "Enumeration",
            format!("no devices ({} skipped)", snapshot.skipped.len()),
            "check the vendor driver installation",
        ),
        Ok(snapshot) => CheckResult::ok(
            "Enumeration",
            format!(
                "{} device(s), {} skipped",
                snapshot.records.len(),
                snapshot.skipped.len()
            ),
        ),
        Err(e) => CheckResult::error("Enumeration", e.to_string(), "check the vendor driver installation"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_vendor_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = check_icd_vendors_in(&dir.path().join("vendors"));
        assert_eq!(result.status, CheckStatus::Warning);
        assert!(result.fix_hint.is_some());
    }

    #[test]
    fn test_vendor_files_listed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pocl.icd"), "libpocl.so.2").unwrap();
        std::fs::write(dir.path().join("intel.icd"), "libintelocl.so").unwrap();
        std::fs::write(dir.path().join("README"), "").unwrap();

        let result = check_icd_vendors_in(dir.path());
        assert_eq!(result.status, CheckStatus::Ok);
        assert_eq!(result.message, "intel.icd, pocl.icd");
    }

    #[test]
    fn test_empty_vendor_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = check_icd_vendors_in(dir.path());
        assert_eq!(result.status, CheckStatus::Warning);
    }

    #[test]
    fn test_enumeration_timeout_follows_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"query_timeout_secs": 3}"#).unwrap();
        assert_eq!(enumeration_timeout(&path), Duration::from_secs(3));
    }

    #[test]
    fn test_enumeration_timeout_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let default = Duration::from_secs(FinderConfig::default().query_timeout_secs);

        assert_eq!(enumeration_timeout(&dir.path().join("missing.json")), default);

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, r#"{"query_timeout_secs": 0}"#).unwrap();
        assert_eq!(enumeration_timeout(&broken), default);
    }

    #[test]
    fn test_feature_check_matches_build() {
        let result = check_feature();
        if cfg!(feature = "opencl") {
            assert_eq!(result.status, CheckStatus::Ok);
        } else {
            assert_eq!(result.status, CheckStatus::Error);
        }
    }
}
