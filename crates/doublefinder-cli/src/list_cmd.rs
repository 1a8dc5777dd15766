//! list 命令

use anyhow::{Context, Result, anyhow};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::oneshot;

use doublefinder_core::{DoubleFinderError, FinderConfig, OutputFormat};
use doublefinder_device::{
    ComputePlatform, DeviceClass, DeviceFilter, DeviceLister, DeviceSnapshot, FixturePlatform,
    NoPlatform, TablePresenter,
};

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Output format (table or json)
    #[arg(short, long, value_parser = parse_format)]
    pub format: Option<OutputFormat>,
    /// Read devices from a JSON fixture instead of the OpenCL driver
    #[arg(long)]
    pub fixture: Option<PathBuf>,
    /// Only show devices of this class (cpu, gpu, accelerator, other); repeatable
    #[arg(long = "class", value_parser = parse_class)]
    pub classes: Vec<DeviceClass>,
    /// Only show devices that support double precision
    #[arg(long)]
    pub doubles_only: bool,
    /// Add a platform column
    #[arg(long)]
    pub show_platform: bool,
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,
}

fn parse_format(s: &str) -> std::result::Result<OutputFormat, String> {
    s.parse().map_err(|e: DoubleFinderError| e.to_string())
}

fn parse_class(s: &str) -> std::result::Result<DeviceClass, String> {
    s.parse().map_err(|e: DoubleFinderError| e.to_string())
}

/// 设备来源
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceSource {
    Fixture(PathBuf),
    OpenCl,
    None,
}

impl DeviceSource {
    pub fn select(config: &FinderConfig) -> Self {
        match &config.fixture {
            Some(path) => Self::Fixture(path.clone()),
            None if cfg!(feature = "opencl") => Self::OpenCl,
            None => {
                tracing::warn!("built without the `opencl` feature and no fixture given, no devices can be listed");
                Self::None
            }
        }
    }
}

/// 命令行参数覆盖配置文件
pub fn apply_overrides(mut config: FinderConfig, args: &ListArgs) -> FinderConfig {
    if let Some(format) = args.format {
        config.format = format;
    }
    if let Some(fixture) = &args.fixture {
        config.fixture = Some(fixture.clone());
    }
    if !args.classes.is_empty() {
        config.classes = args.classes.iter().map(|c| c.name().to_string()).collect();
    }
    config.doubles_only |= args.doubles_only;
    config.show_platform |= args.show_platform;
    config
}

pub fn config_path(arg: Option<&str>) -> PathBuf {
    match arg {
        Some(path) => PathBuf::from(shellexpand::tilde(path).to_string()),
        None => FinderConfig::default_path(),
    }
}

/// 在独立线程上执行一次枚举，超时则放弃等待。
///
/// 线程不归 tokio 运行时管理：驱动卡死时运行时可以正常关闭，进程退出时该线程随之结束。
pub async fn scan_with<F, P>(make_backend: F, filter: DeviceFilter, timeout: Duration) -> Result<DeviceSnapshot>
where
    F: FnOnce() -> doublefinder_core::Result<P> + Send + 'static,
    P: ComputePlatform + 'static,
{
    let (tx, rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("doublefinder-scan".to_string())
        .spawn(move || {
            let result = make_backend().map(|backend| DeviceLister::new(backend).with_filter(filter).scan());
            // 接收端已超时放弃时发送失败，忽略即可
            let _ = tx.send(result);
        })
        .context("failed to start enumeration thread")?;

    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(result)) => Ok(result?),
        Ok(Err(_)) => Err(anyhow!("enumeration thread exited without a result")),
        Err(_) => Err(DoubleFinderError::Timeout(format!(
            "device enumeration did not finish within {:?}",
            timeout
        ))
        .into()),
    }
}

pub async fn scan(source: DeviceSource, filter: DeviceFilter, timeout: Duration) -> Result<DeviceSnapshot> {
    match source {
        DeviceSource::Fixture(path) => scan_with(move || FixturePlatform::load(&path), filter, timeout).await,
        #[cfg(feature = "opencl")]
        DeviceSource::OpenCl => {
            scan_with(|| Ok(doublefinder_device::OpenClPlatform::new()), filter, timeout).await
        }
        #[cfg(not(feature = "opencl"))]
        DeviceSource::OpenCl => scan_with(|| Ok(NoPlatform), filter, timeout).await,
        DeviceSource::None => scan_with(|| Ok(NoPlatform), filter, timeout).await,
    }
}

pub fn render(snapshot: &DeviceSnapshot, config: &FinderConfig) -> Result<String> {
    match config.format {
        OutputFormat::Table => {
            let mut presenter = TablePresenter::from_snapshot(snapshot);
            if config.show_platform {
                presenter = presenter.with_platform_column();
            }
            Ok(presenter.render_table())
        }
        OutputFormat::Json => Ok(TablePresenter::render_json(snapshot)?),
    }
}

pub async fn run(args: ListArgs) -> Result<()> {
    let path = config_path(args.config.as_deref());
    let config = FinderConfig::load(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let config = apply_overrides(config, &args);

    let filter = DeviceFilter::from_config(&config)?;
    let source = DeviceSource::select(&config);
    tracing::debug!(?source, "selected device source");

    let snapshot = scan(source, filter, Duration::from_secs(config.query_timeout_secs)).await?;
    print!("{}", render(&snapshot, &config)?);

    if !snapshot.skipped.is_empty() && config.format == OutputFormat::Table {
        eprintln!("{} platform(s)/device(s) skipped, run with -v for details", snapshot.skipped.len());
    }

    Ok(())
}
