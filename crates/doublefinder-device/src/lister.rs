//! 设备枚举
//!
//! 逐个平台、逐个设备查询，生成 [`DeviceSnapshot`]。单个平台或设备查询失败时记录警告并跳过，
//! 其余部分照常枚举。枚举本身从不返回错误。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use doublefinder_core::{FinderConfig, Result};

use crate::platform::ComputePlatform;
use crate::record::{DeviceClass, DeviceRecord};

/// 被跳过的平台或设备
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkippedItem {
    /// 平台列表本身无法读取
    PlatformList {
        reason: String,
    },
    Platform {
        index: usize,
        reason: String,
    },
    Device {
        platform: String,
        index: usize,
        reason: String,
    },
}

/// 一次枚举的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub backend: String,
    pub captured_at: DateTime<Utc>,
    pub records: Vec<DeviceRecord>,
    pub skipped: Vec<SkippedItem>,
}

impl DeviceSnapshot {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// 设备过滤条件，在分类之后应用。被过滤的设备不算跳过。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    pub classes: HashSet<DeviceClass>,
    pub doubles_only: bool,
}

impl DeviceFilter {
    pub fn matches(&self, record: &DeviceRecord) -> bool {
        if !self.classes.is_empty() && !self.classes.contains(&record.class()) {
            return false;
        }
        if self.doubles_only && !record.supports_double_precision() {
            return false;
        }
        true
    }

    /// 从配置构建；类别名称无法识别时返回配置错误。
    pub fn from_config(config: &FinderConfig) -> Result<Self> {
        let mut builder = DeviceFilterBuilder::new();
        for name in &config.classes {
            builder = builder.class(name.parse()?);
        }
        if config.doubles_only {
            builder = builder.doubles_only();
        }
        Ok(builder.build())
    }
}

pub struct DeviceFilterBuilder(DeviceFilter);

impl DeviceFilterBuilder {
    pub fn new() -> Self {
        Self(DeviceFilter::default())
    }

    pub fn class(mut self, class: DeviceClass) -> Self {
        self.0.classes.insert(class);
        self
    }

    pub fn doubles_only(mut self) -> Self {
        self.0.doubles_only = true;
        self
    }

    pub fn build(self) -> DeviceFilter {
        self.0
    }
}

impl Default for DeviceFilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DeviceLister<P> {
    backend: P,
    filter: DeviceFilter,
}

impl<P: ComputePlatform> DeviceLister<P> {
    pub fn new(backend: P) -> Self {
        Self {
            backend,
            filter: DeviceFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: DeviceFilter) -> Self {
        self.filter = filter;
        self
    }

    /// 执行一次完整枚举。每次调用都重新查询，不做增量更新。
    pub fn scan(&self) -> DeviceSnapshot {
        let backend = self.backend.backend_name().to_string();
        let mut records = Vec::new();
        let mut skipped = Vec::new();

        let platforms = match self.backend.platforms() {
            Ok(platforms) => platforms,
            Err(e) => {
                warn!(backend = %backend, "platform query failed, no devices listed: {}", e);
                skipped.push(SkippedItem::PlatformList {
                    reason: e.to_string(),
                });
                Vec::new()
            }
        };

        if platforms.is_empty() {
            info!(backend = %backend, "no compute platforms found");
        }

        for (index, platform) in platforms.iter().enumerate() {
            let label = self
                .backend
                .platform_name(platform)
                .unwrap_or_else(|e| {
                    warn!("could not read name of platform #{}: {}", index, e);
                    format!("platform #{index}")
                });

            let devices = match self.backend.devices(platform) {
                Ok(devices) => devices,
                Err(e) => {
                    warn!(platform = %label, "skipping platform: {}", e);
                    skipped.push(SkippedItem::Platform {
                        index,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            debug!(platform = %label, count = devices.len(), "listing devices");

            for (device_index, device) in devices.iter().enumerate() {
                match self.read_device(device) {
                    Ok(record) => {
                        let record = record.with_platform(label.clone());
                        debug!(
                            platform = %label,
                            name = record.name(),
                            class = %record.class(),
                            doubles = record.supports_double_precision(),
                            "found device"
                        );
                        if self.filter.matches(&record) {
                            records.push(record);
                        }
                    }
                    Err(e) => {
                        warn!(platform = %label, device = device_index, "skipping device: {}", e);
                        skipped.push(SkippedItem::Device {
                            platform: label.clone(),
                            index: device_index,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            backend = %backend,
            devices = records.len(),
            skipped = skipped.len(),
            "enumeration finished"
        );

        DeviceSnapshot {
            backend,
            captured_at: Utc::now(),
            records,
            skipped,
        }
    }

    fn read_device(&self, device: &P::Device) -> Result<DeviceRecord> {
        let name = self.backend.device_name(device)?;
        let class = DeviceClass::from_type_bits(self.backend.device_type_bits(device)?);
        let doubles = self.backend.supports_double_precision(device)?;
        Ok(DeviceRecord::new(name.trim_end_matches('\0').trim(), class, doubles))
    }
}
