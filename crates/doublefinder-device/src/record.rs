//! 设备记录
//!
//! 一次枚举得到的设备快照：名称、类别、是否支持双精度。构造后不可变。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use doublefinder_core::{DoubleFinderError, Result};

/// OpenCL `cl_device_type` 位
pub mod type_bits {
    pub const DEFAULT: u64 = 1 << 0;
    pub const CPU: u64 = 1 << 1;
    pub const GPU: u64 = 1 << 2;
    pub const ACCELERATOR: u64 = 1 << 3;
    pub const CUSTOM: u64 = 1 << 4;
    pub const ALL: u64 = 0xFFFF_FFFF;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Cpu,
    Gpu,
    Accelerator,
    Other,
}

impl DeviceClass {
    /// 由设备类型位掩码得出类别。
    ///
    /// 厂商可能同时设置多个类型位，按 GPU > Accelerator > CPU > Other 取最具体的一个。
    /// DEFAULT 与 CUSTOM 位不参与判断。
    pub fn from_type_bits(bits: u64) -> Self {
        if bits & type_bits::GPU != 0 {
            Self::Gpu
        } else if bits & type_bits::ACCELERATOR != 0 {
            Self::Accelerator
        } else if bits & type_bits::CPU != 0 {
            Self::Cpu
        } else {
            Self::Other
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
            Self::Accelerator => "accelerator",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Gpu => "GPU",
            Self::Accelerator => "Accelerator",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DeviceClass {
    type Err = DoubleFinderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu" => Ok(Self::Gpu),
            "accelerator" | "accel" => Ok(Self::Accelerator),
            "other" => Ok(Self::Other),
            other => Err(DoubleFinderError::Config(format!(
                "unknown device class: {other} (expected cpu, gpu, accelerator or other)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    name: String,
    class: DeviceClass,
    supports_double_precision: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    platform: Option<String>,
}

impl DeviceRecord {
    pub fn new(name: impl Into<String>, class: DeviceClass, supports_double_precision: bool) -> Self {
        Self {
            name: name.into(),
            class,
            supports_double_precision,
            platform: None,
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> DeviceClass {
        self.class
    }

    pub fn supports_double_precision(&self) -> bool {
        self.supports_double_precision
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }
}
