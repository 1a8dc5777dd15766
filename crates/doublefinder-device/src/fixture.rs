//! 夹具后端
//!
//! 用 JSON 描述平台与设备，代替真实驱动。可为任一查询注入错误，用于复现驱动故障。
//!
//! ```json
//! {
//!   "platforms": [
//!     {
//!       "name": "Apple",
//!       "devices": [
//!         { "name": "Intel CPU", "types": ["cpu"], "doubles": true },
//!         { "name": "Mock GPU", "types": ["gpu"], "doubles": false },
//!         { "name": "Broken", "types": ["gpu"], "fail": { "query": "doubles", "message": "CL_OUT_OF_RESOURCES" } }
//!       ]
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use doublefinder_core::{DoubleFinderError, Result};

use crate::platform::ComputePlatform;
use crate::record::type_bits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureType {
    Default,
    Cpu,
    Gpu,
    Accelerator,
    Custom,
}

impl FixtureType {
    pub fn bits(&self) -> u64 {
        match self {
            Self::Default => type_bits::DEFAULT,
            Self::Cpu => type_bits::CPU,
            Self::Gpu => type_bits::GPU,
            Self::Accelerator => type_bits::ACCELERATOR,
            Self::Custom => type_bits::CUSTOM,
        }
    }
}

/// 可注入失败的设备查询
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceQuery {
    Name,
    Type,
    Doubles,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectedFailure {
    pub query: DeviceQuery,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureDevice {
    pub name: String,
    #[serde(default)]
    pub types: Vec<FixtureType>,
    #[serde(default)]
    pub doubles: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail: Option<InjectedFailure>,
}

impl FixtureDevice {
    pub fn new(name: impl Into<String>, types: Vec<FixtureType>, doubles: bool) -> Self {
        Self {
            name: name.into(),
            types,
            doubles,
            fail: None,
        }
    }

    pub fn failing(mut self, query: DeviceQuery, message: impl Into<String>) -> Self {
        self.fail = Some(InjectedFailure {
            query,
            message: message.into(),
        });
        self
    }

    fn check(&self, query: DeviceQuery) -> Result<()> {
        match &self.fail {
            Some(failure) if failure.query == query => Err(DoubleFinderError::Device(format!(
                "{}: {}",
                self.name, failure.message
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixturePlatformEntry {
    pub name: String,
    #[serde(default)]
    pub devices: Vec<FixtureDevice>,
    /// 设置后列出设备失败
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixturePlatform {
    #[serde(default)]
    pub platforms: Vec<FixturePlatformEntry>,
    /// 设置后列出平台失败
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FixturePlatform {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DoubleFinderError::Fixture(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| DoubleFinderError::Fixture(format!("invalid fixture: {}", e)))
    }

    pub fn with_platform(mut self, name: impl Into<String>, devices: Vec<FixtureDevice>) -> Self {
        self.platforms.push(FixturePlatformEntry {
            name: name.into(),
            devices,
            error: None,
        });
        self
    }

    pub fn with_broken_platform(mut self, name: impl Into<String>, error: impl Into<String>) -> Self {
        self.platforms.push(FixturePlatformEntry {
            name: name.into(),
            devices: Vec::new(),
            error: Some(error.into()),
        });
        self
    }

    fn entry(&self, index: usize) -> Result<&FixturePlatformEntry> {
        self.platforms
            .get(index)
            .ok_or_else(|| DoubleFinderError::Platform(format!("no platform at index {index}")))
    }

    fn device(&self, (platform, index): (usize, usize)) -> Result<&FixtureDevice> {
        self.entry(platform)?
            .devices
            .get(index)
            .ok_or_else(|| DoubleFinderError::Device(format!("no device {index} on platform {platform}")))
    }
}

impl ComputePlatform for FixturePlatform {
    type Platform = usize;
    type Device = (usize, usize);

    fn backend_name(&self) -> &str {
        "fixture"
    }

    fn platforms(&self) -> Result<Vec<usize>> {
        if let Some(error) = &self.error {
            return Err(DoubleFinderError::Platform(error.clone()));
        }
        Ok((0..self.platforms.len()).collect())
    }

    fn platform_name(&self, platform: &usize) -> Result<String> {
        Ok(self.entry(*platform)?.name.clone())
    }

    fn devices(&self, platform: &usize) -> Result<Vec<(usize, usize)>> {
        let entry = self.entry(*platform)?;
        if let Some(error) = &entry.error {
            return Err(DoubleFinderError::Platform(format!("{}: {}", entry.name, error)));
        }
        Ok((0..entry.devices.len()).map(|i| (*platform, i)).collect())
    }

    fn device_name(&self, device: &(usize, usize)) -> Result<String> {
        let device = self.device(*device)?;
        device.check(DeviceQuery::Name)?;
        Ok(device.name.clone())
    }

    fn device_type_bits(&self, device: &(usize, usize)) -> Result<u64> {
        let device = self.device(*device)?;
        device.check(DeviceQuery::Type)?;
        Ok(device.types.iter().fold(0, |bits, t| bits | t.bits()))
    }

    fn supports_double_precision(&self, device: &(usize, usize)) -> Result<bool> {
        let device = self.device(*device)?;
        device.check(DeviceQuery::Doubles)?;
        Ok(device.doubles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "platforms": [
            {
                "name": "Apple",
                "devices": [
                    { "name": "Intel CPU", "types": ["cpu"], "doubles": true },
                    { "name": "Mock GPU", "types": ["gpu", "accelerator"] },
                    { "name": "Broken", "types": ["gpu"], "fail": { "query": "doubles", "message": "CL_OUT_OF_RESOURCES" } }
                ]
            },
            { "name": "Dead", "error": "CL_PLATFORM_NOT_FOUND_KHR" }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let fixture = FixturePlatform::from_json(SAMPLE).unwrap();
        assert_eq!(fixture.platforms().unwrap(), vec![0, 1]);
        assert_eq!(fixture.platform_name(&0).unwrap(), "Apple");
        assert_eq!(fixture.devices(&0).unwrap().len(), 3);
        assert!(fixture.devices(&1).is_err());
    }

    #[test]
    fn test_type_bits_are_ored() {
        let fixture = FixturePlatform::from_json(SAMPLE).unwrap();
        assert_eq!(
            fixture.device_type_bits(&(0, 1)).unwrap(),
            type_bits::GPU | type_bits::ACCELERATOR
        );
        assert!(!fixture.supports_double_precision(&(0, 1)).unwrap());
    }

    #[test]
    fn test_injected_failure_hits_only_its_query() {
        let fixture = FixturePlatform::from_json(SAMPLE).unwrap();
        assert_eq!(fixture.device_name(&(0, 2)).unwrap(), "Broken");
        let err = fixture.supports_double_precision(&(0, 2)).unwrap_err();
        assert!(err.to_string().contains("CL_OUT_OF_RESOURCES"));
    }

    #[test]
    fn test_invalid_json_is_fixture_error() {
        assert!(matches!(
            FixturePlatform::from_json("[1, 2"),
            Err(DoubleFinderError::Fixture(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.json");
        fs::write(&path, SAMPLE).unwrap();

        let fixture = FixturePlatform::load(&path).unwrap();
        assert_eq!(fixture.platforms.len(), 2);

        assert!(matches!(
            FixturePlatform::load(&dir.path().join("missing.json")),
            Err(DoubleFinderError::Fixture(_))
        ));
    }

    #[test]
    fn test_top_level_error() {
        let fixture = FixturePlatform {
            error: Some("CL_PLATFORM_NOT_FOUND_KHR".to_string()),
            ..Default::default()
        };
        assert!(fixture.platforms().is_err());
    }
}
