pub mod platform {
    use doublefinder_core::{DoubleFinderError, Result};
    use doublefinder_device::ComputePlatform;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MockDevice {
        pub name: String,
        pub type_bits: u64,
        pub doubles: bool,
    }

    #[derive(Debug, Clone, Default)]
    struct MockPlatformEntry {
        name: String,
        devices: Vec<MockDevice>,
    }

    /// 可注入失败并统计调用次数的平台
    #[derive(Clone, Default)]
    pub struct MockPlatform {
        platforms: Arc<Mutex<Vec<MockPlatformEntry>>>,
        failing_platforms: Arc<Mutex<HashSet<usize>>>,
        failing_platform_names: Arc<Mutex<HashSet<usize>>>,
        failing_devices: Arc<Mutex<HashSet<(usize, usize)>>>,
        fail_listing: Arc<Mutex<bool>>,
        call_count: Arc<Mutex<u32>>,
    }

    impl MockPlatform {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_platform(self, name: impl Into<String>, devices: Vec<MockDevice>) -> Self {
            self.platforms.lock().unwrap().push(MockPlatformEntry {
                name: name.into(),
                devices,
            });
            self
        }

        pub fn fail_platform(self, index: usize) -> Self {
            self.failing_platforms.lock().unwrap().insert(index);
            self
        }

        /// 让平台名称查询失败，设备列表不受影响
        pub fn fail_platform_name(self, index: usize) -> Self {
            self.failing_platform_names.lock().unwrap().insert(index);
            self
        }

        /// 让设备的双精度查询失败
        pub fn fail_device(self, platform: usize, device: usize) -> Self {
            self.failing_devices.lock().unwrap().insert((platform, device));
            self
        }

        pub fn set_fail_listing(&self, fail: bool) {
            *self.fail_listing.lock().unwrap() = fail;
        }

        pub fn call_count(&self) -> u32 {
            *self.call_count.lock().unwrap()
        }

        pub fn reset_count(&self) {
            *self.call_count.lock().unwrap() = 0;
        }

        fn record_call(&self) {
            *self.call_count.lock().unwrap() += 1;
        }

        fn device(&self, (platform, index): (usize, usize)) -> Result<MockDevice> {
            self.platforms
                .lock()
                .unwrap()
                .get(platform)
                .and_then(|p| p.devices.get(index).cloned())
                .ok_or_else(|| DoubleFinderError::Device(format!("no device {platform}/{index}")))
        }
    }

    pub fn device(name: &str, type_bits: u64, doubles: bool) -> MockDevice {
        MockDevice {
            name: name.to_string(),
            type_bits,
            doubles,
        }
    }

    impl ComputePlatform for MockPlatform {
        type Platform = usize;
        type Device = (usize, usize);

        fn backend_name(&self) -> &str {
            "mock"
        }

        fn platforms(&self) -> Result<Vec<usize>> {
            self.record_call();
            if *self.fail_listing.lock().unwrap() {
                return Err(DoubleFinderError::Platform("Mock platform error".to_string()));
            }
            Ok((0..self.platforms.lock().unwrap().len()).collect())
        }

        fn platform_name(&self, platform: &usize) -> Result<String> {
            self.record_call();
            if self.failing_platform_names.lock().unwrap().contains(platform) {
                return Err(DoubleFinderError::Platform("Mock platform name error".to_string()));
            }
            self.platforms
                .lock()
                .unwrap()
                .get(*platform)
                .map(|p| p.name.clone())
                .ok_or_else(|| DoubleFinderError::Platform(format!("no platform {platform}")))
        }

        fn devices(&self, platform: &usize) -> Result<Vec<(usize, usize)>> {
            self.record_call();
            if self.failing_platforms.lock().unwrap().contains(platform) {
                return Err(DoubleFinderError::Platform("Mock platform error".to_string()));
            }
            let count = self
                .platforms
                .lock()
                .unwrap()
                .get(*platform)
                .map(|p| p.devices.len())
                .unwrap_or(0);
            Ok((0..count).map(|i| (*platform, i)).collect())
        }

        fn device_name(&self, device: &(usize, usize)) -> Result<String> {
            self.record_call();
            Ok(self.device(*device)?.name)
        }

        fn device_type_bits(&self, device: &(usize, usize)) -> Result<u64> {
            self.record_call();
            Ok(self.device(*device)?.type_bits)
        }

        fn supports_double_precision(&self, device: &(usize, usize)) -> Result<bool> {
            self.record_call();
            if self.failing_devices.lock().unwrap().contains(device) {
                return Err(DoubleFinderError::Device("Mock device error".to_string()));
            }
            Ok(self.device(*device)?.doubles)
        }
    }
}

pub mod records {
    use doublefinder_device::{DeviceClass, DeviceRecord};

    pub fn intel_cpu() -> DeviceRecord {
        DeviceRecord::new("Intel CPU", DeviceClass::Cpu, true)
    }

    pub fn mock_gpu() -> DeviceRecord {
        DeviceRecord::new("Mock GPU", DeviceClass::Gpu, false)
    }
}

#[cfg(test)]
mod tests {
    use super::platform::{MockPlatform, device};
    use super::records::{intel_cpu, mock_gpu};
    use doublefinder_device::{
        Column, DeviceClass, DeviceLister, SkippedItem, TablePresenter, type_bits,
    };

    fn intel_and_mock_gpu() -> MockPlatform {
        MockPlatform::new().with_platform(
            "Apple",
            vec![
                device("Intel CPU", type_bits::CPU, true),
                device("Mock GPU", type_bits::GPU, false),
            ],
        )
    }

    #[test]
    fn test_zero_platforms_zero_rows() {
        let mock = MockPlatform::new();
        let snapshot = DeviceLister::new(&mock).scan();

        assert_eq!(snapshot.records.len(), 0);
        assert_eq!(TablePresenter::from_snapshot(&snapshot).row_count(), 0);
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_cpu_and_gpu_scenario() {
        let snapshot = DeviceLister::new(intel_and_mock_gpu()).scan();

        assert_eq!(
            snapshot.records,
            vec![
                intel_cpu().with_platform("Apple"),
                mock_gpu().with_platform("Apple"),
            ]
        );

        let table = TablePresenter::from_snapshot(&snapshot);
        assert_eq!(table.row_count(), 2);
        let supported = table.cell(0, Column::DoublePrecision).unwrap();
        let unsupported = table.cell(1, Column::DoublePrecision).unwrap();
        assert!(supported.contains("doubles supported"));
        assert!(unsupported.contains("no doubles"));
    }

    #[test]
    fn test_gpu_accelerator_overlap() {
        let mock = MockPlatform::new().with_platform(
            "Vendor",
            vec![device("Hybrid", type_bits::GPU | type_bits::ACCELERATOR, true)],
        );
        let snapshot = DeviceLister::new(mock).scan();
        assert_eq!(snapshot.records[0].class(), DeviceClass::Gpu);
    }

    #[test]
    fn test_partial_failure_isolation() {
        let mock = MockPlatform::new()
            .with_platform(
                "A",
                vec![
                    device("first", type_bits::GPU, true),
                    device("broken", type_bits::GPU, true),
                    device("third", type_bits::CPU, false),
                ],
            )
            .fail_device(0, 1);

        let snapshot = DeviceLister::new(mock).scan();
        let names: Vec<_> = snapshot.records.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["first", "third"]);
        assert!(matches!(
            snapshot.skipped.as_slice(),
            [SkippedItem::Device { index: 1, .. }]
        ));
    }

    #[test]
    fn test_failing_platform_is_skipped() {
        let mock = MockPlatform::new()
            .with_platform("A", vec![device("a", type_bits::GPU, true)])
            .with_platform("B", vec![device("b", type_bits::CPU, true)])
            .fail_platform(0);

        let snapshot = DeviceLister::new(mock).scan();
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.records[0].name(), "b");
    }

    #[test]
    fn test_listing_failure_yields_empty() {
        let mock = intel_and_mock_gpu();
        mock.set_fail_listing(true);

        let snapshot = DeviceLister::new(&mock).scan();
        assert!(snapshot.is_empty());
        assert!(matches!(
            snapshot.skipped.as_slice(),
            [SkippedItem::PlatformList { .. }]
        ));
    }

    #[test]
    fn test_unnamed_platform_keeps_devices() {
        let mock = intel_and_mock_gpu()
            .with_platform("Other", vec![device("c", type_bits::ACCELERATOR, false)])
            .fail_platform_name(0);

        let snapshot = DeviceLister::new(mock).scan();
        assert!(snapshot.skipped.is_empty());
        let rows: Vec<_> = snapshot
            .records
            .iter()
            .map(|r| (r.name(), r.platform()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Intel CPU", Some("platform #0")),
                ("Mock GPU", Some("platform #0")),
                ("c", Some("Other")),
            ]
        );

        let table = TablePresenter::from_snapshot(&snapshot).with_platform_column();
        assert_eq!(table.cell(1, Column::Platform).as_deref(), Some("platform #0"));
    }

    #[test]
    fn test_rescan_is_deterministic_and_requeries() {
        let mock = intel_and_mock_gpu();
        let lister = DeviceLister::new(&mock);

        let first = lister.scan();
        let calls = mock.call_count();
        mock.reset_count();
        let second = lister.scan();

        assert_eq!(first.records, second.records);
        assert_eq!(mock.call_count(), calls);
    }
}
