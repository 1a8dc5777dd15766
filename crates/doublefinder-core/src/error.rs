//! 统一错误处理

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DoubleFinderError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("平台查询错误: {0}")]
    Platform(String),

    #[error("设备查询错误: {0}")]
    Device(String),

    #[error("夹具错误: {0}")]
    Fixture(String),

    #[error("查询超时: {0}")]
    Timeout(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DoubleFinderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        fn read() -> Result<String> {
            Ok(std::fs::read_to_string("/definitely/not/here/config.json")?)
        }

        let err = read().unwrap_err();
        assert!(matches!(err, DoubleFinderError::Io(_)));
    }

    #[test]
    fn test_display_keeps_detail() {
        let err = DoubleFinderError::Device("CL_INVALID_DEVICE".to_string());
        assert!(err.to_string().contains("CL_INVALID_DEVICE"));
    }
}
