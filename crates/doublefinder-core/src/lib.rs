//! DoubleFinder Core - 核心类型
//!
//! 提供项目的错误处理与配置加载。

pub mod config;
pub mod error;

pub use config::*;
pub use error::*;
