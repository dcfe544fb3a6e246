// ==========================================
// 仓储库位分配系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 库位分配与出入库核心(界面/打印/扫码由外围应用负责)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施(连接初始化/PRAGMA 统一)
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组合根
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ItemStatus, MovementType, RackType, WeightLimit, WeightPolicy};

// 领域实体
pub use domain::{StockItem, StockMovement, StorageLocation};

// 引擎
pub use engine::{
    AllocationEngine, AllocationError, LifecycleEngine, LifecycleError, NoOpEventPublisher,
    OccupancyDelta, StackOp, StorageEvent, StorageEventPublisher, StorageEventType,
};

// API
pub use api::{ApiError, ApiResult, LocationApi, StockApi};

// 应用
pub use app::{get_default_db_path, AppState};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "仓储库位分配系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
