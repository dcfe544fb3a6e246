// ==========================================
// 仓储库位分配系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod capacity;
pub mod item;
pub mod location;
pub mod movement;
pub mod types;

// 重导出核心类型
pub use capacity::{ConfigurationError, GROUND_LEVEL};
pub use item::StockItem;
pub use location::{bay_ordinal, OccupancyCheck, StorageLocation};
pub use movement::StockMovement;
pub use types::{ItemStatus, MovementType, RackType, WeightLimit, WeightPolicy};
