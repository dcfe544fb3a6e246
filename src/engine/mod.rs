// ==========================================
// 仓储库位分配系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL,所有拒绝必须输出可解释原因
// ==========================================

pub mod allocation;
pub mod events;
pub mod lifecycle;

// 重导出核心引擎
pub use allocation::{AllocationEngine, AllocationError};
pub use events::{NoOpEventPublisher, StorageEvent, StorageEventPublisher, StorageEventType};
pub use lifecycle::{LifecycleEngine, LifecycleError, OccupancyDelta, StackOp};
