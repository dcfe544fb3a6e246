// ==========================================
// 仓储库位分配系统 - 数据仓储层
// ==========================================
// 职责: 数据访问,不含业务逻辑
// 红线: 共享计数器一律条件更新,禁止"先读后写"
// ==========================================

pub mod error;
pub mod item_repo;
pub mod location_repo;
pub mod movement_repo;
pub mod placement_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use item_repo::ItemRepository;
pub use location_repo::LocationRepository;
pub use movement_repo::MovementRepository;
pub use placement_repo::PlacementRepository;
