// ==========================================
// 仓储库位分配系统 - 应用层
// ==========================================
// 职责: 组合根,供外围应用(扫描工位/收发货界面)装配核心
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
