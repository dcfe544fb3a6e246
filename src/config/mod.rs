// ==========================================
// 仓储库位分配系统 - 配置层
// ==========================================
// 职责: 系统配置的读取与覆写
// ==========================================

pub mod config_manager;

pub use config_manager::{
    ConfigManager, DEFAULT_RECENT_MOVEMENT_LIMIT, KEY_RECENT_MOVEMENT_LIMIT, KEY_WEIGHT_POLICY,
};
