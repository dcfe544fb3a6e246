// ==========================================
// 仓储库位分配系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 所有仓储共享同一条互斥连接,保证出入库事务的三表写入
//       与单库位/单物品的条件更新在同一串行化通道上
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{LocationApi, StockApi};
use crate::config::config_manager::ConfigManager;
use crate::db;
use crate::engine::{AllocationEngine, LifecycleEngine, StorageEventPublisher};
use crate::repository::{
    ItemRepository, LocationRepository, MovementRepository, PlacementRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源,由外围应用(扫描工位/收发货界面)持有
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 库位管理API
    pub location_api: Arc<LocationApi>,

    /// 出入库API
    pub stock_api: Arc<StockApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 事件发布器(读缓存失效/看板刷新等下游钩子)
    pub event_publisher: Option<Arc<dyn StorageEventPublisher>>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - event_publisher: 可选事件发布器
    ///
    /// # 说明
    /// 该方法会:
    /// 1. 打开共享数据库连接并应用统一 PRAGMA
    /// 2. 初始化所有表结构(幂等)并写入 schema_version 标记
    /// 3. 读取承重策略配置
    /// 4. 创建所有Repository/Engine/API实例
    pub fn new(
        db_path: String,
        event_publisher: Option<Arc<dyn StorageEventPublisher>>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState,数据库路径: {}", db_path);

        // 创建数据库连接(共享连接)
        let conn = db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;

        // 初始化表结构
        LocationRepository::init_schema_on(&conn)
            .map_err(|e| format!("库位表初始化失败: {}", e))?;
        ItemRepository::init_schema_on(&conn).map_err(|e| format!("物品表初始化失败: {}", e))?;
        MovementRepository::init_schema_on(&conn)
            .map_err(|e| format!("流水表初始化失败: {}", e))?;
        ConfigManager::init_schema_on(&conn).map_err(|e| format!("配置表初始化失败: {}", e))?;

        // schema_version 校验与标记
        match db::read_schema_version(&conn) {
            Ok(Some(v)) if v > db::CURRENT_SCHEMA_VERSION => {
                tracing::warn!(
                    "数据库 schema_version={} 高于当前代码期望 {},可能来自更新的版本",
                    v,
                    db::CURRENT_SCHEMA_VERSION
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("schema_version 读取失败(将继续启动): {}", e),
        }
        db::mark_schema_version(&conn, db::CURRENT_SCHEMA_VERSION)
            .map_err(|e| format!("schema_version 写入失败: {}", e))?;

        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let location_repo = Arc::new(LocationRepository::from_connection(conn.clone()));
        let item_repo = Arc::new(ItemRepository::from_connection(conn.clone()));
        let movement_repo = Arc::new(MovementRepository::from_connection(conn.clone()));
        let placement_repo = Arc::new(PlacementRepository::from_connection(conn.clone()));

        // ==========================================
        // 初始化配置与Engine层
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("配置管理器初始化失败: {}", e))?,
        );
        let weight_policy = config_manager
            .weight_policy()
            .map_err(|e| format!("承重策略配置读取失败: {}", e))?;
        tracing::info!("承重策略: {}", weight_policy);

        let allocation_engine = Arc::new(AllocationEngine::with_policy(weight_policy));
        let lifecycle_engine = Arc::new(LifecycleEngine::new());

        // ==========================================
        // 初始化API层
        // ==========================================
        let location_api = Arc::new(LocationApi::new(
            location_repo.clone(),
            event_publisher.clone(),
        ));
        let stock_api = Arc::new(StockApi::new(
            item_repo,
            location_repo,
            movement_repo,
            placement_repo,
            allocation_engine,
            lifecycle_engine,
            event_publisher.clone(),
        ));

        tracing::info!("AppState初始化成功");

        Ok(Self {
            db_path,
            location_api,
            stock_api,
            config_manager,
            event_publisher,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 WAREHOUSE_SLOTTING_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径(便于调试/测试/CI)
    if let Ok(path) = std::env::var("WAREHOUSE_SLOTTING_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./warehouse_slotting.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录,避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("warehouse-slotting-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("warehouse-slotting");
        }

        if let Err(e) = std::fs::create_dir_all(&path) {
            tracing::warn!("数据目录创建失败,回退当前目录: {}", e);
            path = PathBuf::from(".");
        }
        path = path.join("warehouse_slotting.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    // 注意: AppState::new() 的测试需要真实的数据库文件
    // 这些测试在集成测试中进行
}
