// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据准备等功能
// ==========================================

#![allow(dead_code)]

use std::error::Error;

use rusqlite::Connection;
use tempfile::NamedTempFile;

use warehouse_slotting::api::{ProvisionRequest, RegisterItemRequest};
use warehouse_slotting::AppState;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("临时文件路径非法")?.to_string();
    Ok((temp_file, db_path))
}

/// 打开一条指向测试数据库的裸连接（用于测试内的直接 SQL 校验/破坏）
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(Connection::open(db_path)?)
}

// ==========================================
// 测试环境
// ==========================================

/// 集成测试环境
///
/// 持有 AppState 与临时数据库文件（文件随环境析构自动清理）
pub struct TestEnv {
    pub db_path: String,
    pub state: AppState,
    _temp_file: NamedTempFile,
}

/// 创建完整测试环境（schema 初始化由 AppState 完成）
pub fn create_test_env() -> Result<TestEnv, Box<dyn Error>> {
    let (temp_file, db_path) = create_test_db()?;
    let state = AppState::new(db_path.clone(), None)?;
    Ok(TestEnv {
        db_path,
        state,
        _temp_file: temp_file,
    })
}

// ==========================================
// 测试数据准备
// ==========================================

/// 标准货架建库请求: 排1..2 x 巷[A,B] x 层0..2 x 位1..2
pub fn standard_grid_request() -> ProvisionRequest {
    ProvisionRequest {
        row_start: 1,
        row_end: 2,
        bays: vec!["A".to_string(), "B".to_string()],
        top_level: 2,
        positions_per_bay: 2,
        rack_type: "STANDARD".to_string(),
        verified: true,
        height_override: None,
    }
}

/// 建一批标准库位（已核验，可直接参与分配）
pub fn provision_standard_grid(env: &TestEnv) -> Result<usize, Box<dyn Error>> {
    let result = env
        .state
        .location_api
        .provision_locations(standard_grid_request())?;
    Ok(result.created)
}

/// 登记一件 PENDING 物品
pub fn register_item(
    env: &TestEnv,
    system_code: &str,
    weight_kg: f64,
) -> Result<(), Box<dyn Error>> {
    env.state.stock_api.register_item(RegisterItemRequest {
        system_code: system_code.to_string(),
        item_code: format!("I-{}", system_code),
        description: Some("测试物品".to_string()),
        category: Some("钢卷".to_string()),
        weight_kg,
    })?;
    Ok(())
}
