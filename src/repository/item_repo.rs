// ==========================================
// 仓储库位分配系统 - 库存物品仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 状态转换必须是条件更新(WHERE status = 期望态),
//       保证同一物品的并发转换恰好一个成功
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::item::StockItem;
use crate::domain::types::ItemStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ItemRepository - 库存物品仓储
// ==========================================

/// 库存物品仓储
/// 职责: 管理 stock_item 表的增查与受控状态转换
pub struct ItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ItemRepository {
    /// 创建新的物品仓储实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 初始化表结构(幂等)
    pub fn init_schema(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::init_schema_on(&conn)
    }

    pub(crate) fn init_schema_on(conn: &Connection) -> RepositoryResult<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS stock_item (
                system_code TEXT PRIMARY KEY,
                item_code TEXT NOT NULL,
                description TEXT,
                category TEXT,
                weight_kg REAL NOT NULL,
                status TEXT NOT NULL,
                location_code TEXT,
                location_verified INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_item_status ON stock_item (status)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_item_location ON stock_item (location_code)",
            [],
        )?;
        Ok(())
    }

    // ==========================================
    // 写入接口
    // ==========================================

    /// 登记新物品(收货,PENDING 状态)
    ///
    /// 扫描码重复时返回唯一约束违反
    pub fn insert(&self, item: &StockItem) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO stock_item (
                system_code, item_code, description, category, weight_kg,
                status, location_code, location_verified, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                item.system_code,
                item.item_code,
                item.description,
                item.category,
                item.weight_kg,
                item.status.as_str(),
                item.location_code,
                item.location_verified,
                item.created_at.to_rfc3339(),
                item.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 按扫描码查询单个物品
    pub fn find_by_system_code(&self, system_code: &str) -> RepositoryResult<Option<StockItem>> {
        let conn = self.get_conn()?;
        find_by_system_code_on(&conn, system_code)
    }

    /// 按状态查询物品列表
    pub fn list_by_status(&self, status: ItemStatus) -> RepositoryResult<Vec<StockItem>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM stock_item WHERE status = ?1 ORDER BY created_at, system_code",
            ITEM_COLUMNS
        ))?;

        let items = stmt
            .query_map(params![status.as_str()], map_item_row)?
            .collect::<SqliteResult<Vec<StockItem>>>()?;

        Ok(items)
    }

    /// 查询登记在某库位上的物品
    pub fn list_by_location(&self, location_code: &str) -> RepositoryResult<Vec<StockItem>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM stock_item WHERE location_code = ?1 ORDER BY system_code",
            ITEM_COLUMNS
        ))?;

        let items = stmt
            .query_map(params![location_code], map_item_row)?
            .collect::<SqliteResult<Vec<StockItem>>>()?;

        Ok(items)
    }
}

// ==========================================
// 连接级状态转换原语(供出入库事务在同一事务内复用)
// ==========================================

pub(crate) const ITEM_COLUMNS: &str = "system_code, item_code, description, category, weight_kg, \
     status, location_code, location_verified, created_at, updated_at";

pub(crate) fn find_by_system_code_on(
    conn: &Connection,
    system_code: &str,
) -> RepositoryResult<Option<StockItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM stock_item WHERE system_code = ?1",
        ITEM_COLUMNS
    ))?;

    let item = stmt
        .query_row(params![system_code], map_item_row)
        .optional()?;
    Ok(item)
}

/// PENDING -> PLACED 条件转换
///
/// WHERE status = 'PENDING' 保证并发 place 恰好一个成功;
/// 0 行受影响时回读实际状态,输出确定性的转换错误
pub(crate) fn transition_to_placed_on(
    conn: &Connection,
    system_code: &str,
    location_code: &str,
) -> RepositoryResult<()> {
    let affected = conn.execute(
        r#"
        UPDATE stock_item
        SET status = 'PLACED',
            location_code = ?1,
            location_verified = 1,
            updated_at = ?2
        WHERE system_code = ?3 AND status = 'PENDING'
        "#,
        params![location_code, Utc::now().to_rfc3339(), system_code],
    )?;

    if affected == 0 {
        return Err(transition_failure(conn, system_code, ItemStatus::Placed));
    }
    Ok(())
}

/// PLACED -> REMOVED 条件转换
///
/// 同时校验登记库位未被并发修改(WHERE location_code = 期望值)
pub(crate) fn transition_to_removed_on(
    conn: &Connection,
    system_code: &str,
    expected_location: &str,
) -> RepositoryResult<()> {
    let affected = conn.execute(
        r#"
        UPDATE stock_item
        SET status = 'REMOVED',
            location_code = NULL,
            location_verified = 0,
            updated_at = ?1
        WHERE system_code = ?2 AND status = 'PLACED' AND location_code = ?3
        "#,
        params![Utc::now().to_rfc3339(), system_code, expected_location],
    )?;

    if affected == 0 {
        return Err(transition_failure(conn, system_code, ItemStatus::Removed));
    }
    Ok(())
}

/// 条件转换失败后的错误判定: 不存在 / 状态不符
fn transition_failure(
    conn: &Connection,
    system_code: &str,
    to: ItemStatus,
) -> RepositoryError {
    let actual: Result<Option<String>, rusqlite::Error> = conn
        .query_row(
            "SELECT status FROM stock_item WHERE system_code = ?1",
            params![system_code],
            |row| row.get(0),
        )
        .optional();

    match actual {
        Ok(Some(from)) => RepositoryError::InvalidStateTransition {
            system_code: system_code.to_string(),
            from,
            to: to.as_str().to_string(),
        },
        Ok(None) => RepositoryError::NotFound {
            entity: "StockItem".to_string(),
            id: system_code.to_string(),
        },
        Err(e) => e.into(),
    }
}

/// 行映射: stock_item -> StockItem
pub(crate) fn map_item_row(row: &Row<'_>) -> SqliteResult<StockItem> {
    let status_raw: String = row.get(5)?;
    let status = ItemStatus::parse(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            format!("未知物品状态: {}", status_raw).into(),
        )
    })?;

    Ok(StockItem {
        system_code: row.get(0)?,
        item_code: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        weight_kg: row.get(4)?,
        status,
        location_code: row.get(6)?,
        location_verified: row.get(7)?,
        created_at: parse_timestamp(row, 8)?,
        updated_at: parse_timestamp(row, 9)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> SqliteResult<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
