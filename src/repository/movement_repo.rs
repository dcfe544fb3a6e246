// ==========================================
// 仓储库位分配系统 - 出入库流水仓储
// ==========================================
// 红线: 仅追加(append-only),不暴露更新/删除接口
// 说明: 唯一允许无界增长的表,读取一律走"最新优先 + 限量窗口"
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::movement::StockMovement;
use crate::domain::types::MovementType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// MovementRepository - 出入库流水仓储
// ==========================================

/// 出入库流水仓储
/// 职责: stock_movement 表的追加与有界读取
pub struct MovementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MovementRepository {
    /// 创建新的流水仓储实例
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
            CREATE TABLE IF NOT EXISTS stock_movement (
                movement_id TEXT PRIMARY KEY,
                system_code TEXT NOT NULL,
                location_code TEXT NOT NULL,
                movement_type TEXT NOT NULL,
                weight_kg REAL NOT NULL,
                operator TEXT NOT NULL,
                reference TEXT,
                notes TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_movement_created ON stock_movement (created_at DESC)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_movement_item ON stock_movement (system_code)",
            [],
        )?;
        Ok(())
    }

    // ==========================================
    // 写入接口(仅追加)
    // ==========================================

    /// 追加一条流水
    pub fn append(&self, movement: &StockMovement) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        append_on(&conn, movement)
    }

    // ==========================================
    // 查询接口(有界窗口)
    // ==========================================

    /// 查询最近流水(最新优先)
    pub fn recent(&self, limit: u32) -> RepositoryResult<Vec<StockMovement>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM stock_movement
            ORDER BY created_at DESC, movement_id DESC
            LIMIT ?1
            "#,
            MOVEMENT_COLUMNS
        ))?;

        let movements = stmt
            .query_map(params![limit], map_movement_row)?
            .collect::<SqliteResult<Vec<StockMovement>>>()?;

        Ok(movements)
    }

    /// 查询某物品的全部流水(最新优先)
    pub fn find_by_system_code(&self, system_code: &str) -> RepositoryResult<Vec<StockMovement>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM stock_movement
            WHERE system_code = ?1
            ORDER BY created_at DESC, movement_id DESC
            "#,
            MOVEMENT_COLUMNS
        ))?;

        let movements = stmt
            .query_map(params![system_code], map_movement_row)?
            .collect::<SqliteResult<Vec<StockMovement>>>()?;

        Ok(movements)
    }

    /// 流水总数(测试/巡检用)
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM stock_movement", [], |row| row.get(0))?;
        Ok(n)
    }
}

// ==========================================
// 连接级追加原语(供出入库事务在同一事务内复用)
// ==========================================

pub(crate) const MOVEMENT_COLUMNS: &str = "movement_id, system_code, location_code, movement_type, \
     weight_kg, operator, reference, notes, created_at";

pub(crate) fn append_on(conn: &Connection, movement: &StockMovement) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO stock_movement (
            movement_id, system_code, location_code, movement_type,
            weight_kg, operator, reference, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            movement.movement_id,
            movement.system_code,
            movement.location_code,
            movement.movement_type.as_str(),
            movement.weight_kg,
            movement.operator,
            movement.reference,
            movement.notes,
            movement.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// 行映射: stock_movement -> StockMovement
pub(crate) fn map_movement_row(row: &Row<'_>) -> SqliteResult<StockMovement> {
    let type_raw: String = row.get(3)?;
    let movement_type = MovementType::parse(&type_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("未知移动类型: {}", type_raw).into(),
        )
    })?;

    let created_raw: String = row.get(8)?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

    Ok(StockMovement {
        movement_id: row.get(0)?,
        system_code: row.get(1)?,
        location_code: row.get(2)?,
        movement_type,
        weight_kg: row.get(4)?,
        operator: row.get(5)?,
        reference: row.get(6)?,
        notes: row.get(7)?,
        created_at,
    })
}
