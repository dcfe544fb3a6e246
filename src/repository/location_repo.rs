// ==========================================
// 仓储库位分配系统 - 库位目录仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 占用字段的唯一合法修改入口是 apply_occupancy_delta,
//       必须是条件更新(乐观并发),禁止"先读后写"
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::location::StorageLocation;
use crate::domain::types::RackType;
use crate::engine::lifecycle::{OccupancyDelta, StackOp};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// LocationRepository - 库位目录仓储
// ==========================================

/// 库位目录仓储
/// 职责: 管理 storage_location 表的查询与受控变更
pub struct LocationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LocationRepository {
    /// 创建新的库位仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
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

    /// 获取数据库连接
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
            CREATE TABLE IF NOT EXISTS storage_location (
                code TEXT PRIMARY KEY,
                row_no INTEGER NOT NULL,
                bay TEXT NOT NULL,
                level INTEGER NOT NULL,
                position INTEGER NOT NULL,
                rack_type TEXT NOT NULL,
                max_weight_kg REAL,
                current_weight_kg REAL NOT NULL DEFAULT 0,
                available INTEGER NOT NULL DEFAULT 1,
                verified INTEGER NOT NULL DEFAULT 0,
                is_ground_full INTEGER NOT NULL DEFAULT 0,
                stacked_items TEXT NOT NULL DEFAULT '[]',
                height_m REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
            [],
        )?;
        conn.execute(
            r#"
            CREATE INDEX IF NOT EXISTS idx_location_eligible
            ON storage_location (available, verified, level)
            "#,
            [],
        )?;
        Ok(())
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 按编码查询单个库位
    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<StorageLocation>> {
        let conn = self.get_conn()?;
        find_by_code_on(&conn, code)
    }

    /// 查询全部库位(按物理坐标排序)
    pub fn list_all(&self) -> RepositoryResult<Vec<StorageLocation>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM storage_location ORDER BY row_no, bay, level, position",
            LOCATION_COLUMNS
        ))?;

        let locations = stmt
            .query_map([], map_location_row)?
            .collect::<SqliteResult<Vec<StorageLocation>>>()?;

        Ok(locations)
    }

    /// 查询可分配库位(可用 + 已核验 + 地面/货架匹配)
    ///
    /// 排序按物理坐标(排/巷/层/位),保证分配引擎的输入顺序稳定,
    /// 从而保证同分 tie-break 的确定性
    pub fn list_eligible(&self, require_ground: bool) -> RepositoryResult<Vec<StorageLocation>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM storage_location
            WHERE available = 1
              AND verified = 1
              AND ((?1 AND level = 0) OR (NOT ?1 AND level <> 0))
            ORDER BY row_no, bay, level, position
            "#,
            LOCATION_COLUMNS
        ))?;

        let locations = stmt
            .query_map(params![require_ground], map_location_row)?
            .collect::<SqliteResult<Vec<StorageLocation>>>()?;

        Ok(locations)
    }

    // ==========================================
    // 建库/管理接口
    // ==========================================

    /// 批量插入库位(已存在的编码跳过,保证重复建库幂等)
    ///
    /// # 返回
    /// - Ok(usize): 实际新建的库位数
    pub fn insert_batch(&self, locations: &[StorageLocation]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut created = 0usize;
        for loc in locations {
            let affected = tx.execute(
                r#"
                INSERT OR IGNORE INTO storage_location (
                    code, row_no, bay, level, position, rack_type,
                    max_weight_kg, current_weight_kg, available, verified,
                    is_ground_full, stacked_items, height_m
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
                params![
                    loc.code,
                    loc.row,
                    loc.bay,
                    loc.level,
                    loc.position,
                    loc.rack_type.as_str(),
                    loc.max_weight_kg,
                    loc.current_weight_kg,
                    loc.available,
                    loc.verified,
                    loc.is_ground_full,
                    serde_json::to_string(&loc.stacked_items)
                        .map_err(|e| RepositoryError::InternalError(e.to_string()))?,
                    loc.height_m,
                ],
            )?;
            created += affected;
        }

        tx.commit()?;
        Ok(created)
    }

    /// 设置库位启用标志
    pub fn set_available(&self, code: &str, available: bool) -> RepositoryResult<()> {
        self.set_flag(code, "available", available)
    }

    /// 设置库位核验标志
    pub fn set_verified(&self, code: &str, verified: bool) -> RepositoryResult<()> {
        self.set_flag(code, "verified", verified)
    }

    /// 设置地面层"已满"标志
    pub fn set_ground_full(&self, code: &str, full: bool) -> RepositoryResult<()> {
        self.set_flag(code, "is_ground_full", full)
    }

    fn set_flag(&self, code: &str, column: &str, value: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        // column 来自固定白名单,不存在注入
        let affected = conn.execute(
            &format!(
                "UPDATE storage_location SET {} = ?1, updated_at = datetime('now') WHERE code = ?2",
                column
            ),
            params![value, code],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "StorageLocation".to_string(),
                id: code.to_string(),
            });
        }
        Ok(())
    }

    /// 删除空库位
    ///
    /// 条件删除: 仅当 current_weight_kg = 0 且 stacked_items 为空时生效,
    /// 非空库位删除属于业务规则违反
    pub fn delete_if_empty(&self, code: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"
            DELETE FROM storage_location
            WHERE code = ?1
              AND current_weight_kg <= 0
              AND stacked_items = '[]'
            "#,
            params![code],
        )?;

        if affected == 0 {
            // 区分"不存在"与"非空"
            let exists: bool = conn
                .query_row(
                    "SELECT 1 FROM storage_location WHERE code = ?1",
                    params![code],
                    |_row| Ok(true),
                )
                .optional()?
                .unwrap_or(false);

            if exists {
                return Err(RepositoryError::BusinessRuleViolation(format!(
                    "库位非空,不能删除: code={}",
                    code
                )));
            }
            return Err(RepositoryError::NotFound {
                entity: "StorageLocation".to_string(),
                id: code.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 占用变更原语
    // ==========================================

    /// 应用占用变更(唯一合法的占用字段修改入口)
    ///
    /// # 参数
    /// - delta: 生命周期引擎推导出的占用变化
    /// - enforce_ceiling: 是否强制承重上限(STRICT 策略为 true)
    ///
    /// # 返回
    /// - Ok(StorageLocation): 变更后的库位
    /// - Err(RepositoryError::CapacityExceeded): 超承重且强制上限
    /// - Err(RepositoryError::NotFound): 库位不存在
    pub fn apply_occupancy_delta(
        &self,
        delta: &OccupancyDelta,
        enforce_ceiling: bool,
    ) -> RepositoryResult<StorageLocation> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let updated = apply_occupancy_delta_on(&tx, delta, enforce_ceiling)?;
        tx.commit()?;
        Ok(updated)
    }
}

// ==========================================
// 连接级原语(供出入库事务在同一事务内复用)
// ==========================================

pub(crate) const LOCATION_COLUMNS: &str = "code, row_no, bay, level, position, rack_type, \
     max_weight_kg, current_weight_kg, available, verified, \
     is_ground_full, stacked_items, height_m";

pub(crate) fn find_by_code_on(
    conn: &Connection,
    code: &str,
) -> RepositoryResult<Option<StorageLocation>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM storage_location WHERE code = ?1",
        LOCATION_COLUMNS
    ))?;

    let location = stmt.query_row(params![code], map_location_row).optional()?;
    Ok(location)
}

/// 占用变更的连接级实现
///
/// 货架层走承重记账(条件更新 + 影响行数判定),
/// 地面层走堆放集合操作(同一互斥连接下串行化)
pub(crate) fn apply_occupancy_delta_on(
    conn: &Connection,
    delta: &OccupancyDelta,
    enforce_ceiling: bool,
) -> RepositoryResult<StorageLocation> {
    match &delta.stack_op {
        Some(op) => apply_stack_op(conn, &delta.location_code, op)?,
        None => apply_weight_delta(
            conn,
            &delta.location_code,
            delta.weight_delta_kg,
            enforce_ceiling,
        )?,
    }

    find_by_code_on(conn, &delta.location_code)?.ok_or_else(|| RepositoryError::NotFound {
        entity: "StorageLocation".to_string(),
        id: delta.location_code.clone(),
    })
}

/// 承重记账: 单条条件更新
///
/// - 负增量钳制到 0(记账是参考值,不是精确物理质量)
/// - 正增量在强制上限时写入前检查 current + delta <= max,
///   条件不满足则 0 行受影响 -> CapacityExceeded
fn apply_weight_delta(
    conn: &Connection,
    code: &str,
    weight_delta_kg: f64,
    enforce_ceiling: bool,
) -> RepositoryResult<()> {
    let affected = conn.execute(
        r#"
        UPDATE storage_location
        SET current_weight_kg = MAX(current_weight_kg + ?1, 0.0),
            updated_at = datetime('now')
        WHERE code = ?2
          AND (
              level = 0
              OR ?1 <= 0
              OR NOT ?3
              OR max_weight_kg IS NULL
              OR current_weight_kg + ?1 <= max_weight_kg
          )
        "#,
        params![weight_delta_kg, code, enforce_ceiling],
    )?;

    if affected == 0 {
        // 区分"不存在"与"超承重"
        let row: Option<(f64, Option<f64>)> = conn
            .query_row(
                "SELECT current_weight_kg, max_weight_kg FROM storage_location WHERE code = ?1",
                params![code],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        return match row {
            Some((current_kg, Some(max_kg))) => Err(RepositoryError::CapacityExceeded {
                code: code.to_string(),
                attempted_kg: current_kg + weight_delta_kg,
                max_weight_kg: max_kg,
            }),
            Some((_, None)) => Err(RepositoryError::InternalError(format!(
                "占用更新意外失败: code={}",
                code
            ))),
            None => Err(RepositoryError::NotFound {
                entity: "StorageLocation".to_string(),
                id: code.to_string(),
            }),
        };
    }

    if !enforce_ceiling {
        // 软偏好策略下允许越限,但必须留下告警痕迹
        let over: Option<f64> = conn
            .query_row(
                r#"
                SELECT current_weight_kg - max_weight_kg FROM storage_location
                WHERE code = ?1 AND max_weight_kg IS NOT NULL
                  AND current_weight_kg > max_weight_kg
                "#,
                params![code],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(excess_kg) = over {
            tracing::warn!(code, excess_kg, "库位承重越限(软偏好策略放行)");
        }
    }

    Ok(())
}

/// 地面层堆放集合操作(JSON 数组)
fn apply_stack_op(conn: &Connection, code: &str, op: &StackOp) -> RepositoryResult<()> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT stacked_items FROM storage_location WHERE code = ?1",
            params![code],
            |row| row.get(0),
        )
        .optional()?;

    let raw = raw.ok_or_else(|| RepositoryError::NotFound {
        entity: "StorageLocation".to_string(),
        id: code.to_string(),
    })?;

    let mut stacked: Vec<String> = serde_json::from_str(&raw)
        .map_err(|e| RepositoryError::InternalError(format!("stacked_items 解析失败: {}", e)))?;

    match op {
        StackOp::Push(system_code) => {
            if !stacked.contains(system_code) {
                stacked.push(system_code.clone());
            }
        }
        StackOp::Remove(system_code) => {
            stacked.retain(|s| s != system_code);
        }
    }

    conn.execute(
        "UPDATE storage_location SET stacked_items = ?1, updated_at = datetime('now') WHERE code = ?2",
        params![
            serde_json::to_string(&stacked)
                .map_err(|e| RepositoryError::InternalError(e.to_string()))?,
            code
        ],
    )?;

    Ok(())
}

/// 行映射: storage_location -> StorageLocation
pub(crate) fn map_location_row(row: &Row<'_>) -> SqliteResult<StorageLocation> {
    let rack_type_raw: String = row.get(5)?;
    let rack_type = RackType::parse(&rack_type_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            Box::new(crate::domain::capacity::ConfigurationError::UnknownRackType(
                rack_type_raw.clone(),
            )),
        )
    })?;

    let stacked_raw: String = row.get(11)?;
    let stacked_items: Vec<String> = serde_json::from_str(&stacked_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(11, Type::Text, Box::new(e))
    })?;

    Ok(StorageLocation {
        code: row.get(0)?,
        row: row.get(1)?,
        bay: row.get(2)?,
        level: row.get(3)?,
        position: row.get(4)?,
        rack_type,
        max_weight_kg: row.get(6)?,
        current_weight_kg: row.get(7)?,
        available: row.get(8)?,
        verified: row.get(9)?,
        is_ground_full: row.get(10)?,
        stacked_items,
        height_m: row.get(12)?,
    })
}
