// ==========================================
// 仓储库位分配系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 关键配置: allocation.weight_policy (承重策略,必须显式,默认 STRICT)
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::types::WeightPolicy;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 承重策略配置键
pub const KEY_WEIGHT_POLICY: &str = "allocation.weight_policy";

/// 流水窗口默认条数配置键
pub const KEY_RECENT_MOVEMENT_LIMIT: &str = "movement.recent_default_limit";

/// 流水窗口默认条数(未配置时)
pub const DEFAULT_RECENT_MOVEMENT_LIMIT: u32 = 50;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 初始化配置表结构(幂等)
    pub fn init_schema(&self) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        Self::init_schema_on(&conn)?;
        Ok(())
    }

    pub(crate) fn init_schema_on(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS config_scope (
                scope_id TEXT PRIMARY KEY,
                scope_type TEXT NOT NULL,
                scope_key TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(scope_type, scope_key)
            )
            "#,
            [],
        )?;
        conn.execute(
            r#"
            INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
            VALUES ('global', 'GLOBAL', 'global')
            "#,
            [],
        )?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS config_kv (
                scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (scope_id, key)
            )
            "#,
            [],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    // ==========================================
    // 业务配置读取
    // ==========================================

    /// 读取承重策略
    ///
    /// 未配置时默认 STRICT(硬约束);
    /// 配置值无法识别属于配置错误,显式报错而不是静默回落
    pub fn weight_policy(&self) -> Result<WeightPolicy, Box<dyn Error>> {
        match self.get_config_value(KEY_WEIGHT_POLICY)? {
            None => Ok(WeightPolicy::Strict),
            Some(raw) => WeightPolicy::parse(raw.trim())
                .ok_or_else(|| format!("无法识别的承重策略配置: {}", raw).into()),
        }
    }

    /// 读取流水窗口默认条数
    pub fn recent_movement_limit(&self) -> Result<u32, Box<dyn Error>> {
        match self.get_config_value(KEY_RECENT_MOVEMENT_LIMIT)? {
            None => Ok(DEFAULT_RECENT_MOVEMENT_LIMIT),
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|e| format!("流水窗口配置非法: {} ({})", raw, e).into()),
        }
    }
}
