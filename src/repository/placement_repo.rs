// ==========================================
// 仓储库位分配系统 - 出入库事务仓储
// ==========================================
// 职责: 把"库位占用变更 + 物品状态转换 + 流水追加"三步
//       放进同一个 SQLite 事务,整体提交或整体回滚
// 红线: 三步之间不允许出现可被外部观察到的中间状态
// 红线: 提交前基于权威行数据重新校验资格/承重,不信任调用方快照
// ==========================================

use crate::domain::location::StorageLocation;
use crate::domain::movement::StockMovement;
use crate::engine::lifecycle::OccupancyDelta;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::item_repo::{transition_to_placed_on, transition_to_removed_on};
use crate::repository::location_repo::{apply_occupancy_delta_on, find_by_code_on};
use crate::repository::movement_repo::append_on;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// PlacementRepository - 出入库事务仓储
// ==========================================

/// 出入库事务仓储
///
/// 三张表的复合写入必须共用同一条连接,
/// 因此该仓储只能通过共享连接构造
pub struct PlacementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlacementRepository {
    /// 从共享连接创建实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 上架提交
    // ==========================================

    /// 提交上架: 占用增加 + PENDING->PLACED + IN 流水,原子执行
    ///
    /// # 参数
    /// - delta: 生命周期引擎推导的占用变化(目标库位在 delta 内)
    /// - movement: 预构造的 IN 流水
    /// - enforce_ceiling: STRICT 策略为 true
    ///
    /// # 返回
    /// - Ok(StorageLocation): 提交后的库位状态
    /// - Err: 任一步失败,整个事务回滚,无任何落库效果
    pub fn commit_place(
        &self,
        delta: &OccupancyDelta,
        movement: &StockMovement,
        enforce_ceiling: bool,
    ) -> RepositoryResult<StorageLocation> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 提交时资格复核: 以权威行数据为准,不信任选位时的快照
        let location = require_location(&tx, &delta.location_code)?;
        if !location.available || !location.verified {
            return Err(RepositoryError::LocationUnavailable {
                code: location.code,
                reason: "库位不可用或未核验".to_string(),
            });
        }
        if location.is_ground() && location.is_ground_full {
            return Err(RepositoryError::LocationUnavailable {
                code: location.code,
                reason: "地面库位已满".to_string(),
            });
        }

        // 占用变更(承重条件更新,超限 -> CapacityExceeded)
        let updated = apply_occupancy_delta_on(&tx, delta, enforce_ceiling)?;

        // 物品状态条件转换(并发 place 恰好一个成功)
        transition_to_placed_on(&tx, &movement.system_code, &delta.location_code)?;

        // 流水追加
        append_on(&tx, movement)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(updated)
    }

    // ==========================================
    // 出库提交
    // ==========================================

    /// 提交出库: 占用减少(钳制到0) + PLACED->REMOVED + OUT 流水,原子执行
    pub fn commit_pick(
        &self,
        delta: &OccupancyDelta,
        movement: &StockMovement,
    ) -> RepositoryResult<StorageLocation> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 登记库位必须仍然存在
        require_location(&tx, &delta.location_code)?;

        // 物品状态条件转换(并发 pick 恰好一个成功;同时校验登记库位未漂移)
        transition_to_removed_on(&tx, &movement.system_code, &delta.location_code)?;

        // 占用变更(负增量不受承重上限约束,仓储侧钳制到 0)
        let updated = apply_occupancy_delta_on(&tx, delta, false)?;

        // 流水追加
        append_on(&tx, movement)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(updated)
    }
}

/// 读取库位,缺失归为 LocationUnavailable(调用方可刷新候选集后重试)
fn require_location(conn: &Connection, code: &str) -> RepositoryResult<StorageLocation> {
    find_by_code_on(conn, code)?.ok_or_else(|| RepositoryError::LocationUnavailable {
        code: code.to_string(),
        reason: "库位不存在".to_string(),
    })
}
