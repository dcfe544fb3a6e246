// ==========================================
// 仓储库位分配系统 - 出入库 API
// ==========================================
// 职责: 物品登记、库位分配、上架、出库、流水查询
// 流程: 先快速失败校验(不写库),再由出入库事务统一提交,
//       提交内部基于权威数据复核资格/承重
// 红线: 提交成功后才发布事件;事件失败不回滚事务
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::item::StockItem;
use crate::domain::movement::StockMovement;
use crate::domain::types::ItemStatus;
use crate::engine::allocation::AllocationEngine;
use crate::engine::events::{StorageEvent, StorageEventPublisher};
use crate::engine::lifecycle::LifecycleEngine;
use crate::repository::item_repo::ItemRepository;
use crate::repository::location_repo::LocationRepository;
use crate::repository::movement_repo::MovementRepository;
use crate::repository::placement_repo::PlacementRepository;

/// 流水窗口上限(防止无界读取)
const MAX_RECENT_MOVEMENTS: u32 = 500;

// ==========================================
// RegisterItemRequest - 收货登记请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterItemRequest {
    pub system_code: String,
    pub item_code: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub weight_kg: f64,
}

// ==========================================
// StockApi - 出入库 API
// ==========================================

/// 出入库API
///
/// 职责:
/// 1. 收货登记(PENDING 物品)
/// 2. 库位分配(纯内存打分,不落库)
/// 3. 上架/出库(三表原子事务)
/// 4. 流水查询(有界窗口)
pub struct StockApi {
    item_repo: Arc<ItemRepository>,
    location_repo: Arc<LocationRepository>,
    movement_repo: Arc<MovementRepository>,
    placement_repo: Arc<PlacementRepository>,
    allocation_engine: Arc<AllocationEngine>,
    lifecycle_engine: Arc<LifecycleEngine>,
    event_publisher: Option<Arc<dyn StorageEventPublisher>>,
}

impl StockApi {
    /// 创建新的 StockApi 实例
    pub fn new(
        item_repo: Arc<ItemRepository>,
        location_repo: Arc<LocationRepository>,
        movement_repo: Arc<MovementRepository>,
        placement_repo: Arc<PlacementRepository>,
        allocation_engine: Arc<AllocationEngine>,
        lifecycle_engine: Arc<LifecycleEngine>,
        event_publisher: Option<Arc<dyn StorageEventPublisher>>,
    ) -> Self {
        Self {
            item_repo,
            location_repo,
            movement_repo,
            placement_repo,
            allocation_engine,
            lifecycle_engine,
            event_publisher,
        }
    }

    // ==========================================
    // 收货登记
    // ==========================================

    /// 登记新物品(收货,PENDING 状态)
    pub fn register_item(&self, req: RegisterItemRequest) -> ApiResult<StockItem> {
        if req.system_code.trim().is_empty() {
            return Err(ApiError::InvalidInput("系统扫描码不能为空".to_string()));
        }
        if req.item_code.trim().is_empty() {
            return Err(ApiError::InvalidInput("物品编码不能为空".to_string()));
        }
        if !req.weight_kg.is_finite() || req.weight_kg <= 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "物品重量必须为正数: {}",
                req.weight_kg
            )));
        }

        let item = StockItem::new_pending(
            req.system_code,
            req.item_code,
            req.description,
            req.category,
            req.weight_kg,
        );
        self.item_repo.insert(&item)?;

        info!(system_code = %item.system_code, weight_kg = item.weight_kg, "物品登记完成");
        Ok(item)
    }

    /// 按扫描码查询物品
    pub fn get_item(&self, system_code: &str) -> ApiResult<StockItem> {
        self.item_repo
            .find_by_system_code(system_code)?
            .ok_or_else(|| ApiError::NotFound(format!("StockItem(id={})不存在", system_code)))
    }

    /// 按状态查询物品列表
    pub fn list_items_by_status(&self, status: ItemStatus) -> ApiResult<Vec<StockItem>> {
        Ok(self.item_repo.list_by_status(status)?)
    }

    // ==========================================
    // 库位分配
    // ==========================================

    /// 为指定重量挑选最优库位(只读,不落库)
    ///
    /// # 参数
    /// - weight_kg: 物品重量
    /// - require_ground: 是否强制地面层(超重/超限物品,策略由调用方掌握)
    ///
    /// # 返回
    /// - Ok(String): 推荐库位编码
    /// - Err(ApiError::NoLocationAvailable): 无可行库位,提示人工指定
    pub fn allocate(&self, weight_kg: f64, require_ground: bool) -> ApiResult<String> {
        let candidates = self.location_repo.list_eligible(require_ground)?;
        let code = self
            .allocation_engine
            .allocate(weight_kg, require_ground, &candidates)?;

        debug!(weight_kg, require_ground, code = %code, "库位分配完成");
        Ok(code)
    }

    // ==========================================
    // 上架
    // ==========================================

    /// 上架: PENDING 物品放入指定库位
    ///
    /// 步骤:
    /// 1. 快速失败校验(状态机/重量/操作员),不写库
    /// 2. 推导占用变化与 IN 流水
    /// 3. 出入库事务提交(内部复核资格/承重,失败整体回滚)
    /// 4. 发布 ItemPlaced 事件
    ///
    /// # 返回
    /// - Ok(StockMovement): 已落库的 IN 流水
    pub fn place(
        &self,
        system_code: &str,
        location_code: &str,
        operator: &str,
        reference: Option<String>,
        notes: Option<String>,
    ) -> ApiResult<StockMovement> {
        let operator = validate_operator(operator)?;

        let item = self.get_item(system_code)?;
        self.lifecycle_engine.validate_place(&item)?;

        // 选位与提交之间存在窗口期;这里的读取只用于推导增量形态(地面/货架),
        // 资格与承重以提交事务内的权威复核为准
        let location = self
            .location_repo
            .find_by_code(location_code)?
            .ok_or_else(|| {
                ApiError::LocationUnavailable(format!("库位不存在 (code={})", location_code))
            })?;

        let delta = self.lifecycle_engine.place_delta(&item, &location);
        let movement =
            self.lifecycle_engine
                .build_in_movement(&item, location_code, operator, reference, notes);

        let enforce_ceiling = self.allocation_engine.policy().enforces_ceiling();
        self.placement_repo
            .commit_place(&delta, &movement, enforce_ceiling)?;

        info!(
            system_code,
            location_code,
            weight_kg = item.weight_kg,
            "上架完成"
        );
        self.publish(StorageEvent::item_placed(
            system_code.to_string(),
            location_code.to_string(),
        ));

        Ok(movement)
    }

    // ==========================================
    // 出库
    // ==========================================

    /// 出库: PLACED 物品从登记库位取出
    ///
    /// # 返回
    /// - Ok(StockMovement): 已落库的 OUT 流水
    pub fn pick(
        &self,
        system_code: &str,
        operator: &str,
        reference: Option<String>,
        notes: Option<String>,
    ) -> ApiResult<StockMovement> {
        let operator = validate_operator(operator)?;

        let item = self.get_item(system_code)?;
        let location_code = self.lifecycle_engine.validate_pick(&item)?;

        let location = self
            .location_repo
            .find_by_code(&location_code)?
            .ok_or_else(|| {
                ApiError::LocationUnavailable(format!("库位不存在 (code={})", location_code))
            })?;

        let delta = self.lifecycle_engine.pick_delta(&item, &location);
        let movement =
            self.lifecycle_engine
                .build_out_movement(&item, &location_code, operator, reference, notes);

        self.placement_repo.commit_pick(&delta, &movement)?;

        info!(
            system_code,
            location_code = %location_code,
            weight_kg = item.weight_kg,
            "出库完成"
        );
        self.publish(StorageEvent::item_picked(
            system_code.to_string(),
            location_code,
        ));

        Ok(movement)
    }

    // ==========================================
    // 流水查询
    // ==========================================

    /// 查询最近流水(最新优先,有界窗口)
    pub fn list_recent_movements(&self, limit: u32) -> ApiResult<Vec<StockMovement>> {
        if limit == 0 {
            return Err(ApiError::InvalidInput("流水窗口必须大于 0".to_string()));
        }
        let limit = limit.min(MAX_RECENT_MOVEMENTS);
        Ok(self.movement_repo.recent(limit)?)
    }

    /// 查询某物品的全部流水
    pub fn list_item_movements(&self, system_code: &str) -> ApiResult<Vec<StockMovement>> {
        Ok(self.movement_repo.find_by_system_code(system_code)?)
    }

    /// 事件发布失败只记日志,不影响已提交的事务
    fn publish(&self, event: StorageEvent) {
        if let Some(publisher) = &self.event_publisher {
            if let Err(e) = publisher.publish(event) {
                warn!("事件发布失败(忽略): {}", e);
            }
        }
    }
}

/// 操作员校验: 非空,去除首尾空白
fn validate_operator(operator: &str) -> ApiResult<String> {
    let trimmed = operator.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("操作员不能为空".to_string()));
    }
    Ok(trimmed.to_string())
}
