// ==========================================
// 仓储库位分配系统 - 库位管理 API
// ==========================================
// 职责: 库位批量建库、查询、管理员编辑(启用/核验/地面满标)、空库位删除
// 红线: 占用字段不经过本 API 修改,只能走出入库事务
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::capacity::{self, GROUND_LEVEL};
use crate::domain::location::StorageLocation;
use crate::engine::events::{StorageEvent, StorageEventPublisher};
use crate::repository::location_repo::LocationRepository;

// ==========================================
// ProvisionRequest - 批量建库请求
// ==========================================

/// 批量建库请求: 按 排x巷x层x位 的笛卡尔积生成库位
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub row_start: i32,
    pub row_end: i32,
    pub bays: Vec<String>,
    /// 最高层级(含地面层0到 top_level 的全部层)
    pub top_level: i32,
    pub positions_per_bay: i32,
    pub rack_type: String,
    /// 新建库位是否直接标记为已核验
    pub verified: bool,
    /// 层高覆盖(米): 设置后所有货架层使用该值,默认由承重模型推导
    pub height_override: Option<f64>,
}

/// 批量建库结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionResult {
    pub created: usize,
    pub skipped: usize,
}

// ==========================================
// LocationApi - 库位管理 API
// ==========================================

/// 库位管理API
///
/// 职责:
/// 1. 批量建库(按坐标范围生成,承重/高度由承重模型推导)
/// 2. 库位查询(全量/可分配)
/// 3. 管理员编辑(available / verified / is_ground_full)
/// 4. 空库位删除(非空库位拒绝删除)
pub struct LocationApi {
    location_repo: Arc<LocationRepository>,
    event_publisher: Option<Arc<dyn StorageEventPublisher>>,
}

impl LocationApi {
    /// 创建新的 LocationApi 实例
    pub fn new(
        location_repo: Arc<LocationRepository>,
        event_publisher: Option<Arc<dyn StorageEventPublisher>>,
    ) -> Self {
        Self {
            location_repo,
            event_publisher,
        }
    }

    // ==========================================
    // 建库接口
    // ==========================================

    /// 批量建库
    ///
    /// 承重上限与层高由承重模型按(货架类型, 层级)推导;
    /// 已存在的编码跳过,重复执行幂等
    ///
    /// # 返回
    /// - Ok(ProvisionResult): 新建/跳过数量
    /// - Err(ApiError::ConfigurationError): 未知货架类型或层级超出配置表
    /// - Err(ApiError::InvalidInput): 坐标范围非法
    pub fn provision_locations(&self, req: ProvisionRequest) -> ApiResult<ProvisionResult> {
        // 参数验证
        if req.row_start < 1 || req.row_end < req.row_start {
            return Err(ApiError::InvalidInput(format!(
                "排号范围非法: {}..{}",
                req.row_start, req.row_end
            )));
        }
        if req.bays.is_empty() || req.bays.iter().any(|b| b.trim().is_empty()) {
            return Err(ApiError::InvalidInput("巷道列表不能为空".to_string()));
        }
        if req.positions_per_bay < 1 {
            return Err(ApiError::InvalidInput(format!(
                "每巷位数非法: {}",
                req.positions_per_bay
            )));
        }
        if req.top_level < GROUND_LEVEL {
            return Err(ApiError::InvalidInput(format!(
                "最高层级非法: {}",
                req.top_level
            )));
        }
        if let Some(h) = req.height_override {
            if !h.is_finite() || h <= 0.0 {
                return Err(ApiError::InvalidInput(format!("层高覆盖非法: {}", h)));
            }
        }

        let rack_type = capacity::parse_rack_type(&req.rack_type)?;
        if req.top_level > capacity::max_level_for(rack_type) {
            return Err(ApiError::ConfigurationError(format!(
                "货架类型 {} 不存在层级 {}",
                rack_type, req.top_level
            )));
        }

        // 按坐标笛卡尔积生成库位
        let mut locations = Vec::new();
        for row in req.row_start..=req.row_end {
            for bay in &req.bays {
                for level in GROUND_LEVEL..=req.top_level {
                    let max_weight_kg = capacity::max_weight_for(rack_type, level)?.as_kg();
                    let height_m = match req.height_override {
                        Some(h) if level != GROUND_LEVEL => h,
                        _ => capacity::height_for(rack_type, level)?,
                    };

                    for position in 1..=req.positions_per_bay {
                        locations.push(StorageLocation {
                            code: StorageLocation::compose_code(row, bay, level, position),
                            row,
                            bay: bay.clone(),
                            level,
                            position,
                            rack_type,
                            max_weight_kg,
                            current_weight_kg: 0.0,
                            available: true,
                            verified: req.verified,
                            is_ground_full: false,
                            stacked_items: Vec::new(),
                            height_m,
                        });
                    }
                }
            }
        }

        let total = locations.len();
        let created = self.location_repo.insert_batch(&locations)?;
        info!(created, skipped = total - created, "批量建库完成");

        self.publish(StorageEvent::directory_changed(None));

        Ok(ProvisionResult {
            created,
            skipped: total - created,
        })
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询全部库位
    pub fn list_locations(&self) -> ApiResult<Vec<StorageLocation>> {
        Ok(self.location_repo.list_all()?)
    }

    /// 查询可分配库位(可用 + 已核验 + 地面/货架匹配)
    pub fn list_eligible(&self, require_ground: bool) -> ApiResult<Vec<StorageLocation>> {
        Ok(self.location_repo.list_eligible(require_ground)?)
    }

    /// 按编码查询单个库位
    pub fn get_location(&self, code: &str) -> ApiResult<StorageLocation> {
        self.location_repo
            .find_by_code(code)?
            .ok_or_else(|| ApiError::NotFound(format!("StorageLocation(code={})不存在", code)))
    }

    // ==========================================
    // 管理员编辑接口
    // ==========================================

    /// 设置库位启用标志
    pub fn set_available(&self, code: &str, available: bool) -> ApiResult<()> {
        self.location_repo.set_available(code, available)?;
        debug!(code, available, "库位启用标志已更新");
        self.publish(StorageEvent::directory_changed(Some(code.to_string())));
        Ok(())
    }

    /// 设置库位核验标志
    pub fn set_verified(&self, code: &str, verified: bool) -> ApiResult<()> {
        self.location_repo.set_verified(code, verified)?;
        debug!(code, verified, "库位核验标志已更新");
        self.publish(StorageEvent::directory_changed(Some(code.to_string())));
        Ok(())
    }

    /// 设置地面层"已满"标志
    ///
    /// 仅地面层有意义;对货架层设置属于无效输入
    pub fn set_ground_full(&self, code: &str, full: bool) -> ApiResult<()> {
        let location = self.get_location(code)?;
        if !location.is_ground() {
            return Err(ApiError::InvalidInput(format!(
                "非地面库位不支持已满标志: code={}, level={}",
                code, location.level
            )));
        }

        self.location_repo.set_ground_full(code, full)?;
        debug!(code, full, "地面库位已满标志已更新");
        self.publish(StorageEvent::directory_changed(Some(code.to_string())));
        Ok(())
    }

    /// 删除空库位(非空库位拒绝删除)
    pub fn delete_location(&self, code: &str) -> ApiResult<()> {
        self.location_repo.delete_if_empty(code)?;
        info!(code, "库位已删除");
        self.publish(StorageEvent::directory_changed(Some(code.to_string())));
        Ok(())
    }

    /// 事件发布失败只记日志,不影响已完成的变更
    fn publish(&self, event: StorageEvent) {
        if let Some(publisher) = &self.event_publisher {
            if let Err(e) = publisher.publish(event) {
                tracing::warn!("事件发布失败(忽略): {}", e);
            }
        }
    }
}
