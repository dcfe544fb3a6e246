// ==========================================
// 仓储库位分配系统 - 物品生命周期引擎
// ==========================================
// 职责: 校验状态机转换合法性,推导转换隐含的库位占用变化与流水记录
// 状态机: PENDING --place--> PLACED --pick--> REMOVED
// 红线: 纯校验/推导,不做任何写入;写入由出入库事务统一提交
// 红线: 非法转换必须显式报错,重复 place/pick 是确定性终态错误而非瞬态错误
// ==========================================

use crate::domain::item::StockItem;
use crate::domain::location::StorageLocation;
use crate::domain::movement::StockMovement;
use crate::domain::types::{ItemStatus, MovementType};
use thiserror::Error;

// ==========================================
// 生命周期错误
// ==========================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleError {
    /// 非法状态转换(调用方逻辑错误,禁止重试)
    #[error("无效的状态转换: system_code={system_code}, from={from}, to={to}")]
    InvalidTransition {
        system_code: String,
        from: ItemStatus,
        to: ItemStatus,
    },

    /// PLACED 物品缺少库位记录(数据不一致)
    #[error("物品缺少库位记录: system_code={0}")]
    MissingLocation(String),

    /// 重量非法
    #[error("物品重量非法: system_code={system_code}, weight_kg={weight_kg}")]
    InvalidWeight {
        system_code: String,
        weight_kg: f64,
    },
}

// ==========================================
// 占用变化指令
// ==========================================

/// 地面层堆放集合操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackOp {
    /// 加入堆放集合
    Push(String),
    /// 从堆放集合移除
    Remove(String),
}

/// 一次转换隐含的库位占用变化
///
/// 货架层走 weight_delta_kg,地面层走 stack_op(地面不做承重记账)
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyDelta {
    pub location_code: String,
    pub weight_delta_kg: f64,
    pub stack_op: Option<StackOp>,
}

// ==========================================
// LifecycleEngine - 生命周期引擎
// ==========================================
pub struct LifecycleEngine {
    // 无状态引擎
}

impl LifecycleEngine {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 转换校验
    // ==========================================

    /// 校验 place 转换(仅 PENDING 可上架)
    pub fn validate_place(&self, item: &StockItem) -> Result<(), LifecycleError> {
        if !item.has_valid_weight() {
            return Err(LifecycleError::InvalidWeight {
                system_code: item.system_code.clone(),
                weight_kg: item.weight_kg,
            });
        }
        if item.status != ItemStatus::Pending {
            return Err(LifecycleError::InvalidTransition {
                system_code: item.system_code.clone(),
                from: item.status,
                to: ItemStatus::Placed,
            });
        }
        Ok(())
    }

    /// 校验 pick 转换(仅 PLACED 可出库),返回物品当前登记库位
    pub fn validate_pick(&self, item: &StockItem) -> Result<String, LifecycleError> {
        if item.status != ItemStatus::Placed {
            return Err(LifecycleError::InvalidTransition {
                system_code: item.system_code.clone(),
                from: item.status,
                to: ItemStatus::Removed,
            });
        }
        item.location_code
            .clone()
            .ok_or_else(|| LifecycleError::MissingLocation(item.system_code.clone()))
    }

    // ==========================================
    // 占用变化推导
    // ==========================================

    /// place 隐含的占用变化: 货架层 +重量,地面层加入堆放集合
    pub fn place_delta(&self, item: &StockItem, location: &StorageLocation) -> OccupancyDelta {
        if location.is_ground() {
            OccupancyDelta {
                location_code: location.code.clone(),
                weight_delta_kg: 0.0,
                stack_op: Some(StackOp::Push(item.system_code.clone())),
            }
        } else {
            OccupancyDelta {
                location_code: location.code.clone(),
                weight_delta_kg: item.weight_kg,
                stack_op: None,
            }
        }
    }

    /// pick 隐含的占用变化: 货架层 -重量(提交侧钳制到 0),地面层移出堆放集合
    pub fn pick_delta(&self, item: &StockItem, location: &StorageLocation) -> OccupancyDelta {
        if location.is_ground() {
            OccupancyDelta {
                location_code: location.code.clone(),
                weight_delta_kg: 0.0,
                stack_op: Some(StackOp::Remove(item.system_code.clone())),
            }
        } else {
            OccupancyDelta {
                location_code: location.code.clone(),
                weight_delta_kg: -item.weight_kg,
                stack_op: None,
            }
        }
    }

    // ==========================================
    // 流水记录构造
    // ==========================================

    /// 构造入库流水
    pub fn build_in_movement(
        &self,
        item: &StockItem,
        location_code: &str,
        operator: String,
        reference: Option<String>,
        notes: Option<String>,
    ) -> StockMovement {
        StockMovement::record(
            item.system_code.clone(),
            location_code.to_string(),
            MovementType::In,
            item.weight_kg,
            operator,
            reference,
            notes,
        )
    }

    /// 构造出库流水
    pub fn build_out_movement(
        &self,
        item: &StockItem,
        location_code: &str,
        operator: String,
        reference: Option<String>,
        notes: Option<String>,
    ) -> StockMovement {
        StockMovement::record(
            item.system_code.clone(),
            location_code.to_string(),
            MovementType::Out,
            item.weight_kg,
            operator,
            reference,
            notes,
        )
    }
}

impl Default for LifecycleEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::RackType;

    fn pending_item() -> StockItem {
        StockItem::new_pending("S-0001".into(), "I-20001".into(), None, None, 120.0)
    }

    fn rack_location() -> StorageLocation {
        StorageLocation {
            code: "R1-A-1-1".into(),
            row: 1,
            bay: "A".into(),
            level: 1,
            position: 1,
            rack_type: RackType::Standard,
            max_weight_kg: Some(1500.0),
            current_weight_kg: 0.0,
            available: true,
            verified: true,
            is_ground_full: false,
            stacked_items: Vec::new(),
            height_m: 2.0,
        }
    }

    fn ground_location() -> StorageLocation {
        StorageLocation {
            code: "R2-B-0-1".into(),
            level: 0,
            max_weight_kg: None,
            height_m: 0.0,
            ..rack_location()
        }
    }

    #[test]
    fn test_place_only_from_pending() {
        let engine = LifecycleEngine::new();
        let mut item = pending_item();
        assert!(engine.validate_place(&item).is_ok());

        item.status = ItemStatus::Placed;
        assert!(matches!(
            engine.validate_place(&item),
            Err(LifecycleError::InvalidTransition { from: ItemStatus::Placed, .. })
        ));

        item.status = ItemStatus::Removed;
        assert!(engine.validate_place(&item).is_err());
    }

    #[test]
    fn test_pick_only_from_placed() {
        let engine = LifecycleEngine::new();
        let mut item = pending_item();

        assert!(matches!(
            engine.validate_pick(&item),
            Err(LifecycleError::InvalidTransition { from: ItemStatus::Pending, .. })
        ));

        item.status = ItemStatus::Placed;
        item.location_code = Some("R1-A-1-1".into());
        assert_eq!(engine.validate_pick(&item).unwrap(), "R1-A-1-1");

        // PLACED 但缺库位 -> 数据不一致
        item.location_code = None;
        assert!(matches!(
            engine.validate_pick(&item),
            Err(LifecycleError::MissingLocation(_))
        ));
    }

    #[test]
    fn test_removed_is_terminal() {
        let engine = LifecycleEngine::new();
        let mut item = pending_item();
        item.status = ItemStatus::Removed;

        assert!(engine.validate_place(&item).is_err());
        assert!(engine.validate_pick(&item).is_err());
    }

    #[test]
    fn test_rack_delta_uses_weight() {
        let engine = LifecycleEngine::new();
        let item = pending_item();
        let loc = rack_location();

        let delta = engine.place_delta(&item, &loc);
        assert_eq!(delta.weight_delta_kg, 120.0);
        assert!(delta.stack_op.is_none());

        let delta = engine.pick_delta(&item, &loc);
        assert_eq!(delta.weight_delta_kg, -120.0);
    }

    #[test]
    fn test_ground_delta_uses_stack() {
        let engine = LifecycleEngine::new();
        let item = pending_item();
        let loc = ground_location();

        let delta = engine.place_delta(&item, &loc);
        assert_eq!(delta.weight_delta_kg, 0.0);
        assert_eq!(delta.stack_op, Some(StackOp::Push("S-0001".into())));

        let delta = engine.pick_delta(&item, &loc);
        assert_eq!(delta.stack_op, Some(StackOp::Remove("S-0001".into())));
    }

    #[test]
    fn test_movement_construction() {
        let engine = LifecycleEngine::new();
        let item = pending_item();

        let m = engine.build_in_movement(&item, "R1-A-1-1", "张三".into(), None, None);
        assert_eq!(m.movement_type, MovementType::In);
        assert_eq!(m.weight_kg, 120.0);
        assert_eq!(m.location_code, "R1-A-1-1");
    }
}
