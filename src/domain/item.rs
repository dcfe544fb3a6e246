// ==========================================
// 仓储库位分配系统 - 库存物品领域模型
// ==========================================
// 状态机: PENDING --place--> PLACED --pick--> REMOVED
// 不变式: location_code 存在 当且仅当 status == PLACED
// ==========================================

use crate::domain::types::ItemStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// StockItem - 库存物品
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    // ===== 主键 =====
    pub system_code: String, // 系统扫描码(唯一)

    // ===== 主数据 =====
    pub item_code: String,           // 物品编码(物料号)
    pub description: Option<String>, // 描述
    pub category: Option<String>,    // 类别
    pub weight_kg: f64,              // 重量(千克), 必须 > 0

    // ===== 生命周期 =====
    pub status: ItemStatus,
    pub location_code: Option<String>, // 仅 PLACED 状态存在
    pub location_verified: bool,       // 仅在确认库位上为 true

    // ===== 时间戳 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// 创建待入库物品(登记收货)
    pub fn new_pending(
        system_code: String,
        item_code: String,
        description: Option<String>,
        category: Option<String>,
        weight_kg: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            system_code,
            item_code,
            description,
            category,
            weight_kg,
            status: ItemStatus::Pending,
            location_code: None,
            location_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// 重量是否合法(正数且有限)
    pub fn has_valid_weight(&self) -> bool {
        self.weight_kg.is_finite() && self.weight_kg > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pending_defaults() {
        let item = StockItem::new_pending(
            "S-0001".to_string(),
            "I-20001".to_string(),
            None,
            Some("钢卷".to_string()),
            120.0,
        );
        assert_eq!(item.status, ItemStatus::Pending);
        assert!(item.location_code.is_none());
        assert!(!item.location_verified);
        assert!(item.has_valid_weight());
    }

    #[test]
    fn test_invalid_weight() {
        let mut item = StockItem::new_pending("S-1".into(), "I-1".into(), None, None, 0.0);
        assert!(!item.has_valid_weight());
        item.weight_kg = f64::NAN;
        assert!(!item.has_valid_weight());
    }
}
