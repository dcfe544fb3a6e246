// ==========================================
// 仓储库位分配系统 - 库位领域模型
// ==========================================
// 红线: 占用字段(current_weight_kg / stacked_items / is_ground_full)
//       只能通过出入库事务或库位仓储的占用原语修改
// ==========================================

use crate::domain::capacity::GROUND_LEVEL;
use crate::domain::types::{RackType, WeightLimit};
use serde::{Deserialize, Serialize};

// ==========================================
// StorageLocation - 库位
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageLocation {
    // ===== 主键 =====
    pub code: String, // 库位编码, 形如 R1-A-1-1 (排-巷-层-位)

    // ===== 坐标 =====
    pub row: i32,      // 排号
    pub bay: String,   // 巷道编号(字母)
    pub level: i32,    // 层级(0 = 地面层)
    pub position: i32, // 位编号

    // ===== 承重 =====
    pub rack_type: RackType,
    pub max_weight_kg: Option<f64>, // 货架层上限; 地面层为 None(无上限)
    pub current_weight_kg: f64,     // 当前已放置重量(仅货架层有意义)

    // ===== 可用性 =====
    pub available: bool, // 管理员启用标志
    pub verified: bool,  // 库位已实地核验标志

    // ===== 地面层专用 =====
    pub is_ground_full: bool,      // 地面层"已满"标志(替代承重上限)
    pub stacked_items: Vec<String>, // 地面层堆放的物品扫描码集合

    // ===== 物理尺寸 =====
    pub height_m: f64, // 层底高度(米), 地面层为 0
}

impl StorageLocation {
    /// 拼接库位编码: R{排}-{巷}-{层}-{位}
    pub fn compose_code(row: i32, bay: &str, level: i32, position: i32) -> String {
        format!("R{}-{}-{}-{}", row, bay, level, position)
    }

    /// 是否为地面层库位
    pub fn is_ground(&self) -> bool {
        self.level == GROUND_LEVEL
    }

    /// 是否满足分配资格(可用 + 已核验 + 地面/货架匹配)
    pub fn is_eligible(&self, require_ground: bool) -> bool {
        self.available && self.verified && self.is_ground() == require_ground
    }

    /// 承重上限(领域视角)
    pub fn weight_limit(&self) -> WeightLimit {
        match self.max_weight_kg {
            Some(max_kg) if !self.is_ground() => WeightLimit::Limited(max_kg),
            _ => WeightLimit::Unlimited,
        }
    }

    /// 巷道序号: A=1, B=2, ... 非字母巷道记 0
    ///
    /// 用于距离打分的次级排序键(排号为主序)
    pub fn bay_ordinal(&self) -> i32 {
        bay_ordinal(&self.bay)
    }

    /// 库位是否为空(可安全删除)
    pub fn is_empty(&self) -> bool {
        self.current_weight_kg <= 0.0 && self.stacked_items.is_empty()
    }
}

/// 巷道编号 -> 序号 (A=1 .. Z=26)
pub fn bay_ordinal(bay: &str) -> i32 {
    bay.chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| (c.to_ascii_uppercase() as i32) - ('A' as i32) + 1)
        .unwrap_or(0)
}

// ==========================================
// Trait: OccupancyCheck
// ==========================================
// 用途: 分配引擎的可行性检查接口
pub trait OccupancyCheck {
    /// 检查能否再容纳 weight_kg(仅承重维度,不含可用性)
    fn can_accept_weight(&self, weight_kg: f64) -> bool;

    /// 剩余承重(千克); 无上限返回 None
    fn remaining_weight_kg(&self) -> Option<f64>;
}

impl OccupancyCheck for StorageLocation {
    fn can_accept_weight(&self, weight_kg: f64) -> bool {
        self.weight_limit().accepts(self.current_weight_kg, weight_kg)
    }

    fn remaining_weight_kg(&self) -> Option<f64> {
        self.weight_limit()
            .as_kg()
            .map(|max_kg| (max_kg - self.current_weight_kg).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rack_location(code: &str, level: i32, max_kg: f64, current_kg: f64) -> StorageLocation {
        StorageLocation {
            code: code.to_string(),
            row: 1,
            bay: "A".to_string(),
            level,
            position: 1,
            rack_type: RackType::Standard,
            max_weight_kg: Some(max_kg),
            current_weight_kg: current_kg,
            available: true,
            verified: true,
            is_ground_full: false,
            stacked_items: Vec::new(),
            height_m: 2.0,
        }
    }

    #[test]
    fn test_compose_code() {
        assert_eq!(StorageLocation::compose_code(1, "A", 1, 1), "R1-A-1-1");
        assert_eq!(StorageLocation::compose_code(12, "C", 0, 7), "R12-C-0-7");
    }

    #[test]
    fn test_bay_ordinal() {
        assert_eq!(bay_ordinal("A"), 1);
        assert_eq!(bay_ordinal("c"), 3);
        assert_eq!(bay_ordinal("Z"), 26);
        assert_eq!(bay_ordinal("3"), 0);
    }

    #[test]
    fn test_eligibility() {
        let mut loc = rack_location("R1-A-1-1", 1, 1500.0, 0.0);
        assert!(loc.is_eligible(false));
        assert!(!loc.is_eligible(true));

        loc.verified = false;
        assert!(!loc.is_eligible(false));
    }

    #[test]
    fn test_occupancy_check() {
        let loc = rack_location("R1-A-1-2", 1, 1500.0, 1400.0);
        assert!(loc.can_accept_weight(100.0));
        assert!(!loc.can_accept_weight(200.0));
        assert_eq!(loc.remaining_weight_kg(), Some(100.0));
    }
}
