// ==========================================
// 仓储库位分配系统 - 出入库流水领域模型
// ==========================================
// 红线: 仅追加(append-only),创建后不允许更新或删除
// 用途: 审计追踪,唯一允许无界增长的实体(读取使用有界窗口)
// ==========================================

use crate::domain::types::MovementType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// StockMovement - 出入库流水
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    // ===== 主键 =====
    pub movement_id: String, // UUID

    // ===== 关联 =====
    pub system_code: String,   // 物品扫描码(永久引用,物品出库后仍然有效)
    pub location_code: String, // 发生地库位编码

    // ===== 内容 =====
    pub movement_type: MovementType,
    pub weight_kg: f64,
    pub operator: String,          // 操作员(由调用方提供的展示名/账号)
    pub reference: Option<String>, // 单据号等外部引用
    pub notes: Option<String>,

    // ===== 时间戳 =====
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// 构造一条新流水(分配新 UUID 与当前时间戳)
    pub fn record(
        system_code: String,
        location_code: String,
        movement_type: MovementType,
        weight_kg: f64,
        operator: String,
        reference: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            movement_id: Uuid::new_v4().to_string(),
            system_code,
            location_code,
            movement_type,
            weight_kg,
            operator,
            reference,
            notes,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_assigns_id() {
        let m = StockMovement::record(
            "S-0001".into(),
            "R1-A-1-1".into(),
            MovementType::In,
            120.0,
            "张三".into(),
            Some("GR-2026-001".into()),
            None,
        );
        assert!(!m.movement_id.is_empty());
        assert_eq!(m.movement_type, MovementType::In);
    }
}
