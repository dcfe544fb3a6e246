// ==========================================
// 仓储库位分配系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 货架类型 (Rack Type)
// ==========================================
// 红线: 封闭枚举,未知类型必须显式报错,不允许宽松默认
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RackType {
    Standard,   // 标准货架
    HeavyDuty,  // 重型货架
    Cantilever, // 悬臂货架
}

impl RackType {
    /// 转换为数据库存储字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            RackType::Standard => "STANDARD",
            RackType::HeavyDuty => "HEAVY_DUTY",
            RackType::Cantilever => "CANTILEVER",
        }
    }

    /// 从数据库字符串解析（未知类型返回 None，由调用方决定报错方式）
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "STANDARD" => Some(RackType::Standard),
            "HEAVY_DUTY" => Some(RackType::HeavyDuty),
            "CANTILEVER" => Some(RackType::Cantilever),
            _ => None,
        }
    }
}

impl fmt::Display for RackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 物品状态 (Item Status)
// ==========================================
// 状态机: PENDING --place--> PLACED --pick--> REMOVED
// 红线: REMOVED 为终态,不允许任何后续转换
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Pending, // 待入库
    Placed,  // 已上架
    Removed, // 已出库
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "PENDING",
            ItemStatus::Placed => "PLACED",
            ItemStatus::Removed => "REMOVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ItemStatus::Pending),
            "PLACED" => Some(ItemStatus::Placed),
            "REMOVED" => Some(ItemStatus::Removed),
            _ => None,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 移动类型 (Movement Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    In,  // 入库
    Out, // 出库
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(MovementType::In),
            "OUT" => Some(MovementType::Out),
            _ => None,
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 承重策略 (Weight Policy)
// ==========================================
// 背景: 层级承重上限存在"硬约束"与"软偏好"两种历史口径,
//       必须作为显式配置项,不允许隐式选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeightPolicy {
    /// 硬约束: 超过层级承重上限的库位直接排除,提交时拒绝写入
    Strict,
    /// 软偏好: 超限库位保留但施加大额罚分,提交时不拒绝(仅告警)
    SoftPreference,
}

impl Default for WeightPolicy {
    fn default() -> Self {
        WeightPolicy::Strict
    }
}

impl WeightPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightPolicy::Strict => "STRICT",
            WeightPolicy::SoftPreference => "SOFT_PREFERENCE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "STRICT" => Some(WeightPolicy::Strict),
            "SOFT_PREFERENCE" => Some(WeightPolicy::SoftPreference),
            _ => None,
        }
    }

    /// 是否在提交时强制执行承重上限
    pub fn enforces_ceiling(&self) -> bool {
        matches!(self, WeightPolicy::Strict)
    }
}

impl fmt::Display for WeightPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 承重上限 (Weight Limit)
// ==========================================
// 地面层(level=0)不设数字上限,用 Unlimited 表达,
// 避免用哨兵值(如 f64::MAX)混入算术运算
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WeightLimit {
    /// 无上限(地面层)
    Unlimited,
    /// 数字上限(千克)
    Limited(f64),
}

impl WeightLimit {
    /// 检查在当前已用重量下能否再容纳 weight_kg
    pub fn accepts(&self, current_kg: f64, weight_kg: f64) -> bool {
        match self {
            WeightLimit::Unlimited => true,
            WeightLimit::Limited(max_kg) => current_kg + weight_kg <= *max_kg,
        }
    }

    /// 数字上限(若有)
    pub fn as_kg(&self) -> Option<f64> {
        match self {
            WeightLimit::Unlimited => None,
            WeightLimit::Limited(max_kg) => Some(*max_kg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rack_type_roundtrip() {
        for rt in [RackType::Standard, RackType::HeavyDuty, RackType::Cantilever] {
            assert_eq!(RackType::parse(rt.as_str()), Some(rt));
        }
        assert_eq!(RackType::parse("DRIVE_IN"), None);
    }

    #[test]
    fn test_item_status_roundtrip() {
        for st in [ItemStatus::Pending, ItemStatus::Placed, ItemStatus::Removed] {
            assert_eq!(ItemStatus::parse(st.as_str()), Some(st));
        }
        assert_eq!(ItemStatus::parse("placed"), None);
    }

    #[test]
    fn test_weight_limit_accepts() {
        assert!(WeightLimit::Unlimited.accepts(1.0e9, 1.0e9));
        assert!(WeightLimit::Limited(1500.0).accepts(1300.0, 200.0));
        assert!(!WeightLimit::Limited(1500.0).accepts(1400.0, 200.0));
    }

    #[test]
    fn test_weight_policy_default_is_strict() {
        assert_eq!(WeightPolicy::default(), WeightPolicy::Strict);
        assert!(WeightPolicy::Strict.enforces_ceiling());
        assert!(!WeightPolicy::SoftPreference.enforces_ceiling());
    }
}
