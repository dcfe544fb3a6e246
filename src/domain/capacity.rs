// ==========================================
// 仓储库位分配系统 - 承重模型
// ==========================================
// 职责: (层级, 货架类型) -> 承重上限 / 物理高度 的纯查表
// 红线: 地面层(level=0)永远无承重上限,高度为0
// 红线: 未知货架类型/层级必须返回 ConfigurationError,不允许宽松默认
// 红线: 纯函数,不访问任何存储,供分配引擎在内存中直接打分
// ==========================================

use crate::domain::types::{RackType, WeightLimit};
use thiserror::Error;

/// 地面层层级编号
pub const GROUND_LEVEL: i32 = 0;

// ==========================================
// 配置错误
// ==========================================

/// 承重模型配置错误
///
/// 调用方不应自动重试,属于致命配置问题
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("未知货架类型: {0}")]
    UnknownRackType(String),

    #[error("货架类型 {rack_type} 不存在层级 {level}")]
    UnknownLevel { rack_type: RackType, level: i32 },
}

// ==========================================
// 承重/高度查表
// ==========================================

/// 每种货架类型的层级承重表(千克),下标 = level - 1
fn ceiling_table(rack_type: RackType) -> &'static [f64] {
    match rack_type {
        RackType::Standard => &[1500.0, 1200.0, 1000.0, 800.0],
        RackType::HeavyDuty => &[3000.0, 2500.0, 2000.0],
        RackType::Cantilever => &[1200.0, 900.0],
    }
}

/// 每种货架类型的单层高度(米)
fn level_pitch_m(rack_type: RackType) -> f64 {
    match rack_type {
        RackType::Standard => 2.0,
        RackType::HeavyDuty => 2.5,
        RackType::Cantilever => 2.2,
    }
}

/// 货架类型的最大层级编号(不含地面层)
pub fn max_level_for(rack_type: RackType) -> i32 {
    ceiling_table(rack_type).len() as i32
}

/// 查询层级承重上限
///
/// # 参数
/// - rack_type: 货架类型
/// - level: 层级编号(0 = 地面层)
///
/// # 返回
/// - Ok(WeightLimit::Unlimited): 地面层
/// - Ok(WeightLimit::Limited(kg)): 货架层上限
/// - Err(ConfigurationError): 层级不在该货架类型的配置表内
pub fn max_weight_for(rack_type: RackType, level: i32) -> Result<WeightLimit, ConfigurationError> {
    if level == GROUND_LEVEL {
        return Ok(WeightLimit::Unlimited);
    }

    let table = ceiling_table(rack_type);
    if level < GROUND_LEVEL || level as usize > table.len() {
        return Err(ConfigurationError::UnknownLevel { rack_type, level });
    }

    Ok(WeightLimit::Limited(table[(level - 1) as usize]))
}

/// 查询层级物理高度(米)
///
/// 地面层高度恒为 0
pub fn height_for(rack_type: RackType, level: i32) -> Result<f64, ConfigurationError> {
    if level == GROUND_LEVEL {
        return Ok(0.0);
    }

    let table = ceiling_table(rack_type);
    if level < GROUND_LEVEL || level as usize > table.len() {
        return Err(ConfigurationError::UnknownLevel { rack_type, level });
    }

    Ok(level_pitch_m(rack_type) * level as f64)
}

/// 从字符串解析货架类型(未知类型返回 ConfigurationError)
pub fn parse_rack_type(s: &str) -> Result<RackType, ConfigurationError> {
    RackType::parse(s).ok_or_else(|| ConfigurationError::UnknownRackType(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_level_unlimited() {
        for rt in [RackType::Standard, RackType::HeavyDuty, RackType::Cantilever] {
            assert_eq!(max_weight_for(rt, GROUND_LEVEL), Ok(WeightLimit::Unlimited));
            assert_eq!(height_for(rt, GROUND_LEVEL), Ok(0.0));
        }
    }

    #[test]
    fn test_rack_level_ceilings() {
        assert_eq!(
            max_weight_for(RackType::Standard, 1),
            Ok(WeightLimit::Limited(1500.0))
        );
        assert_eq!(
            max_weight_for(RackType::Standard, 4),
            Ok(WeightLimit::Limited(800.0))
        );
        assert_eq!(
            max_weight_for(RackType::HeavyDuty, 3),
            Ok(WeightLimit::Limited(2000.0))
        );
    }

    #[test]
    fn test_unknown_level_is_configuration_error() {
        assert!(max_weight_for(RackType::Standard, 5).is_err());
        assert!(max_weight_for(RackType::Cantilever, 3).is_err());
        assert!(max_weight_for(RackType::Standard, -1).is_err());
        assert!(height_for(RackType::HeavyDuty, 4).is_err());
    }

    #[test]
    fn test_height_scales_with_level() {
        assert_eq!(height_for(RackType::Standard, 2), Ok(4.0));
        assert_eq!(height_for(RackType::HeavyDuty, 1), Ok(2.5));
    }

    #[test]
    fn test_parse_rack_type_rejects_unknown() {
        assert_eq!(parse_rack_type("STANDARD"), Ok(RackType::Standard));
        match parse_rack_type("MEZZANINE") {
            Err(ConfigurationError::UnknownRackType(s)) => assert_eq!(s, "MEZZANINE"),
            other => panic!("期望 UnknownRackType, 实际 {:?}", other),
        }
    }
}
