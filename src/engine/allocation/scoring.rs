// 打分函数集合
//
// 距离分: 排号为主序(每排 1000 分),巷道序号为次序,
//         单调对应行走距离,排序即"先近后远"
// 承重分: weight_kg * 层级,重物放高层受罚;地面层恒为 0

/// 同分之外的超限罚分(软偏好策略下使用)
///
/// 取值远大于任何正常 距离分+承重分 组合,保证"未超限者恒优于超限者"
pub(super) const SOFT_OVERLOAD_PENALTY: f64 = 1_000_000.0;

/// 距离分: (排号 - 1) * 1000 + 巷道序号
pub(super) fn distance_score(row: i32, bay_ordinal: i32) -> f64 {
    ((row - 1).max(0) as f64) * 1000.0 + bay_ordinal as f64
}

/// 承重分: 重量 * 层级(地面层 level=0 时恒为 0)
pub(super) fn weight_score(weight_kg: f64, level: i32) -> f64 {
    weight_kg * level.max(0) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_row_dominates_bay() {
        // 第1排最远巷道仍优于第2排最近巷道
        assert!(distance_score(1, 26) < distance_score(2, 1));
    }

    #[test]
    fn test_weight_score_ground_is_zero() {
        assert_eq!(weight_score(800.0, 0), 0.0);
        assert!(weight_score(800.0, 2) > weight_score(800.0, 1));
    }

    #[test]
    fn test_soft_penalty_dominates() {
        // 罚分必须压过任何正常分值组合
        let worst_normal = distance_score(100, 26) + weight_score(3000.0, 4);
        assert!(SOFT_OVERLOAD_PENALTY > worst_normal);
    }
}
