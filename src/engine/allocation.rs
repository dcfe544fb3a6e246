// ==========================================
// 仓储库位分配系统 - 库位分配引擎
// ==========================================
// 职责: 在已过滤的候选库位集合内,为一件带重量的物品挑选最优库位
// 输入: 物品重量 + 候选库位快照 + 地面/货架选择标志
// 输出: 最优库位编码(或"无可用库位")
// 红线: 纯函数,无 I/O、无状态、无随机性;相同快照必须返回相同结果
// 红线: 引擎不拥有"是否走地面"的策略,由调用方决定
// ==========================================

mod scoring;

#[cfg(test)]
mod tests;

use crate::domain::location::{OccupancyCheck, StorageLocation};
use crate::domain::types::WeightPolicy;
use self::scoring::{distance_score, weight_score, SOFT_OVERLOAD_PENALTY};
use thiserror::Error;

// ==========================================
// 分配错误
// ==========================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocationError {
    /// 无可行候选库位;调用方可提示人工指定,不属于异常情况
    #[error("没有可用库位: require_ground={require_ground}, weight_kg={weight_kg}")]
    NoLocationAvailable {
        require_ground: bool,
        weight_kg: f64,
    },

    /// 重量非法(必须为正的有限值)
    #[error("无效重量: {0}")]
    InvalidWeight(f64),
}

// ==========================================
// AllocationEngine - 库位分配引擎
// ==========================================
pub struct AllocationEngine {
    policy: WeightPolicy,
}

impl AllocationEngine {
    /// 构造函数(默认硬承重约束)
    pub fn new() -> Self {
        Self {
            policy: WeightPolicy::Strict,
        }
    }

    /// 指定承重策略的构造函数
    pub fn with_policy(policy: WeightPolicy) -> Self {
        Self { policy }
    }

    /// 当前承重策略
    pub fn policy(&self) -> WeightPolicy {
        self.policy
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 为物品挑选最优库位
    ///
    /// 算法:
    /// 1) 按 require_ground 取地面/货架分区,空分区 -> NoLocationAvailable
    /// 2) 地面分区: 排除 is_ground_full,按 (堆放数, 距离分) 升序取第一个
    /// 3) 货架分区: 超承重的候选按策略排除(STRICT)或罚分(SOFT_PREFERENCE),
    ///    总分 = 距离分 + 承重分,取最小;同分按输入顺序取先出现者
    ///
    /// # 参数
    /// - `weight_kg`: 物品重量(千克),必须 > 0
    /// - `require_ground`: true 走地面层(超重/超限物品),false 走货架层
    /// - `candidates`: 候选库位(应已按可用性/核验过滤)
    ///
    /// # 返回
    /// - Ok(String): 选中的库位编码
    /// - Err(AllocationError): 无可用库位或重量非法
    pub fn allocate(
        &self,
        weight_kg: f64,
        require_ground: bool,
        candidates: &[StorageLocation],
    ) -> Result<String, AllocationError> {
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return Err(AllocationError::InvalidWeight(weight_kg));
        }

        if require_ground {
            self.pick_ground(weight_kg, candidates)
        } else {
            self.pick_rack(weight_kg, candidates)
        }
    }

    /// 地面层选择: 堆放数最少优先,距离次之
    fn pick_ground(
        &self,
        weight_kg: f64,
        candidates: &[StorageLocation],
    ) -> Result<String, AllocationError> {
        let mut best: Option<(usize, f64, &StorageLocation)> = None;

        for loc in candidates {
            if !loc.is_ground() || loc.is_ground_full {
                continue;
            }

            let key = (loc.stacked_items.len(), distance_score(loc.row, loc.bay_ordinal()));
            match &best {
                // 严格小于才替换,保证同分时先出现者胜出(稳定)
                Some((n, d, _)) if (key.0, key.1) >= (*n, *d) => {}
                _ => best = Some((key.0, key.1, loc)),
            }
        }

        best.map(|(_, _, loc)| loc.code.clone())
            .ok_or(AllocationError::NoLocationAvailable {
                require_ground: true,
                weight_kg,
            })
    }

    /// 货架层选择: 总分最小者胜出
    fn pick_rack(
        &self,
        weight_kg: f64,
        candidates: &[StorageLocation],
    ) -> Result<String, AllocationError> {
        let mut best: Option<(f64, &StorageLocation)> = None;

        for loc in candidates {
            if loc.is_ground() {
                continue;
            }

            let feasible = loc.can_accept_weight(weight_kg);
            let mut score = distance_score(loc.row, loc.bay_ordinal())
                + weight_score(weight_kg, loc.level);

            if !feasible {
                match self.policy {
                    // 硬约束: 超承重直接排除,不参与打分
                    WeightPolicy::Strict => continue,
                    // 软偏好: 保留但施加大额罚分,只有全员超限时才会被选中
                    WeightPolicy::SoftPreference => score += SOFT_OVERLOAD_PENALTY,
                }
            }

            match &best {
                Some((s, _)) if score >= *s => {}
                _ => best = Some((score, loc)),
            }
        }

        best.map(|(_, loc)| loc.code.clone())
            .ok_or(AllocationError::NoLocationAvailable {
                require_ground: false,
                weight_kg,
            })
    }
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self::new()
    }
}
