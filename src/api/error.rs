// ==========================================
// 仓储库位分配系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型,转换 Repository/Engine 错误为用户友好的错误消息
// 红线: 结构化错误值,绝不向调用方抛原始技术异常
// ==========================================

use crate::domain::capacity::ConfigurationError;
use crate::engine::allocation::AllocationError;
use crate::engine::lifecycle::LifecycleError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
///
/// 错误分类决定调用方的处理方式:
/// - ConfigurationError / InvalidTransition: 确定性错误,禁止自动重试
/// - NoLocationAvailable: 正常业务结果,提示人工指定
/// - CapacityExceeded / LocationUnavailable: 可刷新候选集后重试
/// - Database*: 瞬态错误,重试策略由调用方决定(核心层不做隐式重试)
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 配置错误(致命,不重试)
    // ==========================================
    #[error("配置错误: {0}")]
    ConfigurationError(String),

    // ==========================================
    // 分配结果
    // ==========================================
    #[error("没有可用库位: require_ground={require_ground}, weight_kg={weight_kg}")]
    NoLocationAvailable {
        require_ground: bool,
        weight_kg: f64,
    },

    // ==========================================
    // 生命周期错误
    // ==========================================
    #[error("无效的状态转换: system_code={system_code}, from={from}, to={to}")]
    InvalidTransition {
        system_code: String,
        from: String,
        to: String,
    },

    // ==========================================
    // 提交期并发/容量错误
    // ==========================================
    #[error("承重超限: code={code}, attempted_kg={attempted_kg}, max_weight_kg={max_weight_kg}")]
    CapacityExceeded {
        code: String,
        attempted_kg: f64,
        max_weight_kg: f64,
    },

    #[error("库位不可用: {0}")]
    LocationUnavailable(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::CapacityExceeded {
                code,
                attempted_kg,
                max_weight_kg,
            } => ApiError::CapacityExceeded {
                code,
                attempted_kg,
                max_weight_kg,
            },
            RepositoryError::InvalidStateTransition {
                system_code,
                from,
                to,
            } => ApiError::InvalidTransition {
                system_code,
                from,
                to,
            },
            RepositoryError::LocationUnavailable { code, reason } => {
                ApiError::LocationUnavailable(format!("{} (code={})", reason, code))
            }

            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从引擎层错误转换
// ==========================================

impl From<AllocationError> for ApiError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::NoLocationAvailable {
                require_ground,
                weight_kg,
            } => ApiError::NoLocationAvailable {
                require_ground,
                weight_kg,
            },
            AllocationError::InvalidWeight(w) => {
                ApiError::InvalidInput(format!("无效重量: {}", w))
            }
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::InvalidTransition {
                system_code,
                from,
                to,
            } => ApiError::InvalidTransition {
                system_code,
                from: from.to_string(),
                to: to.to_string(),
            },
            LifecycleError::MissingLocation(system_code) => {
                ApiError::LocationUnavailable(format!("物品缺少库位记录: {}", system_code))
            }
            LifecycleError::InvalidWeight {
                system_code,
                weight_kg,
            } => ApiError::InvalidInput(format!(
                "物品重量非法: system_code={}, weight_kg={}",
                system_code, weight_kg
            )),
        }
    }
}

impl From<ConfigurationError> for ApiError {
    fn from(err: ConfigurationError) -> Self {
        ApiError::ConfigurationError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::CapacityExceeded {
            code: "R1-A-1-1".to_string(),
            attempted_kg: 1600.0,
            max_weight_kg: 1500.0,
        };
        match ApiError::from(repo_err) {
            ApiError::CapacityExceeded {
                code, attempted_kg, ..
            } => {
                assert_eq!(code, "R1-A-1-1");
                assert_eq!(attempted_kg, 1600.0);
            }
            other => panic!("期望 CapacityExceeded, 实际 {:?}", other),
        }

        let repo_err = RepositoryError::NotFound {
            entity: "StockItem".to_string(),
            id: "S-0001".to_string(),
        };
        match ApiError::from(repo_err) {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("StockItem"));
                assert!(msg.contains("S-0001"));
            }
            other => panic!("期望 NotFound, 实际 {:?}", other),
        }
    }

    #[test]
    fn test_allocation_error_conversion() {
        let err = AllocationError::NoLocationAvailable {
            require_ground: false,
            weight_kg: 2000.0,
        };
        assert!(matches!(
            ApiError::from(err),
            ApiError::NoLocationAvailable { require_ground: false, .. }
        ));
    }
}
