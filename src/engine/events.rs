// ==========================================
// 仓储库位分配系统 - 引擎层事件发布
// ==========================================
// 职责: 定义出入库事件发布 trait,实现依赖倒置
// 说明: Engine 层定义 trait,读缓存失效/看板刷新等下游在外层实现适配器
// 红线: 事件发布失败只记日志,绝不影响已提交的事务
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;

// ==========================================
// 出入库事件类型
// ==========================================

/// 出入库事件触发类型
///
/// 下游典型消费者: 读穿缓存失效、看板读模型刷新
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageEventType {
    /// 物品上架
    ItemPlaced,
    /// 物品出库
    ItemPicked,
    /// 库位目录变更(新建/管理员编辑/删除)
    LocationDirectoryChanged,
}

impl StorageEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            StorageEventType::ItemPlaced => "ItemPlaced",
            StorageEventType::ItemPicked => "ItemPicked",
            StorageEventType::LocationDirectoryChanged => "LocationDirectoryChanged",
        }
    }
}

/// 出入库事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEvent {
    /// 事件类型
    pub event_type: StorageEventType,
    /// 涉及的物品扫描码(库位目录变更时为 None)
    pub system_code: Option<String>,
    /// 涉及的库位编码
    pub location_code: Option<String>,
    /// 事件来源描述
    pub source: Option<String>,
}

impl StorageEvent {
    /// 物品上架事件
    pub fn item_placed(system_code: String, location_code: String) -> Self {
        Self {
            event_type: StorageEventType::ItemPlaced,
            system_code: Some(system_code),
            location_code: Some(location_code),
            source: None,
        }
    }

    /// 物品出库事件
    pub fn item_picked(system_code: String, location_code: String) -> Self {
        Self {
            event_type: StorageEventType::ItemPicked,
            system_code: Some(system_code),
            location_code: Some(location_code),
            source: None,
        }
    }

    /// 库位目录变更事件
    pub fn directory_changed(location_code: Option<String>) -> Self {
        Self {
            event_type: StorageEventType::LocationDirectoryChanged,
            system_code: None,
            location_code,
            source: None,
        }
    }
}

// ==========================================
// 事件发布 trait
// ==========================================

/// 出入库事件发布接口
///
/// 实现方负责自己的重试/降级策略;核心层不做隐式重试
pub trait StorageEventPublisher: Send + Sync {
    fn publish(&self, event: StorageEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空实现: 用于测试环境或无下游消费者的部署
pub struct NoOpEventPublisher;

impl StorageEventPublisher for NoOpEventPublisher {
    fn publish(&self, _event: StorageEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_publisher() {
        let publisher = NoOpEventPublisher;
        let event = StorageEvent::item_placed("S-0001".into(), "R1-A-1-1".into());
        assert!(publisher.publish(event).is_ok());
    }

    #[test]
    fn test_event_type_as_str() {
        assert_eq!(StorageEventType::ItemPlaced.as_str(), "ItemPlaced");
        assert_eq!(StorageEventType::ItemPicked.as_str(), "ItemPicked");
    }
}
