// ==========================================
// 仓储库位分配系统 - API 层
// ==========================================
// 职责: 面向调用方的业务接口(扫描工位/收发货工作流)
// 红线: 只返回结构化错误值,用户可见行为由外围应用负责
// ==========================================

pub mod error;
pub mod location_api;
pub mod stock_api;

pub use error::{ApiError, ApiResult};
pub use location_api::{LocationApi, ProvisionRequest, ProvisionResult};
pub use stock_api::{RegisterItemRequest, StockApi};
