// ==========================================
// 库位分配流程集成测试
// ==========================================
// 测试目标: 验证 建库 → 分配 → 上架 后分配结果随占用变化的完整闭环
// ==========================================

mod test_helpers;

use warehouse_slotting::api::ApiError;
use warehouse_slotting::config::{ConfigManager, KEY_WEIGHT_POLICY};
use warehouse_slotting::logging;
use warehouse_slotting::AppState;

// ==========================================
// 货架层分配
// ==========================================

#[test]
fn test_allocate_prefers_near_and_low() {
    logging::init_test();

    let env = test_helpers::create_test_env().expect("测试环境创建失败");
    let created = test_helpers::provision_standard_grid(&env).expect("建库失败");
    assert!(created > 0, "应该有新建库位");

    // 空仓库: 最近的排/巷 + 最低货架层胜出
    let code = env.state.stock_api.allocate(500.0, false).expect("分配失败");
    assert_eq!(code, "R1-A-1-1");
}

#[test]
fn test_allocation_reacts_to_occupancy() {
    logging::init_test();

    let env = test_helpers::create_test_env().expect("测试环境创建失败");
    test_helpers::provision_standard_grid(&env).expect("建库失败");

    // 先把 1200kg 放进最优库位 R1-A-1-1 (1层上限 1500kg)
    test_helpers::register_item(&env, "S-1001", 1200.0).expect("登记失败");
    env.state
        .stock_api
        .place("S-1001", "R1-A-1-1", "张三", None, None)
        .expect("上架失败");

    // 再分配 500kg: R1-A-1-1 剩余 300kg 不可行,同巷同层下一位胜出
    let code = env.state.stock_api.allocate(500.0, false).expect("分配失败");
    assert_eq!(code, "R1-A-1-2");
}

#[test]
fn test_allocate_rejects_invalid_weight() {
    let env = test_helpers::create_test_env().expect("测试环境创建失败");
    test_helpers::provision_standard_grid(&env).expect("建库失败");

    assert!(matches!(
        env.state.stock_api.allocate(0.0, false),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        env.state.stock_api.allocate(-10.0, false),
        Err(ApiError::InvalidInput(_))
    ));
}

#[test]
fn test_no_rack_can_take_overweight_item() {
    let env = test_helpers::create_test_env().expect("测试环境创建失败");
    test_helpers::provision_standard_grid(&env).expect("建库失败");

    // 2000kg 超过标准货架 1 层上限 1500kg,STRICT 策略下无可行货架
    match env.state.stock_api.allocate(2000.0, false) {
        Err(ApiError::NoLocationAvailable {
            require_ground,
            weight_kg,
        }) => {
            assert!(!require_ground);
            assert_eq!(weight_kg, 2000.0);
        }
        other => panic!("期望 NoLocationAvailable, 实际 {:?}", other),
    }
}

// ==========================================
// 地面层分配
// ==========================================

#[test]
fn test_ground_accepts_any_weight_and_prefers_fewer_stacked() {
    logging::init_test();

    let env = test_helpers::create_test_env().expect("测试环境创建失败");
    test_helpers::provision_standard_grid(&env).expect("建库失败");

    // 地面层不设承重上限: 2000kg 正常分配
    let code = env.state.stock_api.allocate(2000.0, true).expect("分配失败");
    assert_eq!(code, "R1-A-0-1");

    // 放入一件后,空地面位(堆放数 0)优先于已有堆放的库位
    test_helpers::register_item(&env, "S-2001", 2000.0).expect("登记失败");
    env.state
        .stock_api
        .place("S-2001", "R1-A-0-1", "张三", None, None)
        .expect("上架失败");

    let code = env.state.stock_api.allocate(1800.0, true).expect("分配失败");
    assert_eq!(code, "R1-A-0-2");
}

#[test]
fn test_ground_full_flag_excludes_location() {
    let env = test_helpers::create_test_env().expect("测试环境创建失败");
    test_helpers::provision_standard_grid(&env).expect("建库失败");

    env.state
        .location_api
        .set_ground_full("R1-A-0-1", true)
        .expect("设置已满标志失败");

    let code = env.state.stock_api.allocate(2000.0, true).expect("分配失败");
    assert_ne!(code, "R1-A-0-1");
    assert_eq!(code, "R1-A-0-2");
}

// ==========================================
// 承重策略
// ==========================================

#[test]
fn test_soft_preference_allows_overload() {
    logging::init_test();

    let (_temp_file, db_path) = test_helpers::create_test_db().expect("测试数据库创建失败");

    // 在启动前写入软偏好策略配置
    let config = ConfigManager::new(&db_path).expect("配置管理器创建失败");
    config.init_schema().expect("配置表初始化失败");
    config
        .set_global_config_value(KEY_WEIGHT_POLICY, "SOFT_PREFERENCE")
        .expect("配置写入失败");

    let state = AppState::new(db_path, None).expect("AppState 创建失败");
    state
        .location_api
        .provision_locations(test_helpers::standard_grid_request())
        .expect("建库失败");

    // 1600kg 对所有标准货架层都超限,软偏好策略仍给出最优库位
    let code = state.stock_api.allocate(1600.0, false).expect("分配失败");
    assert_eq!(code, "R1-A-1-1");

    // 提交时不强制上限,越限放行
    state
        .stock_api
        .register_item(warehouse_slotting::api::RegisterItemRequest {
            system_code: "S-3001".to_string(),
            item_code: "I-S-3001".to_string(),
            description: None,
            category: None,
            weight_kg: 1600.0,
        })
        .expect("登记失败");
    state
        .stock_api
        .place("S-3001", "R1-A-1-1", "张三", None, None)
        .expect("软偏好策略下上架应该成功");

    let location = state.location_api.get_location("R1-A-1-1").expect("查询失败");
    assert_eq!(location.current_weight_kg, 1600.0);
    assert!(location.current_weight_kg > location.max_weight_kg.unwrap());
}
