// ==========================================
// 库位分配引擎单元测试
// ==========================================

use super::*;
use crate::domain::types::RackType;

fn rack(code: &str, row: i32, bay: &str, level: i32, max_kg: f64, current_kg: f64) -> StorageLocation {
    StorageLocation {
        code: code.to_string(),
        row,
        bay: bay.to_string(),
        level,
        position: 1,
        rack_type: RackType::Standard,
        max_weight_kg: Some(max_kg),
        current_weight_kg: current_kg,
        available: true,
        verified: true,
        is_ground_full: false,
        stacked_items: Vec::new(),
        height_m: 2.0 * level as f64,
    }
}

fn ground(code: &str, row: i32, bay: &str, stacked: usize, full: bool) -> StorageLocation {
    StorageLocation {
        code: code.to_string(),
        row,
        bay: bay.to_string(),
        level: 0,
        position: 1,
        rack_type: RackType::Standard,
        max_weight_kg: None,
        current_weight_kg: 0.0,
        available: true,
        verified: true,
        is_ground_full: full,
        stacked_items: (0..stacked).map(|i| format!("S-{}", i)).collect(),
        height_m: 0.0,
    }
}

// 场景1: 承重不可行的库位被整体排除,而非仅罚分
#[test]
fn test_infeasible_rack_excluded() {
    let engine = AllocationEngine::new();
    let candidates = vec![
        rack("R1-A-1-2", 1, "A", 1, 1500.0, 1400.0), // 1400+200 > 1500, 不可行
        rack("R1-A-1-1", 1, "A", 1, 1500.0, 0.0),
    ];

    // R1-A-1-2 距离分更优(输入顺序在前),但超承重必须被排除
    let code = engine.allocate(200.0, false, &candidates).unwrap();
    assert_eq!(code, "R1-A-1-1");
}

// 场景2: 地面层按堆放数优先
#[test]
fn test_ground_prefers_fewer_stacked() {
    let engine = AllocationEngine::new();
    let candidates = vec![
        ground("R2-B-0-2", 2, "B", 2, false),
        ground("R2-B-0-1", 2, "B", 0, false),
    ];

    let code = engine.allocate(50.0, true, &candidates).unwrap();
    assert_eq!(code, "R2-B-0-1");
}

// 场景5: 所有货架层都放不下 -> 无可用库位
#[test]
fn test_no_feasible_rack_reports_unavailable() {
    let engine = AllocationEngine::new();
    let candidates = vec![
        rack("R1-A-1-1", 1, "A", 1, 1500.0, 0.0),
        rack("R1-A-1-2", 1, "A", 1, 1500.0, 1400.0),
    ];

    let err = engine.allocate(2000.0, false, &candidates).unwrap_err();
    assert_eq!(
        err,
        AllocationError::NoLocationAvailable {
            require_ground: false,
            weight_kg: 2000.0
        }
    );
}

// 地面层"已满"标志排除,而非承重排除
#[test]
fn test_ground_never_excluded_on_weight() {
    let engine = AllocationEngine::new();
    let candidates = vec![
        ground("R2-B-0-1", 2, "B", 0, true), // 已满
        ground("R2-B-0-2", 2, "B", 5, false),
    ];

    // 超大重量也能进入未满的地面库位
    let code = engine.allocate(50_000.0, true, &candidates).unwrap();
    assert_eq!(code, "R2-B-0-2");
}

// 距离打分: 排号为主序,巷道为次序
#[test]
fn test_rack_distance_row_major() {
    let engine = AllocationEngine::new();
    let candidates = vec![
        rack("R2-A-1-1", 2, "A", 1, 1500.0, 0.0),
        rack("R1-C-1-1", 1, "C", 1, 1500.0, 0.0),
        rack("R1-B-1-1", 1, "B", 1, 1500.0, 0.0),
    ];

    let code = engine.allocate(100.0, false, &candidates).unwrap();
    assert_eq!(code, "R1-B-1-1");
}

// 承重分: 同距离时轻层级优先(重物不上高层)
#[test]
fn test_weight_penalty_prefers_low_level() {
    let engine = AllocationEngine::new();
    let candidates = vec![
        rack("R1-A-2-1", 1, "A", 2, 1200.0, 0.0),
        rack("R1-A-1-1", 1, "A", 1, 1500.0, 0.0),
    ];

    let code = engine.allocate(500.0, false, &candidates).unwrap();
    assert_eq!(code, "R1-A-1-1");
}

// 确定性: 相同快照重复调用返回相同结果;同分取输入顺序在前者
#[test]
fn test_deterministic_and_stable_tiebreak() {
    let engine = AllocationEngine::new();
    // 两个完全同分的库位
    let candidates = vec![
        rack("R1-A-1-1", 1, "A", 1, 1500.0, 0.0),
        rack("R1-A-1-9", 1, "A", 1, 1500.0, 0.0),
    ];

    for _ in 0..10 {
        let code = engine.allocate(300.0, false, &candidates).unwrap();
        assert_eq!(code, "R1-A-1-1");
    }
}

// 软偏好策略: 超限候选保留但劣后;全员超限时仍可返回
#[test]
fn test_soft_preference_keeps_overloaded_candidates() {
    let engine = AllocationEngine::with_policy(WeightPolicy::SoftPreference);

    // 一个未超限 + 一个超限: 未超限者胜出
    let candidates = vec![
        rack("R1-A-1-2", 1, "A", 1, 1500.0, 1400.0),
        rack("R2-A-1-1", 2, "A", 1, 1500.0, 0.0),
    ];
    let code = engine.allocate(200.0, false, &candidates).unwrap();
    assert_eq!(code, "R2-A-1-1");

    // 全员超限: 硬约束报无库位,软偏好仍返回最优者
    let all_over = vec![rack("R1-A-1-2", 1, "A", 1, 1500.0, 1400.0)];
    assert!(AllocationEngine::new().allocate(200.0, false, &all_over).is_err());
    let code = engine.allocate(200.0, false, &all_over).unwrap();
    assert_eq!(code, "R1-A-1-2");
}

// 空分区 / 非法重量
#[test]
fn test_empty_partition_and_invalid_weight() {
    let engine = AllocationEngine::new();
    let only_rack = vec![rack("R1-A-1-1", 1, "A", 1, 1500.0, 0.0)];

    assert!(matches!(
        engine.allocate(50.0, true, &only_rack),
        Err(AllocationError::NoLocationAvailable { require_ground: true, .. })
    ));
    assert!(matches!(
        engine.allocate(0.0, false, &only_rack),
        Err(AllocationError::InvalidWeight(_))
    ));
    assert!(matches!(
        engine.allocate(f64::NAN, false, &only_rack),
        Err(AllocationError::InvalidWeight(_))
    ));
}
