//! 等级计算
//!
//! 从累计 XP 推导等级与升级进度的纯函数。等级必须在所有调用点
//! （事件记账、用户档案、排行榜）使用同一实现，否则会出现等级漂移，
//! 因此存储实现也统一调用本模块推导 `level` 列的写入值。
//!
//! 公式：`level = floor(sqrt(xp / 100)) + 1`
//!
//! | 等级 | 所需累计 XP |
//! |------|-------------|
//! | 1    | 0           |
//! | 2    | 100         |
//! | 3    | 400         |
//! | 4    | 900         |
//! | 5    | 1600        |

/// 从累计 XP 计算等级
///
/// 使用整数平方根避免浮点临界值问题；对 `floor(sqrt(x))` 而言
/// 先取整除 100 与先做浮点除法结果一致。
///
/// # Panics
///
/// XP 为负说明上游不变量已被破坏（XP 单调非减、从 0 起步），
/// 属于程序错误，直接断言而不是静默修正。
pub fn level_for_xp(xp: i64) -> i32 {
    assert!(xp >= 0, "XP 不可为负: {xp}");
    (xp / 100).isqrt() as i32 + 1
}

/// 达到 `level` 所需的累计 XP（等级区间下界）
pub fn xp_floor(level: i32) -> i64 {
    assert!(level >= 1, "等级从 1 起步: {level}");
    let l = (level - 1) as i64;
    l * l * 100
}

/// 达到 `level + 1` 所需的累计 XP（等级区间上界，不含）
pub fn xp_ceil(level: i32) -> i64 {
    assert!(level >= 1, "等级从 1 起步: {level}");
    let l = level as i64;
    l * l * 100
}

/// 当前等级内的进度百分比，钳制到 `[0, 100]`
pub fn progress_percent(xp: i64) -> f64 {
    let level = level_for_xp(xp);
    let floor = xp_floor(level);
    let ceil = xp_ceil(level);
    let progress = (xp - floor) as f64 / (ceil - floor) as f64 * 100.0;
    progress.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_thresholds() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(399), 2);
        assert_eq!(level_for_xp(400), 3);
        assert_eq!(level_for_xp(900), 4);
        assert_eq!(level_for_xp(1600), 5);
    }

    #[test]
    fn test_level_is_monotonic() {
        let mut prev = level_for_xp(0);
        for xp in 1..5_000 {
            let level = level_for_xp(xp);
            assert!(level >= prev, "等级在 xp={xp} 处回退");
            prev = level;
        }
    }

    #[test]
    fn test_floor_ceil_bracket_xp() {
        for xp in [0, 1, 99, 100, 101, 399, 400, 899, 900, 12_345] {
            let level = level_for_xp(xp);
            assert!(xp_floor(level) <= xp, "xp={xp} 低于所在等级下界");
            assert!(xp < xp_ceil(level), "xp={xp} 不低于所在等级上界");
        }
    }

    #[test]
    fn test_floor_and_ceil_are_adjacent() {
        for level in 1..50 {
            assert_eq!(xp_ceil(level), xp_floor(level + 1));
        }
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0), 0.0);
        assert_eq!(progress_percent(50), 50.0);
        // 等级 2 区间为 [100, 400)，150 处进度 1/6
        let progress = progress_percent(150);
        assert!((progress - 100.0 / 6.0).abs() < 1e-9);
        // 区间边界归零
        assert_eq!(progress_percent(100), 0.0);
        assert!(progress_percent(399) < 100.0);
    }

    #[test]
    #[should_panic(expected = "XP 不可为负")]
    fn test_negative_xp_panics() {
        level_for_xp(-1);
    }
}
