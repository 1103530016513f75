//! 双陆棋测试局面库
//!
//! 提供命名的布局记谱，方便测试、基准和调试
//!
//! 记谱中正数为正向（Forward，从 A 出发，终点 CB）的棋子，负数为反向
//! （Backward，从 M 出发，终点 CW）的棋子。
//!
//! 命名规范:
//! - START: 初始局面
//! - BAR_*: 吧台入场
//! - FORCED_*: 强制用骰
//! - COLLECT_* / EXACT_*: 收子
//! - EXPAND_*: 局面展开

// =============================================================================
// 开局 (START)
// =============================================================================

/// 标准开局
pub const START: &str = "2,0,0,0,0,-5,0,-3,0,0,0,5/-2,0,0,0,0,5,0,3,0,0,0,-5 0:0 0:0";

// =============================================================================
// 吧台 (BAR)
// =============================================================================

/// 正向 1 枚在吧台，F、G 是己方格，A 被对方双子占住
pub const BAR_ENTRY: &str = "-2,2,2,2,2,2,4,-13,0,0,0,0/0,0,0,0,0,0,0,0,0,0,0,0 1:0 0:0";

/// 正向 1 枚在吧台，六个入场点全部被对方双子封死
pub const BAR_BLOCKED: &str = "-2,-2,-2,-2,-2,-2,4,-3,0,0,0,0/0,0,0,0,0,0,0,0,0,0,0,10 1:0 0:0";

/// 正向 2 枚在吧台，只有 C（对方孤子）能进
pub const ENTER_WITH_HIT: &str = "-2,-2,-1,-2,-2,-2,0,-2,0,0,0,0/3,-2,0,0,0,5,0,0,0,0,0,5 2:0 0:0";

// =============================================================================
// 强制用骰 (FORCED)
// =============================================================================

/// 内盘外只剩 A 一枚，6 必须由 A 走
pub const FORCED_MOVE: &str = "1,-2,-2,0,-2,-2,0,0,0,-2,0,0/0,0,0,1,0,0,0,0,0,0,0,0 0:0 13:5";

/// 只有 A 能把 6-3 两个骰子都用掉
pub const FORCED_COMPOSITE: &str = "3,0,0,0,0,0,-8,0,0,0,0,4/1,-2,-1,-2,0,3,-2,4,0,0,0,0 0:0 0:0";

/// A 和 L 都能把 6-3 两个骰子都用掉
pub const FORCED_COMPOSITE_TWO_COLUMNS: &str =
    "3,0,0,0,0,0,-9,0,0,0,0,4/1,-2,-1,0,0,3,-3,4,0,0,0,0 0:0 0:0";

/// T 还在内盘外，对子 3 不能收子
pub const COMPOSITE_NO_COLLECT: &str =
    "0,0,-3,-3,-2,-4,-3,0,0,0,0,0/0,5,2,1,3,3,0,1,0,0,0,0 0:0 0:0";

/// 反向：H 一枚在内盘外，6-4 可以不进终点
pub const UNFORCED_TO_HOME: &str = "-2,-2,-1,-2,-4,-3,0,-1,0,0,0,0/2,2,1,2,3,4,0,0,0,1,0,0 0:0 0:0";

// =============================================================================
// 收子 (COLLECT)
// =============================================================================

/// 正向全部在内盘，最远的 P 可以用大点收子
pub const COLLECT_WITH_HIGH: &str = "-4,-4,-4,-3,0,0,0,0,0,0,0,0/5,2,4,4,0,0,0,0,0,0,0,0 0:0 0:0";

/// 反向全部在内盘，E 最远，6 收子后还剩一个 2
pub const COLLECT_WITH_HIGH_BACKWARD: &str =
    "0,-1,-2,-2,-4,0,0,0,0,0,0,0/0,0,1,1,2,8,0,0,0,0,0,0 0:0 3:6";

/// 正向 T 先进内盘，再用另一个骰子收子
pub const MOVE_AND_COLLECT: &str = "-2,-2,0,-1,-1,-7,0,0,0,0,0,0/0,0,1,5,2,6,0,1,0,0,0,0 0:0 0:2";

/// 正向 S 进内盘后，N 可以用 2 收子
pub const NON_FORCED_WITH_COLLECT: &str =
    "-6,-2,-2,-2,-2,0,0,0,0,0,0,0/2,4,0,-1,3,5,1,0,0,0,0,0 0:0 0:0";

/// 正向 O 离终点正好 3 点，R 在后面
pub const EXACT_COLLECT: &str = "0,0,0,0,0,0,0,0,0,0,0,-15/0,0,1,0,0,4,0,0,0,0,0,0 0:0 10:0";

/// 正向 O 是最远的一枚，可以用大点越过终点
pub const EXACT_COLLECT_FARTHEST: &str =
    "0,0,0,0,0,0,0,0,0,0,0,-15/0,2,1,0,0,0,0,0,0,0,0,0 0:0 12:0";

/// 正向只剩 N、O 两枚，2 和 3 各收一枚获胜
pub const GAME_WON: &str = "-1,0,0,0,0,0,0,0,0,0,0,0/0,1,1,0,0,0,0,0,0,0,0,0 0:0 13:14";

// =============================================================================
// 局面展开 (EXPAND)
// =============================================================================

/// 双方各剩一枚，正向在 A
pub const EXPAND_SIMPLE: &str = "1,0,0,0,0,0,0,0,0,0,0,0/-1,0,0,0,0,0,0,0,0,0,0,0 0:0 14:14";

/// 反向 5 枚都在 A，正向一枚在 G
pub const EXPAND_TWO_LAYERS: &str = "-5,0,0,0,0,0,1,0,0,0,0,0/0,0,0,0,0,0,0,0,0,0,0,0 0:0 14:10";

/// 所有命名局面
pub const ALL_POSITIONS: &[(&str, &str)] = &[
    ("START", START),
    ("BAR_ENTRY", BAR_ENTRY),
    ("BAR_BLOCKED", BAR_BLOCKED),
    ("ENTER_WITH_HIT", ENTER_WITH_HIT),
    ("FORCED_MOVE", FORCED_MOVE),
    ("FORCED_COMPOSITE", FORCED_COMPOSITE),
    ("FORCED_COMPOSITE_TWO_COLUMNS", FORCED_COMPOSITE_TWO_COLUMNS),
    ("COMPOSITE_NO_COLLECT", COMPOSITE_NO_COLLECT),
    ("UNFORCED_TO_HOME", UNFORCED_TO_HOME),
    ("COLLECT_WITH_HIGH", COLLECT_WITH_HIGH),
    ("COLLECT_WITH_HIGH_BACKWARD", COLLECT_WITH_HIGH_BACKWARD),
    ("MOVE_AND_COLLECT", MOVE_AND_COLLECT),
    ("NON_FORCED_WITH_COLLECT", NON_FORCED_WITH_COLLECT),
    ("EXACT_COLLECT", EXACT_COLLECT),
    ("EXACT_COLLECT_FARTHEST", EXACT_COLLECT_FARTHEST),
    ("GAME_WON", GAME_WON),
    ("EXPAND_SIMPLE", EXPAND_SIMPLE),
    ("EXPAND_TWO_LAYERS", EXPAND_TWO_LAYERS),
];

/// 按名称查找局面（不区分大小写）
pub fn get_position(name: &str) -> Option<&'static str> {
    ALL_POSITIONS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, notation)| *notation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;
    use crate::types::Direction;

    #[test]
    fn test_all_positions_parse() {
        for (name, notation) in ALL_POSITIONS {
            let layout = notation.parse::<Layout>();
            assert!(layout.is_ok(), "{} failed: {:?}", name, layout.err());
            // 记谱与格式化输出一致
            assert_eq!(layout.unwrap().to_string(), *notation, "{}", name);
        }
    }

    #[test]
    fn test_full_piece_sets() {
        for (name, notation) in ALL_POSITIONS {
            let layout: Layout = notation.parse().unwrap();
            assert_eq!(layout.total(Direction::Forward), 15, "{}", name);
            assert_eq!(layout.total(Direction::Backward), 15, "{}", name);
        }
    }

    #[test]
    fn test_get_position() {
        assert_eq!(get_position("start"), Some(START));
        assert_eq!(get_position("GAME_WON"), Some(GAME_WON));
        assert_eq!(get_position("nope"), None);
    }
}
