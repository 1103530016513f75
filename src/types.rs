//! 双陆棋核心类型定义
//!
//! 定义方向、原子转移、复合走法以及棋盘常量

use crate::dice::DiceValues;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 普通格数量
pub const BOARD_COLUMNS: usize = 24;
/// 每方棋子总数
pub const PIECES_PER_PLAYER: u8 = 15;
/// 遍历序中吧台（被击中的棋子）所在位置
pub const BAR_POSITION: usize = 0;
/// 遍历序中终点（已收子）所在位置
pub const HOME_POSITION: usize = BOARD_COLUMNS + 1;
/// 内盘（最后 6 格）的起始位置
pub const HOME_START: usize = HOME_POSITION - 6;

/// 行棋方向
///
/// `None` 是空格的归属，也是引擎第一次掷骰前的状态，从不作为行棋方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
    None,
}

impl Direction {
    /// 获取相反方向
    pub fn reverse(&self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
            Direction::None => Direction::None,
        }
    }

    pub fn sign(&self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
            Direction::None => 0,
        }
    }

    /// 从符号解析（布局中的正负号）
    pub fn from_sign(sign: i32) -> Direction {
        match sign.signum() {
            1 => Direction::Forward,
            -1 => Direction::Backward,
            _ => Direction::None,
        }
    }

    pub fn is_playing(&self) -> bool {
        *self != Direction::None
    }

    /// 遍历表下标；`None` 视同 Forward（快照使用的顺序）
    pub(crate) fn lane(&self) -> usize {
        match self {
            Direction::Backward => 1,
            Direction::Forward | Direction::None => 0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
            Direction::None => write!(f, "none"),
        }
    }
}

impl FromStr for Direction {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forward" | "fwd" | "f" | "+" => Ok(Direction::Forward),
            "backward" | "bwd" | "b" | "-" => Ok(Direction::Backward),
            other => Err(EngineError::MalformedInput(format!(
                "unknown direction: {}. Available: forward, backward",
                other
            ))),
        }
    }
}

/// 原子转移：一枚棋子用一个骰子点数走一步
///
/// 如果这一步击中了对方的孤子，`suspended` 记录被击棋子送往的吧台编号。
/// 这是执行、撤销与对外描述走法的基本单位。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Transition {
    pub source: String,
    pub target: String,
    pub die: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended: Option<String>,
}

impl Transition {
    pub fn new(source: impl Into<String>, target: impl Into<String>, die: u8) -> Self {
        Transition {
            source: source.into(),
            target: target.into(),
            die,
            suspended: None,
        }
    }

    pub fn with_hit(mut self, bar: impl Into<String>) -> Self {
        self.suspended = Some(bar.into());
        self
    }

    pub fn is_hit(&self) -> bool {
        self.suspended.is_some()
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}({})", self.source, self.target, self.die)?;
        if let Some(bar) = &self.suspended {
            write!(f, "*{}", bar)?;
        }
        Ok(())
    }
}

/// 复合走法：起点、终点以及消耗的骰子点数
///
/// 相等性按 (起点, 终点, 点数多重集) 判断，同样点数的两条路径对玩家来说没有区别。
/// 点数保留消耗顺序，执行时按该顺序逐步拆分。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move {
    pub source: String,
    pub target: String,
    pub dice: DiceValues,
}

impl Move {
    pub fn new(source: impl Into<String>, target: impl Into<String>, dice: DiceValues) -> Self {
        Move {
            source: source.into(),
            target: target.into(),
            dice,
        }
    }

    /// 消耗的骰子数
    pub fn dice_count(&self) -> usize {
        self.dice.len()
    }

    pub fn connects(&self, source: &str, target: &str) -> bool {
        self.source == source && self.target == target
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} {}", self.source, self.target, self.dice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_reverse_and_sign() {
        assert_eq!(Direction::Forward.reverse(), Direction::Backward);
        assert_eq!(Direction::Backward.reverse(), Direction::Forward);
        assert_eq!(Direction::None.reverse(), Direction::None);
        assert_eq!(Direction::from_sign(-3), Direction::Backward);
        assert_eq!(Direction::from_sign(0), Direction::None);
        assert_eq!(Direction::from_sign(Direction::Forward.sign()), Direction::Forward);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("Forward".parse::<Direction>().unwrap(), Direction::Forward);
        assert_eq!("b".parse::<Direction>().unwrap(), Direction::Backward);
        assert!("none".parse::<Direction>().is_err());
    }

    #[test]
    fn test_move_identity_ignores_die_order() {
        let a = Move::new("A", "J", DiceValues::new(vec![3, 6]).unwrap());
        let b = Move::new("A", "J", DiceValues::new(vec![6, 3]).unwrap());
        let c = Move::new("A", "J", DiceValues::new(vec![3, 3, 3]).unwrap());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_transition_display() {
        let t = Transition::new("A", "C", 2);
        assert_eq!(t.to_string(), "A-C(2)");
        assert_eq!(t.with_hit("SW").to_string(), "A-C(2)*SW");
    }
}
