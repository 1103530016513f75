//! 骰子模型
//!
//! 掷骰结果规范化（大点在前），双骰展开为 4 个可用点数。
//! 随机性只存在于 [`DiceRoller`]，由调用方注入种子。

use crate::error::EngineError;
use lazy_static::lazy_static;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

pub const MIN_DIE: u8 = 1;
pub const MAX_DIE: u8 = 6;

lazy_static! {
    /// 所有 21 种不同的掷骰结果（15 种非对子 + 6 种对子）
    pub static ref ALL_DICE_ROLLS: Vec<DiceRoll> = {
        let mut rolls = Vec::with_capacity(21);
        for high in MIN_DIE..=MAX_DIE {
            for low in MIN_DIE..=high {
                rolls.push(DiceRoll { high, low });
            }
        }
        rolls
    };
}

fn check_die(value: u8) -> Result<u8, EngineError> {
    if (MIN_DIE..=MAX_DIE).contains(&value) {
        Ok(value)
    } else {
        Err(EngineError::MalformedInput(format!(
            "die value {} outside [{}, {}]",
            value, MIN_DIE, MAX_DIE
        )))
    }
}

/// 一次掷骰：两个 1..=6 的点数，大点在前
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DiceRoll {
    high: u8,
    low: u8,
}

impl DiceRoll {
    pub fn new(first: u8, second: u8) -> Result<Self, EngineError> {
        let first = check_die(first)?;
        let second = check_die(second)?;
        Ok(DiceRoll {
            high: first.max(second),
            low: first.min(second),
        })
    }

    /// 用给定随机源掷一次
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let first = rng.gen_range(MIN_DIE..=MAX_DIE);
        let second = rng.gen_range(MIN_DIE..=MAX_DIE);
        DiceRoll {
            high: first.max(second),
            low: first.min(second),
        }
    }

    pub fn high(&self) -> u8 {
        self.high
    }

    pub fn low(&self) -> u8 {
        self.low
    }

    pub fn is_double(&self) -> bool {
        self.high == self.low
    }

    pub fn is_simple(&self) -> bool {
        !self.is_double()
    }

    /// 可用点数：非对子 2 个，对子 4 个
    pub fn values(&self) -> Vec<u8> {
        if self.is_double() {
            vec![self.high; 4]
        } else {
            vec![self.high, self.low]
        }
    }

    /// 需要搜索的点数顺序：非对子两种顺序，对子一种
    pub fn orderings(&self) -> Vec<Vec<u8>> {
        if self.is_double() {
            vec![self.values()]
        } else {
            vec![vec![self.high, self.low], vec![self.low, self.high]]
        }
    }

    /// 骰子总点数
    pub fn pips(&self) -> u32 {
        self.values().iter().map(|&v| v as u32).sum()
    }
}

impl fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.high, self.low)
    }
}

impl FromStr for DiceRoll {
    type Err = EngineError;

    /// 接受 `6,5`、`6-5` 或 `65`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parts: Vec<&str> = if s.contains(',') {
            s.split(',').collect()
        } else if s.contains('-') {
            s.split('-').collect()
        } else {
            s.char_indices().map(|(i, c)| &s[i..i + c.len_utf8()]).collect()
        };
        if parts.len() != 2 {
            return Err(EngineError::MalformedInput(format!(
                "dice must be two values: {}",
                s
            )));
        }
        let parse = |p: &str| {
            p.trim()
                .parse::<u8>()
                .map_err(|_| EngineError::MalformedInput(format!("invalid die value: {}", p)))
        };
        DiceRoll::new(parse(parts[0])?, parse(parts[1])?)
    }
}

/// 一次走法消耗的点数（1 到 4 个），按消耗顺序保存
///
/// 比较与哈希按多重集进行：`[3, 6]` 与 `[6, 3]` 相等
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct DiceValues {
    values: Vec<u8>,
}

impl DiceValues {
    pub fn new(values: Vec<u8>) -> Result<Self, EngineError> {
        if values.is_empty() || values.len() > 4 {
            return Err(EngineError::MalformedInput(format!(
                "a move consumes between 1 and 4 dice, got {}",
                values.len()
            )));
        }
        for &v in &values {
            check_die(v)?;
        }
        Ok(DiceValues { values })
    }

    /// 内部使用：点数已由骰子保证合法
    pub(crate) fn from_prefix(values: &[u8]) -> Self {
        DiceValues {
            values: values.to_vec(),
        }
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: u8) -> bool {
        self.values.contains(&value)
    }

    fn sorted(&self) -> Vec<u8> {
        let mut sorted = self.values.clone();
        sorted.sort_unstable();
        sorted
    }
}

impl PartialEq for DiceValues {
    fn eq(&self, other: &Self) -> bool {
        self.sorted() == other.sorted()
    }
}

impl Eq for DiceValues {}

impl Hash for DiceValues {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sorted().hash(state);
    }
}

impl PartialOrd for DiceValues {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DiceValues {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sorted().cmp(&other.sorted())
    }
}

impl TryFrom<Vec<u8>> for DiceValues {
    type Error = EngineError;

    fn try_from(values: Vec<u8>) -> Result<Self, Self::Error> {
        DiceValues::new(values)
    }
}

impl From<DiceValues> for Vec<u8> {
    fn from(dice: DiceValues) -> Self {
        dice.values
    }
}

impl fmt::Display for DiceValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
        write!(f, "[{}]", parts.join(","))
    }
}

/// 可复现的骰子发生器
pub struct DiceRoller {
    rng: StdRng,
}

impl DiceRoller {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        DiceRoller { rng }
    }

    pub fn roll(&mut self) -> DiceRoll {
        DiceRoll::random(&mut self.rng)
    }

    /// 给需要额外随机选择的驱动程序使用（例如自对弈）
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_roll_is_normalized() {
        let roll = DiceRoll::new(2, 5).unwrap();
        assert_eq!(roll.high(), 5);
        assert_eq!(roll.low(), 2);
        assert_eq!(roll, DiceRoll::new(5, 2).unwrap());
        assert!(roll.is_simple());
        assert_eq!(roll.values(), vec![5, 2]);
        assert_eq!(roll.orderings(), vec![vec![5, 2], vec![2, 5]]);
    }

    #[test]
    fn test_double_expands_to_four() {
        let roll = DiceRoll::new(3, 3).unwrap();
        assert!(roll.is_double());
        assert_eq!(roll.values(), vec![3, 3, 3, 3]);
        assert_eq!(roll.orderings().len(), 1);
        assert_eq!(roll.pips(), 12);
    }

    #[test]
    fn test_out_of_range_dice_rejected() {
        assert!(matches!(
            DiceRoll::new(0, 3),
            Err(EngineError::MalformedInput(_))
        ));
        assert!(DiceRoll::new(7, 1).is_err());
        assert!(DiceValues::new(vec![]).is_err());
        assert!(DiceValues::new(vec![1, 1, 1, 1, 1]).is_err());
        assert!(DiceValues::new(vec![2, 9]).is_err());
    }

    #[test]
    fn test_parse_roll() {
        assert_eq!("6,5".parse::<DiceRoll>().unwrap(), DiceRoll::new(6, 5).unwrap());
        assert_eq!("3-4".parse::<DiceRoll>().unwrap(), DiceRoll::new(4, 3).unwrap());
        assert_eq!("11".parse::<DiceRoll>().unwrap(), DiceRoll::new(1, 1).unwrap());
        assert!("1,2,3".parse::<DiceRoll>().is_err());
        assert!("x,2".parse::<DiceRoll>().is_err());
    }

    #[test]
    fn test_all_rolls_are_distinct() {
        assert_eq!(ALL_DICE_ROLLS.len(), 21);
        let unique: HashSet<_> = ALL_DICE_ROLLS.iter().collect();
        assert_eq!(unique.len(), 21);
        assert_eq!(ALL_DICE_ROLLS.iter().filter(|r| r.is_double()).count(), 6);
    }

    #[test]
    fn test_seeded_roller_is_reproducible() {
        let mut a = DiceRoller::new(Some(7));
        let mut b = DiceRoller::new(Some(7));
        for _ in 0..50 {
            let roll = a.roll();
            assert_eq!(roll, b.roll());
            assert!((MIN_DIE..=MAX_DIE).contains(&roll.high()));
            assert!(roll.high() >= roll.low());
        }
    }

    #[test]
    fn test_dice_values_serde_round_trip() {
        let dice = DiceValues::new(vec![6, 3]).unwrap();
        let json = serde_json::to_string(&dice).unwrap();
        assert_eq!(json, "[6,3]");
        assert!(serde_json::from_str::<DiceValues>("[0]").is_err());
    }
}
