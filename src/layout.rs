//! 棋盘布局与编号模板
//!
//! 布局由两行各 12 个带符号整数（绝对值 = 棋子数，符号 = 归属方向）
//! 加上双方吧台/终点的初始棋子数组成。
//!
//! 记谱格式：`<上排>/<下排> <吧台正向>:<吧台反向> <终点正向>:<终点反向>`
//!
//! 例如开局：`2,0,0,0,0,-5,0,-3,0,0,0,5/-2,0,0,0,0,5,0,3,0,0,0,-5 0:0 0:0`
//!
//! 上排对应正向位置 1..12，下排倒序对应正向位置 13..24。

use crate::error::{EngineError, EngineResult};
use crate::types::{Direction, BOARD_COLUMNS, PIECES_PER_PLAYER};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// 每排格数
pub const ROW_COLUMNS: usize = BOARD_COLUMNS / 2;

/// 标准开局（正向 2 枚在 A）
pub const STARTING_ROWS: [[i8; ROW_COLUMNS]; 2] = [
    [2, 0, 0, 0, 0, -5, 0, -3, 0, 0, 0, 5],
    [-2, 0, 0, 0, 0, 5, 0, 3, 0, 0, 0, -5],
];

lazy_static! {
    static ref DEFAULT_TEMPLATE: BoardTemplate = BoardTemplate {
        upper: "ABCDEFGHIJKL".chars().map(String::from).collect(),
        lower: "MNOPQRSTUVWX".chars().map(String::from).collect(),
        bar: ["SB".to_string(), "SW".to_string()],
        home: ["CB".to_string(), "CW".to_string()],
    };
}

/// 格子编号模板：24 个普通格 + 每方一个吧台和一个终点，共 28 个唯一编号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardTemplate {
    upper: Vec<String>,
    lower: Vec<String>,
    bar: [String; 2],
    home: [String; 2],
}

impl BoardTemplate {
    pub fn builder() -> BoardTemplateBuilder {
        BoardTemplateBuilder::default()
    }

    pub fn upper_row(&self) -> &[String] {
        &self.upper
    }

    pub fn lower_row(&self) -> &[String] {
        &self.lower
    }

    pub fn bar_id(&self, direction: Direction) -> &str {
        &self.bar[direction.lane()]
    }

    pub fn home_id(&self, direction: Direction) -> &str {
        &self.home[direction.lane()]
    }

    /// 普通格编号，按正向遍历顺序（上排正序，下排倒序）
    pub fn forward_ids(&self) -> Vec<String> {
        self.upper
            .iter()
            .chain(self.lower.iter().rev())
            .cloned()
            .collect()
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.upper.len() != ROW_COLUMNS || self.lower.len() != ROW_COLUMNS {
            return Err(EngineError::MalformedInput(format!(
                "template rows must hold {} ids each, got {} and {}",
                ROW_COLUMNS,
                self.upper.len(),
                self.lower.len()
            )));
        }
        let mut seen = HashSet::new();
        let all = self
            .upper
            .iter()
            .chain(self.lower.iter())
            .chain(self.bar.iter())
            .chain(self.home.iter());
        for id in all {
            if id.trim().is_empty() {
                return Err(EngineError::MalformedInput(
                    "template ids must not be blank".to_string(),
                ));
            }
            if !seen.insert(id.as_str()) {
                return Err(EngineError::MalformedInput(format!(
                    "duplicate column id in template: {}",
                    id
                )));
            }
        }
        Ok(())
    }
}

impl Default for BoardTemplate {
    fn default() -> Self {
        DEFAULT_TEMPLATE.clone()
    }
}

/// 模板构建器，`build` 时校验
#[derive(Debug, Default, Clone)]
pub struct BoardTemplateBuilder {
    upper: Vec<String>,
    lower: Vec<String>,
    bar: [Option<String>; 2],
    home: [Option<String>; 2],
}

impl BoardTemplateBuilder {
    pub fn upper_row<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.upper = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn lower_row<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lower = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn bar(mut self, direction: Direction, id: impl Into<String>) -> Self {
        self.bar[direction.lane()] = Some(id.into());
        self
    }

    pub fn home(mut self, direction: Direction, id: impl Into<String>) -> Self {
        self.home[direction.lane()] = Some(id.into());
        self
    }

    pub fn build(self) -> EngineResult<BoardTemplate> {
        let missing = |name: &str| {
            EngineError::MalformedInput(format!("template is missing the {} id", name))
        };
        let [bar_forward, bar_backward] = self.bar;
        let [home_forward, home_backward] = self.home;
        let template = BoardTemplate {
            upper: self.upper,
            lower: self.lower,
            bar: [
                bar_forward.ok_or_else(|| missing("forward bar"))?,
                bar_backward.ok_or_else(|| missing("backward bar"))?,
            ],
            home: [
                home_forward.ok_or_else(|| missing("forward home"))?,
                home_backward.ok_or_else(|| missing("backward home"))?,
            ],
        };
        template.validate()?;
        Ok(template)
    }
}

/// 棋盘布局（构造输入）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Layout {
    pub rows: [[i8; ROW_COLUMNS]; 2],
    /// 吧台棋子数，下标为方向通道（0 = 正向，1 = 反向）
    pub bar: [u8; 2],
    /// 终点棋子数
    pub home: [u8; 2],
}

impl Layout {
    pub fn new(rows: [[i8; ROW_COLUMNS]; 2]) -> Self {
        Layout {
            rows,
            bar: [0, 0],
            home: [0, 0],
        }
    }

    pub fn with_counts(
        rows: [[i8; ROW_COLUMNS]; 2],
        bar_forward: u8,
        bar_backward: u8,
        home_forward: u8,
        home_backward: u8,
    ) -> Self {
        Layout {
            rows,
            bar: [bar_forward, bar_backward],
            home: [home_forward, home_backward],
        }
    }

    /// 标准开局
    pub fn starting() -> Self {
        Layout::new(STARTING_ROWS)
    }

    /// 从任意形状的行数据构造，校验形状与取值
    pub fn from_rows(rows: &[Vec<i32>]) -> EngineResult<Self> {
        if rows.len() != 2 {
            return Err(EngineError::MalformedInput(format!(
                "layout needs 2 rows, got {}",
                rows.len()
            )));
        }
        let mut parsed = [[0i8; ROW_COLUMNS]; 2];
        for (row, values) in rows.iter().enumerate() {
            if values.len() != ROW_COLUMNS {
                return Err(EngineError::MalformedInput(format!(
                    "layout row {} needs {} values, got {}",
                    row,
                    ROW_COLUMNS,
                    values.len()
                )));
            }
            for (index, &value) in values.iter().enumerate() {
                parsed[row][index] = checked_count(value)?;
            }
        }
        let layout = Layout::new(parsed);
        layout.validate()?;
        Ok(layout)
    }

    /// 24 个普通格的带符号棋子数，按正向遍历顺序
    pub fn forward_columns(&self) -> [i8; BOARD_COLUMNS] {
        let mut columns = [0i8; BOARD_COLUMNS];
        for (index, &value) in self.rows[0].iter().enumerate() {
            columns[index] = value;
        }
        for (index, &value) in self.rows[1].iter().rev().enumerate() {
            columns[ROW_COLUMNS + index] = value;
        }
        columns
    }

    /// 某方在布局中的棋子总数（含吧台与终点）
    pub fn total(&self, direction: Direction) -> u32 {
        if !direction.is_playing() {
            return 0;
        }
        let on_board: u32 = self
            .rows
            .iter()
            .flatten()
            .filter(|&&v| Direction::from_sign(v as i32) == direction)
            .map(|&v| v.unsigned_abs() as u32)
            .sum();
        on_board + self.bar[direction.lane()] as u32 + self.home[direction.lane()] as u32
    }

    pub fn validate(&self) -> EngineResult<()> {
        for direction in [Direction::Forward, Direction::Backward] {
            let total = self.total(direction);
            if total > PIECES_PER_PLAYER as u32 {
                return Err(EngineError::MalformedInput(format!(
                    "{} has {} pieces, at most {} allowed",
                    direction, total, PIECES_PER_PLAYER
                )));
            }
        }
        Ok(())
    }
}

impl Default for Layout {
    fn default() -> Self {
        Layout::starting()
    }
}

fn checked_count(value: i32) -> EngineResult<i8> {
    if value.unsigned_abs() > PIECES_PER_PLAYER as u32 {
        return Err(EngineError::MalformedInput(format!(
            "column count {} out of range",
            value
        )));
    }
    Ok(value as i8)
}

fn parse_row(text: &str) -> EngineResult<[i8; ROW_COLUMNS]> {
    let values: Vec<&str> = text.split(',').collect();
    if values.len() != ROW_COLUMNS {
        return Err(EngineError::MalformedInput(format!(
            "layout row needs {} values, got {}: {}",
            ROW_COLUMNS,
            values.len(),
            text
        )));
    }
    let mut row = [0i8; ROW_COLUMNS];
    for (index, value) in values.iter().enumerate() {
        let parsed = value
            .trim()
            .parse::<i32>()
            .map_err(|_| EngineError::MalformedInput(format!("invalid column count: {}", value)))?;
        row[index] = checked_count(parsed)?;
    }
    Ok(row)
}

fn parse_pair(text: &str) -> EngineResult<[u8; 2]> {
    let (forward, backward) = text
        .split_once(':')
        .ok_or_else(|| {
            EngineError::MalformedInput(format!("expected <forward>:<backward>, got {}", text))
        })?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u8>()
            .map_err(|_| EngineError::MalformedInput(format!("invalid piece count: {}", v)))
    };
    Ok([parse(forward)?, parse(backward)?])
}

impl FromStr for Layout {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(EngineError::MalformedInput(format!(
                "layout notation needs rows and optional bar/home counts: {}",
                s
            )));
        }

        let (upper, lower) = parts[0]
            .split_once('/')
            .ok_or_else(|| {
                EngineError::MalformedInput(format!(
                    "layout rows must be split by '/': {}",
                    parts[0]
                ))
            })?;

        let bar = match parts.get(1) {
            Some(text) => parse_pair(text)?,
            None => [0, 0],
        };
        let home = match parts.get(2) {
            Some(text) => parse_pair(text)?,
            None => [0, 0],
        };

        let layout = Layout {
            rows: [parse_row(upper)?, parse_row(lower)?],
            bar,
            home,
        };
        layout.validate()?;
        Ok(layout)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row = |values: &[i8; ROW_COLUMNS]| {
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };
        write!(
            f,
            "{}/{} {}:{} {}:{}",
            row(&self.rows[0]),
            row(&self.rows[1]),
            self.bar[0],
            self.bar[1],
            self.home[0],
            self.home[1]
        )
    }
}
