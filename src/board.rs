//! 双陆棋棋盘（格子序列）
//!
//! 28 个格子存放在一个数组里：24 个普通格（按正向顺序）、双方吧台、双方终点。
//! 每个方向有一张预先计算好的遍历表，位置 0 是该方向的吧台，位置 25 是该方向的终点，
//! 普通格在两个方向上互为倒序。按位置、按编号查询都是 O(1)。

use crate::error::{EngineError, EngineResult};
use crate::layout::{BoardTemplate, Layout, ROW_COLUMNS};
use crate::types::{Direction, Transition, BOARD_COLUMNS, HOME_POSITION, PIECES_PER_PLAYER};
use log::error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

const TOTAL_SLOTS: usize = BOARD_COLUMNS + 4;
const TRAVERSAL_LEN: usize = HOME_POSITION + 1;
/// 吧台在数组中的下标（按方向通道）
const BAR_SLOT: [usize; 2] = [BOARD_COLUMNS, BOARD_COLUMNS + 1];
/// 终点在数组中的下标（按方向通道）
const HOME_SLOT: [usize; 2] = [BOARD_COLUMNS + 2, BOARD_COLUMNS + 3];

/// 单个格子
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    id: String,
    pieces: u8,
    direction: Direction,
}

impl Column {
    pub fn new(id: impl Into<String>, pieces: u8, direction: Direction) -> Self {
        let direction = if pieces == 0 { Direction::None } else { direction };
        Column {
            id: id.into(),
            pieces,
            direction,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pieces(&self) -> u8 {
        self.pieces
    }

    /// 当前棋子的归属方向，空格为 `None`
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_empty(&self) -> bool {
        self.pieces == 0
    }

    /// 该方向能否落在此格：空格、己方格或对方孤子（击中）
    pub fn is_clear_for(&self, direction: Direction) -> bool {
        self.pieces <= 1 || self.direction == direction
    }

    pub fn add_piece(&mut self, direction: Direction) -> EngineResult<()> {
        if !direction.is_playing() {
            return Err(EngineError::IllegalMove(format!(
                "cannot add a piece without direction to {}",
                self.id
            )));
        }
        if self.pieces > 0 && self.direction != direction {
            return Err(EngineError::IllegalMove(format!(
                "column {} is held by {}",
                self.id, self.direction
            )));
        }
        self.direction = direction;
        self.pieces += 1;
        Ok(())
    }

    pub fn remove_piece(&mut self) -> EngineResult<()> {
        if self.pieces == 0 {
            return Err(EngineError::IllegalMove(format!(
                "column {} is empty",
                self.id
            )));
        }
        self.pieces -= 1;
        if self.pieces == 0 {
            self.direction = Direction::None;
        }
        Ok(())
    }

    fn set(&mut self, pieces: u8, direction: Direction) {
        self.pieces = pieces;
        self.direction = if pieces == 0 { Direction::None } else { direction };
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.direction.sign() * self.pieces as i32)
    }
}

/// 单格快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    pub pieces: u8,
    pub direction: Direction,
}

/// 棋盘快照：24 个普通格（正向顺序）加双方吧台与终点棋子数
///
/// 可作为集合键比较，也可序列化
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub columns: Vec<ColumnSnapshot>,
    pub bar: [u8; 2],
    pub home: [u8; 2],
}

impl BoardSnapshot {
    pub fn from_layout(layout: &Layout) -> Self {
        let columns = layout
            .forward_columns()
            .iter()
            .map(|&value| {
                let pieces = value.unsigned_abs();
                ColumnSnapshot {
                    pieces,
                    direction: if pieces == 0 {
                        Direction::None
                    } else {
                        Direction::from_sign(value as i32)
                    },
                }
            })
            .collect();
        BoardSnapshot {
            columns,
            bar: layout.bar,
            home: layout.home,
        }
    }

    pub fn to_layout(&self) -> EngineResult<Layout> {
        if self.columns.len() != BOARD_COLUMNS {
            return Err(EngineError::MalformedInput(format!(
                "snapshot needs {} columns, got {}",
                BOARD_COLUMNS,
                self.columns.len()
            )));
        }
        let mut rows = [[0i8; ROW_COLUMNS]; 2];
        for (index, column) in self.columns.iter().enumerate() {
            if column.pieces > PIECES_PER_PLAYER {
                return Err(EngineError::MalformedInput(format!(
                    "snapshot column {} holds {} pieces",
                    index, column.pieces
                )));
            }
            if column.pieces > 0 && !column.direction.is_playing() {
                return Err(EngineError::MalformedInput(format!(
                    "snapshot column {} holds pieces without direction",
                    index
                )));
            }
            let value = column.direction.sign() as i8 * column.pieces as i8;
            if index < ROW_COLUMNS {
                rows[0][index] = value;
            } else {
                rows[1][BOARD_COLUMNS - 1 - index] = value;
            }
        }
        let layout = Layout {
            rows,
            bar: self.bar,
            home: self.home,
        };
        layout.validate()?;
        Ok(layout)
    }

    pub fn collected(&self, direction: Direction) -> u8 {
        if direction.is_playing() {
            self.home[direction.lane()]
        } else {
            0
        }
    }

    /// 有一方已收满子
    pub fn is_game_over(&self) -> bool {
        self.home.iter().any(|&count| count == PIECES_PER_PLAYER)
    }
}

impl fmt::Display for BoardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_layout() {
            Ok(layout) => write!(f, "{}", layout),
            Err(_) => write!(f, "<invalid snapshot>"),
        }
    }
}

/// 棋盘：所有格子与两个方向的遍历表
#[derive(Debug, Clone)]
pub struct Board {
    columns: Vec<Column>,
    /// 位置 -> 数组下标
    traversal: [[usize; TRAVERSAL_LEN]; 2],
    /// 数组下标 -> 位置（不在该方向遍历中的为 None）
    positions: [[Option<usize>; TOTAL_SLOTS]; 2],
    by_id: HashMap<String, usize>,
    template: BoardTemplate,
}

impl Board {
    /// 按模板和布局创建棋盘
    pub fn from_layout(template: BoardTemplate, layout: &Layout) -> EngineResult<Board> {
        template.validate()?;
        layout.validate()?;
        Ok(Board::assemble(template, layout))
    }

    /// 从记谱创建（默认模板）
    pub fn from_notation(notation: &str) -> EngineResult<Board> {
        let layout: Layout = notation.parse()?;
        Board::from_layout(BoardTemplate::default(), &layout)
    }

    /// 标准开局
    pub fn standard(template: BoardTemplate) -> EngineResult<Board> {
        Board::from_layout(template, &Layout::starting())
    }

    fn assemble(template: BoardTemplate, layout: &Layout) -> Board {
        let mut columns: Vec<Column> = template
            .forward_ids()
            .into_iter()
            .map(|id| Column::new(id, 0, Direction::None))
            .collect();
        for direction in [Direction::Forward, Direction::Backward] {
            columns.push(Column::new(template.bar_id(direction), 0, Direction::None));
        }
        for direction in [Direction::Forward, Direction::Backward] {
            columns.push(Column::new(template.home_id(direction), 0, Direction::None));
        }

        let mut traversal = [[0usize; TRAVERSAL_LEN]; 2];
        let mut positions = [[None; TOTAL_SLOTS]; 2];
        for direction in [Direction::Forward, Direction::Backward] {
            let lane = direction.lane();
            traversal[lane][0] = BAR_SLOT[lane];
            traversal[lane][HOME_POSITION] = HOME_SLOT[lane];
            for position in 1..HOME_POSITION {
                traversal[lane][position] = match direction {
                    Direction::Backward => BOARD_COLUMNS - position,
                    _ => position - 1,
                };
            }
            for (position, &slot) in traversal[lane].iter().enumerate() {
                positions[lane][slot] = Some(position);
            }
        }

        let by_id = columns
            .iter()
            .enumerate()
            .map(|(slot, column)| (column.id.clone(), slot))
            .collect();

        let mut board = Board {
            columns,
            traversal,
            positions,
            by_id,
            template,
        };
        board.fill(layout);
        board
    }

    fn fill(&mut self, layout: &Layout) {
        for (slot, &value) in layout.forward_columns().iter().enumerate() {
            self.columns[slot].set(value.unsigned_abs(), Direction::from_sign(value as i32));
        }
        for direction in [Direction::Forward, Direction::Backward] {
            let lane = direction.lane();
            self.columns[BAR_SLOT[lane]].set(layout.bar[lane], direction);
            self.columns[HOME_SLOT[lane]].set(layout.home[lane], direction);
        }
    }

    /// 恢复标准开局，吧台与终点清空
    pub fn reset(&mut self) {
        self.fill(&Layout::starting());
    }

    pub fn template(&self) -> &BoardTemplate {
        &self.template
    }

    /// 按方向遍历序取格子
    pub fn column_at(&self, position: usize, direction: Direction) -> &Column {
        let position = position.min(HOME_POSITION);
        &self.columns[self.traversal[direction.lane()][position]]
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.by_id.get(id).map(|&slot| &self.columns[slot])
    }

    /// 格子在某方向遍历序中的位置；对方的吧台和终点不在其中
    pub fn position_of(&self, id: &str, direction: Direction) -> Option<usize> {
        self.by_id
            .get(id)
            .and_then(|&slot| self.positions[direction.lane()][slot])
    }

    pub fn bar(&self, direction: Direction) -> &Column {
        &self.columns[BAR_SLOT[direction.lane()]]
    }

    pub fn home(&self, direction: Direction) -> &Column {
        &self.columns[HOME_SLOT[direction.lane()]]
    }

    /// 位置 `position` 之前（不含）属于该方向的棋子数，含吧台
    pub fn pieces_before(&self, position: usize, direction: Direction) -> u32 {
        (0..position.min(TRAVERSAL_LEN))
            .map(|p| self.column_at(p, direction))
            .filter(|column| column.direction == direction)
            .map(|column| column.pieces as u32)
            .sum()
    }

    /// 该方向有棋子的位置（吧台与普通格，不含终点），按遍历顺序
    pub fn occupied_positions(&self, direction: Direction) -> Vec<usize> {
        (0..HOME_POSITION)
            .filter(|&p| self.column_at(p, direction).direction == direction)
            .collect()
    }

    /// 该方向全部棋子数（含吧台与终点）
    pub fn pieces_of(&self, direction: Direction) -> u32 {
        self.columns
            .iter()
            .filter(|column| column.direction == direction)
            .map(|column| column.pieces as u32)
            .sum()
    }

    pub fn is_game_complete(&self) -> bool {
        self.winning_direction().is_playing()
    }

    /// 已收满子的一方，没有则为 `None`
    pub fn winning_direction(&self) -> Direction {
        [Direction::Forward, Direction::Backward]
            .into_iter()
            .find(|&direction| self.home(direction).pieces == PIECES_PER_PLAYER)
            .unwrap_or(Direction::None)
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let columns = self.columns[..BOARD_COLUMNS]
            .iter()
            .map(|column| ColumnSnapshot {
                pieces: column.pieces,
                direction: column.direction,
            })
            .collect();
        let count =
            |slots: [usize; 2]| [self.columns[slots[0]].pieces, self.columns[slots[1]].pieces];
        BoardSnapshot {
            columns,
            bar: count(BAR_SLOT),
            home: count(HOME_SLOT),
        }
    }

    pub fn load_snapshot(&mut self, snapshot: &BoardSnapshot) -> EngineResult<()> {
        let layout = snapshot.to_layout()?;
        self.fill(&layout);
        Ok(())
    }

    pub fn to_layout(&self) -> Layout {
        let snapshot = self.snapshot();
        let mut rows = [[0i8; ROW_COLUMNS]; 2];
        for (index, column) in snapshot.columns.iter().enumerate() {
            let value = column.direction.sign() as i8 * column.pieces as i8;
            if index < ROW_COLUMNS {
                rows[0][index] = value;
            } else {
                rows[1][BOARD_COLUMNS - 1 - index] = value;
            }
        }
        Layout {
            rows,
            bar: snapshot.bar,
            home: snapshot.home,
        }
    }

    fn slot(&self, id: &str) -> EngineResult<usize> {
        self.by_id
            .get(id)
            .copied()
            .ok_or_else(|| EngineError::MalformedInput(format!("unknown column id: {}", id)))
    }

    /// 从 `from` 位置用一个点数走一步（越过终点时截到终点），返回记录了击中情况的转移
    pub fn hop(&mut self, from: usize, die: u8, direction: Direction) -> EngineResult<Transition> {
        let transition = self.plan_hop(from, die, direction);
        self.apply(&transition, direction)?;
        Ok(transition)
    }

    /// 只计算转移，不修改棋盘
    pub fn plan_hop(&self, from: usize, die: u8, direction: Direction) -> Transition {
        let target_position = (from + die as usize).min(HOME_POSITION);
        let source = self.column_at(from, direction);
        let target = self.column_at(target_position, direction);
        let transition = Transition::new(source.id.clone(), target.id.clone(), die);
        if target.direction == direction.reverse() && direction.is_playing() {
            transition.with_hit(self.bar(direction.reverse()).id.clone())
        } else {
            transition
        }
    }

    /// 执行一个原子转移，先校验后修改
    pub fn apply(&mut self, transition: &Transition, direction: Direction) -> EngineResult<()> {
        if !direction.is_playing() {
            return Err(EngineError::IllegalMove(
                "a transition needs a playing direction".to_string(),
            ));
        }
        let source = self.slot(&transition.source)?;
        let target = self.slot(&transition.target)?;
        let lane = direction.lane();
        match (self.positions[lane][source], self.positions[lane][target]) {
            (Some(from), Some(to)) if from < to && from != HOME_POSITION => {}
            _ => {
                return Err(EngineError::IllegalMove(format!(
                    "{} does not lead forward for {}",
                    transition, direction
                )))
            }
        }
        if self.columns[source].direction != direction {
            return Err(EngineError::IllegalMove(format!(
                "{} holds no {} piece",
                transition.source, direction
            )));
        }

        let opponent = direction.reverse();
        let target_column = &self.columns[target];
        match &transition.suspended {
            Some(bar_id) => {
                let bar = self.slot(bar_id)?;
                if bar != BAR_SLOT[opponent.lane()] {
                    return Err(EngineError::IllegalMove(format!(
                        "{} is not the {} bar",
                        bar_id, opponent
                    )));
                }
                if target_column.direction != opponent || target_column.pieces != 1 {
                    return Err(EngineError::IllegalMove(format!(
                        "no single {} piece to hit on {}",
                        opponent, transition.target
                    )));
                }
                self.columns[target].remove_piece()?;
                self.columns[bar].add_piece(opponent)?;
            }
            None => {
                if target_column.direction == opponent {
                    return Err(EngineError::IllegalMove(format!(
                        "{} is held by {}",
                        transition.target, opponent
                    )));
                }
            }
        }
        self.columns[source].remove_piece()?;
        self.columns[target].add_piece(direction)
    }

    /// 撤销一个原子转移（`apply` 的逆），击中的棋子从吧台放回原格
    pub fn undo(&mut self, transition: &Transition, direction: Direction) -> EngineResult<()> {
        let source = self.slot(&transition.source)?;
        let target = self.slot(&transition.target)?;
        let opponent = direction.reverse();

        let target_column = &self.columns[target];
        if target_column.direction != direction || !direction.is_playing() {
            return Err(EngineError::IllegalMove(format!(
                "cannot undo {}: no {} piece on {}",
                transition, direction, transition.target
            )));
        }
        let source_column = &self.columns[source];
        if source_column.pieces > 0 && source_column.direction != direction {
            return Err(EngineError::IllegalMove(format!(
                "cannot undo {}: {} is held by {}",
                transition, transition.source, source_column.direction
            )));
        }
        let bar = match &transition.suspended {
            Some(bar_id) => {
                let bar = self.slot(bar_id)?;
                if self.columns[bar].direction != opponent || target_column.pieces != 1 {
                    return Err(EngineError::IllegalMove(format!(
                        "cannot undo {}: hit piece is not on {}",
                        transition, bar_id
                    )));
                }
                Some(bar)
            }
            None => None,
        };

        self.columns[target].remove_piece()?;
        self.columns[source].add_piece(direction)?;
        if let Some(bar) = bar {
            self.columns[bar].remove_piece()?;
            self.columns[target].add_piece(opponent)?;
        }
        Ok(())
    }

    /// 依次执行一组转移；中途失败会撤销已执行的部分
    pub fn apply_all(
        &mut self,
        transitions: &[Transition],
        direction: Direction,
    ) -> EngineResult<()> {
        for (index, transition) in transitions.iter().enumerate() {
            if let Err(err) = self.apply(transition, direction) {
                self.undo_all(&transitions[..index], direction)?;
                return Err(err);
            }
        }
        Ok(())
    }

    /// 逆序撤销一组转移
    pub fn undo_all(
        &mut self,
        transitions: &[Transition],
        direction: Direction,
    ) -> EngineResult<()> {
        for transition in transitions.iter().rev() {
            self.undo(transition, direction)?;
        }
        Ok(())
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::assemble(BoardTemplate::default(), &Layout::starting())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_layout())
    }
}

/// 走了一步的棋盘，离开作用域时自动撤销
///
/// 回溯搜索用它保证每次修改都有配对的撤销，出错或 panic 时也一样
pub(crate) struct AppliedHop<'a> {
    board: &'a mut Board,
    transition: Transition,
    direction: Direction,
}

impl<'a> AppliedHop<'a> {
    pub(crate) fn new(
        board: &'a mut Board,
        from: usize,
        die: u8,
        direction: Direction,
    ) -> EngineResult<Self> {
        let transition = board.hop(from, die, direction)?;
        Ok(AppliedHop {
            board,
            transition,
            direction,
        })
    }

    pub(crate) fn board(&mut self) -> &mut Board {
        self.board
    }

    pub(crate) fn transition(&self) -> &Transition {
        &self.transition
    }
}

impl Drop for AppliedHop<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.board.undo(&self.transition, self.direction) {
            error!("failed to undo {}: {}", self.transition, err);
        }
    }
}
