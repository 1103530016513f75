//! 整回合序列预测
//!
//! 深度优先回溯：在同一块棋盘上原地走子、递归、撤销，
//! 穷举所有骰子顺序下的走法序列，只保留用骰最多的序列。

use crate::board::{AppliedHop, Board, BoardSnapshot};
use crate::dice::DiceRoll;
use crate::error::EngineResult;
use crate::types::{Direction, Transition, BAR_POSITION, HOME_POSITION, HOME_START};
use log::trace;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// 序列 -> 走完后的棋盘
pub type Predictions = BTreeMap<Vec<Transition>, BoardSnapshot>;

/// 从 `from` 用点数 `die` 走一步是否合法（不修改棋盘）
pub fn can_hop(board: &Board, from: usize, die: u8, direction: Direction) -> bool {
    if board.column_at(from, direction).direction() != direction || !direction.is_playing() {
        return false;
    }
    let target = from + die as usize;
    let clear = |position: usize| board.column_at(position, direction).is_clear_for(direction);

    if from < HOME_START {
        return clear(target);
    }
    if board.pieces_before(HOME_START, direction) > 0 {
        return target < HOME_POSITION && clear(target);
    }
    if board.pieces_before(from, direction) == 0 {
        // 最后面的棋子可以越过终点
        return target >= HOME_POSITION || clear(target);
    }
    target <= HOME_POSITION && clear(target)
}

struct SequenceSearch {
    direction: Direction,
    dice: VecDeque<u8>,
    stack: Vec<Transition>,
    found: Predictions,
}

impl SequenceSearch {
    fn run(&mut self, board: &mut Board) -> EngineResult<()> {
        let Some(die) = self.dice.pop_front() else {
            self.record(board);
            return Ok(());
        };
        let result = self.expand(board, die);
        self.dice.push_front(die);
        result
    }

    fn expand(&mut self, board: &mut Board, die: u8) -> EngineResult<()> {
        if !board.bar(self.direction).is_empty() {
            // 吧台上的棋子挡住其他所有走法
            if !can_hop(board, BAR_POSITION, die, self.direction) {
                self.record(board);
                return Ok(());
            }
            return self.descend(board, BAR_POSITION, die);
        }

        let mut moved = false;
        for position in 1..HOME_POSITION {
            if can_hop(board, position, die, self.direction) {
                self.descend(board, position, die)?;
                moved = true;
            }
        }
        if !moved {
            self.record(board);
        }
        Ok(())
    }

    fn descend(&mut self, board: &mut Board, from: usize, die: u8) -> EngineResult<()> {
        let mut applied = AppliedHop::new(board, from, die, self.direction)?;
        self.stack.push(applied.transition().clone());
        let result = self.run(applied.board());
        self.stack.pop();
        result
    }

    fn record(&mut self, board: &Board) {
        if !self.stack.is_empty() {
            self.found.insert(self.stack.clone(), board.snapshot());
        }
    }
}

/// 预测一次掷骰的全部最长序列及其结果棋盘
///
/// 棋盘在返回时恢复原状
pub fn predict(
    board: &mut Board,
    roll: &DiceRoll,
    direction: Direction,
) -> EngineResult<Predictions> {
    let mut search = SequenceSearch {
        direction,
        dice: VecDeque::new(),
        stack: Vec::new(),
        found: BTreeMap::new(),
    };
    if !direction.is_playing() {
        return Ok(search.found);
    }
    for ordering in roll.orderings() {
        search.dice = ordering.into_iter().collect();
        search.run(board)?;
    }

    let longest = search.found.keys().map(Vec::len).max().unwrap_or(0);
    search.found.retain(|sequence, _| sequence.len() == longest);
    trace!(
        "{} sequences of length {} for {} {}",
        search.found.len(),
        longest,
        direction,
        roll
    );
    Ok(search.found)
}

/// 只要序列
pub fn predict_sequences(
    board: &mut Board,
    roll: &DiceRoll,
    direction: Direction,
) -> EngineResult<Vec<Vec<Transition>>> {
    Ok(predict(board, roll, direction)?.into_keys().collect())
}

/// 只要去重后的结果棋盘
pub fn predict_boards(
    board: &mut Board,
    roll: &DiceRoll,
    direction: Direction,
) -> EngineResult<BTreeSet<BoardSnapshot>> {
    Ok(predict(board, roll, direction)?.into_values().collect())
}
