//! 逐步走子：每次从走法生成器给出的复合走法中选一个

use super::TurnPlanner;
use crate::board::Board;
use crate::dice::DiceRoll;
use crate::error::{EngineError, EngineResult};
use crate::rules::{execute_move, generate_moves};
use crate::types::{Direction, Move, Transition};

#[derive(Debug, Default, Clone)]
pub struct MovePlanner {
    dice: Vec<u8>,
    moves: Vec<Move>,
}

impl MovePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按剩余骰子重新生成；没有可走的就作废剩余骰子
    fn refresh(&mut self, board: &Board, direction: Direction) {
        if board.is_game_complete() {
            self.clear();
            return;
        }
        self.moves = generate_moves(board, &self.dice, direction);
        if self.moves.is_empty() {
            self.dice.clear();
        }
    }
}

impl TurnPlanner for MovePlanner {
    fn begin_turn(
        &mut self,
        board: &mut Board,
        roll: &DiceRoll,
        direction: Direction,
    ) -> EngineResult<()> {
        self.dice = roll.values();
        self.refresh(board, direction);
        Ok(())
    }

    fn is_turn_done(&self) -> bool {
        self.dice.is_empty()
    }

    fn remaining_dice(&self) -> Vec<u8> {
        self.dice.clone()
    }

    fn legal_moves(&self) -> Vec<Move> {
        self.moves.clone()
    }

    fn execute(
        &mut self,
        board: &mut Board,
        mv: &Move,
        direction: Direction,
    ) -> EngineResult<Vec<Transition>> {
        // 用生成器记录的点数顺序执行，调用方给出的顺序可能走不通
        let chosen = self
            .moves
            .iter()
            .find(|legal| *legal == mv)
            .cloned()
            .ok_or_else(|| EngineError::IllegalMove(format!("{} is not a legal move", mv)))?;
        let transitions = execute_move(board, &chosen, direction)?;
        for &die in chosen.dice.values() {
            if let Some(index) = self.dice.iter().position(|&d| d == die) {
                self.dice.remove(index);
            }
        }
        self.refresh(board, direction);
        Ok(transitions)
    }

    fn clear(&mut self) {
        self.dice.clear();
        self.moves.clear();
    }
}
