//! 整回合序列：开局时一次性预测全部最长序列，之后按前缀逐段消耗

use super::TurnPlanner;
use crate::board::Board;
use crate::dice::{DiceRoll, DiceValues};
use crate::error::{EngineError, EngineResult};
use crate::rules::{predict, Predictions};
use crate::types::{Direction, Move, Transition};
use std::collections::BTreeSet;

/// 剩余序列（已走部分被截掉）及其结果棋盘
#[derive(Debug, Default, Clone)]
pub struct SequencePlanner {
    remaining: Predictions,
    dice: Vec<u8>,
}

impl SequencePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 序列开头首尾相接的一段，组成一个复合走法
    fn chain_prefixes(sequence: &[Transition]) -> Vec<Move> {
        let mut moves = Vec::new();
        let mut dice = Vec::with_capacity(sequence.len());
        for (index, transition) in sequence.iter().enumerate() {
            if index > 0 && sequence[index - 1].target != transition.source {
                break;
            }
            dice.push(transition.die);
            moves.push(Move::new(
                sequence[0].source.clone(),
                transition.target.clone(),
                DiceValues::from_prefix(&dice),
            ));
        }
        moves
    }

    /// 找到第一个能表示 `mv` 的序列前缀
    fn matching_prefix(&self, mv: &Move) -> Option<Vec<Transition>> {
        let length = mv.dice_count();
        self.remaining.keys().find_map(|sequence| {
            Self::chain_prefixes(sequence)
                .into_iter()
                .find(|candidate| candidate == mv)
                .map(|_| sequence[..length].to_vec())
        })
    }

    fn consume(&mut self, prefix: &[Transition]) {
        let remaining = std::mem::take(&mut self.remaining);
        self.remaining = remaining
            .into_iter()
            .filter(|(sequence, _)| sequence.starts_with(prefix))
            .map(|(sequence, snapshot)| (sequence[prefix.len()..].to_vec(), snapshot))
            .collect();
        for transition in prefix {
            if let Some(index) = self.dice.iter().position(|&d| d == transition.die) {
                self.dice.remove(index);
            }
        }
        if self.is_turn_done() {
            self.clear();
        }
    }
}

impl TurnPlanner for SequencePlanner {
    fn begin_turn(
        &mut self,
        board: &mut Board,
        roll: &DiceRoll,
        direction: Direction,
    ) -> EngineResult<()> {
        self.remaining = predict(board, roll, direction)?;
        self.dice = roll.values();
        if self.is_turn_done() {
            self.clear();
        }
        Ok(())
    }

    fn is_turn_done(&self) -> bool {
        self.remaining.keys().all(|sequence| sequence.is_empty())
    }

    fn remaining_dice(&self) -> Vec<u8> {
        self.dice.clone()
    }

    fn legal_moves(&self) -> Vec<Move> {
        let moves: BTreeSet<Move> = self
            .remaining
            .keys()
            .flat_map(|sequence| Self::chain_prefixes(sequence))
            .collect();
        moves.into_iter().collect()
    }

    fn execute(
        &mut self,
        board: &mut Board,
        mv: &Move,
        direction: Direction,
    ) -> EngineResult<Vec<Transition>> {
        let prefix = self
            .matching_prefix(mv)
            .ok_or_else(|| EngineError::IllegalMove(format!("{} is not a legal move", mv)))?;
        board.apply_all(&prefix, direction)?;
        self.consume(&prefix);
        Ok(prefix)
    }

    fn sequences(&self) -> Option<&Predictions> {
        Some(&self.remaining)
    }

    fn commit(
        &mut self,
        board: &mut Board,
        sequence: &[Transition],
        direction: Direction,
    ) -> EngineResult<Vec<Transition>> {
        if sequence.is_empty() || !self.remaining.contains_key(sequence) {
            return Err(EngineError::IllegalMove(format!(
                "sequence of {} transitions is not legal",
                sequence.len()
            )));
        }
        board.apply_all(sequence, direction)?;
        self.clear();
        Ok(sequence.to_vec())
    }

    fn clear(&mut self) {
        self.remaining.clear();
        self.dice.clear();
    }
}
