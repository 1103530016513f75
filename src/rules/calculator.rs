//! 单步合法性判断
//!
//! 三种判断只在落点到达或越过终点时有区别

use crate::board::Board;
use crate::dice::DiceValues;
use crate::types::{Direction, Move, HOME_POSITION};

/// 判断从 `from` 跳到 `to`（同一方向遍历序中的位置）是否合法
pub trait MoveCalculator {
    /// 每条链开始前调用
    fn reset(&mut self) {}

    fn can_hop(&mut self, board: &Board, from: usize, to: usize, direction: Direction) -> bool;

    /// 从 `start` 依次按 `hops` 连跳，每成功一跳产生一个复合走法，遇到非法跳即停止
    fn moves_from(
        &mut self,
        board: &Board,
        start: usize,
        hops: &[u8],
        direction: Direction,
    ) -> Vec<Move> {
        self.reset();
        let source = board.column_at(start, direction).id().to_string();
        let mut moves = Vec::with_capacity(hops.len());
        let mut from = start;
        for (used, &hop) in hops.iter().enumerate() {
            let to = from + hop as usize;
            if !self.can_hop(board, from, to, direction) {
                break;
            }
            let target = board.column_at(to.min(HOME_POSITION), direction).id();
            moves.push(Move::new(
                source.clone(),
                target,
                DiceValues::from_prefix(&hops[..=used]),
            ));
            from = to;
        }
        moves
    }
}

fn is_clear(board: &Board, to: usize, direction: Direction) -> bool {
    board.column_at(to, direction).is_clear_for(direction)
}

/// 只允许落在终点之前的空格、己方格或对方孤子
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicCalculator;

impl MoveCalculator for BasicCalculator {
    fn can_hop(&mut self, board: &Board, _from: usize, to: usize, direction: Direction) -> bool {
        to < HOME_POSITION && is_clear(board, to, direction)
    }
}

/// 最远一枚棋子使用：每条链最多一次越过终点
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissiveCollectCalculator {
    collected: bool,
}

impl MoveCalculator for PermissiveCollectCalculator {
    fn reset(&mut self) {
        self.collected = false;
    }

    fn can_hop(&mut self, board: &Board, from: usize, to: usize, direction: Direction) -> bool {
        if to < HOME_POSITION {
            return is_clear(board, to, direction);
        }
        if self.collected {
            return false;
        }
        self.collected = true;
        // 连跳时正在移动的棋子仍计在起点上，所以允许 1
        to == HOME_POSITION || board.pieces_before(from, direction) <= 1
    }
}

/// 其余棋子使用：只能正好落进终点
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictCollectCalculator;

impl MoveCalculator for StrictCollectCalculator {
    fn can_hop(&mut self, board: &Board, _from: usize, to: usize, direction: Direction) -> bool {
        match to {
            to if to > HOME_POSITION => false,
            HOME_POSITION => true,
            to => is_clear(board, to, direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_positions::*;

    fn ids(moves: &[Move]) -> Vec<String> {
        moves.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_basic_chain_stops_at_first_blocked_hop() {
        let board = Board::default();
        let mut basic = BasicCalculator;
        // A -> C -> E -> G -> I，均未被封
        let moves = basic.moves_from(&board, 1, &[2, 2, 2, 2], Direction::Forward);
        assert_eq!(ids(&moves), vec!["A-C [2]", "A-E [2,2]", "A-G [2,2,2]", "A-I [2,2,2,2]"]);

        // A -> F 被对方双子封住，整条链为空
        let moves = basic.moves_from(&board, 1, &[5, 1], Direction::Forward);
        assert!(moves.is_empty());
    }

    #[test]
    fn test_basic_never_reaches_home() {
        let board = Board::from_notation(EXACT_COLLECT).unwrap();
        let mut basic = BasicCalculator;
        assert!(basic.moves_from(&board, 22, &[3], Direction::Forward).is_empty());
        assert!(!basic.can_hop(&board, 22, 25, Direction::Forward));
    }

    #[test]
    fn test_strict_requires_exact_landing() {
        let board = Board::from_notation(EXACT_COLLECT).unwrap();
        let mut strict = StrictCollectCalculator;
        let moves = strict.moves_from(&board, 22, &[3, 5], Direction::Forward);
        assert_eq!(ids(&moves), vec!["O-CB [3]"]);
        assert!(strict.moves_from(&board, 22, &[5, 3], Direction::Forward).is_empty());
    }

    #[test]
    fn test_permissive_overshoots_once_for_farthest_piece() {
        let board = Board::from_notation(EXACT_COLLECT_FARTHEST).unwrap();
        let mut permissive = PermissiveCollectCalculator::default();
        let moves = permissive.moves_from(&board, 22, &[6, 5], Direction::Forward);
        assert_eq!(ids(&moves), vec!["O-CB [6]"]);
        // reset 之后可以再越过一次
        let moves = permissive.moves_from(&board, 22, &[5, 6], Direction::Forward);
        assert_eq!(ids(&moves), vec!["O-CB [5]"]);
    }

    #[test]
    fn test_permissive_refuses_when_pieces_remain_behind() {
        let board = Board::from_notation(EXACT_COLLECT).unwrap();
        let mut permissive = PermissiveCollectCalculator::default();
        // R(19) 有 4 枚：R -> M 之后从 M 越过终点，R 上仍有棋子在后面
        let moves = permissive.moves_from(&board, 19, &[5, 3], Direction::Forward);
        assert_eq!(ids(&moves), vec!["R-M [5]"]);
    }
}
