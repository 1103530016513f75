//! 执行与撤销复合走法

use crate::board::Board;
use crate::error::{EngineError, EngineResult};
use crate::types::{Direction, Move, Transition, HOME_POSITION};

/// 按走法记录的点数顺序逐跳执行，返回原子转移（含击中）
///
/// 任何一跳失败或终点不符时，已执行的部分会被撤销
pub fn execute_move(
    board: &mut Board,
    mv: &Move,
    direction: Direction,
) -> EngineResult<Vec<Transition>> {
    let mut from = board.position_of(&mv.source, direction).ok_or_else(|| {
        EngineError::IllegalMove(format!("{} is not on the {} path", mv.source, direction))
    })?;

    let mut transitions = Vec::with_capacity(mv.dice_count());
    for &die in mv.dice.values() {
        match board.hop(from, die, direction) {
            Ok(transition) => transitions.push(transition),
            Err(err) => {
                board.undo_all(&transitions, direction)?;
                return Err(err);
            }
        }
        from = (from + die as usize).min(HOME_POSITION);
    }

    let reached = transitions.last().map(|t| t.target.as_str());
    if reached != Some(mv.target.as_str()) {
        board.undo_all(&transitions, direction)?;
        return Err(EngineError::IllegalMove(format!(
            "{} ends on {} instead of {}",
            mv,
            reached.unwrap_or("nothing"),
            mv.target
        )));
    }
    Ok(transitions)
}

/// `execute_move` 的逆操作
pub fn undo_move(
    board: &mut Board,
    transitions: &[Transition],
    direction: Direction,
) -> EngineResult<()> {
    board.undo_all(transitions, direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::DiceValues;
    use crate::test_positions::*;

    fn mv(source: &str, target: &str, dice: &[u8]) -> Move {
        Move::new(source, target, DiceValues::new(dice.to_vec()).unwrap())
    }

    #[test]
    fn test_execute_composite_move() {
        let mut board = Board::default();
        let before = board.snapshot();
        let transitions =
            execute_move(&mut board, &mv("A", "D", &[2, 1]), Direction::Forward).unwrap();
        assert_eq!(
            transitions,
            vec![Transition::new("A", "C", 2), Transition::new("C", "D", 1)]
        );
        assert_eq!(board.column("A").unwrap().pieces(), 1);
        assert_eq!(board.column("D").unwrap().pieces(), 1);
        assert!(board.column("C").unwrap().is_empty());

        undo_move(&mut board, &transitions, Direction::Forward).unwrap();
        assert_eq!(board.snapshot(), before);
    }

    #[test]
    fn test_execute_records_hit() {
        let mut board = Board::from_notation(ENTER_WITH_HIT).unwrap();
        let transitions =
            execute_move(&mut board, &mv("SB", "C", &[3]), Direction::Forward).unwrap();
        assert_eq!(transitions, vec![Transition::new("SB", "C", 3).with_hit("SW")]);
        assert_eq!(board.bar(Direction::Backward).pieces(), 1);
        assert_eq!(board.bar(Direction::Forward).pieces(), 1);
    }

    #[test]
    fn test_execute_backward_move() {
        let mut board = Board::default();
        let transitions =
            execute_move(&mut board, &mv("M", "O", &[2]), Direction::Backward).unwrap();
        assert_eq!(transitions, vec![Transition::new("M", "O", 2)]);
        assert_eq!(board.column("O").unwrap().direction(), Direction::Backward);
    }

    #[test]
    fn test_failed_move_leaves_board_untouched() {
        let mut board = Board::default();
        let before = board.snapshot();
        // 第二跳落在 F（对方双子）
        assert!(execute_move(&mut board, &mv("A", "F", &[2, 3]), Direction::Forward).is_err());
        assert_eq!(board.snapshot(), before);
        // 终点不符
        assert!(execute_move(&mut board, &mv("A", "E", &[2, 1]), Direction::Forward).is_err());
        assert_eq!(board.snapshot(), before);
        // 起点不在该方向路径上
        assert!(execute_move(&mut board, &mv("SW", "B", &[2]), Direction::Forward).is_err());
        assert_eq!(board.snapshot(), before);
    }

    #[test]
    fn test_execute_collects_overshoot() {
        let mut board = Board::from_notation(EXACT_COLLECT_FARTHEST).unwrap();
        let transitions =
            execute_move(&mut board, &mv("O", "CB", &[6]), Direction::Forward).unwrap();
        assert_eq!(transitions, vec![Transition::new("O", "CB", 6)]);
        assert_eq!(board.home(Direction::Forward).pieces(), 13);
    }
}
