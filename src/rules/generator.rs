//! 复合走法生成
//!
//! 按骰子顺序从每个己方格连跳，得到所有合法的单步与连跳走法，
//! 再按"尽量用满骰子"的规则筛掉不允许的走法。

use super::calculator::{
    BasicCalculator, MoveCalculator, PermissiveCollectCalculator, StrictCollectCalculator,
};
use crate::board::Board;
use crate::types::{Direction, Move, BAR_POSITION, HOME_START};
use log::trace;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// 两个不同点数
fn is_simple(dice: &[u8]) -> bool {
    dice.len() == 2 && dice[0] != dice[1]
}

/// 需要尝试的点数顺序
fn dice_orderings(dice: &[u8]) -> Vec<Vec<u8>> {
    if is_simple(dice) {
        vec![dice.to_vec(), dice.iter().rev().copied().collect()]
    } else {
        vec![dice.to_vec()]
    }
}

/// 计算剩余骰子 `dice` 下该方向的全部合法复合走法（去重并排序）
pub fn generate_moves(board: &Board, dice: &[u8], direction: Direction) -> Vec<Move> {
    if !direction.is_playing() || dice.is_empty() {
        return Vec::new();
    }
    let occupied = board.occupied_positions(direction);
    let Some(&farthest) = occupied.first() else {
        return Vec::new();
    };

    let orderings = dice_orderings(dice);
    let mut moves = BTreeSet::new();
    let mut basic = BasicCalculator;

    if farthest == BAR_POSITION {
        // 吧台上有棋子时只能入场
        if board.bar(direction).pieces() > 1 {
            let distinct: BTreeSet<u8> = dice.iter().copied().collect();
            for die in distinct {
                moves.extend(basic.moves_from(board, BAR_POSITION, &[die], direction));
            }
        } else {
            for hops in &orderings {
                moves.extend(basic.moves_from(board, BAR_POSITION, hops, direction));
            }
        }
    } else {
        for &start in &occupied {
            let mut calculator = calculator_for(board, start, direction);
            for hops in &orderings {
                moves.extend(calculator.moves_from(board, start, hops, direction));
            }
        }
    }

    trace!("{} candidate moves for {} with {:?}", moves.len(), direction, dice);
    maximize(board, moves, dice, direction)
}

/// 从 `start` 出发时使用的判断
///
/// 外面不止一枚棋子时一律用 Basic；否则最远一枚可以越过终点，
/// 其余棋子全部进入内盘后只能正好收子
fn calculator_for(
    board: &Board,
    start: usize,
    direction: Direction,
) -> Box<dyn MoveCalculator> {
    if start == BAR_POSITION {
        return Box::new(BasicCalculator);
    }
    let outside = board.pieces_before(HOME_START, direction);
    let farthest = board.occupied_positions(direction).first().copied();
    match outside {
        0 | 1 if farthest == Some(start) => Box::new(PermissiveCollectCalculator::default()),
        0 => Box::new(StrictCollectCalculator),
        _ => Box::new(BasicCalculator),
    }
}

/// 按使用的点数集合分组，处理部分强制的情况
fn maximize(
    board: &Board,
    moves: BTreeSet<Move>,
    dice: &[u8],
    direction: Direction,
) -> Vec<Move> {
    if !is_simple(dice) {
        return moves.into_iter().collect();
    }

    let mut groups: BTreeMap<BTreeSet<u8>, Vec<&Move>> = BTreeMap::new();
    for mv in &moves {
        let key: BTreeSet<u8> = mv.dice.values().iter().copied().collect();
        groups.entry(key).or_default().push(mv);
    }
    if groups.len() != 2 {
        return moves.into_iter().collect();
    }

    if groups.keys().all(|key| key.len() == 1) {
        maximize_single_dice(board, &moves, &groups, dice, direction)
    } else {
        maximize_composite(&moves, &groups, dice)
    }
}

/// 两组各只用一个点数：若某个点数只有唯一走法且起点是孤子，该格必须用这个点数
fn maximize_single_dice(
    board: &Board,
    moves: &BTreeSet<Move>,
    groups: &BTreeMap<BTreeSet<u8>, Vec<&Move>>,
    dice: &[u8],
    direction: Direction,
) -> Vec<Move> {
    let constrained = |die: u8| {
        let key: BTreeSet<u8> = [die].into_iter().collect();
        groups
            .get(&key)
            .and_then(|group| constrained_source(board, group, direction))
    };
    let (source, die) = match (constrained(dice[0]), constrained(dice[1])) {
        (Some(source), None) => (source, dice[0]),
        (None, Some(source)) => (source, dice[1]),
        _ => return moves.iter().cloned().collect(),
    };
    moves
        .iter()
        .filter(|mv| mv.source != source || mv.dice.contains(die))
        .cloned()
        .collect()
}

fn constrained_source(board: &Board, group: &[&Move], direction: Direction) -> Option<String> {
    let [mv] = group else {
        return None;
    };
    if board.column(&mv.source)?.pieces() != 1 {
        return None;
    }
    let outside = board.pieces_before(HOME_START, direction);
    let target = board.position_of(&mv.target, direction)?;
    if outside == 1 && target >= HOME_START {
        return None;
    }
    Some(mv.source.clone())
}

/// 一组用两个点数、一组只用一个：只保留能走完两个点数的起点
fn maximize_composite(
    moves: &BTreeSet<Move>,
    groups: &BTreeMap<BTreeSet<u8>, Vec<&Move>>,
    dice: &[u8],
) -> Vec<Move> {
    let full: BTreeSet<u8> = dice.iter().copied().collect();
    let viable: HashSet<&str> = groups
        .get(&full)
        .map(|group| group.iter().map(|mv| mv.source.as_str()).collect())
        .unwrap_or_default();
    moves
        .iter()
        .filter(|mv| viable.contains(mv.source.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{DiceRoll, DiceValues, ALL_DICE_ROLLS};
    use crate::rules::executor::execute_move;
    use crate::rules::predictor::predict;
    use crate::test_positions::*;

    fn mv(source: &str, target: &str, dice: &[u8]) -> Move {
        Move::new(source, target, DiceValues::new(dice.to_vec()).unwrap())
    }

    fn moves_for(notation: &str, roll: (u8, u8), direction: Direction) -> Vec<Move> {
        let board = Board::from_notation(notation).unwrap();
        let roll = DiceRoll::new(roll.0, roll.1).unwrap();
        generate_moves(&board, &roll.values(), direction)
    }

    #[test]
    fn test_opening_simple_roll() {
        let moves = moves_for(START, (2, 1), Direction::Forward);
        assert!(moves.contains(&mv("A", "B", &[1])));
        assert!(moves.contains(&mv("A", "C", &[2])));
        assert!(moves.contains(&mv("A", "D", &[2, 1])));
        assert!(moves.contains(&mv("T", "R", &[2])));
        // F 被对方封住
        assert!(!moves.iter().any(|m| m.target == "F"));
    }

    #[test]
    fn test_opening_double_chains_four_hops() {
        let moves = moves_for(START, (2, 2), Direction::Forward);
        assert!(moves.contains(&mv("A", "C", &[2])));
        assert!(moves.contains(&mv("A", "I", &[2, 2, 2, 2])));
        assert_eq!(moves.iter().map(|m| m.dice_count()).max(), Some(4));
    }

    #[test]
    fn test_bar_entry_only() {
        let moves = moves_for(BAR_ENTRY, (6, 1), Direction::Forward);
        assert_eq!(moves, vec![mv("SB", "F", &[6]), mv("SB", "G", &[6, 1])]);
    }

    #[test]
    fn test_bar_blocked_for_every_roll() {
        let board = Board::from_notation(BAR_BLOCKED).unwrap();
        for roll in ALL_DICE_ROLLS.iter() {
            let moves = generate_moves(&board, &roll.values(), Direction::Forward);
            assert!(moves.is_empty(), "{}", roll);
        }
    }

    #[test]
    fn test_two_on_bar_enter_one_die_at_a_time() {
        let moves = moves_for(ENTER_WITH_HIT, (4, 3), Direction::Forward);
        assert_eq!(moves, vec![mv("SB", "C", &[3])]);
    }

    #[test]
    fn test_collect_with_high_die() {
        let moves = moves_for(COLLECT_WITH_HIGH, (6, 5), Direction::Forward);
        assert_eq!(moves, vec![mv("P", "CB", &[5]), mv("P", "CB", &[6])]);
    }

    #[test]
    fn test_forced_single_move() {
        let moves = moves_for(FORCED_MOVE, (3, 6), Direction::Forward);
        assert_eq!(moves, vec![mv("A", "G", &[6]), mv("P", "M", &[3])]);
    }

    #[test]
    fn test_forced_composite() {
        let moves = moves_for(FORCED_COMPOSITE, (6, 3), Direction::Forward);
        assert_eq!(moves, vec![mv("A", "D", &[3]), mv("A", "J", &[3, 6])]);
    }

    #[test]
    fn test_forced_composite_two_columns() {
        let moves = moves_for(FORCED_COMPOSITE_TWO_COLUMNS, (6, 3), Direction::Forward);
        let expected: BTreeSet<Move> = [
            mv("A", "D", &[3]),
            mv("A", "J", &[3, 6]),
            mv("L", "V", &[3]),
            mv("L", "P", &[3, 6]),
        ]
        .into_iter()
        .collect();
        assert_eq!(moves.into_iter().collect::<BTreeSet<_>>(), expected);
    }

    #[test]
    fn test_no_collect_while_piece_outside() {
        let moves = moves_for(COMPOSITE_NO_COLLECT, (3, 3), Direction::Forward);
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|m| m.target != "CB"));
        assert!(moves.contains(&mv("T", "N", &[3, 3])));
    }

    #[test]
    fn test_unforced_to_home_backward() {
        let moves = moves_for(UNFORCED_TO_HOME, (6, 4), Direction::Backward);
        assert!(moves.contains(&mv("H", "D", &[4])));
        assert!(moves.contains(&mv("H", "B", &[6])));
    }

    #[test]
    fn test_collect_with_high_backward() {
        let moves = moves_for(COLLECT_WITH_HIGH_BACKWARD, (6, 2), Direction::Backward);
        assert!(moves.contains(&mv("E", "CW", &[6])));
        assert!(moves.contains(&mv("B", "CW", &[2])));
        // 只有最远的 E 能越过终点
        assert!(!moves.iter().any(|m| m.source != "E" && m.dice.contains(6)));
    }

    #[test]
    fn test_exact_collection() {
        let moves = moves_for(EXACT_COLLECT, (5, 3), Direction::Forward);
        assert!(moves.contains(&mv("O", "CB", &[3])));
        assert!(!moves.contains(&mv("O", "CB", &[5])));

        let moves = moves_for(EXACT_COLLECT_FARTHEST, (6, 5), Direction::Forward);
        assert_eq!(moves, vec![mv("O", "CB", &[5]), mv("O", "CB", &[6])]);
    }

    #[test]
    fn test_constrained_piece_must_use_die() {
        // O 是唯一能用 3 的棋子，另一个点数 2 不能再从 O 走
        let moves = moves_for(GAME_WON, (3, 2), Direction::Forward);
        assert_eq!(moves, vec![mv("N", "CB", &[2]), mv("O", "CB", &[3])]);
    }

    #[test]
    fn test_direction_none_or_no_dice() {
        let board = Board::default();
        assert!(generate_moves(&board, &[3, 1], Direction::None).is_empty());
        assert!(generate_moves(&board, &[], Direction::Forward).is_empty());
    }

    #[test]
    fn test_generated_moves_execute_and_undo() {
        for (name, notation) in ALL_POSITIONS {
            for direction in [Direction::Forward, Direction::Backward] {
                for roll in ALL_DICE_ROLLS.iter() {
                    let mut board = Board::from_notation(notation).unwrap();
                    let before = board.snapshot();
                    for mv in generate_moves(&board, &roll.values(), direction) {
                        let transitions = execute_move(&mut board, &mv, direction)
                            .unwrap_or_else(|e| panic!("{} {} {}: {}", name, roll, mv, e));
                        assert_eq!(transitions.len(), mv.dice_count());
                        assert_eq!(board.pieces_of(Direction::Forward), 15);
                        assert_eq!(board.pieces_of(Direction::Backward), 15);
                        board.undo_all(&transitions, direction).unwrap();
                        assert_eq!(board.snapshot(), before, "{} {} {}", name, roll, mv);
                    }
                }
            }
        }
    }

    #[test]
    fn test_moves_replay_through_their_calculator() {
        for (name, notation) in ALL_POSITIONS {
            for direction in [Direction::Forward, Direction::Backward] {
                for roll in ALL_DICE_ROLLS.iter() {
                    let board = Board::from_notation(notation).unwrap();
                    for mv in generate_moves(&board, &roll.values(), direction) {
                        let start = board.position_of(&mv.source, direction).unwrap();
                        let replayed = calculator_for(&board, start, direction).moves_from(
                            &board,
                            start,
                            mv.dice.values(),
                            direction,
                        );
                        assert_eq!(replayed.last(), Some(&mv), "{} {} {}", name, roll, mv);
                    }
                }
            }
        }
    }

    #[test]
    fn test_moves_exist_whenever_a_sequence_does() {
        for (name, notation) in ALL_POSITIONS {
            for direction in [Direction::Forward, Direction::Backward] {
                for roll in ALL_DICE_ROLLS.iter() {
                    let mut board = Board::from_notation(notation).unwrap();
                    let moves = generate_moves(&board, &roll.values(), direction);
                    let predictions = predict(&mut board, roll, direction).unwrap();
                    assert_eq!(
                        moves.is_empty(),
                        predictions.is_empty(),
                        "{} {} {}",
                        name,
                        roll,
                        direction
                    );
                }
            }
        }
    }

    #[test]
    fn test_single_die_tie_break_can_strand_a_die() {
        // 两组单点数走法都不受约束时不剪枝：先走某一步会让另一个点数无处可走，
        // 而整回合预测能用满两个点数
        let cases = [
            (FORCED_MOVE, (3, 1), Direction::Forward),
            (FORCED_MOVE, (3, 2), Direction::Forward),
            (FORCED_COMPOSITE_TWO_COLUMNS, (6, 4), Direction::Backward),
        ];
        for (notation, (a, b), direction) in cases {
            let mut board = Board::from_notation(notation).unwrap();
            let roll = DiceRoll::new(a, b).unwrap();
            let longest = predict(&mut board, &roll, direction)
                .unwrap()
                .keys()
                .map(|seq| seq.len())
                .max();
            assert_eq!(longest, Some(2), "{}", roll);

            let stranding = generate_moves(&board, &roll.values(), direction)
                .into_iter()
                .filter(|mv| mv.dice_count() == 1)
                .find(|mv| {
                    let mut after = board.clone();
                    execute_move(&mut after, mv, direction).unwrap();
                    let left: Vec<u8> = roll
                        .values()
                        .into_iter()
                        .filter(|&d| !mv.dice.contains(d))
                        .collect();
                    generate_moves(&after, &left, direction).is_empty()
                });
            assert!(stranding.is_some(), "{} {}", roll, direction);
        }

        let board = Board::from_notation(FORCED_MOVE).unwrap();
        let moves = generate_moves(&board, &[3, 1], Direction::Forward);
        assert!(moves.contains(&mv("P", "M", &[3])));
        assert!(moves.contains(&mv("A", "D", &[3])));
    }
}
