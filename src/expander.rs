//! 局面展开
//!
//! 从一个棋盘快照出发，对 21 种掷骰结果分别预测整回合结果棋盘，
//! 逐层交替方向展开成树。叶子和父节点回调可以给节点赋值（例如自底向上求期望或极值）。

use crate::board::{Board, BoardSnapshot};
use crate::dice::ALL_DICE_ROLLS;
use crate::error::EngineResult;
use crate::rules::predict_boards;
use crate::types::Direction;
use log::trace;
use std::collections::BTreeSet;

/// 展开树上的节点
#[derive(Debug, Clone)]
pub struct StateNode<V> {
    pub snapshot: BoardSnapshot,
    /// 从这个局面出发行棋的一方
    pub direction: Direction,
    pub layer: usize,
    /// 只在父节点回调期间有内容，回调之后释放
    pub children: Vec<StateNode<V>>,
    pub value: Option<V>,
}

impl<V> StateNode<V> {
    fn new(snapshot: BoardSnapshot, direction: Direction, layer: usize) -> Self {
        StateNode {
            snapshot,
            direction,
            layer,
            children: Vec::new(),
            value: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionStats {
    pub nodes: usize,
    pub leaves: usize,
}

pub type NodeCallback<'a, V> = Box<dyn FnMut(&mut StateNode<V>) + 'a>;

pub struct StateExpander<'a, V> {
    board: Board,
    on_leaf: Option<NodeCallback<'a, V>>,
    on_parent: Option<NodeCallback<'a, V>>,
    stats: ExpansionStats,
}

impl<'a, V> StateExpander<'a, V> {
    pub fn new() -> Self {
        StateExpander {
            board: Board::default(),
            on_leaf: None,
            on_parent: None,
            stats: ExpansionStats::default(),
        }
    }

    /// 叶子节点回调
    pub fn on_leaf(mut self, callback: impl FnMut(&mut StateNode<V>) + 'a) -> Self {
        self.on_leaf = Some(Box::new(callback));
        self
    }

    /// 父节点回调，调用时子节点已全部求值
    pub fn on_parent(mut self, callback: impl FnMut(&mut StateNode<V>) + 'a) -> Self {
        self.on_parent = Some(Box::new(callback));
        self
    }

    /// 上一次展开的统计
    pub fn stats(&self) -> ExpansionStats {
        self.stats
    }

    /// 展开 `layers` 层，返回根节点的值
    pub fn expand(
        &mut self,
        root: &BoardSnapshot,
        direction: Direction,
        layers: usize,
    ) -> EngineResult<Option<V>> {
        self.stats = ExpansionStats::default();
        let mut node = StateNode::new(root.clone(), direction, 0);
        self.expand_node(&mut node, layers)?;
        trace!(
            "expanded {} layers: {} nodes, {} leaves",
            layers,
            self.stats.nodes,
            self.stats.leaves
        );
        Ok(node.value)
    }

    fn expand_node(&mut self, node: &mut StateNode<V>, layers: usize) -> EngineResult<()> {
        self.stats.nodes += 1;
        if node.layer >= layers || node.snapshot.is_game_over() {
            self.leaf(node);
            return Ok(());
        }

        self.board.load_snapshot(&node.snapshot)?;
        let mut boards = BTreeSet::new();
        for roll in ALL_DICE_ROLLS.iter() {
            boards.extend(predict_boards(&mut self.board, roll, node.direction)?);
        }
        if boards.is_empty() {
            self.leaf(node);
            return Ok(());
        }

        let (next, layer) = (node.direction.reverse(), node.layer + 1);
        node.children = boards
            .into_iter()
            .map(|snapshot| StateNode::new(snapshot, next, layer))
            .collect();
        for child in node.children.iter_mut() {
            self.expand_node(child, layers)?;
        }
        if let Some(callback) = self.on_parent.as_mut() {
            callback(node);
        }
        node.children.clear();
        Ok(())
    }

    fn leaf(&mut self, node: &mut StateNode<V>) {
        self.stats.leaves += 1;
        if let Some(callback) = self.on_leaf.as_mut() {
            callback(node);
        }
    }
}

impl<V> Default for StateExpander<'_, V> {
    fn default() -> Self {
        StateExpander::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;
    use crate::test_positions::*;

    fn snapshot(notation: &str) -> BoardSnapshot {
        BoardSnapshot::from_layout(&notation.parse::<Layout>().unwrap())
    }

    #[test]
    fn test_single_layer_leaves() {
        let mut leaves = 0;
        let mut expander = StateExpander::<u8>::new().on_leaf(|node| {
            leaves += 1;
            node.value = Some(node.snapshot.collected(Direction::Forward));
        });
        expander
            .expand(&snapshot(EXPAND_SIMPLE), Direction::Forward, 1)
            .unwrap();
        let stats = expander.stats();
        drop(expander);
        // 9 种非对子点数和 + 对子 3/4/5/6 各一种新位置
        assert_eq!(leaves, 13);
        assert_eq!(stats, ExpansionStats { nodes: 14, leaves: 13 });
    }

    #[test]
    fn test_parent_callback_sees_children() {
        let mut expander = StateExpander::<u8>::new()
            .on_leaf(|node| node.value = Some(node.snapshot.collected(Direction::Forward)))
            .on_parent(|node| {
                assert!(!node.is_leaf());
                node.value = node.children.iter().filter_map(|child| child.value).max();
            });
        let best = expander
            .expand(&snapshot(EXPAND_SIMPLE), Direction::Forward, 1)
            .unwrap();
        // 6-6 收子获胜
        assert_eq!(best, Some(15));
    }

    #[test]
    fn test_two_layers_alternate_direction() {
        let mut directions = Vec::new();
        let mut expander =
            StateExpander::<()>::new().on_leaf(|node| directions.push(node.direction));
        expander
            .expand(&snapshot(EXPAND_TWO_LAYERS), Direction::Backward, 2)
            .unwrap();
        assert_eq!(expander.stats(), ExpansionStats { nodes: 27, leaves: 24 });
        drop(expander);
        // 第二层的节点轮到反向再走
        assert!(directions.iter().all(|&d| d == Direction::Backward));
    }

    #[test]
    fn test_zero_layers_and_finished_games() {
        let mut expander = StateExpander::<()>::new();
        expander.expand(&snapshot(START), Direction::Forward, 0).unwrap();
        assert_eq!(expander.stats(), ExpansionStats { nodes: 1, leaves: 1 });

        // 已经结束的对局不再展开
        let mut board = Board::from_notation(GAME_WON).unwrap();
        board.hop(22, 3, Direction::Forward).unwrap();
        board.hop(23, 2, Direction::Forward).unwrap();
        expander.expand(&board.snapshot(), Direction::Backward, 3).unwrap();
        assert_eq!(expander.stats(), ExpansionStats { nodes: 1, leaves: 1 });
    }

    #[test]
    fn test_blocked_position_is_a_leaf() {
        let mut expander = StateExpander::<()>::new();
        // 正向吧台棋子入不了场，且其余棋子被吧台挡住
        expander
            .expand(&snapshot(BAR_BLOCKED), Direction::Forward, 2)
            .unwrap();
        assert_eq!(expander.stats(), ExpansionStats { nodes: 1, leaves: 1 });
    }
}
