//! 走子规则
//!
//! 两条独立的规则路径：
//! - `generator`: 给出当前剩余骰子下可走的单个复合走法（交互式逐步走子）
//! - `predictor`: 穷举整回合的最长走法序列及结果棋盘
//!
//! `executor` 负责在棋盘上执行/撤销复合走法。

pub mod calculator;
pub mod executor;
pub mod generator;
pub mod predictor;

pub use calculator::{
    BasicCalculator, MoveCalculator, PermissiveCollectCalculator, StrictCollectCalculator,
};
pub use executor::{execute_move, undo_move};
pub use generator::generate_moves;
pub use predictor::{can_hop, predict, predict_boards, predict_sequences, Predictions};
