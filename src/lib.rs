//! Backgammon Rules Engine
//!
//! 双陆棋规则引擎 - 走法生成、整回合预测、回合状态机与局面展开

pub mod board;
pub mod dice;
pub mod engine;
pub mod error;
pub mod expander;
pub mod layout;
pub mod rules;
pub mod test_positions;
pub mod types;

pub use board::{Board, BoardSnapshot, Column, ColumnSnapshot};
pub use dice::{DiceRoll, DiceRoller, DiceValues, ALL_DICE_ROLLS};
pub use engine::{
    Capabilities, Engine, EngineConfig, EngineMode, EngineState, MovePlanner, SequencePlanner,
    TurnPlanner, AVAILABLE_MODES, DEFAULT_MODE,
};
pub use error::{EngineError, EngineResult};
pub use expander::{ExpansionStats, StateExpander, StateNode};
pub use layout::{BoardTemplate, BoardTemplateBuilder, Layout};
pub use rules::{execute_move, generate_moves, predict, undo_move, MoveCalculator, Predictions};
pub use types::{Direction, Move, Transition};
