//! 回合引擎
//!
//! 一个引擎核心 + 可替换的回合规划器：
//! - [`MovePlanner`]: 逐步生成单个复合走法
//! - [`SequencePlanner`]: 预测整回合序列，可按走法、序列或结果棋盘推进
//!
//! 引擎模式决定规划器和对外开放的查询/操作。

mod interactive;
mod predicted;

pub use interactive::MovePlanner;
pub use predicted::SequencePlanner;

use crate::board::{Board, BoardSnapshot};
use crate::dice::{DiceRoll, DiceRoller};
use crate::error::{EngineError, EngineResult};
use crate::layout::{BoardTemplate, Layout};
use crate::rules::Predictions;
use crate::types::{Direction, Move, Transition};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// 可用的引擎模式
pub const AVAILABLE_MODES: &[&str] = &["interactive", "slicing", "board", "hybrid"];

/// 默认模式
pub const DEFAULT_MODE: &str = "hybrid";

/// 一个回合内的走子规划
pub trait TurnPlanner {
    /// 掷骰后计算本回合的合法选择
    fn begin_turn(
        &mut self,
        board: &mut Board,
        roll: &DiceRoll,
        direction: Direction,
    ) -> EngineResult<()>;

    fn is_turn_done(&self) -> bool;

    fn remaining_dice(&self) -> Vec<u8>;

    /// 当前可走的复合走法（去重并排序）
    fn legal_moves(&self) -> Vec<Move>;

    /// 执行一个合法走法，返回实际发生的原子转移
    fn execute(
        &mut self,
        board: &mut Board,
        mv: &Move,
        direction: Direction,
    ) -> EngineResult<Vec<Transition>>;

    /// 剩余序列及结果棋盘，不支持时为 `None`
    fn sequences(&self) -> Option<&Predictions> {
        None
    }

    /// 一次走完整条序列
    fn commit(
        &mut self,
        _board: &mut Board,
        _sequence: &[Transition],
        _direction: Direction,
    ) -> EngineResult<Vec<Transition>> {
        Err(EngineError::Unsupported("whole-turn sequences"))
    }

    fn clear(&mut self);
}

/// 引擎能力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// 报告并执行单个复合走法
    pub single_moves: bool,
    /// 报告并执行整回合序列
    pub sequences: bool,
    /// 报告并选择结果棋盘
    pub snapshots: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// 只有单个走法，由走法生成器提供
    Interactive,
    /// 单个走法 + 整回合序列
    Slicing,
    /// 只有结果棋盘
    Board,
    /// 全部
    #[default]
    Hybrid,
}

impl EngineMode {
    pub fn capabilities(&self) -> Capabilities {
        match self {
            EngineMode::Interactive => Capabilities {
                single_moves: true,
                sequences: false,
                snapshots: false,
            },
            EngineMode::Slicing => Capabilities {
                single_moves: true,
                sequences: true,
                snapshots: false,
            },
            EngineMode::Board => Capabilities {
                single_moves: false,
                sequences: false,
                snapshots: true,
            },
            EngineMode::Hybrid => Capabilities {
                single_moves: true,
                sequences: true,
                snapshots: true,
            },
        }
    }

    fn planner(&self) -> Box<dyn TurnPlanner> {
        match self {
            EngineMode::Interactive => Box::new(MovePlanner::new()),
            _ => Box::new(SequencePlanner::new()),
        }
    }
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineMode::Interactive => "interactive",
            EngineMode::Slicing => "slicing",
            EngineMode::Board => "board",
            EngineMode::Hybrid => "hybrid",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for EngineMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "interactive" | "moves" => Ok(EngineMode::Interactive),
            "slicing" | "sequences" => Ok(EngineMode::Slicing),
            "board" | "boards" => Ok(EngineMode::Board),
            "hybrid" => Ok(EngineMode::Hybrid),
            _ => Err(EngineError::MalformedInput(format!(
                "Unknown engine mode: {}. Available: {}",
                s,
                AVAILABLE_MODES.join(", ")
            ))),
        }
    }
}

/// 引擎配置
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub mode: EngineMode,
    /// 格子编号
    pub template: BoardTemplate,
    /// 骰子随机种子，`None` 时取系统熵
    pub seed: Option<u64>,
}

/// 对局状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    /// 第一手之前，任一方都可以掷
    AwaitingFirstRoll,
    TurnInProgress {
        direction: Direction,
        remaining_dice: Vec<u8>,
    },
    /// 回合结束，下一次掷骰必须来自 `next`
    TurnDone { direction: Direction, next: Direction },
    GameComplete { winner: Direction },
}

/// 双陆棋引擎
pub struct Engine {
    board: Board,
    mode: EngineMode,
    planner: Box<dyn TurnPlanner>,
    roller: DiceRoller,
    current: Direction,
    last_roll: Option<DiceRoll>,
}

impl Engine {
    /// 默认配置（混合模式、标准编号、标准开局）
    pub fn new() -> Self {
        let config = EngineConfig::default();
        Engine::assemble(Board::default(), &config)
    }

    pub fn with_config(config: EngineConfig) -> EngineResult<Self> {
        let board = Board::standard(config.template.clone())?;
        Ok(Engine::assemble(board, &config))
    }

    /// 从任意布局开始
    pub fn from_layout(layout: &Layout, config: EngineConfig) -> EngineResult<Self> {
        let board = Board::from_layout(config.template.clone(), layout)?;
        Ok(Engine::assemble(board, &config))
    }

    pub fn from_notation(notation: &str, config: EngineConfig) -> EngineResult<Self> {
        let layout: Layout = notation.parse()?;
        Engine::from_layout(&layout, config)
    }

    /// 从模式名称创建
    pub fn from_mode(name: &str, config: EngineConfig) -> EngineResult<Self> {
        let mode: EngineMode = name.parse()?;
        Engine::with_config(EngineConfig { mode, ..config })
    }

    fn assemble(board: Board, config: &EngineConfig) -> Self {
        Engine {
            board,
            mode: config.mode,
            planner: config.mode.planner(),
            roller: DiceRoller::new(config.seed),
            current: Direction::None,
            last_roll: None,
        }
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn capabilities(&self) -> Capabilities {
        self.mode.capabilities()
    }

    /// 开始一个回合
    pub fn apply_dice_roll(&mut self, direction: Direction, roll: DiceRoll) -> EngineResult<()> {
        if self.board.is_game_complete() {
            return Err(EngineError::IllegalTurn("game is already complete".to_string()));
        }
        if !self.planner.is_turn_done() {
            return Err(EngineError::IllegalTurn(format!(
                "turn of {} is still in progress",
                self.current
            )));
        }
        if !direction.is_playing() {
            return Err(EngineError::IllegalTurn("a roll needs a playing direction".to_string()));
        }
        if self.current.is_playing() && direction != self.current.reverse() {
            return Err(EngineError::IllegalTurn(format!(
                "expected a roll from {}, got {}",
                self.current.reverse(),
                direction
            )));
        }

        self.planner.begin_turn(&mut self.board, &roll, direction)?;
        self.current = direction;
        self.last_roll = Some(roll);
        debug!("{} rolled {}", direction, roll);
        if self.planner.is_turn_done() {
            debug!("{} has no playable dice", direction);
        }
        Ok(())
    }

    /// 用引擎自己的骰子掷一次
    pub fn roll(&mut self, direction: Direction) -> EngineResult<DiceRoll> {
        let roll = self.roller.roll();
        self.apply_dice_roll(direction, roll)?;
        Ok(roll)
    }

    fn check_active(&self, direction: Direction) -> EngineResult<()> {
        if self.board.is_game_complete() {
            return Err(EngineError::IllegalTurn("game is already complete".to_string()));
        }
        if !direction.is_playing() || direction != self.current {
            return Err(EngineError::IllegalTurn(format!(
                "{} is not the active direction",
                direction
            )));
        }
        if self.planner.is_turn_done() {
            return Err(EngineError::IllegalTurn(format!("turn of {} is done", direction)));
        }
        Ok(())
    }

    fn require(&self, enabled: bool, what: &'static str) -> EngineResult<()> {
        if enabled {
            Ok(())
        } else {
            Err(EngineError::Unsupported(what))
        }
    }

    fn after_execute(&self, direction: Direction, transitions: &[Transition]) {
        debug!("{} played {} transitions", direction, transitions.len());
        if self.board.is_game_complete() {
            debug!("{} wins", self.board.winning_direction());
        } else if self.planner.is_turn_done() {
            debug!("turn of {} finished", direction);
        }
    }

    /// 执行一个复合走法
    pub fn execute(&mut self, direction: Direction, mv: &Move) -> EngineResult<Vec<Transition>> {
        self.require(self.capabilities().single_moves, "single moves")?;
        self.check_active(direction)?;
        let transitions = self.planner.execute(&mut self.board, mv, direction)?;
        self.after_execute(direction, &transitions);
        Ok(transitions)
    }

    /// 按起点和终点执行；多个候选时取用骰最多的，再取排序最前的
    pub fn execute_between(
        &mut self,
        direction: Direction,
        source: &str,
        target: &str,
    ) -> EngineResult<Vec<Transition>> {
        self.require(self.capabilities().single_moves, "single moves")?;
        self.check_active(direction)?;
        let chosen = self
            .planner
            .legal_moves()
            .into_iter()
            .filter(|mv| mv.connects(source, target))
            .min_by(|a, b| b.dice_count().cmp(&a.dice_count()).then_with(|| a.cmp(b)))
            .ok_or_else(|| {
                EngineError::IllegalMove(format!("no legal move from {} to {}", source, target))
            })?;
        self.execute(direction, &chosen)
    }

    /// 走完一条剩余序列
    pub fn select_sequence(
        &mut self,
        direction: Direction,
        sequence: &[Transition],
    ) -> EngineResult<Vec<Transition>> {
        self.require(self.capabilities().sequences, "whole-turn sequences")?;
        self.check_active(direction)?;
        let transitions = self.planner.commit(&mut self.board, sequence, direction)?;
        self.after_execute(direction, &transitions);
        Ok(transitions)
    }

    /// 选择一个结果棋盘，返回到达它的转移
    pub fn choose_board(
        &mut self,
        direction: Direction,
        target: &BoardSnapshot,
    ) -> EngineResult<Vec<Transition>> {
        self.require(self.capabilities().snapshots, "board snapshots")?;
        self.check_active(direction)?;
        let sequence = self
            .planner
            .sequences()
            .and_then(|sequences| {
                sequences
                    .iter()
                    .find(|(_, snapshot)| *snapshot == target)
                    .map(|(sequence, _)| sequence.clone())
            })
            .ok_or_else(|| EngineError::IllegalMove(format!("board {} is not reachable", target)))?;
        let transitions = self.planner.commit(&mut self.board, &sequence, direction)?;
        self.after_execute(direction, &transitions);
        Ok(transitions)
    }

    pub fn legal_moves(&self) -> EngineResult<Vec<Move>> {
        self.require(self.capabilities().single_moves, "single moves")?;
        Ok(self.planner.legal_moves())
    }

    /// 剩余的最长序列（已走部分不含在内）
    pub fn legal_sequences(&self) -> EngineResult<Vec<Vec<Transition>>> {
        self.require(self.capabilities().sequences, "whole-turn sequences")?;
        Ok(self
            .planner
            .sequences()
            .map(|sequences| {
                sequences
                    .keys()
                    .filter(|sequence| !sequence.is_empty())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    /// 本回合可以到达的不同棋盘
    pub fn board_choices(&self) -> EngineResult<BTreeSet<BoardSnapshot>> {
        self.require(self.capabilities().snapshots, "board snapshots")?;
        Ok(self
            .planner
            .sequences()
            .map(|sequences| sequences.values().cloned().collect())
            .unwrap_or_default())
    }

    /// 当前回合的方向，第一手之前为 `None`
    pub fn current_direction(&self) -> Direction {
        self.current
    }

    pub fn is_turn_done(&self) -> bool {
        self.planner.is_turn_done()
    }

    pub fn is_game_complete(&self) -> bool {
        self.board.is_game_complete()
    }

    pub fn winning_direction(&self) -> Direction {
        self.board.winning_direction()
    }

    pub fn losing_direction(&self) -> Direction {
        self.board.winning_direction().reverse()
    }

    pub fn remaining_dice(&self) -> Vec<u8> {
        self.planner.remaining_dice()
    }

    pub fn last_roll(&self) -> Option<DiceRoll> {
        self.last_roll
    }

    pub fn current_board(&self) -> BoardSnapshot {
        self.board.snapshot()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> EngineState {
        if self.board.is_game_complete() {
            EngineState::GameComplete {
                winner: self.board.winning_direction(),
            }
        } else if !self.current.is_playing() {
            EngineState::AwaitingFirstRoll
        } else if self.planner.is_turn_done() {
            EngineState::TurnDone {
                direction: self.current,
                next: self.current.reverse(),
            }
        } else {
            EngineState::TurnInProgress {
                direction: self.current,
                remaining_dice: self.planner.remaining_dice(),
            }
        }
    }

    /// 恢复标准开局并清空回合状态
    pub fn reset(&mut self) {
        self.board.reset();
        self.planner.clear();
        self.current = Direction::None;
        self.last_roll = None;
        debug!("engine reset");
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}
