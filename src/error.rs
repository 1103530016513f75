//! 引擎错误类型
//!
//! 所有错误都来自调用方输入，不存在可重试的内部故障

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// 行棋方向或回合顺序错误（抢先掷骰、回合未结束、对局已结束）
    #[error("illegal turn: {0}")]
    IllegalTurn(String),

    /// 选择的走法不在当前合法集合中
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// 构造输入格式错误（形状、编号、骰子点数、记谱）
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// 当前引擎模式不支持该操作
    #[error("unsupported in this engine mode: {0}")]
    Unsupported(&'static str),
}

pub type EngineResult<T> = Result<T, EngineError>;
