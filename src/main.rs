//! Backgammon Engine CLI
//!
//! 命令行界面，用于查看走法、预测序列、自对弈与局面展开
//!
//! 支持两种模式：
//! 1. 单次命令模式：每次执行一个命令
//! 2. Server 模式：长驻进程，通过 stdin/stdout 通信

use backgammon_engine::test_positions::get_position;
use backgammon_engine::{
    generate_moves, predict, Board, BoardSnapshot, DiceRoll, DiceRoller, Direction, Engine,
    EngineConfig, EngineError, EngineResult, Layout, StateExpander, Transition, DEFAULT_MODE,
};
use clap::{Parser, Subcommand};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "backgammon-engine")]
#[command(about = "Backgammon rules engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出合法复合走法
    Moves {
        /// 布局记谱或命名局面（如 START）
        #[arg(long, default_value = "START")]
        layout: String,

        /// 行棋方向 (forward, backward)
        #[arg(long, default_value = "forward")]
        direction: String,

        /// 骰子，如 6,5
        #[arg(long)]
        dice: String,

        /// JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 列出整回合最长序列及结果局面
    Sequences {
        /// 布局记谱或命名局面
        #[arg(long, default_value = "START")]
        layout: String,

        /// 行棋方向
        #[arg(long, default_value = "forward")]
        direction: String,

        /// 骰子，如 6,5
        #[arg(long)]
        dice: String,

        /// JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 随机自对弈（可复现）
    Play {
        /// 随机种子
        #[arg(long)]
        seed: Option<u64>,

        /// 引擎模式 (interactive, slicing, board, hybrid)
        #[arg(long, default_value = DEFAULT_MODE)]
        mode: String,

        /// 最多回合数
        #[arg(long, default_value = "500")]
        max_turns: usize,

        /// JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 局面展开统计
    Expand {
        /// 布局记谱或命名局面
        #[arg(long, default_value = "START")]
        layout: String,

        /// 先行方向
        #[arg(long, default_value = "forward")]
        direction: String,

        /// 展开层数
        #[arg(long, default_value = "1")]
        depth: usize,

        /// JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 启动 server 模式（stdin/stdout 通信）
    Server,
}

#[derive(Serialize, Deserialize)]
struct MovesResponse {
    moves: Vec<String>,
    total: usize,
}

#[derive(Serialize, Deserialize, Clone)]
struct SequenceResult {
    transitions: Vec<String>,
    board: String,
}

#[derive(Serialize, Deserialize)]
struct TurnRecord {
    turn: usize,
    direction: Direction,
    roll: String,
    transitions: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct PlayResponse {
    turns: Vec<TurnRecord>,
    winner: Direction,
    board: String,
}

// Server 模式的请求和响应结构
#[derive(Serialize, Deserialize)]
struct ServerRequest {
    cmd: String,
    #[serde(default)]
    layout: Option<String>,
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    dice: Option<Vec<u8>>,
    #[serde(default)]
    depth: Option<usize>,
}

#[derive(Serialize, Deserialize, Default)]
struct ServerResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    moves: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sequences: Option<Vec<SequenceResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nodes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    leaves: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ServerResponse {
    fn success_moves(moves: Vec<String>) -> Self {
        Self {
            ok: true,
            moves: Some(moves),
            ..Default::default()
        }
    }

    fn success_sequences(sequences: Vec<SequenceResult>) -> Self {
        Self {
            ok: true,
            sequences: Some(sequences),
            ..Default::default()
        }
    }

    fn success_expand(nodes: usize, leaves: usize, elapsed_ms: f64) -> Self {
        Self {
            ok: true,
            nodes: Some(nodes),
            leaves: Some(leaves),
            elapsed_ms: Some(elapsed_ms),
            ..Default::default()
        }
    }

    fn error(msg: &str) -> Self {
        Self {
            ok: false,
            error: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

/// 命名局面或记谱
fn resolve_layout(text: &str) -> EngineResult<Layout> {
    get_position(text).unwrap_or(text).parse()
}

fn print_json<T: Serialize>(value: &T, pretty: bool) {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match text {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn exit_on_error<T>(result: EngineResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn transitions_to_strings(transitions: &[Transition]) -> Vec<String> {
    transitions.iter().map(|t| t.to_string()).collect()
}

fn list_moves(layout: &str, direction: Direction, roll: &DiceRoll) -> EngineResult<Vec<String>> {
    let board = Board::from_layout(Default::default(), &resolve_layout(layout)?)?;
    Ok(generate_moves(&board, &roll.values(), direction)
        .iter()
        .map(|mv| mv.to_string())
        .collect())
}

fn list_sequences(
    layout: &str,
    direction: Direction,
    roll: &DiceRoll,
) -> EngineResult<Vec<SequenceResult>> {
    let mut board = Board::from_layout(Default::default(), &resolve_layout(layout)?)?;
    Ok(predict(&mut board, roll, direction)?
        .into_iter()
        .map(|(sequence, snapshot)| SequenceResult {
            transitions: transitions_to_strings(&sequence),
            board: snapshot.to_string(),
        })
        .collect())
}

/// 返回 (节点数, 叶子数, 耗时毫秒)
fn expand_counts(
    layout: &str,
    direction: Direction,
    depth: usize,
) -> EngineResult<(usize, usize, f64)> {
    let root = BoardSnapshot::from_layout(&resolve_layout(layout)?);
    let start = Instant::now();
    let mut expander = StateExpander::<()>::new();
    expander.expand(&root, direction, depth)?;
    let stats = expander.stats();
    Ok((stats.nodes, stats.leaves, start.elapsed().as_secs_f64() * 1000.0))
}

fn self_play(seed: Option<u64>, mode: &str, max_turns: usize) -> EngineResult<PlayResponse> {
    let config = EngineConfig {
        seed,
        ..Default::default()
    };
    let mut engine = Engine::from_mode(mode, config)?;
    // 选择走法用单独的随机源，骰子序列只取决于种子
    let mut chooser = DiceRoller::new(seed.map(|s| s.wrapping_add(1)));
    let mut direction = Direction::Forward;
    let mut turns = Vec::new();

    for turn in 1..=max_turns {
        if engine.is_game_complete() {
            break;
        }
        let roll = engine.roll(direction)?;
        let mut played = Vec::new();
        while !engine.is_turn_done() {
            let rng = chooser.rng_mut();
            if engine.capabilities().single_moves {
                let moves = engine.legal_moves()?;
                let Some(mv) = moves.choose(rng) else {
                    break;
                };
                played.extend(engine.execute(direction, mv)?);
            } else {
                let boards: Vec<BoardSnapshot> = engine.board_choices()?.into_iter().collect();
                let Some(target) = boards.choose(rng) else {
                    break;
                };
                played.extend(engine.choose_board(direction, target)?);
            }
        }
        turns.push(TurnRecord {
            turn,
            direction,
            roll: roll.to_string(),
            transitions: transitions_to_strings(&played),
        });
        direction = direction.reverse();
    }

    Ok(PlayResponse {
        turns,
        winner: engine.winning_direction(),
        board: engine.current_board().to_string(),
    })
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Moves {
            layout,
            direction,
            dice,
            json,
        } => {
            let direction: Direction = exit_on_error(direction.parse());
            let roll: DiceRoll = exit_on_error(dice.parse());
            let moves = exit_on_error(list_moves(&layout, direction, &roll));
            if json {
                let response = MovesResponse {
                    total: moves.len(),
                    moves,
                };
                print_json(&response, true);
            } else {
                println!("Legal moves for {} {} ({}):", direction, roll, moves.len());
                for mv in &moves {
                    println!("  {}", mv);
                }
            }
        }

        Commands::Sequences {
            layout,
            direction,
            dice,
            json,
        } => {
            let direction: Direction = exit_on_error(direction.parse());
            let roll: DiceRoll = exit_on_error(dice.parse());
            let sequences = exit_on_error(list_sequences(&layout, direction, &roll));
            if json {
                print_json(&sequences, true);
            } else {
                println!("Sequences for {} {} ({}):", direction, roll, sequences.len());
                for sequence in &sequences {
                    println!("  {} => {}", sequence.transitions.join(" "), sequence.board);
                }
            }
        }

        Commands::Play {
            seed,
            mode,
            max_turns,
            json,
        } => {
            let result = exit_on_error(self_play(seed, &mode, max_turns));
            if json {
                print_json(&result, true);
            } else {
                for record in &result.turns {
                    println!(
                        "{:>4} {:<8} {}  {}",
                        record.turn,
                        record.direction,
                        record.roll,
                        record.transitions.join(" ")
                    );
                }
                println!("\nWinner: {}", result.winner);
                println!("Board: {}", result.board);
            }
        }

        Commands::Expand {
            layout,
            direction,
            depth,
            json,
        } => {
            let direction: Direction = exit_on_error(direction.parse());
            let (nodes, leaves, elapsed_ms) =
                exit_on_error(expand_counts(&layout, direction, depth));
            if json {
                print_json(&ServerResponse::success_expand(nodes, leaves, elapsed_ms), true);
            } else {
                println!(
                    "Expanded {} layers: nodes={}, leaves={}, time={:.1}ms",
                    depth, nodes, leaves, elapsed_ms
                );
            }
        }

        Commands::Server => {
            run_server();
        }
    }
}

/// Server 模式主循环
/// 从 stdin 读取 JSON 请求，返回 JSON 响应到 stdout
fn run_server() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        // 空行跳过
        if line.trim().is_empty() {
            continue;
        }

        let request: ServerRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                print_json(&ServerResponse::error(&format!("Invalid JSON: {}", e)), false);
                let _ = stdout.flush();
                continue;
            }
        };

        let response = match request.cmd.as_str() {
            "moves" => handle_moves_request(&request),
            "sequences" => handle_sequences_request(&request),
            "expand" => handle_expand_request(&request),
            "quit" => break,
            _ => ServerResponse::error(&format!("Unknown command: {}", request.cmd)),
        };

        print_json(&response, false);
        let _ = stdout.flush();
    }
}

/// 请求中的布局、方向和骰子
fn request_position(
    request: &ServerRequest,
) -> EngineResult<(String, Direction, Option<DiceRoll>)> {
    let layout = request.layout.clone().unwrap_or_else(|| "START".to_string());
    let direction = request.direction.as_deref().unwrap_or("forward").parse()?;
    let roll = match request.dice.as_deref() {
        None => None,
        Some([a, b]) => Some(DiceRoll::new(*a, *b)?),
        Some(other) => {
            return Err(EngineError::MalformedInput(format!(
                "dice must hold two values, got {}",
                other.len()
            )))
        }
    };
    Ok((layout, direction, roll))
}

fn required_roll(roll: Option<DiceRoll>) -> EngineResult<DiceRoll> {
    roll.ok_or_else(|| EngineError::MalformedInput("missing dice".to_string()))
}

/// 处理 moves 命令
fn handle_moves_request(request: &ServerRequest) -> ServerResponse {
    let result = request_position(request)
        .and_then(|(layout, direction, roll)| {
            list_moves(&layout, direction, &required_roll(roll)?)
        });
    match result {
        Ok(moves) => ServerResponse::success_moves(moves),
        Err(e) => ServerResponse::error(&e.to_string()),
    }
}

/// 处理 sequences 命令
fn handle_sequences_request(request: &ServerRequest) -> ServerResponse {
    let result = request_position(request)
        .and_then(|(layout, direction, roll)| {
            list_sequences(&layout, direction, &required_roll(roll)?)
        });
    match result {
        Ok(sequences) => ServerResponse::success_sequences(sequences),
        Err(e) => ServerResponse::error(&e.to_string()),
    }
}

/// 处理 expand 命令
fn handle_expand_request(request: &ServerRequest) -> ServerResponse {
    let depth = request.depth.unwrap_or(1);
    let result = request_position(request)
        .and_then(|(layout, direction, _)| expand_counts(&layout, direction, depth));
    match result {
        Ok((nodes, leaves, elapsed_ms)) => {
            ServerResponse::success_expand(nodes, leaves, elapsed_ms)
        }
        Err(e) => ServerResponse::error(&e.to_string()),
    }
}
