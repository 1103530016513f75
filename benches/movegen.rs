//! 走法生成与序列预测基准

use backgammon_engine::test_positions::*;
use backgammon_engine::{generate_moves, predict, Board, DiceRoll, Direction, ALL_DICE_ROLLS};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_generate_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_moves");
    let positions = [
        ("start", START),
        ("forced_composite", FORCED_COMPOSITE),
        ("collect", MOVE_AND_COLLECT),
    ];
    for (name, notation) in positions {
        let board = Board::from_notation(notation).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| {
                for roll in ALL_DICE_ROLLS.iter() {
                    black_box(generate_moves(&board, &roll.values(), Direction::Forward));
                }
            })
        });
    }
    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict");
    let mut board = Board::from_notation(START).unwrap();
    let double = DiceRoll::new(3, 3).unwrap();
    group.bench_function("start_double", |b| {
        b.iter(|| black_box(predict(&mut board, &double, Direction::Forward).unwrap()))
    });
    group.bench_function("start_all_rolls", |b| {
        b.iter(|| {
            for roll in ALL_DICE_ROLLS.iter() {
                black_box(predict(&mut board, roll, Direction::Forward).unwrap());
            }
        })
    });
    group.finish();
}

criterion_group!(benches, bench_generate_moves, bench_predict);
criterion_main!(benches);
