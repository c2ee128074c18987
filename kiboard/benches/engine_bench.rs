use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kiboard::prelude::*;
use kiboard::parser::BoardParser;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn all_rules(fix: bool) -> CheckOptions {
    CheckOptions {
        via_annular_ring: Some(5.0),
        via_drill_width: Some(10.0),
        trace_width: Some(6.0),
        text_thickness: Some(0.15),
        fix,
        ..Default::default()
    }
}

fn bench_parse_board(c: &mut Criterion) {
    c.bench_function("parse_board", |b| {
        b.iter(|| kiboard::load_board(black_box(&fixture_path("violations_board.kicad_pcb"))));
    });
}

fn bench_check(c: &mut Criterion) {
    let board = kiboard::load_board(&fixture_path("violations_board.kicad_pcb")).unwrap();
    let options = all_rules(false);

    c.bench_function("check_board", |b| {
        b.iter(|| {
            let mut board = board.clone();
            KiboardCore::check_loaded(black_box(&mut board), &options)
        });
    });
}

fn bench_fix_and_render(c: &mut Criterion) {
    let content = std::fs::read_to_string(fixture_path("violations_board.kicad_pcb")).unwrap();
    let options = all_rules(true);

    c.bench_function("fix_and_render", |b| {
        b.iter(|| {
            let mut board = BoardParser::parse_str(black_box(&content), "bench").unwrap();
            KiboardCore::check_loaded(&mut board, &options);
            kiboard::BoardWriter::render(&board)
        });
    });
}

criterion_group!(benches, bench_parse_board, bench_check, bench_fix_and_render);
criterion_main!(benches);
