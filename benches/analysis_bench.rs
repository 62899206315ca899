/// Benchmarks for the callorder analysis pipeline.
///
/// Run with: `cargo bench`
///
/// - Normalization of long attribute/binary-heavy instruction streams
/// - Full analysis at various program sizes
/// - Parallel vs sequential per-function passes

use callorder::application::analyze;
use callorder::domain::index::{ClassInfo, FunctionName, FunctionSignature};
use callorder::domain::instruction::{BinaryOp, OpKind, Operation};
use callorder::domain::normalize::normalize;
use callorder::domain::program::{FunctionBody, Program};
use callorder::infrastructure::AnalysisConfig;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

// ═══════════════════════════════════════════════════════════════════════════
// Synthetic Data Generators
// ═══════════════════════════════════════════════════════════════════════════

/// A layered program: function `i` calls the next `fan_out` functions, plus
/// one method call on a known class per body.
fn create_synthetic_program(num_functions: usize, fan_out: usize) -> Program {
    let functions = (0..num_functions)
        .map(|i| {
            let mut instructions = Vec::new();
            for j in (i + 1)..(i + 1 + fan_out).min(num_functions) {
                instructions.push(Operation::load(OpKind::LoadGlobal, &format!("func_{}", j)));
                instructions.push(Operation::load(OpKind::LoadFast, "arg"));
                instructions.push(Operation::load(OpKind::LoadConst, "1"));
                instructions.push(Operation::bare(OpKind::Binary(BinaryOp::Add)));
                instructions.push(Operation::call(1));
                instructions.push(Operation::bare(OpKind::Other));
            }
            instructions.push(Operation::load(OpKind::LoadGlobal, "Registry"));
            instructions.push(Operation::load(OpKind::LoadAttr, "touch"));
            instructions.push(Operation::call(0));
            FunctionBody::new(
                FunctionSignature::new(FunctionName::Plain(format!("func_{}", i)), 1),
                instructions,
            )
        })
        .collect();

    Program {
        functions,
        classes: vec![ClassInfo::new("Registry")],
    }
}

/// `obj.a0.a1...(x + y)` repeated `calls` times.
fn create_instruction_stream(calls: usize, depth: usize) -> Vec<Operation> {
    let mut ops = Vec::new();
    for _ in 0..calls {
        ops.push(Operation::load(OpKind::LoadFast, "obj"));
        for d in 0..depth {
            ops.push(Operation::load(OpKind::LoadAttr, &format!("a{}", d)));
        }
        ops.push(Operation::load(OpKind::LoadFast, "x"));
        ops.push(Operation::load(OpKind::LoadFast, "y"));
        ops.push(Operation::bare(OpKind::Binary(BinaryOp::Add)));
        ops.push(Operation::call(1));
        ops.push(Operation::bare(OpKind::Other));
    }
    ops
}

// ═══════════════════════════════════════════════════════════════════════════
// Normalizer Benchmarks
// ═══════════════════════════════════════════════════════════════════════════

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for calls in [10, 100, 1000].iter() {
        let ops = create_instruction_stream(*calls, 4);
        group.throughput(Throughput::Elements(ops.len() as u64));
        group.bench_with_input(BenchmarkId::new("calls", calls), &ops, |b, ops| {
            b.iter(|| normalize(black_box(ops)))
        });
    }

    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// Full Pipeline Benchmarks
// ═══════════════════════════════════════════════════════════════════════════

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze/full_pipeline");

    for num_functions in [100, 1000, 5000].iter() {
        let program = create_synthetic_program(*num_functions, 3);
        group.throughput(Throughput::Elements(*num_functions as u64));

        let parallel = AnalysisConfig::default();
        group.bench_with_input(
            BenchmarkId::new("parallel", num_functions),
            &program,
            |b, program| b.iter(|| analyze(black_box(program), &parallel)),
        );

        let sequential = AnalysisConfig {
            parallel: false,
            ..AnalysisConfig::default()
        };
        group.bench_with_input(
            BenchmarkId::new("sequential", num_functions),
            &program,
            |b, program| b.iter(|| analyze(black_box(program), &sequential)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_analyze);
criterion_main!(benches);
