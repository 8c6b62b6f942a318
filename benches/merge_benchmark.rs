use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sf_lvars_rs::analysis::merge_var;
use sf_lvars_rs::ast::{CTreeBuilder, LVar, LVars, NodeId, VarLocation};
use sf_lvars_rs::CFunc;

/// `v0 = a1;` followed by `reads` statements of the form `return v0 + v0;`
fn wide_function(reads: usize) -> (CFunc, NodeId) {
    let mut b = CTreeBuilder::new();
    let copy = b.copy_stmt(0x1004, 0, 1);
    b.push_stmt(copy.stmt);
    for i in 0..reads {
        let l = b.var(0);
        let r = b.var(0);
        let sum = b.add(l, r);
        let ret = b.ret(0x1008 + 4 * i as u64, Some(sum));
        b.push_stmt(ret);
    }
    let mut lvars = LVars::new();
    lvars.push(LVar::new("v0", VarLocation::Register { reg: 0 }, 0x1004, 4));
    lvars.push(LVar::new("a1", VarLocation::Register { reg: 1 }, 0x1000, 4));
    (CFunc::new(0x1000, b.finish(), lvars), copy.asg)
}

fn merge_benchmark(c: &mut Criterion) {
    let (cfunc, asg) = wide_function(64);
    c.bench_function("merge_var_128_reads", |b| {
        b.iter(|| {
            let mut cfunc = cfunc.clone();
            black_box(merge_var(&mut cfunc, asg).unwrap());
        });
    });
}

criterion_group!(benches, merge_benchmark);
criterion_main!(benches);
