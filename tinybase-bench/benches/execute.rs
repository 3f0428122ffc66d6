use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::tempdir;
use tinybase::Engine;
use tinybase_storage::StorageConfig;

fn seeded_engine() -> (Engine, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open_with_config(dir.path(), StorageConfig { fsync: false }).unwrap();
    engine
        .execute("CREATE TABLE emp (id INT PRIMARY KEY, dept INT, salary INT)")
        .unwrap();
    for id in 0..500i64 {
        engine
            .execute(&format!(
                "INSERT INTO emp VALUES ({}, {}, {})",
                id,
                id % 10,
                50_000 + (id % 37) * 1_000
            ))
            .unwrap();
    }
    (engine, dir)
}

fn execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute");

    let (mut engine, _dir) = seeded_engine();

    group.bench_function("point select on indexed primary key", |b| {
        b.iter(|| black_box(engine.execute("SELECT * FROM emp WHERE id = 250").unwrap()));
    });

    group.bench_function("grouped aggregate over 500 rows", |b| {
        b.iter(|| {
            black_box(
                engine
                    .execute("SELECT dept, COUNT(*), AVG(salary) FROM emp GROUP BY dept HAVING COUNT(*) >= 10")
                    .unwrap(),
            )
        });
    });
}

criterion_group!(benches, execute);
criterion_main!(benches);
