use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    let short = "SELECT * FROM widgets WHERE id = 1";
    let long = "
        SELECT e.id, e.dept, s.name, AVG(e.salary)
        FROM emp e
        JOIN staff s ON e.id = s.emp_id
        WHERE e.salary > 50000 AND e.dept IN (1, 2, 3)
        GROUP BY e.dept, s.name
        HAVING COUNT(*) >= 3
        ORDER BY e.dept DESC
        LIMIT 50
        ";

    group.bench_function("short select", |b| {
        b.iter(|| black_box(tinybase_parser::parse(short).unwrap()));
    });

    group.bench_function("joined group-by select", |b| {
        b.iter(|| black_box(tinybase_parser::parse(long).unwrap()));
    });
}

criterion_group!(benches, parse);
criterion_main!(benches);
