use criterion::{black_box, criterion_group, criterion_main, Criterion};

use std::path::Path;

use rubricforge_core::merge::parse_score_table;
use rubricforge_core::model::Domain;
use rubricforge_core::parser::{builtin_rubric_source, parse_rubric_str};

fn bench_parse_rubric(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_rubric");

    for domain in Domain::ALL {
        let source = builtin_rubric_source(domain);
        group.bench_function(domain.to_string(), |b| {
            b.iter(|| parse_rubric_str(black_box(source), Path::new("bench.toml")))
        });
    }

    group.finish();
}

fn bench_parse_score_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_score_table");

    let table = {
        let mut s = String::from("需求文档                 总分         得分率\n");
        s.push_str(&"-".repeat(80));
        s.push('\n');
        for i in 0..500 {
            s.push_str(&format!("{:<20} {:>6.1}       {:>6.2}\n", format!("model-{i}"), i as f64 / 10.0, i as f64 / 5.0));
        }
        s
    };

    group.bench_function("rows=500", |b| {
        b.iter(|| parse_score_table(black_box(&table)))
    });

    group.finish();
}

criterion_group!(benches, bench_parse_rubric, bench_parse_score_table);
criterion_main!(benches);
