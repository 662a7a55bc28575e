use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chrono::NaiveDate;
use rubricforge_core::aggregate::Grade;
use rubricforge_core::engine::EvalEngine;
use rubricforge_core::merge::{merge_scores, ScoreTable};
use rubricforge_core::model::{Artifact, Domain};
use rubricforge_core::parser::builtin_rubric;
use rubricforge_core::traits::EvalContext;

fn requirement_document(repeat: usize) -> String {
    let section = "\
## 功能需求
系统应当支持用户注册、登录、书籍搜索和发布图书，订单管理模块支持自提与自付款。
当用户提交订单时，系统应当在 3 秒内返回结果，最多 20 条记录。

## 非功能需求
响应时间 < 200 毫秒，支持 500 个用户同时在线，可用性 99%。

## 技术约束
前端使用 Vue 与 Arco.Design，后端使用 FastAPI，数据库使用 MySQL 和 SQLModel，端口 8080。
";
    section.repeat(repeat)
}

fn bench_engine_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_run");
    let engine = match builtin_rubric(Domain::Requirement) {
        Ok(rubric) => EvalEngine::new(rubric),
        Err(e) => panic!("built-in rubric failed to parse: {e:#}"),
    };
    let ctx = EvalContext::default();
    let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

    for repeat in [1, 10, 100] {
        let artifact = Artifact::from_text("需求说明.md", requirement_document(repeat));
        group.bench_function(format!("requirement_x{repeat}"), |b| {
            b.iter(|| engine.run(black_box(&artifact), black_box(&ctx), date))
        });
    }

    group.finish();
}

fn bench_grade(c: &mut Criterion) {
    c.bench_function("grade_from_percentage", |b| {
        b.iter(|| {
            for p in 0..=100 {
                black_box(Grade::from_percentage(black_box(p as f64)));
            }
        })
    });
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_scores");

    for size in [10, 100, 1000] {
        let mut a = ScoreTable::new();
        let mut b = ScoreTable::new();
        for i in 0..size {
            a.insert(format!("model-{i}"), i as f64, i as f64 / 2.0);
            b.insert(format!("model-{}", i + size / 2), i as f64, i as f64 / 2.0);
        }
        group.bench_function(format!("rows={size}"), |bench| {
            bench.iter(|| merge_scores(black_box(&a), black_box(&b)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_engine_run, bench_grade, bench_merge);
criterion_main!(benches);
