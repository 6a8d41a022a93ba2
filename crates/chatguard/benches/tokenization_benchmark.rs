use chatguard::budget::TokenBudgetGuard;
use chatguard::models::message::Message;
use chatguard::models::profile::ModelCatalog;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn benchmark_estimation(c: &mut Criterion) {
    let guard = TokenBudgetGuard::new().unwrap();
    let catalog = ModelCatalog::builtin();
    let lengths = [1_000, 10_000, 50_000, 100_000];
    let models = ["gpt-4o", "gpt-4-turbo"];

    for &length in &lengths {
        for model_name in models {
            let profile = catalog.get(model_name).unwrap();
            let log = vec![
                Message::user().with_text("hello ".repeat(length)),
                Message::assistant().with_text("ok"),
            ];
            c.bench_function(&format!("{}_{}_words", model_name, length), |b| {
                b.iter(|| guard.can_submit(black_box(&log), profile))
            });
        }
    }
}

criterion_group!(benches, benchmark_estimation);
criterion_main!(benches);
