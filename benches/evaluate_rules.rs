use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use wals_universals::classifier::{compare, ClassifierConfig};
use wals_universals::{all_rules, evaluate, FeatureCode, LanguageRecord, WideTable};

const ORDERS: [&str; 6] = ["SOV", "SVO", "VSO", "VOS", "OSV", "No dominant order"];
const ADPOSITIONS: [&str; 3] = ["Postpositions", "Prepositions", "Inpositions"];
const NOUN_ORDERS: [&str; 3] = ["Adjective-Noun", "Noun-Adjective", "No dominant order"];
const CASES: [&str; 4] = ["none", "2-4", "5+", "borderline"];

/// Deterministic table with every feature column and some gaps
fn synthetic_table(n: usize) -> WideTable {
    let records = (0..n)
        .map(|i| {
            let pick = |values: &[&'static str], salt: usize| {
                let k = (i * 31 + salt * 17) % (values.len() + 1);
                values.get(k).copied()
            };
            FeatureCode::ALL
                .iter()
                .enumerate()
                .fold(LanguageRecord::new(format!("l{:05}", i)), |record, (salt, &code)| {
                    let value = match code {
                        FeatureCode::WordOrder => pick(&ORDERS, salt),
                        FeatureCode::AdpositionOrder => pick(&ADPOSITIONS, salt),
                        FeatureCode::CaseCountBucket => pick(&CASES, salt),
                        _ => pick(&NOUN_ORDERS, salt),
                    };
                    record.with_feature(code, value)
                })
        })
        .collect();
    WideTable {
        features: FeatureCode::ALL.to_vec(),
        records,
    }
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_rules");
    let rules = all_rules();

    for n in [1_000_usize, 10_000] {
        let table = synthetic_table(n);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("all_rules", n), &table, |b, table| {
            b.iter(|| black_box(evaluate(black_box(table), &rules)));
        });
    }

    group.finish();
}

fn bench_classifier(c: &mut Criterion) {
    let table = synthetic_table(2_000);
    let config = ClassifierConfig::default();

    c.bench_function("compare_classifiers_2000", |b| {
        b.iter(|| black_box(compare(black_box(&table), &config)))
    });
}

criterion_group!(benches, bench_evaluate, bench_classifier);
criterion_main!(benches);
