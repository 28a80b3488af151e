use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tally_store::{ScanStrategy, TailReader};

/// Write a transaction-shaped log with `rows` data rows.
fn write_log(path: &Path, rows: u64) {
    let mut out = BufWriter::new(File::create(path).unwrap());
    writeln!(
        out,
        "transaction_id,started_at,account_id,display_name,type,amount,currency,resulting_balance,\
         counterparty_account_id,counterparty_display_name,reference_number,completed_at,status,remarks"
    )
    .unwrap();
    for i in 1..=rows {
        writeln!(
            out,
            "{i},2024-05-01T09:30:00.000000Z,{},Holder {},deposit,10.00,HKD,{}.00,,,{i},\
             2024-05-01T09:30:00.100000Z,completed,",
            i % 97 + 1,
            i % 97 + 1,
            i * 10
        )
        .unwrap();
    }
    out.flush().unwrap();
}

fn bench_tail_read(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let mut group = c.benchmark_group("tail_read");

    for rows in [1_000u64, 100_000] {
        let path = dir.path().join(format!("log_{rows}.csv"));
        write_log(&path, rows);

        for strategy in [ScanStrategy::BackwardChunks, ScanStrategy::FullScan] {
            let reader = TailReader::new().with_strategy(strategy);
            group.bench_with_input(
                BenchmarkId::new(format!("{strategy:?}"), rows),
                &path,
                |b, path| {
                    b.iter(|| {
                        black_box(
                            reader
                                .extract_last_record(path, &["transaction_id", "reference_number"])
                                .unwrap(),
                        )
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_tail_read);
criterion_main!(benches);
