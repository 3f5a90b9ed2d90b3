//! Blob encoding benchmarks
//!
//! Compare typed groups against `skip_encoding` groups when decoding and
//! re-encoding a wide attribute map.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serialattrs::registry::default_registry;
use serialattrs::types::FieldOptions;
use serialattrs::{Map, Schema, SchemaDefaults, Value};

const WIDTHS: &[usize] = &[8, 64, 256];

fn schema(width: usize, skip_encoding: bool) -> Schema {
    let mut builder = Schema::builder("data", default_registry(), &SchemaDefaults::default())
        .skip_encoding(skip_encoding);
    for i in 0..width {
        let name = format!("f{i}");
        let type_name = match i % 4 {
            0 => "integer",
            1 => "float",
            2 => "string",
            _ => "datetime",
        };
        builder = builder
            .field(type_name, &[name.as_str()], FieldOptions::new())
            .expect("builtin type");
    }
    builder.build()
}

fn blob(width: usize) -> String {
    let mut body = Map::new();
    for i in 0..width {
        let value = match i % 4 {
            0 => Value::from(i as i64),
            1 => Value::from(i as f64 / 3.0),
            2 => Value::from(format!("value {i}")),
            _ => Value::from("2024-01-01T12:00:00Z"),
        };
        body.insert(format!("f{i}"), value);
    }
    serde_json::to_string(&Value::Map(body).to_json()).expect("json")
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for &width in WIDTHS {
        let raw = blob(width);
        for (label, skip) in [("typed", false), ("skip_encoding", true)] {
            let schema = schema(width, skip);
            group.bench_with_input(BenchmarkId::new(label, width), &raw, |b, raw| {
                b.iter(|| schema.decode(Some(black_box(raw)), false).expect("decode"));
            });
        }
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for &width in WIDTHS {
        let raw = blob(width);
        for (label, skip) in [("typed", false), ("skip_encoding", true)] {
            let schema = schema(width, skip);
            let body = schema.decode(Some(&raw), false).expect("decode");
            group.bench_with_input(BenchmarkId::new(label, width), &body, |b, body| {
                b.iter(|| schema.encode(black_box(body)).expect("encode"));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
