// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encode/decode throughput
//!
//! - `encode_*`: graph -> framed bytes
//! - `decode_local`: bytes -> graph, every type registered locally
//! - `decode_synthesized`: bytes -> graph on a receiver whose carpenter
//!   already cached the types (steady state after first contact)

#![allow(clippy::cast_possible_wrap)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use typewire::schema::{PrimitiveKind, TypeDescriptorBuilder};
use typewire::{ObjectGraph, SerializationScheme, Value, ValueType};

fn build_graph(scheme: &SerializationScheme, rows: usize) -> (ObjectGraph, Value) {
    let registry = scheme.registry();
    let row = registry
        .register(
            TypeDescriptorBuilder::composite("bench.Row")
                .field("id", PrimitiveKind::U64)
                .field("price", PrimitiveKind::F64)
                .nullable_field("symbol", PrimitiveKind::String)
                .reference("parent", "bench.Row", true)
                .build()
                .unwrap(),
        )
        .unwrap();

    let mut graph = ObjectGraph::new();
    let mut previous = Value::Null;
    let mut items = Vec::with_capacity(rows);
    for i in 0..rows {
        // Every fourth row points at its predecessor to exercise back-references.
        let parent = if i % 4 == 0 { previous.clone() } else { Value::Null };
        let r = graph
            .instantiate(
                &row,
                vec![
                    Value::U64(i as u64),
                    Value::F64(i as f64 * 0.5),
                    format!("SYM{}", i % 97).into(),
                    parent,
                ],
            )
            .unwrap();
        previous = r.into();
        items.push(previous.clone());
    }
    (graph, Value::List(items))
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for rows in [16usize, 256, 4096] {
        let scheme = SerializationScheme::default();
        let (graph, root) = build_graph(&scheme, rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| scheme.serialize_to_bytes(black_box(&graph), black_box(&root)).unwrap());
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let rows = 1024usize;
    let sender = SerializationScheme::default();
    let (graph, root) = build_graph(&sender, rows);
    let bytes = sender.serialize_to_bytes(&graph, &root).unwrap();
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("decode_local", |b| {
        b.iter(|| sender.deserialize(black_box(&bytes), &ValueType::Any).unwrap());
    });

    let receiver = SerializationScheme::default();
    receiver.deserialize(&bytes, &ValueType::Any).unwrap();
    group.bench_function("decode_synthesized", |b| {
        b.iter(|| receiver.deserialize(black_box(&bytes), &ValueType::Any).unwrap());
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
