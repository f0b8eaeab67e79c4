// Copyright (c) ONNX Project Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end pipeline benchmark on a synthetic chain model.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use sonnx_core::compile_source;

fn chain_model(len: usize) -> String {
    let mut nodes = String::new();
    for i in 1..=len {
        nodes.push_str(&format!(
            r#"NODE {{ OP_TYPE: "Relu" NAME: "n{i}" INPUT: ["t{}"] OUTPUT: ["t{i}"] }}"#,
            i - 1
        ));
        nodes.push('\n');
    }
    format!(
        r#"MODEL {{
             IR_VERSION: 7
             PRODUCER_NAME: "bench"
             PRODUCER_VERSION: "0.1"
             DOMAIN: ""
             MODEL_VERSION: 1
             DOC_STRING: ""
             GRAPH {{
               NAME: "chain"
               NODE_LIST {{ {nodes} }}
               INPUT_LIST {{ INPUT {{ NAME: "t0" TYPE: FLOAT SHAPE: [64, 64] }} }}
               OUTPUT_LIST {{ OUTPUT {{ NAME: "t{len}" TYPE: FLOAT SHAPE: [64, 64] }} }}
             }}
             OPSET {{ DOMAIN: "" VERSION: 13 }}
           }}"#
    )
}

fn bench_compile(c: &mut Criterion) {
    for len in [16usize, 256] {
        let source = chain_model(len);
        c.bench_function(&format!("compile_chain_{len}"), |b| {
            b.iter_batched(
                || source.clone(),
                |src| compile_source(&src).unwrap(),
                BatchSize::SmallInput,
            )
        });
    }
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
