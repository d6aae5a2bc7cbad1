//! Benchmarks for analysis pane rendering.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use scanlens::markdown::{render, to_html};

const ANALYSIS: &str = "# Findings

The lungs are **clear** bilaterally. No focal consolidation,
pleural effusion or pneumothorax.

## Impression

1. Normal chest radiograph.
2. Cardiac silhouette within normal limits.

| Region | Observation |
|--------|-------------|
| Left   | Clear       |
| Right  | Clear       |

```json
{\"confidence\": 0.93}
```
";

fn bench_render_pane(c: &mut Criterion) {
    let source = ANALYSIS.repeat(8);
    c.bench_function("render_pane", |b| {
        b.iter(|| render(black_box(&source), black_box(80)))
    });
}

fn bench_relayout(c: &mut Criterion) {
    let mut pane = render(&ANALYSIS.repeat(8), 80);
    let mut narrow = false;
    c.bench_function("relayout", |b| {
        b.iter(|| {
            narrow = !narrow;
            pane.relayout(black_box(if narrow { 56 } else { 80 }));
        })
    });
}

fn bench_to_html(c: &mut Criterion) {
    c.bench_function("to_html", |b| b.iter(|| to_html(black_box(ANALYSIS))));
}

criterion_group!(benches, bench_render_pane, bench_relayout, bench_to_html);
criterion_main!(benches);
