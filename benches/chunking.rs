use criterion::{Criterion, criterion_group, criterion_main};
use motofix::embeddings::chunking::{ChunkingConfig, chunk_text};
use std::hint::black_box;

const PARAGRAPH: &str = "Para cambiar el aceite, coloque la motocicleta sobre el soporte central \
con el motor tibio. Retire el tapón de drenaje y deje escurrir el aceite usado por completo. \
Instale una arandela nueva, apriete el tapón a 25 N·m y llene con aceite 20W-50 hasta la marca \
superior de la varilla.\r\n";

pub fn criterion_benchmark(c: &mut Criterion) {
    let manual = PARAGRAPH.repeat(400);
    let config = ChunkingConfig::default();
    c.bench_function("chunking", |b| {
        b.iter(|| chunk_text(black_box(&manual), black_box(&config)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
