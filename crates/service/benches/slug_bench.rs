use criterion::{black_box, criterion_group, criterion_main, Criterion};

use service::slug::slugify;

fn bench_slugify(c: &mut Criterion) {
    let titles = [
        "Prefeitura anuncia programação do Réveillon 2025",
        "Inscrições abertas: curso gratuito de informática básica para jovens e adultos",
        "São João da Praça — quadrilhas, comidas típicas & música ao vivo!!!",
    ];

    c.bench_function("slugify_titles", |b| {
        b.iter(|| {
            for t in &titles {
                let _ = slugify(black_box(t));
            }
        });
    });

    let long = "Notícia ".repeat(40);
    c.bench_function("slugify_truncate", |b| b.iter(|| slugify(black_box(&long))));
}

criterion_group!(benches, bench_slugify);
criterion_main!(benches);
