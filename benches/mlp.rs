use criterion::{Criterion, black_box, criterion_group, criterion_main};

use splearn::{LayerSpec, Mlp};

fn bound_net() -> Mlp {
    let mut mlp = Mlp::new(LayerSpec::uniform(256, 2)).unwrap();
    mlp.bind(128, 10).unwrap();
    for idx in 0..mlp.num_layers() {
        let len = mlp.weights(idx).unwrap().len();
        let w: Vec<f32> = (0..len).map(|p| (p % 13) as f32 / 130.0 - 0.05).collect();
        mlp.set_weights(idx, &w).unwrap();
    }
    mlp
}

fn mlp_forward_bench(c: &mut Criterion) {
    let mut mlp = bound_net();
    let input = vec![0.1_f32; 128];

    c.bench_function("mlp_forward_128_256_256_10", |b| {
        b.iter(|| {
            let out = mlp.forward(black_box(&input)).unwrap();
            black_box(out);
        })
    });
}

fn mlp_backprop_bench(c: &mut Criterion) {
    let mut mlp = bound_net();
    let input = vec![0.1_f32; 128];
    let target = vec![0.0_f32; 10];

    c.bench_function("mlp_forward_backprop_128_256_256_10", |b| {
        b.iter(|| {
            mlp.forward(black_box(&input)).unwrap();
            mlp.backprop(black_box(&target)).unwrap();
        })
    });
}

criterion_group!(benches, mlp_forward_bench, mlp_backprop_bench);
criterion_main!(benches);
