use std::hint::black_box;
use std::time::Instant;

use cylgrid_common::{SceneConfig, TintConfig};
use cylgrid_field::InstanceField;
use cylgrid_render::{
    InstanceRecord, RecordingDevice, RenderContext, RenderOrchestrator, ShaderSource,
    update_transforms,
};

fn bench_update(side: u32, iterations: usize) {
    let ctx = RenderContext::from_config(&SceneConfig::default());
    let mut field = InstanceField::with_seed(side, side, TintConfig::default(), 7)
        .expect("grid is non-empty");
    let mut records = vec![InstanceRecord::default(); field.len()];

    let start = Instant::now();
    for i in 0..iterations {
        let t = i as f32 / 60.0;
        black_box(update_transforms(&ctx, black_box(t), &mut field, &mut records));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  update ({side}x{side} instances, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn bench_frame(side: u32, iterations: usize) {
    let mut config = SceneConfig::default();
    config.grid.count_x = side;
    config.grid.count_z = side;
    config.tint.seed = Some(7);
    let mut orch = RenderOrchestrator::from_config(
        RecordingDevice::new(),
        &config,
        &ShaderSource::new("vs", "fs"),
    )
    .expect("default scene builds");

    let start = Instant::now();
    for i in 0..iterations {
        black_box(orch.frame(black_box(i as f32 / 60.0)).expect("frame renders"));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  frame ({side}x{side} instances, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn main() {
    println!("=== Transform Update Benchmarks ===\n");

    println!("Per-instance update:");
    bench_update(10, 10000);
    bench_update(100, 200);
    bench_update(300, 20);

    println!("\nFull frame (map, update, unmap, draw):");
    bench_frame(10, 10000);
    bench_frame(100, 200);

    println!("\n=== Done ===");
}
