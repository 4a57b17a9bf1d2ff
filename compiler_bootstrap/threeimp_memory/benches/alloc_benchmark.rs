use criterion::{black_box, criterion_group, criterion_main, Criterion};
use threeimp_memory::Heap;

fn benchmark_alloc_dealloc_cycle(c: &mut Criterion) {
    c.bench_function("alloc_dealloc_cycle", |b| {
        let heap = Heap::new(1024);
        b.iter(|| {
            let mut ptrs = Vec::with_capacity(256);
            for i in 0..256i64 {
                ptrs.push(heap.alloc(black_box(i)).unwrap());
            }
            for p in ptrs {
                unsafe { heap.dealloc(p) };
            }
        })
    });
}

criterion_group!(benches, benchmark_alloc_dealloc_cycle);
criterion_main!(benches);
