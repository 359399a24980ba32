use arbor_core::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn keyed_list(order: impl Iterator<Item = usize>) -> Element {
    let items: Vec<Child> = order
        .map(|i| create_element("li", Props::new().key(i).attr("data-row", i as i64), vec![Child::from(i)]).into())
        .collect();
    create_element("ul", Props::new(), items)
}

fn rerender_unchanged(c: &mut Criterion) {
    let mut group = c.benchmark_group("rerender_unchanged");
    for size in [100usize, 1_000] {
        let mut host = MemoryHost::new();
        let container = host.create_container("div", "app");
        let mut renderer = Renderer::new(host);
        renderer.render(keyed_list(0..size), container);
        renderer.flush_sync().expect("initial render");

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                renderer.render(black_box(keyed_list(0..size)), container);
                renderer.flush_sync().expect("render");
            });
        });
    }
    group.finish();
}

fn reverse_keyed_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("reverse_keyed_list");
    for size in [100usize, 1_000] {
        let mut host = MemoryHost::new();
        let container = host.create_container("div", "app");
        let mut renderer = Renderer::new(host);
        renderer.render(keyed_list(0..size), container);
        renderer.flush_sync().expect("initial render");

        let mut reversed = false;
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                reversed = !reversed;
                let list = if reversed {
                    keyed_list((0..size).rev())
                } else {
                    keyed_list(0..size)
                };
                renderer.render(list, container);
                renderer.flush_sync().expect("render");
            });
        });
    }
    group.finish();
}

fn mount_fresh(c: &mut Criterion) {
    c.bench_function("mount_1000_rows", |b| {
        b.iter(|| {
            let mut host = MemoryHost::new();
            let container = host.create_container("div", "app");
            let mut renderer = Renderer::new(host);
            renderer.render(keyed_list(0..1_000), container);
            renderer.flush_sync().expect("mount");
            black_box(renderer.commit_count())
        });
    });
}

criterion_group!(benches, rerender_unchanged, reverse_keyed_list, mount_fresh);
criterion_main!(benches);
