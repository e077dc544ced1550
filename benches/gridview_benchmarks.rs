use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridview::*;
use std::sync::Arc;

const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

fn create_store(size: usize) -> Arc<TabularStore> {
    let ids = (0..size).map(|i| CellValue::Int64(i as i64)).collect();
    let scores = (0..size)
        .map(|i| CellValue::Float64(((i * 7919) % 1000) as f64 / 10.0))
        .collect();
    let names = (0..size)
        .map(|i| CellValue::String(format!("user_{}", i % 500)))
        .collect();

    Arc::new(
        TabularStore::from_columns(
            "bench",
            vec![
                ("id", ColumnType::Int64, ids),
                ("score", ColumnType::Float64, scores),
                ("name", ColumnType::String, names),
            ],
        )
        .unwrap(),
    )
}

fn bench_mask_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("mask_rebuild");

    for size in SIZES.iter() {
        let store = create_store(*size);
        let conditions = vec![
            FilterCondition::new("score", "> 50"),
            FilterCondition::new("name", "contains '1'"),
        ];

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| evaluate(black_box(&store), black_box(&conditions)));
        });
    }
    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_by_score");

    for size in SIZES.iter() {
        let store = create_store(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut view = GridView::new(Arc::clone(&store));
                view.request_sort(black_box("score")).unwrap();
                view.visible_row_count()
            });
        });
    }
    group.finish();
}

fn bench_cell_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("sorted_cell_access");

    for size in SIZES.iter() {
        let mut view = GridView::new(create_store(*size));
        view.apply_filter(&[FilterCondition::new("score", ">= 25")]);
        view.request_sort("name").unwrap();
        let rows = view.visible_row_count();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                // One screen of cells, scattered across the view
                for i in 0..50 {
                    let row = (i * 7919) % rows;
                    black_box(view.cell_ref(row, 1).unwrap());
                }
            });
        });
    }
    group.finish();
}

fn bench_selection_remap(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection_positions");

    for size in SIZES.iter() {
        let mut view = GridView::new(create_store(*size));
        for row in (0..*size).step_by(10) {
            view.select(row).unwrap();
        }
        view.request_sort("score").unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| view.selected_view_positions());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_mask_rebuild,
    bench_sort,
    bench_cell_access,
    bench_selection_remap
);
criterion_main!(benches);
