/// Filter, Sort and Select Example
///
/// This example demonstrates:
/// - Building a store from rows
/// - Applying filter lines, including one that fails to type-check
/// - Clicking a column header twice to flip the sort
/// - Selecting rows and watching the selection follow them across sorts
/// - Reading a filtered snapshot for a histogram

use gridview::{
    CellValue, ColumnType, DataSource, FilterCondition, GridView, Schema, StoreBuilder, ViewEvent,
};
use std::collections::HashMap;
use std::sync::Arc;

fn print_view(view: &GridView) {
    let header: Vec<&str> = view.visible_columns();
    println!("   {}", header.join(" | "));
    for row in 0..view.visible_row_count() {
        let cells: Vec<String> = (0..header.len()).map(|col| view.cell_text(row, col)).collect();
        let marker = match view.source_row_identity(row) {
            Ok(id) if view.is_selected(id) => "*",
            _ => " ",
        };
        println!(" {} {}", marker, cells.join(" | "));
    }
    println!();
}

fn main() {
    println!("=== GridView Filter/Sort/Select Example ===\n");

    let schema = Schema::new(vec![
        ("product".to_string(), ColumnType::String, false),
        ("category".to_string(), ColumnType::String, false),
        ("price".to_string(), ColumnType::Float64, false),
        ("quantity".to_string(), ColumnType::Int32, false),
    ]);
    let mut builder = StoreBuilder::new("sales", schema).unwrap();

    let items = vec![
        ("Laptop", "Electronics", 999.99, 5),
        ("Mouse", "Electronics", 29.99, 20),
        ("Desk", "Furniture", 299.99, 3),
        ("Chair", "Furniture", 199.99, 8),
        ("Monitor", "Electronics", 399.99, 10),
    ];
    for (product, category, price, quantity) in items {
        let mut row = HashMap::new();
        row.insert("product".to_string(), CellValue::String(product.to_string()));
        row.insert("category".to_string(), CellValue::String(category.to_string()));
        row.insert("price".to_string(), CellValue::Float64(price));
        row.insert("quantity".to_string(), CellValue::Int32(quantity));
        builder.append_row(row).unwrap();
    }

    let mut view = GridView::new(Arc::new(builder.build().unwrap()));
    view.subscribe(|event| match event {
        ViewEvent::RowCountChanged { previous, current } => {
            println!("   [status] {} -> {} rows", previous, current)
        }
        ViewEvent::ConditionFailed { column, message, .. } => {
            println!("   [filter] {}: {}", column, message)
        }
        _ => {}
    });

    println!("1. Filtering price > 100 (and a broken quantity line)...");
    let report = view.apply_filter(&[
        FilterCondition::new("price", "> 100"),
        FilterCondition::new("quantity", "== 'many'"),
    ]);
    println!("   {} rows match, {} line(s) ignored\n", report.match_count, report.errors.len());
    print_view(&view);

    println!("2. Selecting Desk and Monitor...");
    view.select(2).unwrap();
    view.select(4).unwrap();
    println!("   positions: {:?}\n", view.selected_view_positions());

    println!("3. Sorting by price, twice (descending)...");
    view.request_sort("price").unwrap();
    view.request_sort("price").unwrap();
    println!("   positions: {:?}", view.selected_view_positions());
    println!("   identities: {:?}\n", view.selected_identities());
    print_view(&view);

    println!("4. Showing product and price only...");
    view.set_visible_columns(&["price", "product"]).unwrap();
    view.swap_adjacent_by_display_position(0, 1).unwrap();
    print_view(&view);

    println!("5. Histogram of price over the filtered rows...");
    let histogram = view.filtered_snapshot().histogram("price", 4).unwrap();
    for (i, count) in histogram.counts.iter().enumerate() {
        println!(
            "   {:>8.2} - {:>8.2}: {}",
            histogram.edges[i],
            histogram.edges[i + 1],
            "#".repeat(*count)
        );
    }
}
