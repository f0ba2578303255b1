use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;

use service::{FieldFilter, Payload, ResourceSchema, ResourceStore};

fn item(n: usize) -> Payload {
    json!({"name": format!("Item {}", n % 10), "qty": n})
        .as_object()
        .cloned()
        .unwrap_or_default()
}

fn bench_store(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = ResourceStore::in_memory(ResourceSchema::new("items").require(["name"]));

    // pre-populate outside of the measured section
    let ids: Vec<String> = rt.block_on(async {
        let mut ids = Vec::new();
        for n in 0..1_000 {
            ids.push(store.create(item(n)).await.unwrap().id.to_string());
        }
        ids
    });

    c.bench_function("memory_store_get", |b| {
        let mut i = 0;
        b.iter(|| {
            let id = &ids[i % ids.len()];
            i += 1;
            rt.block_on(store.get(id)).unwrap()
        });
    });

    let filter = FieldFilter::new("name", "Item 3");
    c.bench_function("memory_store_list_filtered", |b| {
        b.iter(|| rt.block_on(store.list(Some(&filter))).unwrap());
    });
}

criterion_group!(benches, bench_store);
criterion_main!(benches);
