use criterion::{criterion_group, criterion_main, Criterion};
use hostbridge_core::inventory::{DirectoryInventory, InventorySource};
use hostbridge_core::report::{StatusPayload, StatusReport};
use tempfile::TempDir;

fn bench_inventory_scan(c: &mut Criterion) {
    let tmp = TempDir::new().expect("create bench dir");
    let dir = tmp.path();
    for i in 0..200 {
        std::fs::write(dir.join(format!("component-{i}.jar")), b"").expect("write jar");
        std::fs::write(dir.join(format!("notes-{i}.txt")), b"").expect("write txt");
    }
    let inventory = DirectoryInventory::new(dir, ".jar", "1.0.0");

    c.bench_function("scan_200_packages", |b| {
        b.iter(|| {
            let components = inventory.components().expect("scan");
            assert_eq!(components.len(), 200);
        })
    });

    let payload = StatusPayload::Report(StatusReport {
        platform_version: "1.20.1".to_string(),
        loader_type: "Fabric".to_string(),
        components: inventory.components().expect("scan"),
    });
    c.bench_function("serialize_status_payload", |b| {
        b.iter(|| serde_json::to_vec(&payload).expect("serialize"))
    });
}

criterion_group!(benches, bench_inventory_scan);
criterion_main!(benches);
