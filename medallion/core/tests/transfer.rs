//! Transfer tests against in-memory object stores.

use std::sync::Arc;

use bytes::Bytes;
use object_store::memory::InMemory;
use object_store::{path::Path, ObjectStore};
use url::Url;

use medallion_core::execution::transfer::copy_objects;
use medallion_core::model::TransferStep;

fn step(replace: bool, apply_dest_prefix: bool) -> TransferStep {
    TransferStep {
        source_bucket: "raw-landing".to_string(),
        source_prefix: Some("exports/daily".to_string()),
        source_conn_id: "aws_default".to_string(),
        dest_conn_id: "google_cloud_default".to_string(),
        destination: Url::parse("gs://lake/landing").unwrap(),
        replace,
        apply_dest_prefix,
    }
}

async fn seed(store: &InMemory, key: &str, data: &'static [u8]) {
    store
        .put(&Path::from(key), Bytes::from_static(data).into())
        .await
        .unwrap();
}

async fn contents(store: &InMemory, key: &str) -> Bytes {
    store
        .get(&Path::from(key))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap()
}

#[tokio::test]
async fn copies_every_object_under_the_prefix() {
    let source = Arc::new(InMemory::new());
    let destination = Arc::new(InMemory::new());

    seed(&source, "exports/daily/orders.parquet", b"orders").await;
    seed(&source, "exports/daily/customers.parquet", b"customers").await;
    seed(&source, "exports/monthly/summary.parquet", b"summary").await;

    let descriptor = step(false, false).resolve().unwrap();
    let outcome = copy_objects(source, destination.clone(), &descriptor)
        .await
        .unwrap();

    assert_eq!(outcome.copied, 2);
    assert_eq!(outcome.skipped, 0);

    assert_eq!(
        contents(&destination, "landing/orders.parquet").await,
        Bytes::from_static(b"orders")
    );
    assert_eq!(
        contents(&destination, "landing/customers.parquet").await,
        Bytes::from_static(b"customers")
    );
    // objects outside the prefix stay put
    assert!(destination
        .head(&Path::from("landing/summary.parquet"))
        .await
        .is_err());
}

#[tokio::test]
async fn dest_prefix_keeps_the_full_source_key() {
    let source = Arc::new(InMemory::new());
    let destination = Arc::new(InMemory::new());

    seed(&source, "exports/daily/orders.parquet", b"orders").await;

    let descriptor = step(false, true).resolve().unwrap();
    copy_objects(source, destination.clone(), &descriptor)
        .await
        .unwrap();

    assert_eq!(
        contents(&destination, "landing/exports/daily/orders.parquet").await,
        Bytes::from_static(b"orders")
    );
}

#[tokio::test]
async fn existing_objects_are_skipped_without_replace() {
    let source = Arc::new(InMemory::new());
    let destination = Arc::new(InMemory::new());

    seed(&source, "exports/daily/orders.parquet", b"new").await;
    seed(&source, "exports/daily/customers.parquet", b"customers").await;
    seed(&destination, "landing/orders.parquet", b"old").await;

    let descriptor = step(false, false).resolve().unwrap();
    let outcome = copy_objects(source, destination.clone(), &descriptor)
        .await
        .unwrap();

    assert_eq!(outcome.copied, 1);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(
        contents(&destination, "landing/orders.parquet").await,
        Bytes::from_static(b"old")
    );
}

#[tokio::test]
async fn replace_overwrites_existing_objects() {
    let source = Arc::new(InMemory::new());
    let destination = Arc::new(InMemory::new());

    seed(&source, "exports/daily/orders.parquet", b"new").await;
    seed(&destination, "landing/orders.parquet", b"old").await;

    let descriptor = step(true, false).resolve().unwrap();
    let outcome = copy_objects(source, destination.clone(), &descriptor)
        .await
        .unwrap();

    assert_eq!(outcome.copied, 1);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(
        contents(&destination, "landing/orders.parquet").await,
        Bytes::from_static(b"new")
    );
}
