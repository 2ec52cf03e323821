// region:    --- Modules

use std::time::Instant;

use cluster_query::{Cluster, Pagable, QueryOptions, ScanConsistency};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

// endregion: --- Modules

pub type Result<T> = core::result::Result<T, Error>;
pub type Error = Box<dyn std::error::Error>; // For early dev.

const BUCKET: &str = "travel_sample";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // -- INIT CLUSTER
    let cluster = Cluster::connect("localhost", "Administrator", "password").await?;
    let bucket = cluster.bucket(BUCKET).await?;
    println!("Bucket: {}", bucket.name());

    simple(&cluster).await?;
    positional(&cluster).await?;
    named(&cluster).await?;
    request_plus(&cluster).await?;
    deferred(&cluster).await?;
    streaming(&cluster).await?;

    cluster.disconnect().await;

    Ok(())
}

async fn simple(cluster: &Cluster) -> Result<()> {
    let start = Instant::now();
    let result = cluster
        .query(
            format!("select * from {BUCKET}.airlines limit 10"),
            QueryOptions::new(),
        )
        .await?;
    println!("Simple: {:?}", start.elapsed());

    for row in result.rows() {
        println!("Row: {row:?}");
    }

    Ok(())
}

async fn positional(cluster: &Cluster) -> Result<()> {
    let stmt = format!("select * from {BUCKET}.airlines where type=$1 and country=$2 limit 10");

    let result = cluster
        .query(
            stmt,
            QueryOptions::new().positional_parameters(["airline", "United States"]),
        )
        .await?;
    println!("Positional: {} rows", result.len());

    Ok(())
}

async fn named(cluster: &Cluster) -> Result<()> {
    let stmt =
        format!("select * from {BUCKET}.airlines where type=$type and country=$country limit 10");

    let result = cluster
        .query(
            stmt,
            QueryOptions::new()
                .parameter("type", "airline")
                .parameter("country", "United States"),
        )
        .await?;
    println!("Named: {} rows", result.len());

    Ok(())
}

async fn request_plus(cluster: &Cluster) -> Result<()> {
    let result = cluster
        .query(
            format!("select * from {BUCKET}.airlines limit 10"),
            ScanConsistency::RequestPlus,
        )
        .await?;
    println!(
        "Request plus: {} rows in {:?}",
        result.len(),
        result.meta_data().elapsed
    );

    Ok(())
}

async fn deferred(cluster: &Cluster) -> Result<()> {
    let handle = cluster.query_deferred(
        format!("select * from {BUCKET}.airlines limit 10"),
        QueryOptions::new(),
    );
    println!("Deferred {} ready: {}", handle.client_context_id(), handle.is_ready());

    let rows = handle.await?.into_rows();
    println!("Deferred: {} rows", rows.len());

    Ok(())
}

async fn streaming(cluster: &Cluster) -> Result<()> {
    let mut stream = cluster
        .query_stream(
            format!("select * from {BUCKET}.airlines"),
            QueryOptions::new().page_size(100),
        )
        .await?;

    let mut all_rows = Vec::new();
    while let Some(row) = stream.next().await {
        match row {
            Ok(row) => {
                println!("{row:?}");
                all_rows.push(row);
            }
            Err(err) => eprintln!("Error: {err}"),
        }
    }
    println!("Streamed: {} rows", all_rows.len());

    // -- PAGES
    let stream = cluster
        .query_stream(
            format!("select * from {BUCKET}.airlines"),
            QueryOptions::new(),
        )
        .await?;
    let mut pages = stream.paged(5);

    let start = Instant::now();
    let mut rows_count = 0;
    while let Some(rows) = pages.next_page().await {
        rows_count += rows.len();
    }
    println!("Paged {} rows: {:?}", rows_count, start.elapsed());

    if let Some(err) = pages.take_error() {
        eprintln!("Error: {err}");
    }

    Ok(())
}
