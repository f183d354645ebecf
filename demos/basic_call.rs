//! Basic demo of the four call shapes and lifecycle telemetry.
//!
//! Run with: `cargo run --example basic_call`

use courier::{Client, Error, HttpVerb, RequestDescriptor, TelemetryEvent};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("courier=debug,basic_call=info")
        .init();

    let client = Client::builder()
        .base_url("https://jsonplaceholder.typicode.com")?
        .listener(|event: &TelemetryEvent<'_>| match event {
            TelemetryEvent::SendingRequest { request_id, method, uri } => {
                println!("[{}] -> {} {}", request_id, method, uri)
            }
            TelemetryEvent::ReceivedResponse { request_id, status, elapsed, .. } => {
                println!("[{}] <- {} in {:?}", request_id, status, elapsed)
            }
            TelemetryEvent::Failed { request_id, error, .. } => {
                println!("[{}] !! {}", request_id, error)
            }
        })
        .build()?;

    println!("=== Typed GET ===");
    let response = client.get::<Post>("posts/1").await?;
    println!("Post ID: {}", response.data.id);
    println!("Title: {}", response.data.title);
    println!("Status code: {}", response.status);
    println!();

    println!("=== POST with query parameters ===");
    let request = RequestDescriptor::new(HttpVerb::Post, "posts")
        .with_query_param("notify", "false")
        .with_content(&NewPost {
            title: "My New Post".to_string(),
            body: "This is the content of my new post!".to_string(),
            user_id: 1,
        })?;
    let response = client.execute_as::<Post>(request).await?;
    println!("Created post ID: {}", response.data.id);
    println!("Content-Type: {:?}", response.header("content-type"));
    println!();

    println!("=== Raw bytes ===");
    let response = client
        .execute_bytes(RequestDescriptor::new(HttpVerb::Get, "posts/1/comments"))
        .await?;
    println!("Received {} bytes", response.data.len());
    println!();

    println!("=== Streaming ===");
    let mut body = client
        .execute_stream(RequestDescriptor::new(HttpVerb::Get, "photos"))
        .await?;
    let mut chunks = 0;
    let mut total = 0;
    while let Some(chunk) = body.chunk().await? {
        chunks += 1;
        total += chunk.len();
    }
    println!("Streamed {} bytes in {} chunks", total, chunks);
    println!();

    println!("=== No result ===");
    let response = client
        .execute(RequestDescriptor::new(HttpVerb::Delete, "posts/1"))
        .await?;
    println!("Deleted with status {}", response.status);

    Ok(())
}
