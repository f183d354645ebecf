//! Demo of the error kinds a call can end with.
//!
//! Run with: `cargo run --example error_handling`

use courier::{CancellationToken, Client, Error, HttpVerb, RequestDescriptor};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    id: u32,
    title: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("courier=info")
        .init();

    let client = Client::builder()
        .base_url("https://jsonplaceholder.typicode.com")?
        .build()?;

    println!("=== Protocol errors ===");
    match client.get::<Post>("posts/999999").await {
        Ok(response) => println!("Success: {:?}", response.data),
        Err(Error::Protocol(err)) => {
            println!("HTTP Error!");
            println!("  Request id: {}", err.request_id);
            println!("  Status: {} ({:?})", err.status, err.reason);
            println!("  Request: {} {}", err.method, err.uri);
            println!("  Request headers: {:?}", err.request_headers);
            println!("  Body: {:?}", err.body);
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Deserialization errors ===");
    #[derive(Deserialize)]
    #[allow(dead_code)]
    struct WrongSchema {
        nonexistent_field: String,
    }

    match client.get::<WrongSchema>("posts/1").await {
        Ok(_) => println!("Unexpected success"),
        Err(Error::DeserializationFailed { status, error, .. }) => {
            println!("Deserialization Failed!");
            println!("  Status: {}", status);
            println!("  Error: {}", error);
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Connection errors ===");
    let bad_client = Client::builder()
        .base_url("https://this-domain-does-not-exist-12345.com")?
        .timeout(Duration::from_secs(5))
        .build()?;

    match bad_client.get::<serde_json::Value>("").await {
        Ok(_) => println!("Unexpected success"),
        Err(Error::Connection {
            request_id,
            uri,
            elapsed,
            cause,
            ..
        }) => {
            println!("Connection Error!");
            println!("  Request id: {}", request_id);
            println!("  URI: {}", uri);
            println!("  Gave up after: {:?}", elapsed);
            println!("  Cause: {}", cause);
            println!("  Is timeout: {}", cause.is_timeout());
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Cancellation ===");
    let token = CancellationToken::new();
    token.cancel();
    let request = RequestDescriptor::new(HttpVerb::Get, "posts").with_cancellation(token);
    match client.execute(request).await {
        Ok(_) => println!("Unexpected success"),
        Err(e) => {
            println!("Error occurred: {}", e);
            println!("  Is connection error: {}", e.is_connection());
            println!("  Request id: {:?}", e.request_id());
        }
    }

    Ok(())
}
