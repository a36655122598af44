use resilient_fetch::{Client, RequestOptions};
use serde_json::{json, Value};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base = std::env::var("DEMO_BASE_URL").unwrap_or_else(|_| "https://httpbin.org".to_owned());
    let client = Client::from_env().map_err(anyhow::Error::msg)?;

    let echoed: Value = client
        .post(
            &format!("{base}/anything"),
            json!({ "name": "Kit", "tags": ["a", "b"] }),
            &RequestOptions::default(),
        )
        .await?;
    println!("{echoed:#}");

    let nothing: Option<Value> = client
        .get(&format!("{base}/status/204"), &RequestOptions::default())
        .await?;
    println!("204 -> {nothing:?}");

    Ok(())
}
