use std::time::Duration;

use resilient_fetch::{AbortController, Client, Delay, Error, RequestOptions, RetryOptions, Target};
use serde_json::Value;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base = std::env::var("DEMO_BASE_URL").unwrap_or_else(|_| "https://httpbin.org".to_owned());
    let client = Client::new();

    let controller = AbortController::new();
    let signal = controller.signal();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        controller.abort("demo deadline reached");
    });

    let options = RetryOptions::new()
        .attempts(4)
        .delay(Delay::default())
        .signal(signal)
        .retryable(|err: &Error, attempt| {
            println!("attempt {attempt} failed: {err}");
            err.status().map_or(true, |status| status >= 500)
        });

    let result = client
        .retry::<Value>(
            Target::http(format!("{base}/status/503")),
            &options,
            &RequestOptions::default(),
        )
        .await;

    match result {
        Ok(value) => println!("succeeded: {value}"),
        Err(err) => println!("gave up: {err}"),
    }

    Ok(())
}
