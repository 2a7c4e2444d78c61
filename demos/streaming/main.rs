use std::io::Write;

use gptfn::prelude::*;
use tracing_subscriber::EnvFilter;

#[gpt(temperature = 0.8, max_tokens = 200)]
/// Tell a short tale about the given topic, in pirate speak.
async fn tale(topic: &str) -> CompletionStream {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut stream = tale("a parrot who hoards buttons").await?;

    let mut stdout = std::io::stdout();
    while let Some(chunk) = stream.next().await {
        write!(stdout, "{}", chunk?)?;
        stdout.flush()?;
    }
    writeln!(stdout)?;

    tracing::info!("stream finished");
    Ok(())
}
