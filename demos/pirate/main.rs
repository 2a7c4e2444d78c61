use gptfn::prelude::*;
use tracing_subscriber::EnvFilter;

#[gpt]
/// Rewrite the sentence the way a pirate would say it.
async fn pirate(sentence: &str) -> String {}

#[gpt(model = "gpt-4", temperature = 0.9)]
/// Rewrite the sentence the way a pirate would say it,
/// adding as much nautical slang as it will bear.
async fn salty_pirate(sentence: &str) -> String {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("gptfn Pirate Example\n====================");

    let sentence = "Hello, friend! Where is the treasure?";
    println!("pirate({sentence:?}) → {}", pirate(sentence).await?);
    println!("salty_pirate({sentence:?}) → {}", salty_pirate(sentence).await?);

    println!("\nRegistered functions:");
    for reg in registered_functions() {
        let function = reg.function()?;
        println!(
            "  {} [{}]",
            function.declaration().signature(),
            function.config().model
        );
    }

    Ok(())
}
