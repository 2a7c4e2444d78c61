use gptfn::prelude::*;
use gptfn::DecodeError;
use tracing_subscriber::EnvFilter;

#[gpt]
/// Decide whether the text is a question.
async fn is_question(text: &str) -> bool {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let inputs = [
        "Is the ship seaworthy?",
        "The ship is seaworthy.",
        "Tell me whether the ship is seaworthy",
    ];

    for text in inputs {
        match is_question(text).await {
            Ok(answer) => println!("{text:?} → {answer}"),
            Err(GptError::Decode(DecodeError::UnrecognizedBoolean { text: reply })) => {
                println!("{text:?} → model gave no clear answer: {reply:?}")
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
