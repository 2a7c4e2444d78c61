mod common;

use std::sync::Arc;

use common::ScriptedClient;
use gptfn::prelude::*;
use gptfn::{ConfigurationError, DecodeError, ReturnKind, Role};
use once_cell::sync::Lazy;

// ───────── Clients, one per scenario so tests can run in parallel ─────────

static PIRATE: Lazy<Arc<ScriptedClient>> =
    Lazy::new(|| ScriptedClient::replies(&["  Arrr, matey!\n"]));
static QUESTION: Lazy<Arc<ScriptedClient>> =
    Lazy::new(|| ScriptedClient::replies(&["Yes", "No", "Maybe"]));
static TALE: Lazy<Arc<ScriptedClient>> =
    Lazy::new(|| ScriptedClient::chunks(&["Ar", "rr, ", "matey!"]));
static TUNED: Lazy<Arc<ScriptedClient>> =
    Lazy::new(|| ScriptedClient::replies(&["Ahoy", "Avast"]));

fn pirate_client() -> Result<SharedClient, GptError> {
    Ok(PIRATE.shared())
}

fn question_client() -> Result<SharedClient, GptError> {
    Ok(QUESTION.shared())
}

fn tale_client() -> Result<SharedClient, GptError> {
    Ok(TALE.shared())
}

fn tuned_client() -> Result<SharedClient, GptError> {
    Ok(TUNED.shared())
}

// ───────── Declared functions ─────────

#[gpt(client = pirate_client)]
/// Rewrite the sentence the way a pirate would say it.
async fn pirate(sentence: &str) -> String {}

#[gpt(client = question_client)]
/// Decide whether the text is a question.
async fn is_question(text: &str) -> bool {}

#[gpt(client = tale_client)]
/// Tell a very short tale about the given topic, in pirate speak.
async fn tale(topic: &str) -> CompletionStream {}

#[gpt(model = "gpt-4", temperature = 0.7, max_tokens = 32, client = tuned_client)]
/// Greet the crew member by name.
///   Keep it under five words.
async fn greet(name: String, rank: u8) -> String {}

// ───────── Tests ─────────

#[tokio::test]
async fn string_function_returns_completion() {
    let reply = pirate("Hello, friend!").await.unwrap();
    assert_eq!(reply, "Arrr, matey!");

    let requests = PIRATE.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model, gptfn::DEFAULT_MODEL);
    assert_eq!(request.temperature, gptfn::DEFAULT_TEMPERATURE);
    assert!(!request.stream);

    // gpt-3.5 models take their instructions as a user message
    assert_eq!(request.messages[0].role, Role::User);
    assert!(
        request.messages[0]
            .content
            .starts_with("You are the function `pirate(sentence: &str) -> String`.")
    );
    assert!(
        request.messages[0]
            .content
            .contains("Rewrite the sentence the way a pirate would say it.")
    );
    assert_eq!(
        request.messages[1].content,
        "Inputs:\nsentence = \"Hello, friend!\""
    );
}

#[tokio::test]
async fn boolean_function_decodes_answers() {
    assert!(is_question("Is it raining?").await.unwrap());
    assert!(!is_question("It is raining.").await.unwrap());

    let err = is_question("Raining?").await.unwrap_err();
    assert!(matches!(
        err,
        GptError::Decode(DecodeError::UnrecognizedBoolean { ref text }) if text == "Maybe"
    ));

    let requests = QUESTION.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].messages[0].content.contains("true or false"));
}

#[tokio::test]
async fn streaming_function_yields_chunks_in_order() {
    let mut stream = tale("treasure").await.unwrap();

    let mut chunks = Vec::new();
    while let Some(chunk) = stream.next().await {
        chunks.push(chunk.unwrap());
    }
    assert_eq!(chunks, ["Ar", "rr, ", "matey!"]);
    assert!(stream.next().await.is_none());

    let requests = TALE.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].stream);
}

#[tokio::test]
async fn overrides_reach_every_request() {
    assert_eq!(greet("Anne".into(), 2).await.unwrap(), "Ahoy");
    assert_eq!(greet("Mary".into(), 1).await.unwrap(), "Avast");

    let requests = TUNED.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.max_tokens, Some(32));
        assert_eq!(request.messages[0].role, Role::System);
        assert!(
            request.messages[0]
                .content
                .contains("Greet the crew member by name.\n  Keep it under five words.")
        );
    }
    assert_eq!(
        requests[0].messages[1].content,
        "Inputs:\nname = \"Anne\"\nrank = 2"
    );
}

#[test]
fn functions_are_registered() {
    for name in ["pirate", "is_question", "tale", "greet"] {
        assert!(find_function(name).is_some(), "{name} should be registered");
    }

    let greet = find_function("greet").unwrap().function().unwrap();
    assert_eq!(greet.declaration().signature(), "greet(name: String, rank: u8) -> String");
    assert_eq!(greet.config().model, "gpt-4");

    let tale = find_function("tale").unwrap().function().unwrap();
    assert_eq!(tale.declaration().returns(), ReturnKind::Stream);
}

#[tokio::test]
async fn mismatched_output_type_is_a_configuration_error() {
    let function = find_function("is_question").unwrap().function().unwrap();
    let client = ScriptedClient::replies(&["yes"]);
    let arguments = gptfn::Arguments::new().bind("text", "hi").unwrap();

    let err = function
        .call::<String>(client.as_ref(), arguments)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GptError::Configuration(ConfigurationError::ReturnTypeMismatch { .. })
    ));
    assert!(client.requests().is_empty());
}
