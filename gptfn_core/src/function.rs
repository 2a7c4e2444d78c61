//! LLM-backed functions: a validated declaration plus model settings.

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::arguments::Arguments;
use crate::client::{CompletionClient, CompletionRequest};
use crate::config::ModelConfig;
use crate::declaration::{FunctionDeclaration, Parameter};
use crate::decode::{Completion, FunctionOutput};
use crate::error::{ArgumentError, ConfigurationError, GptError};
use crate::prompt::{self, Prompt};
use crate::tokens;

/// A function whose body is a chat completion.
///
/// Immutable once built; share it freely between tasks. Every call renders a
/// fresh prompt and issues exactly one request.
#[derive(Debug, Clone, PartialEq)]
pub struct GptFunction {
    declaration: FunctionDeclaration,
    config: ModelConfig,
}

impl GptFunction {
    pub fn new(
        declaration: FunctionDeclaration,
        config: ModelConfig,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            declaration,
            config,
        })
    }

    pub fn builder(name: impl Into<String>) -> GptFunctionBuilder {
        GptFunctionBuilder::new(name)
    }

    pub fn declaration(&self) -> &FunctionDeclaration {
        &self.declaration
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn prompt(&self, arguments: &Arguments) -> Result<Prompt, ArgumentError> {
        prompt::build(&self.declaration, arguments, &self.config.model)
    }

    /// The request a call with `arguments` would send.
    pub fn request(&self, arguments: &Arguments) -> Result<CompletionRequest, ArgumentError> {
        let prompt = self.prompt(arguments)?;
        self.check_budget(&prompt);
        Ok(CompletionRequest {
            model: self.config.model.clone(),
            messages: prompt.into_messages(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stop: self.config.stop.clone(),
            stream: self.declaration.returns().is_streaming(),
        })
    }

    /// Run the function: prompt, one completion request, decode.
    ///
    /// `R` must match the declared return type.
    #[instrument(
        name = "gpt_call",
        skip_all,
        fields(function = %self.declaration.name(), model = %self.config.model)
    )]
    pub async fn call<R: FunctionOutput>(
        &self,
        client: &dyn CompletionClient,
        arguments: Arguments,
    ) -> Result<R, GptError> {
        let declared = self.declaration.returns();
        if R::KIND != declared {
            return Err(ConfigurationError::ReturnTypeMismatch {
                name: self.declaration.name().to_owned(),
                declared,
                requested: R::KIND,
            }
            .into());
        }

        let request = self.request(&arguments)?;
        let completion = if request.stream {
            Completion::Stream(client.stream(&request).await?)
        } else {
            Completion::Text(client.complete(&request).await?)
        };
        debug!("completion received");

        R::decode(completion)
    }

    fn check_budget(&self, prompt: &Prompt) {
        let model = &self.config.model;
        let estimate = tokens::estimate_messages(prompt.messages(), model);
        let reserved = self.config.max_tokens.unwrap_or(0) as usize;

        match tokens::context_window(model) {
            Some(window) if estimate.tokens + reserved > window => warn!(
                tokens = estimate.tokens,
                reserved,
                window,
                approximate = estimate.approximate,
                "prompt may not fit the model's context window"
            ),
            _ => debug!(
                tokens = estimate.tokens,
                approximate = estimate.approximate,
                "estimated prompt size"
            ),
        }
    }
}

/// Step-by-step construction of a [`GptFunction`].
///
/// Nothing is validated until [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct GptFunctionBuilder {
    name: String,
    doc: String,
    parameters: Vec<Parameter>,
    returns: String,
    config: ModelConfig,
}

impl GptFunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: String::new(),
            parameters: Vec::new(),
            returns: "()".to_owned(),
            config: ModelConfig::default(),
        }
    }

    /// Behaviour description sent to the model verbatim.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            ty: ty.into(),
            default: None,
        });
        self
    }

    pub fn param_with_default(
        mut self,
        name: impl Into<String>,
        ty: impl Into<String>,
        default: Value,
    ) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            ty: ty.into(),
            default: Some(default),
        });
        self
    }

    /// Declared return type: `String`, `bool` or `CompletionStream`.
    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.returns = type_name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    pub fn stop<I, S>(mut self, sequences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.stop = sequences.into_iter().map(Into::into).collect();
        self
    }

    /// Replace all model settings at once.
    pub fn config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<GptFunction, ConfigurationError> {
        let declaration =
            FunctionDeclaration::new(self.name, &self.doc, self.parameters, &self.returns)?;
        GptFunction::new(declaration, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{ChunkStream, CompletionStream};
    use crate::error::{DecodeError, TransportError};
    use futures::future::BoxFuture;
    use futures::{FutureExt, StreamExt, stream};
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers every request with canned output and remembers what it saw.
    #[derive(Default)]
    struct ScriptedClient {
        text: String,
        chunks: Vec<String>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedClient {
        fn text(text: &str) -> Self {
            Self {
                text: text.into(),
                ..Self::default()
            }
        }

        fn chunks(chunks: &[&str]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| (*c).to_owned()).collect(),
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl CompletionClient for ScriptedClient {
        fn complete<'a>(
            &'a self,
            request: &'a CompletionRequest,
        ) -> BoxFuture<'a, Result<String, TransportError>> {
            self.requests.lock().unwrap().push(request.clone());
            let text = self.text.clone();
            async move { Ok(text) }.boxed()
        }

        fn stream<'a>(
            &'a self,
            request: &'a CompletionRequest,
        ) -> BoxFuture<'a, Result<ChunkStream, TransportError>> {
            self.requests.lock().unwrap().push(request.clone());
            let chunks: Vec<Result<String, TransportError>> =
                self.chunks.iter().cloned().map(Ok).collect();
            async move { Ok(stream::iter(chunks).boxed()) }.boxed()
        }
    }

    fn pirate(returns: &str) -> GptFunction {
        GptFunction::builder("pirate")
            .doc("Rewrite the sentence the way a pirate would say it.")
            .param("sentence", "&str")
            .returns(returns)
            .build()
            .unwrap()
    }

    fn sentence(text: &str) -> Arguments {
        Arguments::new().bind("sentence", text).unwrap()
    }

    #[tokio::test]
    async fn text_call_returns_trimmed_completion() {
        let client = ScriptedClient::text("  Arrr, matey!\n");
        let out: String = pirate("String")
            .call(&client, sentence("Hello, friend"))
            .await
            .unwrap();
        assert_eq!(out, "Arrr, matey!");

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].stream);
        assert_eq!(requests[0].model, "gpt-3.5-turbo");
        assert_eq!(requests[0].temperature, 0.0);
    }

    #[tokio::test]
    async fn boolean_call_decodes_answers() {
        let f = GptFunction::builder("is_question")
            .doc("Tell whether the text is a question.")
            .param("text", "&str")
            .returns("bool")
            .build()
            .unwrap();
        let args = || Arguments::new().push("Is it raining?").unwrap();

        let yes: bool = f.call(&ScriptedClient::text("Yes"), args()).await.unwrap();
        assert!(yes);
        let no: bool = f.call(&ScriptedClient::text("No"), args()).await.unwrap();
        assert!(!no);

        let err = f
            .call::<bool>(&ScriptedClient::text("Maybe"), args())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GptError::Decode(DecodeError::UnrecognizedBoolean { .. })
        ));
    }

    #[tokio::test]
    async fn stream_call_yields_chunks() {
        let client = ScriptedClient::chunks(&["Ar", "rr, ", "matey!"]);
        let stream: CompletionStream = pirate("CompletionStream")
            .call(&client, sentence("Hello"))
            .await
            .unwrap();
        let chunks: Vec<String> = stream.map(|c| c.unwrap()).collect().await;
        assert_eq!(chunks, vec!["Ar", "rr, ", "matey!"]);
        assert!(client.requests()[0].stream);
    }

    #[tokio::test]
    async fn overrides_reach_every_request() {
        let f = GptFunction::builder("pirate")
            .doc("Talk like a pirate.")
            .param("sentence", "&str")
            .returns("String")
            .model("gpt-4")
            .temperature(0.7)
            .max_tokens(64)
            .stop(["\n\n"])
            .build()
            .unwrap();
        let client = ScriptedClient::text("Arr");

        for _ in 0..3 {
            let _: String = f.call(&client, sentence("hi")).await.unwrap();
        }

        let requests = client.requests();
        assert_eq!(requests.len(), 3);
        for request in requests {
            assert_eq!(request.model, "gpt-4");
            assert_eq!(request.temperature, 0.7);
            assert_eq!(request.max_tokens, Some(64));
            assert_eq!(request.stop, vec!["\n\n".to_owned()]);
        }
    }

    #[tokio::test]
    async fn mismatched_output_type_is_rejected_before_sending() {
        let client = ScriptedClient::text("true");
        let err = pirate("String")
            .call::<bool>(&client, sentence("hi"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GptError::Configuration(ConfigurationError::ReturnTypeMismatch { .. })
        ));
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn binding_errors_are_rejected_before_sending() {
        let client = ScriptedClient::text("Arr");
        let err = pirate("String")
            .call::<String>(&client, Arguments::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GptError::Arguments(ArgumentError::Missing { .. })
        ));
        assert!(client.requests().is_empty());
    }

    #[test]
    fn builder_validates() {
        let missing_doc = GptFunction::builder("pirate")
            .param("sentence", "&str")
            .returns("String")
            .build();
        assert!(matches!(
            missing_doc,
            Err(ConfigurationError::MissingDocstring { .. })
        ));

        let no_return = GptFunction::builder("pirate").doc("Talk.").build();
        assert!(matches!(
            no_return,
            Err(ConfigurationError::UnsupportedReturnType { .. })
        ));

        let hot = GptFunction::builder("pirate")
            .doc("Talk.")
            .returns("String")
            .temperature(3.0)
            .build();
        assert!(matches!(
            hot,
            Err(ConfigurationError::InvalidTemperature { .. })
        ));
    }

    #[test]
    fn defaults_fill_unbound_parameters() {
        let f = GptFunction::builder("translate")
            .doc("Translate the text.")
            .param("text", "&str")
            .param_with_default("language", "&str", json!("French"))
            .returns("String")
            .model("gpt-4")
            .build()
            .unwrap();
        let request = f
            .request(&Arguments::new().push("hello").unwrap())
            .unwrap();
        assert_eq!(
            request.messages[1].content,
            "Inputs:\ntext = \"hello\"\nlanguage = \"French\""
        );
    }
}
