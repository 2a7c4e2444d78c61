#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::{FutureExt, StreamExt, future::BoxFuture, stream};
use gptfn::{ChunkStream, CompletionClient, CompletionRequest, SharedClient, TransportError};

/// Replays canned completions and records every request it receives.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<String>>,
    chunks: Vec<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    /// Answers non-streaming requests with `replies`, in order.
    pub fn replies(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| (*r).to_owned()).collect()),
            ..Self::default()
        })
    }

    /// Answers streaming requests with `chunks`.
    pub fn chunks(chunks: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            chunks: chunks.iter().map(|c| (*c).to_owned()).collect(),
            ..Self::default()
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn shared(self: &Arc<Self>) -> SharedClient {
        Arc::clone(self) as SharedClient
    }
}

impl CompletionClient for ScriptedClient {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, TransportError>> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self.replies.lock().unwrap().pop_front();
        async move {
            reply.ok_or(TransportError::MalformedResponse(
                "scripted client ran out of replies".into(),
            ))
        }
        .boxed()
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
