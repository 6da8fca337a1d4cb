//! Scripted `ChatClient` for tests: replays canned deltas and records every
//! request it receives.

use super::*;
use std::collections::VecDeque;
use std::sync::Mutex;

pub enum Script {
    /// Stream these deltas, then finish.
    Reply(Vec<&'static str>),
    /// Stream these deltas, then fail with an API error.
    FailAfter(Vec<&'static str>, &'static str),
    /// Reject the call before any chunk arrives.
    Reject(&'static str),
    /// Stream these deltas, then never finish.
    Hang(Vec<&'static str>),
}

#[derive(Default)]
pub struct ScriptedClient {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<(String, ChatRequest)>>,
}

impl ScriptedClient {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(deltas: Vec<&'static str>) -> Self {
        Self::new(vec![Script::Reply(deltas)])
    }

    /// `(api_key, request)` for every call made so far.
    pub fn requests(&self) -> Vec<(String, ChatRequest)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

fn deltas(items: Vec<&'static str>) -> Vec<Result<String, LlmError>> {
    items.into_iter().map(|d| Ok(d.to_string())).collect()
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn stream_chat(&self, api_key: &str, request: ChatRequest) -> Result<SnapshotStream, LlmError> {
        self.requests.lock().unwrap().push((api_key.to_string(), request));
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Script::Reply(Vec::new()));

        match script {
            Script::Reply(items) => Ok(into_snapshots(futures::stream::iter(deltas(items)))),
            Script::FailAfter(items, message) => {
                let mut items = deltas(items);
                items.push(Err(LlmError::Api(message.to_string())));
                Ok(into_snapshots(futures::stream::iter(items)))
            }
            Script::Reject(message) => Err(LlmError::Api(message.to_string())),
            Script::Hang(items) => {
                let stream = futures::stream::iter(deltas(items)).chain(futures::stream::pending());
                Ok(into_snapshots(stream))
            }
        }
    }
}
