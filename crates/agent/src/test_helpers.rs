//! Scripted providers and builders shared by the agent tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use supportdesk_core::{
    AssistantTurn, Provider, ProviderError, ProviderRequest, ProviderResponse, ToolRequest, Usage,
};

/// Replays canned replies in order and keeps every request it was sent.
/// Running past the script is a provider error, which the loop surfaces.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<ProviderResponse>>,
    seen: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<ProviderResponse>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn single_text(text: &str) -> Self {
        Self::new(vec![text_reply(text)])
    }

    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.seen.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut seen = self.seen.lock().unwrap();
            seen.push(request);
            seen.len()
        };
        self.script.lock().unwrap().pop_front().ok_or_else(|| {
            ProviderError::InvalidResponse(format!("script exhausted at call {call}"))
        })
    }
}

fn reply(turn: AssistantTurn) -> ProviderResponse {
    ProviderResponse {
        turn,
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A final answer.
pub fn text_reply(text: &str) -> ProviderResponse {
    reply(AssistantTurn::answer(text))
}

/// A turn that only requests tools.
pub fn tool_reply(requests: Vec<ToolRequest>) -> ProviderResponse {
    reply(AssistantTurn {
        text: String::new(),
        tool_requests: requests,
    })
}

/// Non-object `args` become an empty argument map.
pub fn request_tool(id: &str, name: &str, args: serde_json::Value) -> ToolRequest {
    let arguments = args.as_object().cloned().unwrap_or_default();
    ToolRequest::new(id, name, arguments)
}
