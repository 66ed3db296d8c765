use upcraft_core::{Message, Role};
use uuid::Uuid;

/// In-memory conversation state for one agent turn.
/// Persistence is the caller's concern.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: Uuid,
    system_prompt: Option<String>,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            system_prompt: None,
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = Some(prompt.into());
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages as sent to a provider: the system prompt first, if set.
    pub fn provider_messages(&self) -> Vec<Message> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            out.push(Message::system(prompt.clone()));
        }
        out.extend(self.messages.iter().cloned());
        out
    }

    /// Tool messages answering `call_id`.
    pub fn tool_results_for<'a>(&'a self, call_id: &'a str) -> impl Iterator<Item = &'a Message> {
        self.messages
            .iter()
            .filter(move |m| m.role == Role::Tool && m.tool_call_id.as_deref() == Some(call_id))
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
