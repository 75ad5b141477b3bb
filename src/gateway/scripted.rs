use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use super::GenerationBackend;
use crate::error::{EduforgeError, Result};
use crate::prompt::{Request, VisionRequest};

/// A backend that replays queued replies and records what it was asked.
///
/// Replies are consumed in order by both `complete` and `describe_image`.
/// An empty queue behaves like an unreachable provider.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: RefCell<VecDeque<std::result::Result<String, String>>>,
    requests: RefCell<Vec<Request>>,
    vision_calls: Cell<usize>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push_reply(text);
        self
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push_failure(message);
        self
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        self.replies.borrow_mut().push_back(Ok(text.into()));
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.replies.borrow_mut().push_back(Err(message.into()));
    }

    /// Text completion requests received so far.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    /// Total calls of either kind.
    pub fn calls(&self) -> usize {
        self.requests.borrow().len() + self.vision_calls.get()
    }

    fn next_reply(&self) -> Result<String> {
        match self.replies.borrow_mut().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(EduforgeError::Backend(message)),
            None => Err(EduforgeError::Backend("no scripted reply left".to_string())),
        }
    }
}

impl GenerationBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete(&self, request: &Request) -> Result<String> {
        self.requests.borrow_mut().push(request.clone());
        self.next_reply()
    }

    fn describe_image(&self, _request: &VisionRequest) -> Result<String> {
        self.vision_calls.set(self.vision_calls.get() + 1);
        self.next_reply()
    }
}
