//! Scripted stand-in for the remote service, shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::client::TryOnApi;
use crate::error::TryOnError;
use crate::models::{ImagePayload, LoginReply, TryOnResponse};
use crate::request::TryOnForm;
use crate::staging::StagedInputs;

#[derive(Default)]
pub struct ScriptedApi {
    pub replies: Mutex<VecDeque<Result<TryOnResponse, TryOnError>>>,
    pub logins: Mutex<VecDeque<Result<LoginReply, TryOnError>>>,
    pub forms: Mutex<Vec<TryOnForm>>,
    pub calls: AtomicUsize,
    /// When set, `try_on` waits for a notification before answering.
    pub gate: Option<Arc<Notify>>,
}

impl ScriptedApi {
    pub fn replying(replies: Vec<Result<TryOnResponse, TryOnError>>) -> Self {
        Self { replies: Mutex::new(replies.into()), ..Default::default() }
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl TryOnApi for ScriptedApi {
    async fn try_on(&self, form: TryOnForm) -> Result<TryOnResponse, TryOnError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.forms.lock().push(form);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.replies.lock().pop_front().unwrap_or_else(|| Err(TryOnError::Transport("script exhausted".into())))
    }

    async fn login(&self, _: &str, _: &str) -> Result<LoginReply, TryOnError> {
        self.logins.lock().pop_front().unwrap_or_else(|| Err(TryOnError::Transport("script exhausted".into())))
    }
}

pub fn ok(openai_image: Option<&str>, text: &str) -> Result<TryOnResponse, TryOnError> {
    Ok(TryOnResponse { openai_image: openai_image.map(String::from), external_image: None, text: Some(text.into()) })
}

/// Staged inputs with both images present and nothing else set.
pub fn staged() -> StagedInputs {
    let mut staged = StagedInputs::default();
    staged.set_person_image(Some(ImagePayload::new(b"A".to_vec(), None, Some("image/png".into()), "person")));
    staged.set_cloth_image(Some(ImagePayload::new(b"B".to_vec(), None, Some("image/png".into()), "cloth")));
    staged
}
