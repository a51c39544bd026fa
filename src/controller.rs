use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::client::TryOnApi;
use crate::error::TryOnError;
use crate::history::History;
use crate::models::{describe_image_ref, TryOnResult};
use crate::notify::Notifications;
use crate::progress::ProgressIndicator;
use crate::request::TryOnForm;
use crate::staging::StagedInputs;

pub const SUCCESS_MESSAGE: &str = "Virtual try-on completed successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Submitting,
}

/// Drives one submission at a time from staged inputs to a recorded result.
pub struct SubmissionController {
    api: Arc<dyn TryOnApi>,
    progress: Arc<dyn ProgressIndicator>,
    history: Arc<History>,
    notices: Arc<Notifications>,
    phase: Mutex<Phase>,
}

/// Held while submitting. Dropping it puts the controller back to idle,
/// so an abandoned submit future cannot leave it stuck.
struct Episode<'a> {
    controller: &'a SubmissionController,
}

impl Drop for Episode<'_> {
    fn drop(&mut self) {
        self.controller.progress.finish();
        *self.controller.phase.lock() = Phase::Idle;
    }
}

impl SubmissionController {
    pub fn new(
        api: Arc<dyn TryOnApi>,
        progress: Arc<dyn ProgressIndicator>,
        history: Arc<History>,
        notices: Arc<Notifications>,
    ) -> Self {
        Self { api, progress, history, notices, phase: Mutex::new(Phase::Idle) }
    }

    pub fn phase(&self) -> Phase { *self.phase.lock() }

    pub fn is_loading(&self) -> bool { self.phase() == Phase::Submitting }

    pub fn progress(&self) -> u8 { self.progress.percent() }

    fn begin(&self) -> Result<Episode<'_>, TryOnError> {
        {
            let mut phase = self.phase.lock();
            if *phase == Phase::Submitting {
                return Err(TryOnError::Busy);
            }
            *phase = Phase::Submitting;
        }
        self.progress.start();
        Ok(Episode { controller: self })
    }

    pub async fn submit(&self, inputs: &StagedInputs) -> Result<TryOnResult, TryOnError> {
        let form = match inputs.ready() {
            Ok(ready) => TryOnForm::build(&ready),
            Err(e) => {
                warn!("⚠️ Submit rejected: {}", e);
                self.notices.error(e.to_string());
                return Err(e);
            }
        };

        let episode = match self.begin() {
            Ok(episode) => episode,
            Err(e) => {
                warn!("⚠️ Submit rejected: {}", e);
                self.notices.error(e.to_string());
                return Err(e);
            }
        };

        info!("🚀 Submitting try-on request");
        let outcome = self.api.try_on(form).await;
        drop(episode);

        match outcome {
            Ok(response) => {
                let result = TryOnResult::from_response(response);
                let images: Vec<String> = [&result.openai_image, &result.external_image]
                    .into_iter()
                    .flatten()
                    .map(|r| describe_image_ref(r))
                    .collect();
                if !result.has_image() {
                    warn!("⚠️ Try-on {} succeeded without any image", result.id);
                }
                info!("✅ Try-on {} completed: [{}] {}", result.id, images.join(", "), result.text);
                self.history.record_result(result.clone());
                self.notices.success(SUCCESS_MESSAGE);
                Ok(result)
            }
            Err(e) => {
                error!("❌ Try-on failed: {:?}", e);
                self.notices.error(e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GENERIC_FAILURE;
    use crate::models::ModelType;
    use crate::notify::ToastLevel;
    use crate::testing::{ok, staged, ScriptedApi};
    use pretty_assertions::assert_eq;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<&'static str>>,
    }

    impl ProgressIndicator for RecordingProgress {
        fn start(&self) { self.events.lock().push("start") }
        fn finish(&self) { self.events.lock().push("finish") }
        fn percent(&self) -> u8 { 0 }
    }

    struct Harness {
        api: Arc<ScriptedApi>,
        progress: Arc<RecordingProgress>,
        history: Arc<History>,
        notices: Arc<Notifications>,
        controller: SubmissionController,
    }

    fn harness(api: ScriptedApi) -> Harness {
        let api = Arc::new(api);
        let progress = Arc::new(RecordingProgress::default());
        let history = Arc::new(History::default());
        let notices = Arc::new(Notifications::default());
        let controller = SubmissionController::new(api.clone(), progress.clone(), history.clone(), notices.clone());
        Harness { api, progress, history, notices, controller }
    }

    #[tokio::test]
    async fn missing_image_never_reaches_the_network() {
        let h = harness(ScriptedApi::replying(vec![ok(Some("x.png"), "done")]));
        let mut inputs = staged();
        inputs.set_cloth_image(None);

        let err = h.controller.submit(&inputs).await.unwrap_err();
        assert_eq!(err.to_string(), "Please upload both person and cloth images");
        assert_eq!(h.api.calls(), 0);
        assert!(h.history.is_empty());
        assert_eq!(h.controller.phase(), Phase::Idle);
        assert!(h.progress.events.lock().is_empty());
        assert_eq!(h.notices.drain()[0].level, ToastLevel::Error);
    }

    #[tokio::test]
    async fn success_is_recorded_and_becomes_current() {
        let h = harness(ScriptedApi::replying(vec![ok(Some("x.png"), "done")]));
        let result = h.controller.submit(&staged()).await.unwrap();

        assert_eq!(result.openai_image.as_deref(), Some("x.png"));
        assert_eq!(result.external_image, None);
        assert_eq!(result.text, "done");
        assert_eq!(h.history.entries(), vec![result.clone()]);
        assert_eq!(h.history.current_result(), Some(result));
        assert_eq!(*h.progress.events.lock(), vec!["start", "finish"]);
        assert!(!h.controller.is_loading());

        let toasts = h.notices.drain();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].message, SUCCESS_MESSAGE);

        let forms = h.api.forms.lock();
        assert_eq!(forms[0].text("model_type"), Some(""));
        assert_eq!(forms[0].text("instructions"), Some(""));
    }

    #[tokio::test]
    async fn history_orders_newest_first_across_submissions() {
        let h = harness(ScriptedApi::replying(vec![ok(Some("1.png"), "first"), ok(None, "second"), ok(Some("3.png"), "third")]));
        let mut inputs = staged();
        for model_type in [ModelType::Top, ModelType::Bottom, ModelType::Full] {
            inputs.set_model_type(Some(model_type));
            h.controller.submit(&inputs).await.unwrap();
        }
        let texts: Vec<_> = h.history.entries().into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["third", "second", "first"]);
        assert_eq!(h.api.forms.lock()[2].text("model_type"), Some("full"));
    }

    #[tokio::test]
    async fn failures_leave_history_alone() {
        let h = harness(ScriptedApi::replying(vec![
            ok(Some("keep.png"), "kept"),
            Err(TryOnError::Server { status: 400, message: "Invalid image format".into() }),
            Err(TryOnError::Transport("connection reset".into())),
        ]));
        h.controller.submit(&staged()).await.unwrap();
        let before = h.history.entries();
        h.notices.drain();

        let server = h.controller.submit(&staged()).await.unwrap_err();
        assert_eq!(server.to_string(), "Invalid image format");
        let transport = h.controller.submit(&staged()).await.unwrap_err();
        assert_eq!(transport.to_string(), GENERIC_FAILURE);

        assert_eq!(h.history.entries(), before);
        assert_eq!(h.controller.phase(), Phase::Idle);
        let messages: Vec<_> = h.notices.drain().into_iter().map(|t| t.message).collect();
        assert_eq!(messages, vec!["Invalid image format".to_string(), GENERIC_FAILURE.to_string()]);
    }

    #[tokio::test]
    async fn second_submit_while_submitting_is_rejected() {
        let gate = Arc::new(Notify::new());
        let api = ScriptedApi { gate: Some(gate.clone()), ..ScriptedApi::replying(vec![ok(Some("x.png"), "done")]) };
        let h = harness(api);
        let inputs = staged();

        let (first, second) = tokio::join!(h.controller.submit(&inputs), async {
            assert!(h.controller.is_loading());
            let rejected = h.controller.submit(&inputs).await;
            gate.notify_one();
            rejected
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(TryOnError::Busy)));
        assert_eq!(h.api.calls(), 1);
        assert_eq!(h.history.len(), 1);
        assert_eq!(*h.progress.events.lock(), vec!["start", "finish"]);
        assert_eq!(h.controller.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn dropped_submission_returns_to_idle() {
        let gate = Arc::new(Notify::new());
        let h = harness(ScriptedApi { gate: Some(gate), ..Default::default() });
        let inputs = staged();
        {
            let pending = h.controller.submit(&inputs);
            tokio::pin!(pending);
            let timed_out = tokio::time::timeout(std::time::Duration::from_millis(10), &mut pending).await;
            assert!(timed_out.is_err());
            assert!(h.controller.is_loading());
        }
        assert_eq!(h.controller.phase(), Phase::Idle);
        assert!(h.history.is_empty());
    }
}
