use std::sync::Arc;
use tributary_types::*;

// --- Hook trait objects ---

struct CountingHook {
    seen: std::sync::Mutex<usize>,
}

#[async_trait::async_trait]
impl Hook for CountingHook {
    fn points(&self) -> &[HookPoint] {
        &[HookPoint::Delta]
    }

    async fn on_event(&self, _ctx: &HookContext) -> Result<HookAction, HookError> {
        *self.seen.lock().unwrap() += 1;
        Ok(HookAction::Continue)
    }
}

#[tokio::test]
async fn hook_is_object_safe() {
    let hook: Arc<dyn Hook> = Arc::new(CountingHook {
        seen: std::sync::Mutex::new(0),
    });
    let action = hook
        .on_event(&HookContext::delta("hi", 1, 2))
        .await
        .unwrap();
    assert_eq!(action, HookAction::Continue);
    assert_eq!(hook.points(), &[HookPoint::Delta]);
}

// --- HookContext constructors ---

#[test]
fn delta_context_fields() {
    let ctx = HookContext::delta("abc", 3, 9);
    assert_eq!(ctx.point, HookPoint::Delta);
    assert_eq!(ctx.delta.as_deref(), Some("abc"));
    assert_eq!(ctx.deltas, 3);
    assert_eq!(ctx.bytes, 9);
    assert!(ctx.text.is_none());
    assert!(ctx.error.is_none());
}

#[test]
fn completed_context_measures_text() {
    let ctx = HookContext::completed("héllo", 2);
    assert_eq!(ctx.point, HookPoint::Completed);
    assert_eq!(ctx.text.as_deref(), Some("héllo"));
    assert_eq!(ctx.bytes, "héllo".len());
}

#[test]
fn failed_context_carries_message() {
    let err = StreamError::Cancelled;
    let ctx = HookContext::failed(err.to_string(), 0, 0);
    assert_eq!(ctx.point, HookPoint::Failed);
    assert_eq!(ctx.error.as_deref(), Some("cancelled"));
}

#[test]
fn hook_action_serde_tagged() {
    let json = serde_json::to_value(HookAction::Halt {
        reason: "quota".into(),
    })
    .unwrap();
    assert_eq!(json["action"], "halt");
    assert_eq!(json["reason"], "quota");

    let cont: HookAction = serde_json::from_str(r#"{"action":"continue"}"#).unwrap();
    assert_eq!(cont, HookAction::Continue);
}

// --- StreamOutcome ---

#[test]
fn outcome_from_result() {
    let ok: StreamOutcome = Ok::<_, StreamError>("done".to_string()).into();
    assert!(ok.is_completed());
    assert_eq!(ok.text(), Some("done"));

    let failed: StreamOutcome = Err::<String, _>(StreamError::Halted("stop".into())).into();
    assert!(!failed.is_completed());
    assert_eq!(failed.text(), None);
    assert!(matches!(
        failed.into_result(),
        Err(StreamError::Halted(reason)) if reason == "stop"
    ));
}
