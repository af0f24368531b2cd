mod support;

use techendeavor::api::ApiError;
use techendeavor::model::{Draft, DraftError};
use techendeavor::pages::create::CREATE_FAILED;
use techendeavor::pages::{CreateArticleViewModel, SubmitOutcome};
use techendeavor::shell::routes::Route;

use support::{unauthorized, Call, Harness, RecordingApi};

#[tokio::test]
async fn empty_title_is_rejected_before_any_request() {
    let harness = Harness::restored(RecordingApi::with_pages(1), "tok").await;
    let vm = CreateArticleViewModel::new(harness.ctx.clone());
    vm.set_body("Some body");

    assert_eq!(
        vm.submit().await,
        SubmitOutcome::Invalid(DraftError::MissingTitle)
    );
    assert!(harness.api.calls().is_empty());
    assert_eq!(vm.snapshot().draft.body, "Some body");
}

#[tokio::test]
async fn empty_body_is_rejected_before_any_request() {
    let harness = Harness::restored(RecordingApi::with_pages(1), "tok").await;
    let vm = CreateArticleViewModel::new(harness.ctx.clone());
    vm.set_title("Title");

    assert_eq!(vm.submit().await, SubmitOutcome::Invalid(DraftError::MissingBody));
    assert!(harness.api.calls().is_empty());
}

#[tokio::test]
async fn guard_redirects_without_credential() {
    let harness = Harness::signed_out(RecordingApi::with_pages(1));
    harness.ctx.navigator.navigate(Route::CreateArticle);
    let vm = CreateArticleViewModel::new(harness.ctx.clone());

    assert!(!vm.on_mount());
    assert_eq!(harness.ctx.navigator.current(), Route::Login);
}

#[tokio::test]
async fn submit_without_credential_redirects_without_request() {
    let harness = Harness::signed_out(RecordingApi::with_pages(1));
    let vm = CreateArticleViewModel::new(harness.ctx.clone());
    vm.set_title("Title");
    vm.set_body("Body");

    assert_eq!(vm.submit().await, SubmitOutcome::LoginRequired);
    assert!(harness.api.calls().is_empty());
    assert_eq!(harness.ctx.navigator.current(), Route::Login);
}

#[tokio::test]
async fn successful_submit_discards_draft_and_returns_to_feed() {
    let api = RecordingApi::with_pages(1);
    api.script_create(Ok(42));
    let harness = Harness::restored(api, "tok").await;
    harness.ctx.navigator.navigate(Route::CreateArticle);
    let vm = CreateArticleViewModel::new(harness.ctx.clone());
    assert!(vm.on_mount());
    vm.set_title("Rust at scale");
    vm.set_body("Lessons learned");

    assert_eq!(vm.submit().await, SubmitOutcome::Published { id: 42 });

    assert_eq!(
        harness.api.calls(),
        vec![Call::Create {
            bearer: Some("tok".into()),
            draft: Draft::new("Rust at scale", "Lessons learned"),
        }]
    );
    assert_eq!(vm.snapshot().draft, Draft::default());
    assert_eq!(harness.ctx.navigator.current(), Route::Feed);
}

#[tokio::test]
async fn api_detail_is_shown_verbatim_and_draft_kept() {
    let api = RecordingApi::with_pages(1);
    api.script_create(Err(ApiError::Validation {
        status: 422,
        detail: Some("title: field required".into()),
    }));
    api.script_create(Err(ApiError::Status { status: 500, detail: None }));
    let harness = Harness::restored(api, "tok").await;
    let vm = CreateArticleViewModel::new(harness.ctx.clone());
    vm.set_title("Title");
    vm.set_body("Body");

    assert_eq!(
        vm.submit().await,
        SubmitOutcome::Failed("title: field required".into())
    );
    assert_eq!(vm.snapshot().draft, Draft::new("Title", "Body"));

    assert_eq!(vm.submit().await, SubmitOutcome::Failed(CREATE_FAILED.into()));
    let state = vm.snapshot();
    assert_eq!(state.error.as_deref(), Some(CREATE_FAILED));
    assert_eq!(state.draft, Draft::new("Title", "Body"));
    assert!(harness.ctx.session.is_authenticated());
}

#[tokio::test]
async fn unauthorized_submit_signs_out_and_redirects() {
    let api = RecordingApi::with_pages(1);
    api.script_create(Err(unauthorized()));
    let harness = Harness::restored(api, "expired").await;
    let vm = CreateArticleViewModel::new(harness.ctx.clone());
    vm.set_title("Title");
    vm.set_body("Body");

    assert!(matches!(vm.submit().await, SubmitOutcome::Failed(_)));
    assert!(!harness.ctx.session.is_authenticated());
    assert_eq!(harness.ctx.navigator.current(), Route::Login);
}

#[tokio::test]
async fn second_submit_while_posting_sends_nothing() {
    let api = RecordingApi::with_pages(1);
    let release = api.gate_submit();
    let harness = Harness::restored(api, "tok").await;
    let vm = CreateArticleViewModel::new(harness.ctx.clone());
    vm.set_title("Title");
    vm.set_body("Body");

    let driver = async {
        tokio::task::yield_now().await;
        release.send(()).unwrap();
    };
    let (first, second, ()) = tokio::join!(vm.submit(), vm.submit(), driver);

    assert_eq!(first, SubmitOutcome::Published { id: 1 });
    assert_eq!(second, SubmitOutcome::Busy);
    assert_eq!(harness.api.calls().len(), 1);
    assert!(!vm.snapshot().submitting);
}

#[tokio::test]
async fn cancel_discards_draft() {
    let harness = Harness::restored(RecordingApi::with_pages(1), "tok").await;
    let vm = CreateArticleViewModel::new(harness.ctx.clone());
    vm.set_title("Half-written");
    vm.cancel();
    assert_eq!(vm.snapshot().draft, Draft::default());
    assert_eq!(harness.ctx.navigator.current(), Route::Feed);
}
