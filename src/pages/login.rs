use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

use super::PageContext;
use crate::shell::routes::Route;

pub const LOGIN_FAILED: &str = "Invalid username or password";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    SignedIn,
    MissingField(&'static str),
    Failed(String),
    /// A sign-in request is already in flight.
    Busy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginState {
    pub username: String,
    pub password: String,
    pub error: Option<String>,
    pub submitting: bool,
}

#[derive(Debug)]
pub struct LoginViewModel {
    ctx: PageContext,
    state: Mutex<LoginState>,
}

impl LoginViewModel {
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            state: Mutex::new(LoginState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, LoginState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> LoginState {
        let mut state = self.state().clone();
        state.password = "*".repeat(state.password.chars().count());
        state
    }

    pub fn set_username(&self, username: impl Into<String>) {
        self.state().username = username.into();
    }

    pub fn set_password(&self, password: impl Into<String>) {
        self.state().password = password.into();
    }

    /// Exchange username/password for a credential, then fetch who it belongs to.
    #[instrument(skip_all)]
    pub async fn submit(&self) -> LoginOutcome {
        let (username, password) = {
            let mut state = self.state();
            if state.submitting {
                debug!("login already in flight");
                return LoginOutcome::Busy;
            }
            if state.username.is_empty() {
                return LoginOutcome::MissingField("username");
            }
            if state.password.is_empty() {
                return LoginOutcome::MissingField("password");
            }
            state.error = None;
            state.submitting = true;
            (state.username.clone(), state.password.clone())
        };

        let result = self.ctx.api.login(&username, &password).await;
        self.state().submitting = false;

        let credential = match result {
            Ok(credential) => credential,
            Err(err) => {
                warn!(?err, "login failed");
                let message = err.detail().unwrap_or(LOGIN_FAILED).to_string();
                self.state().error = Some(message.clone());
                return LoginOutcome::Failed(message);
            }
        };

        self.ctx.session.login(credential).await;
        match self.ctx.session.validate(self.ctx.api.as_ref()).await {
            Ok(_) => {}
            Err(err) if err.is_unauthorized() => {
                // The API issued a token it will not accept; the session is already cleared.
                let message = err.detail().unwrap_or(LOGIN_FAILED).to_string();
                self.state().error = Some(message.clone());
                return LoginOutcome::Failed(message);
            }
            Err(err) => warn!(?err, "signed in but could not fetch the profile yet"),
        }
        info!(%username, "login succeeded");
        self.state().password.clear();
        self.ctx.navigator.navigate(Route::Feed);
        LoginOutcome::SignedIn
    }
}
