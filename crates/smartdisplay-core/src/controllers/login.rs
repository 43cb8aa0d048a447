use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::auth::{AuthState, PIN_LENGTH, PinEntry, PinInput, is_valid_pin, resolve_role};
use crate::context::AppContext;
use crate::error::CoreError;
use crate::router::View;
use crate::session::SessionKey;
use crate::store::{partial, slices};

const DEFAULT_REJECTION: &str = "Login failed";

/// PIN keypad and sign-in flow. Owns `authState`.
///
/// A backend call happens only once a full PIN has been entered.
pub struct LoginController {
    ctx: AppContext,
    entry: Mutex<PinEntry>,
}

impl LoginController {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            entry: Mutex::new(PinEntry::new()),
        }
    }

    /// Feed one keypad press. Returns `Some` once the fourth digit
    /// completed the PIN and the login succeeded.
    pub async fn press(&self, key: char) -> Result<Option<AuthState>, CoreError> {
        let input = self.entry.lock().await.push(key);
        match input {
            PinInput::Complete(pin) => self.submit(pin).await.map(Some),
            PinInput::Pending { .. } | PinInput::Ignored => Ok(None),
        }
    }

    pub async fn backspace(&self) {
        self.entry.lock().await.backspace();
    }

    pub async fn clear_entry(&self) {
        self.entry.lock().await.clear();
    }

    /// Masked keypad display, e.g. `●●○○`.
    pub async fn masked(&self) -> String {
        self.entry.lock().await.masked()
    }

    /// Sign in with a whole PIN. Anything but exactly four digits is
    /// rejected locally.
    pub async fn login(&self, pin: &str) -> Result<AuthState, CoreError> {
        if !is_valid_pin(pin) {
            return Err(CoreError::InvalidPin {
                expected: PIN_LENGTH,
            });
        }
        self.submit(SecretString::from(pin)).await
    }

    async fn submit(&self, pin: SecretString) -> Result<AuthState, CoreError> {
        let response = self.ctx.api().login(&pin).await?;

        if !response.success {
            self.reset().await;
            let message = response
                .message
                .unwrap_or_else(|| DEFAULT_REJECTION.to_owned());
            warn!(%message, "login rejected");
            return Err(CoreError::LoginRejected { message });
        }

        let role = resolve_role(response.role.as_deref(), pin.expose_secret());
        let state = AuthState::signed_in(role, response.username);

        let session = self.ctx.session();
        session.set(SessionKey::Role, role.to_string());
        match &state.username {
            Some(name) => session.set(SessionKey::CurrentUser, name.clone()),
            None => {
                session.remove(SessionKey::CurrentUser);
            }
        }
        session.set_pin(pin);

        self.ctx
            .store()
            .set_state(partial(slices::AUTH, state.to_value()))
            .await;
        self.ctx.router().navigate(View::Home);
        info!(%role, "login succeeded");
        Ok(state)
    }

    /// End the session and go back to the keypad.
    pub async fn logout(&self) {
        self.reset().await;
        self.ctx.router().navigate(View::Login);
        info!("logged out");
    }

    async fn reset(&self) {
        self.ctx.session().clear();
        self.ctx
            .store()
            .set_state(partial(slices::AUTH, AuthState::guest().to_value()))
            .await;
    }
}
