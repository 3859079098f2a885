//! CLI command implementations.

pub mod auth;
pub mod inventory;
pub mod onboard;

use crate::output::{self, OutputFormat};
use anyhow::{anyhow, bail, Result};
use backend_client::{ApiError, BackendClient, Organization};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use stockpulse_auth::{route_decision, AuthContext, RouteDecision};
use stockpulse_config_and_utils::{Config, Paths};
use stockpulse_storage::create_session_store;

/// Everything a command needs: the backend client and a bootstrapped,
/// settled auth context.
pub struct App {
    pub client: Arc<BackendClient>,
    pub ctx: Arc<AuthContext<BackendClient>>,
}

/// Build the context, run the startup session fetch, and wait for the
/// projection to settle.
pub async fn build_app(format: &OutputFormat) -> Result<App> {
    let paths = Paths::new()?;
    let config = Config::load(&paths)?;

    let client = match BackendClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(e) if e.is_configuration() => {
            output::print_error(
                "Backend not configured. Set STOCKPULSE_BACKEND_URL and \
                 STOCKPULSE_ANON_KEY, then retry.",
                format,
            );
            bail!("backend not configured");
        }
        Err(e) => return Err(e.into()),
    };

    let store = Arc::new(create_session_store(&paths)?);
    let ctx = Arc::new(AuthContext::new(Arc::clone(&client), store));
    ctx.listen();

    if let Err(e) = ctx.bootstrap().await {
        // Typed failure with a retry affordance; no placeholder state
        output::print_error(&format!("Could not reach the backend: {}. Retry.", e), format);
        bail!("bootstrap failed");
    }
    ctx.wait_settled().await;
    tracing::debug!(phase = ?ctx.phase(), "Auth context settled");

    Ok(App { client, ctx })
}

/// Where the signed-in state says the user should be. Commands that need
/// the dashboard call this and print the "redirect" instead of running.
pub fn require_dashboard(app: &App, format: &OutputFormat) -> Result<(Organization, String)> {
    let snapshot = app.ctx.snapshot();
    match route_decision(&snapshot) {
        Some(RouteDecision::Dashboard) => {
            let organization = snapshot
                .organization
                .ok_or_else(|| anyhow!("organization missing from dashboard state"))?;
            let access_token = app
                .ctx
                .access_token()?
                .ok_or_else(|| anyhow!("access token missing from dashboard state"))?;
            Ok((organization, access_token))
        }
        Some(RouteDecision::Onboarding) => {
            output::print_error(
                "No restaurant yet. Run 'stockpulse onboard' first.",
                format,
            );
            bail!("onboarding required");
        }
        Some(RouteDecision::Login) | None => {
            output::print_error("Not signed in. Run 'stockpulse login' first.", format);
            bail!("login required");
        }
    }
}

/// Read a line from stdin with a prompt.
pub fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

/// Wait briefly for the listener to apply a just-published auth event.
pub async fn wait_for_sign_in(app: &App) -> Result<()> {
    for _ in 0..100 {
        if app.ctx.snapshot().user.is_some() {
            app.ctx.wait_settled().await;
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    bail!("sign-in event was not applied");
}

/// Render an API error for inline display.
pub fn describe_api_error(error: &ApiError) -> String {
    match error {
        ApiError::InvalidCredentials(_) => "Invalid email or password".to_string(),
        ApiError::WeakPassword(msg) => format!("Password rejected: {}", msg),
        ApiError::SlugTaken(slug) => format!("The slug '{}' is already taken", slug),
        other if other.is_transient() => format!("Network problem: {}. Retry.", other),
        other => other.to_string(),
    }
}
