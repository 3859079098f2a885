//! Authentication commands.

use super::{build_app, describe_api_error, prompt, wait_for_sign_in};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use backend_client::SignUpOutcome;
use stockpulse_auth::{route_decision, AuthError, RouteDecision};

/// Sign up with email and password.
pub async fn signup(format: &OutputFormat) -> Result<()> {
    let app = build_app(format).await?;

    if app.ctx.snapshot().user.is_some() {
        output::print_success("Already signed in. Run 'stockpulse logout' first.", format);
        return Ok(());
    }

    let email = prompt("Email")?;
    if email.is_empty() {
        output::print_error("Email is required", format);
        return Ok(());
    }

    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;

    if password != confirm {
        output::print_error("Passwords do not match", format);
        return Ok(());
    }
    if password.len() < 6 {
        output::print_error("Password must be at least 6 characters", format);
        return Ok(());
    }

    match app.ctx.sign_up(&email, &password).await {
        Ok(SignUpOutcome::ConfirmationRequired { email }) => {
            output::print_success(
                &format!(
                    "Check your email: a confirmation link was sent to {}. \
                     Sign in after confirming.",
                    email
                ),
                format,
            );
        }
        Ok(SignUpOutcome::SessionCreated(_)) => {
            wait_for_sign_in(&app).await?;
            output::print_success(&format!("Signed up and signed in as {}", email), format);
        }
        Err(AuthError::Api(e)) => output::print_error(&describe_api_error(&e), format),
        Err(e) => output::print_error(&e.to_string(), format),
    }

    Ok(())
}

/// Sign in with email and password.
pub async fn login(format: &OutputFormat) -> Result<()> {
    let app = build_app(format).await?;

    if let Some(user) = app.ctx.snapshot().user {
        let who = user.email.unwrap_or_else(|| user.id.to_string());
        output::print_success(&format!("Already signed in as {}", who), format);
        return Ok(());
    }

    let email = prompt("Email")?;
    if email.is_empty() {
        output::print_error("Email is required", format);
        return Ok(());
    }
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        output::print_error("Password is required", format);
        return Ok(());
    }

    println!("Signing in...");

    match app.ctx.sign_in(&email, &password).await {
        Ok(_) => {
            wait_for_sign_in(&app).await?;
            let snapshot = app.ctx.snapshot();
            match snapshot.organization {
                Some(organization) => output::print_success(
                    &format!("Signed in to {} ({})", organization.name, email),
                    format,
                ),
                None => output::print_success(
                    &format!(
                        "Signed in as {}. No restaurant yet: run 'stockpulse onboard'.",
                        email
                    ),
                    format,
                ),
            }
        }
        Err(AuthError::Api(e)) => output::print_error(&describe_api_error(&e), format),
        Err(e) => output::print_error(&e.to_string(), format),
    }

    Ok(())
}

/// Sign out and clear the local session.
pub async fn logout(format: &OutputFormat) -> Result<()> {
    let app = build_app(format).await?;

    if app.ctx.snapshot().user.is_none() {
        output::print_success("Not signed in", format);
        return Ok(());
    }

    match app.ctx.sign_out().await {
        Ok(()) => output::print_success("Signed out", format),
        Err(e) => {
            // Local state stays signed in on failure, and we say so
            output::print_error(
                &format!("Sign-out failed, you are still signed in: {}", e),
                format,
            );
        }
    }

    Ok(())
}

/// Show the derived auth state.
pub async fn status(format: &OutputFormat) -> Result<()> {
    let app = build_app(format).await?;
    let snapshot = app.ctx.snapshot();
    let phase = app.ctx.phase();

    match format {
        OutputFormat::Text => {
            output::print_heading("StockPulse status");
            output::print_row("Phase", &format!("{:?}", phase));
            match &snapshot.user {
                Some(user) => {
                    output::print_row(
                        "User",
                        user.email.as_deref().unwrap_or(&user.id.to_string()),
                    );
                }
                None => output::print_row("User", "not signed in"),
            }
            match &snapshot.organization {
                Some(organization) => {
                    output::print_row(
                        "Restaurant",
                        &format!("{} ({})", organization.name, organization.slug),
                    );
                }
                None => output::print_row("Restaurant", "none"),
            }
            if let Some(decision) = route_decision(&snapshot) {
                let next = match decision {
                    RouteDecision::Login => "sign in with 'stockpulse login'",
                    RouteDecision::Onboarding => "create a restaurant with 'stockpulse onboard'",
                    RouteDecision::Dashboard => "manage stock with 'stockpulse inventory list'",
                };
                output::print_row("Next", next);
            }
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "phase": phase,
                "user": snapshot.user,
                "organization": snapshot.organization,
                "route": route_decision(&snapshot),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

/// Request a password recovery email.
pub async fn reset_password(format: &OutputFormat) -> Result<()> {
    let app = build_app(format).await?;

    let email = prompt("Email")?;
    if email.is_empty() {
        output::print_error("Email is required", format);
        return Ok(());
    }

    match app.ctx.reset_password(&email).await {
        Ok(()) => output::print_success(
            &format!(
                "If an account exists for {}, a password reset link is on its way.",
                email
            ),
            format,
        ),
        Err(AuthError::Api(e)) => output::print_error(&describe_api_error(&e), format),
        Err(e) => output::print_error(&e.to_string(), format),
    }

    Ok(())
}

/// Set a new password for the current (or recovery) session.
pub async fn update_password(format: &OutputFormat) -> Result<()> {
    let app = build_app(format).await?;

    let password = rpassword::prompt_password("New password: ")?;
    let confirm = rpassword::prompt_password("Confirm new password: ")?;

    if password != confirm {
        output::print_error("Passwords do not match", format);
        return Ok(());
    }
    if password.len() < 8 {
        output::print_error("Password must be at least 8 characters", format);
        return Ok(());
    }

    match app.ctx.update_password(&password).await {
        Ok(_) => output::print_success("Password updated. Sign in again.", format),
        Err(AuthError::NotSignedIn) => {
            output::print_error("Not signed in. Open the recovery link first.", format)
        }
        Err(AuthError::Api(e)) => output::print_error(&describe_api_error(&e), format),
        Err(e) => output::print_error(&e.to_string(), format),
    }

    Ok(())
}
