//! Restaurant onboarding command.

use super::{build_app, describe_api_error, prompt};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use stockpulse_auth::AuthError;
use stockpulse_config_and_utils::slugify;

/// Create the restaurant for the signed-in user.
pub async fn onboard(
    name: Option<String>,
    slug: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let app = build_app(format).await?;
    let snapshot = app.ctx.snapshot();

    if snapshot.user.is_none() {
        output::print_error("Not signed in. Run 'stockpulse login' first.", format);
        return Ok(());
    }
    if let Some(organization) = snapshot.organization {
        output::print_success(
            &format!(
                "Already set up: {} ({})",
                organization.name, organization.slug
            ),
            format,
        );
        return Ok(());
    }

    let name = match name {
        Some(name) => name,
        None => prompt("Restaurant name")?,
    };
    if name.trim().is_empty() {
        output::print_error("Restaurant name is required", format);
        return Ok(());
    }

    // Suggested from the name, exactly like the onboarding form does
    let slug = match slug {
        Some(slug) => slug,
        None => {
            let suggested = slugify(&name);
            let entered = prompt(&format!("URL slug [{}]", suggested))?;
            if entered.is_empty() {
                suggested
            } else {
                entered
            }
        }
    };
    if slug.trim().is_empty() {
        output::print_error("URL slug is required", format);
        return Ok(());
    }

    println!("Creating restaurant...");

    match app.ctx.create_organization(name.trim(), slug.trim()).await {
        Ok(organization) => {
            output::print_success(
                &format!(
                    "Created {} ({}). Run 'stockpulse inventory list' to start.",
                    organization.name, organization.slug
                ),
                format,
            );
        }
        Err(AuthError::Api(e)) => output::print_error(&describe_api_error(&e), format),
        Err(e) => output::print_error(&e.to_string(), format),
    }

    Ok(())
}
