use anyhow::{Result, bail};
use facegate::{Facegate, LoginOutcome};
use serde_json::json;
use tracing::info;

use super::print_json;

pub async fn login(client: &Facegate, username: &str, password: &str) -> Result<()> {
	info!(target: "facegate.cli", %username, api = client.api().base_url(), "logging in");
	match client.auth().login(username, password).await {
		LoginOutcome::Success { user } => print_json(&json!({
			"authenticated": true,
			"username": user.username,
			"role": user.role,
		})),
		LoginOutcome::Failure { error } => bail!("login failed: {error}"),
	}
}

pub fn logout(client: &Facegate) -> Result<()> {
	client.auth().logout()?;
	print_json(&json!({"authenticated": false}))
}

pub fn whoami(client: &Facegate) -> Result<()> {
	print_json(&json!({
		"authenticated": client.auth().is_authenticated(),
		"api": client.api().base_url(),
	}))
}
