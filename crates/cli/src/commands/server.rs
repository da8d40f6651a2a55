use anyhow::{Context, Result};
use facegate::Facegate;
use tracing::warn;

use super::print_json;

pub async fn status(client: &Facegate) -> Result<()> {
	let status = client.api().system_status().await.context("fetching system status")?;
	for component in status.failing_components() {
		warn!(target: "facegate.cli", %component, "component unhealthy");
	}
	print_json(&status)
}

pub async fn users(client: &Facegate) -> Result<()> {
	let users = client.api().list_users().await.context("listing users")?;
	print_json(&users)
}
