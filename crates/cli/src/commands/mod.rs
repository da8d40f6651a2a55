mod auth;
mod capture;
mod channel;
mod recognize;
mod server;

use anyhow::{Context, Result};
use facegate::Facegate;
use facegate::config::default_config_path;
use serde::Serialize;
use tracing::info;

use crate::cli::{Commands, GlobalArgs};
use crate::config;

pub async fn dispatch(command: Commands, global: &GlobalArgs) -> Result<()> {
	let client = Facegate::new(config::resolve(global)?)?;
	match command {
		Commands::Login { username, password } => auth::login(&client, &username, &password).await,
		Commands::Logout => auth::logout(&client),
		Commands::Whoami => auth::whoami(&client),
		Commands::Status => server::status(&client).await,
		Commands::Users => server::users(&client).await,
		Commands::Capture(args) => capture::execute(&client, args).await,
		Commands::Recognize(args) => recognize::execute(&client, args).await,
		Commands::Listen(args) => channel::listen(&client, args).await,
		Commands::Send { kind, payload, timeout_secs } => channel::send(&client, &kind, payload.as_deref(), timeout_secs).await,
		Commands::Config { save } => show_config(&client, global, save),
	}
}

fn show_config(client: &Facegate, global: &GlobalArgs, save: bool) -> Result<()> {
	if save {
		let path = global
			.config
			.clone()
			.or_else(default_config_path)
			.context("no config directory on this platform, pass --config")?;
		client.config().save(&path).with_context(|| format!("writing {}", path.display()))?;
		info!(target: "facegate.cli", path = %path.display(), "configuration saved");
	}
	print_json(client.config())
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}
