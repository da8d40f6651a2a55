//! Layered configuration: file, then `FACEGATE_*` environment, then flags.

use anyhow::{Context, Result};
use facegate::ClientConfig;

use crate::cli::GlobalArgs;

pub fn resolve(args: &GlobalArgs) -> Result<ClientConfig> {
	let mut config = ClientConfig::load_or_default(args.config.as_deref()).context("loading configuration")?;
	config.apply_env_overrides();
	apply_flags(&mut config, args);
	config.validate()?;
	Ok(config)
}

fn apply_flags(config: &mut ClientConfig, args: &GlobalArgs) {
	if let Some(url) = &args.api_url {
		config.api_base_url = url.clone();
	}
	if let Some(url) = &args.ws_url {
		config.websocket_url = url.clone();
	}
	if let Some(dir) = &args.state_dir {
		config.state_dir = Some(dir.clone());
	}
}
