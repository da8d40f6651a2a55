use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "facegate")]
#[command(about = "facegate - face-recognition client from the command line")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	#[command(flatten)]
	pub global: GlobalArgs,

	#[command(subcommand)]
	pub command: Commands,
}

/// Options that shape the client configuration for every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
	/// Config file (defaults to <config dir>/facegate/config.json when present)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// REST API base URL, e.g. http://localhost:5000/api
	#[arg(long, global = true, value_name = "URL")]
	pub api_url: Option<String>,

	/// Event channel URL, e.g. ws://localhost:5000/ws
	#[arg(long, global = true, value_name = "URL")]
	pub ws_url: Option<String>,

	/// Directory holding the session token
	#[arg(long, global = true, value_name = "DIR")]
	pub state_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Log in and store the session token
	Login {
		#[arg(short, long)]
		username: String,
		/// Password (read from FACEGATE_PASSWORD when omitted)
		#[arg(short, long, env = "FACEGATE_PASSWORD", hide_env_values = true)]
		password: String,
	},

	/// Forget the stored session token
	Logout,

	/// Report whether a session token is stored
	Whoami,

	/// Show server component health
	Status,

	/// List registered users
	Users,

	/// Collect training images for a user and commit them
	Capture(CaptureArgs),

	/// Run recognition and print a line per local frame
	#[command(alias = "rec")]
	Recognize(RecognizeArgs),

	/// Print event channel traffic as JSON lines
	Listen(ListenArgs),

	/// Send one envelope over the event channel
	Send {
		/// Envelope type
		kind: String,
		/// JSON payload (defaults to null)
		payload: Option<String>,
		/// Seconds to wait for the connection to open
		#[arg(long, default_value = "5")]
		timeout_secs: u64,
	},

	/// Print the effective configuration
	Config {
		/// Also write it to the config file, creating it if needed
		#[arg(long)]
		save: bool,
	},
}

#[derive(Args, Debug)]
pub struct CaptureArgs {
	#[arg(long)]
	pub user_id: i64,
	/// Display name of the user
	#[arg(long)]
	pub name: String,
	/// Video target (an image file for the still-image camera)
	#[arg(long)]
	pub target: String,
	/// Images to collect (defaults to max_capture_images)
	#[arg(long)]
	pub images: Option<usize>,
	/// Pause between captures in milliseconds (defaults to capture_interval_ms)
	#[arg(long)]
	pub interval_ms: Option<u64>,
}

#[derive(Args, Debug)]
pub struct RecognizeArgs {
	/// Video target (an image file for the still-image camera)
	#[arg(long)]
	pub target: String,
	/// Stop after this many seconds instead of waiting for Ctrl-C
	#[arg(long)]
	pub duration_secs: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
	/// Event types to print in addition to connected/disconnected/error
	#[arg(short, long = "event", value_name = "TYPE")]
	pub events: Vec<String>,
	/// Stop after this many seconds instead of waiting for Ctrl-C
	#[arg(long)]
	pub duration_secs: Option<u64>,
}
