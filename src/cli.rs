use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Overlay instrument graphics on a live camera feed", long_about = None)]
pub struct Args {
	/// Configuration file (defaults to the per-user hudcam config)
	#[arg(short, long)]
	pub config: Option<PathBuf>,

	/// Camera index, overrides the configuration
	#[arg(long)]
	pub camera: Option<i32>,

	/// Output debug information
	#[arg(short, long)]
	pub debug: bool,

	/// Flight-director image, overrides the configuration
	#[arg(long)]
	pub flight_director: Option<PathBuf>,

	/// Mission-plan image, overrides the configuration
	#[arg(long)]
	pub mission_plan: Option<PathBuf>,
}

pub fn parse_args() -> Args {
	Args::parse()
}
