use anyhow::Result;
use cli::parse_args;
use compositor::{Assets, Compositor};
use conf::load_config;
use log::logger::AdvancedLogger;
use log::{LogLevel, info};

mod cli;
mod compositor;
mod conf;
mod cv;

fn main() -> Result<()> {
	let args = parse_args();
	AdvancedLogger::init(if args.debug { LogLevel::Debug } else { LogLevel::Info })?;

	let cfg = load_config(args.config.as_deref())?.with_overrides(&args);
	cfg.validate()?;

	let mut camera = cv::get_stream_camera(cfg.camera.index)?;
	let assets = Assets::load(&cfg.assets)?;
	let mut window = cv::init_window(&cfg.window)?;

	let mut compositor = Compositor::new(&cfg, assets);
	compositor.run(&mut camera, &mut window)?;

	info!("Exiting");
	Ok(())
}
