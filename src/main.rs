mod app;
mod config;
mod cubemap;
mod error;
mod external;
mod gpu;
mod scheduler;
mod simulation;
mod timeline;

use winit::event_loop::{ControlFlow, EventLoop};

use app::App;
use error::AppError;

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // `--dev`: manual scene switching, no timeline
    let dev_mode = std::env::args().skip(1).any(|arg| arg == "--dev");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(dev_mode);
    event_loop.run_app(&mut app)?;

    match app.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
