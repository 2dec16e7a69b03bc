use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::config::{DEFAULT_NARRATION_SECS, OUTPUT_CUBE_MAP_SIDE};
use crate::error::AppError;
use crate::external::{
    FramePublisher, LoggingPublisher, Narration, NoSensor, SensorInput, SilentNarration,
};
use crate::gpu::{Compositor, GpuContext, PresentPipeline};
use crate::scheduler::Scheduler;
use crate::simulation::{random_unit_vector, SceneKind, SceneSet};

/// GPU resources that exist once the window does
struct Stage {
    scenes: SceneSet,
    compositor: Compositor,
    present: PresentPipeline,
}

/// Application state
pub struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    stage: Option<Stage>,
    scheduler: Scheduler,
    narration: Box<dyn Narration>,
    sensor: SensorInput,
    publisher: Box<dyn FramePublisher>,
    /// Disruptions triggered from the keyboard, applied next frame
    pending: Vec<Vec3>,
    rng: StdRng,
    last_frame: Instant,
    fps_counter: FpsCounter,
    /// Startup failure, reported by `main` once the event loop has exited
    error: Option<AppError>,
}

impl App {
    pub fn new(dev_mode: bool) -> Self {
        let narration: Box<dyn Narration> = Box::new(SilentNarration::new(DEFAULT_NARRATION_SECS));
        let scheduler = Scheduler::new(dev_mode, narration.as_ref());

        Self {
            window: None,
            gpu: None,
            stage: None,
            scheduler,
            narration,
            sensor: SensorInput::new(Box::new(NoSensor)),
            publisher: Box::new(LoggingPublisher::default()),
            pending: Vec::new(),
            rng: StdRng::from_entropy(),
            last_frame: Instant::now(),
            fps_counter: FpsCounter::new(),
            error: None,
        }
    }

    /// The error that stopped the app during startup, if any
    pub fn take_error(&mut self) -> Option<AppError> {
        self.error.take()
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        log::info!("Initializing Digital Life...");

        let window_attrs = Window::default_attributes()
            .with_title("Digital Life - Initializing...")
            .with_inner_size(winit::dpi::LogicalSize::new(1536, 256));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        log::info!("Creating GPU context...");
        let gpu = pollster::block_on(GpuContext::new(window.clone()))?;

        log::info!("Creating scenes...");
        let scenes = SceneSet::new(&gpu);
        let compositor = Compositor::new(&gpu.device, OUTPUT_CUBE_MAP_SIDE);
        let present = PresentPipeline::new(&gpu.device, gpu.format(), compositor.strip_view());

        log::info!("Initialization complete!");
        log::info!("Controls:");
        if self.scheduler.is_dev_mode() {
            log::info!("  1/2/3: Reaction-diffusion / Flocking / Network");
        }
        log::info!("  Space: Disrupt in a random direction");
        if !self.scheduler.is_dev_mode() {
            log::info!("  P: Pause/resume narration");
        }
        log::info!("  Escape: Quit");

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.stage = Some(Stage {
            scenes,
            compositor,
            present,
        });
        self.last_frame = Instant::now();
        Ok(())
    }

    fn render(&mut self) {
        let (Some(gpu), Some(stage)) = (self.gpu.as_ref(), self.stage.as_mut()) else {
            return;
        };

        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let mut disruptions = self.sensor.poll(&mut self.rng);
        disruptions.append(&mut self.pending);
        let alpha = self.scheduler.advance(dt, self.narration.as_mut());

        // Get surface texture
        let output = match gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                log::error!("Surface error: {:?}", e);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        let scene = stage.scenes.get_mut(self.scheduler.active());
        for direction in disruptions {
            scene.disrupt(gpu, &mut encoder, direction);
        }
        scene.update(gpu, &mut encoder);
        let name = scene.name();
        let target = scene.draw(gpu, &mut encoder);

        stage
            .compositor
            .composite(&gpu.device, &gpu.queue, &mut encoder, target, alpha);
        stage.present.draw(&mut encoder, &view);

        gpu.queue.submit(std::iter::once(encoder.finish()));
        self.publisher.publish(stage.compositor.strip());
        output.present();

        if let Some(fps) = self.fps_counter.tick() {
            if let Some(window) = &self.window {
                let state = if self.scheduler.is_dev_mode() {
                    " [dev]"
                } else if self.narration.is_playing() {
                    ""
                } else {
                    " [paused]"
                };
                window.set_title(&format!(
                    "Digital Life - {:.0} FPS - {} (alpha {:.2}){}",
                    fps, name, alpha, state
                ));
            }
        }
    }

    fn handle_key(&mut self, key_code: KeyCode) {
        match key_code {
            KeyCode::Digit1 | KeyCode::Digit2 | KeyCode::Digit3 => {
                let digit = match key_code {
                    KeyCode::Digit1 => 1,
                    KeyCode::Digit2 => 2,
                    _ => 3,
                };
                if let Some(kind) = SceneKind::from_digit(digit) {
                    self.scheduler.select(kind);
                }
            }

            KeyCode::Space => {
                let direction = random_unit_vector(&mut self.rng);
                log::info!(
                    "Disruption at ({:.2}, {:.2}, {:.2})",
                    direction.x,
                    direction.y,
                    direction.z
                );
                self.pending.push(direction);
            }

            KeyCode::KeyP => {
                self.scheduler.toggle_pause(self.narration.as_mut());
            }

            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.init(event_loop) {
            log::error!("{}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() && !event.repeat {
                    if let PhysicalKey::Code(key_code) = event.physical_key {
                        if key_code == KeyCode::Escape {
                            log::info!("Escape pressed, exiting...");
                            event_loop.exit();
                        } else {
                            self.handle_key(key_code);
                        }
                    }
                }
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    log::info!("Window resized to {}x{}", new_size.width, new_size.height);
                    gpu.resize(new_size);
                }
            }
            WindowEvent::RedrawRequested => {
                self.render();
                // Request another frame immediately
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if self.narration.is_playing() {
            self.narration.stop();
        }
        self.publisher.finish();
    }
}

/// Simple FPS counter
struct FpsCounter {
    last_update: Instant,
    frame_count: u32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last_update: Instant::now(),
            frame_count: 0,
        }
    }

    /// Tick the counter, returns Some(fps) every second
    fn tick(&mut self) -> Option<f64> {
        self.frame_count += 1;
        let elapsed = self.last_update.elapsed();

        if elapsed.as_secs_f64() >= 1.0 {
            let fps = self.frame_count as f64 / elapsed.as_secs_f64();
            self.frame_count = 0;
            self.last_update = Instant::now();
            Some(fps)
        } else {
            None
        }
    }
}
