//! Window shell and frame loop
//!
//! Owns the winit application handler: window creation, GPU init, input
//! collection into a per-frame snapshot, and the simulate/render/present
//! cadence. All game logic lives in [`crate::game::GameSession`].

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::assets::Assets;
use crate::audio::{AudioSystem, NullSink};
use crate::game::level::{self, Level};
use crate::game::{render, GameSession, InputSnapshot};
use crate::renderer::{BatchRenderer, RenderState, TextureLibrary};
use crate::settings::Settings;

const WINDOW_SIZE: u32 = 900;

/// Everything that needs a live window/GPU to exist
struct GameCtx {
    renderer: BatchRenderer<RenderState>,
    library: TextureLibrary,
    assets: Assets,
    session: GameSession,
    audio: AudioSystem,
}

pub struct App {
    window: Option<Arc<Window>>,
    ctx: Option<GameCtx>,
    input: InputSnapshot,
    settings: Settings,
    last_frame: Instant,
    started: Instant,
    // fps accounting
    frame_count: u32,
    fps_window: Instant,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let now = Instant::now();
        Self {
            window: None,
            ctx: None,
            input: InputSnapshot::default(),
            settings,
            last_frame: now,
            started: now,
            frame_count: 0,
            fps_window: now,
        }
    }

    fn load_levels() -> Vec<Level> {
        let dir = Path::new("levels");
        let loaded: Vec<Level> = match level::level_files(dir) {
            Ok(files) => files
                .iter()
                .filter_map(|path| match level::load_level(path) {
                    Ok(level) => Some(level),
                    Err(err) => {
                        log::warn!("App - skipping level: {err}");
                        None
                    }
                })
                .collect(),
            Err(err) => {
                log::warn!("App - {err}, using built-in levels");
                Vec::new()
            }
        };
        if loaded.is_empty() {
            level::builtin_levels()
        } else {
            loaded
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .expect("Failed to create rendering surface");
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("No suitable GPU adapter");
        log::info!("App - using adapter {:?}", adapter.get_info().name);

        let render_state = pollster::block_on(RenderState::new(
            surface,
            &adapter,
            size.width.max(1),
            size.height.max(1),
        ));

        let mut renderer = BatchRenderer::new(render_state);
        let shader = renderer.backend().quad_shader();
        renderer.set_shader(shader);

        let mut library = TextureLibrary::new();
        let assets = Assets::generate(renderer.backend_mut(), &mut library);

        let mut session = GameSession::new(Self::load_levels());
        session.particles_enabled = self.settings.particles_enabled;
        let audio = AudioSystem::new(NullSink, self.settings.master_volume);

        self.ctx = Some(GameCtx {
            renderer,
            library,
            assets,
            session,
            audio,
        });
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(ctx) = self.ctx.as_mut() else { return };

        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        ctx.session.update(&self.input, dt);
        for sound in ctx.session.drain_sounds() {
            ctx.audio.play(sound);
        }
        if ctx.session.quit_requested() {
            self.settings.save();
            event_loop.exit();
            return;
        }

        match ctx.renderer.backend_mut().begin_frame() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (w, h) = ctx.renderer.backend().size;
                ctx.renderer.backend_mut().resize(w, h);
                self.input.end_frame();
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("App - GPU out of memory, exiting");
                event_loop.exit();
                return;
            }
            Err(err) => {
                log::warn!("App - skipping frame: {err}");
                self.input.end_frame();
                return;
            }
        }

        let buttons = render::draw(&ctx.session, &ctx.assets, &ctx.library, &mut ctx.renderer);
        if self.input.clicked {
            if let Some(action) = render::hit_test(&buttons, self.input.mouse_ndc) {
                ctx.session.handle_ui(action);
            }
        }

        let filter = ctx.session.active_filter();
        let time = self.started.elapsed().as_secs_f32();
        ctx.renderer.backend_mut().present(filter, time);

        self.frame_count += 1;
        if self.settings.show_fps && self.fps_window.elapsed().as_secs_f32() >= 1.0 {
            log::info!("App - {} fps", self.frame_count);
            self.frame_count = 0;
            self.fps_window = Instant::now();
        }

        self.input.end_frame();
    }

    fn on_key(&mut self, event: &KeyEvent) {
        let pressed = event.state == ElementState::Pressed;
        match event.physical_key {
            PhysicalKey::Code(KeyCode::ArrowLeft | KeyCode::KeyA) => self.input.left_held = pressed,
            PhysicalKey::Code(KeyCode::ArrowRight | KeyCode::KeyD) => {
                self.input.right_held = pressed
            }
            PhysicalKey::Code(KeyCode::Space) if pressed && !event.repeat => {
                self.input.launch = true
            }
            PhysicalKey::Code(KeyCode::KeyP) if pressed && !event.repeat => {
                self.input.pause = true
            }
            PhysicalKey::Code(KeyCode::Escape) if pressed && !event.repeat => {
                self.input.menu = true
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
        let attrs = Window::default_attributes()
            .with_title("Brick Rush")
            .with_inner_size(LogicalSize::new(WINDOW_SIZE, WINDOW_SIZE));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .expect("Failed to create window"),
        );
        self.window = Some(window.clone());
        self.init_gpu(window);
        self.last_frame = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.settings.save();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(ctx) = self.ctx.as_mut() {
                    ctx.renderer.backend_mut().resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.on_key(&event),
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(ctx) = &self.ctx {
                    let (w, h) = ctx.renderer.backend().size;
                    self.input.mouse_ndc = Vec2::new(
                        (position.x / w as f64 * 2.0 - 1.0) as f32,
                        (1.0 - position.y / h as f64 * 2.0) as f32,
                    );
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.input.clicked = true,
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
