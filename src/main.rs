use std::collections::HashSet;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use tile_raycaster::camera::{Camera, PlayerPose};
use tile_raycaster::compositor::DepthBuffer;
use tile_raycaster::config::{MapFile, RenderConfig};
use tile_raycaster::draw::{pack_rgb, submit};
use tile_raycaster::error::ConfigError;
use tile_raycaster::frame::{FrameSettings, render_frame};
use tile_raycaster::player::{InputState, Player};
use tile_raycaster::renderer::{SoftwareSink, clear_background};
use tile_raycaster::scaler::{Upscaler, internal_size};
use tile_raycaster::textures::ProceduralTextures;
use tile_raycaster::world::GridWorld;

const DEMO_MAP: &str = include_str!("../maps/demo.toml");

struct App {
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    world: GridWorld,
    player: Player,
    config: RenderConfig,
    settings: FrameSettings,
    textures: ProceduralTextures,
    depth: DepthBuffer,

    // HUD
    frame_counter: u32,
    last_fps_print: Instant,

    // Internal framebuffer, fixed height
    fb_small: Vec<u32>,
    fb_w: usize,
    fb_h: usize,

    upscaler: Upscaler,

    // Input and movement
    keys_down: HashSet<KeyCode>,
    last_tick: Instant,
}

impl App {
    fn new(config: RenderConfig, map: &MapFile) -> Result<Self, ConfigError> {
        let world = map.build()?;
        let t = world.tile_size();
        let spawn = map.spawn.map_or_else(
            || PlayerPose::new(1.5 * t, 1.5 * t, 0.0),
            |s| PlayerPose::new(s.x * t, s.y * t, s.angle_deg.to_radians()),
        );
        let settings = FrameSettings::from_config(&config, t);
        let fb_h = config.internal_height;
        let (fb_w, _) = internal_size(800, 600, fb_h);

        Ok(Self {
            window: None,
            surface: None,
            world,
            player: Player::new(spawn),
            settings,
            textures: ProceduralTextures::default(),
            depth: DepthBuffer::new(fb_w),

            frame_counter: 0,
            last_fps_print: Instant::now(),

            fb_small: vec![0; fb_w * fb_h],
            fb_w,
            fb_h,

            upscaler: Upscaler::default(),

            keys_down: HashSet::new(),
            last_tick: Instant::now(),
            config,
        })
    }

    fn camera(&self) -> Camera {
        let eye = self.config.eye_height * self.world.tile_size();
        Camera::new(self.player.pose, eye, self.fb_w, self.fb_h, self.config.fov_deg)
    }

    fn axis(&self, plus: KeyCode, minus: KeyCode) -> f32 {
        let mut v = 0.0;
        if self.keys_down.contains(&plus) {
            v += 1.0;
        }
        if self.keys_down.contains(&minus) {
            v -= 1.0;
        }
        v
    }

    fn tick(&mut self) {
        // Cap dt to avoid huge jumps if the app was paused
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).min(Duration::from_millis(100));
        self.last_tick = now;

        let input = InputState {
            forward: self.axis(KeyCode::KeyW, KeyCode::KeyS),
            strafe: self.axis(KeyCode::KeyD, KeyCode::KeyA),
            turn: self.axis(KeyCode::KeyE, KeyCode::KeyQ),
            pitch: self.axis(KeyCode::KeyR, KeyCode::KeyF),
            jump: self.keys_down.contains(&KeyCode::Space),
        };
        let max_pitch = 0.5 * self.fb_h as f32;
        self.player
            .update(&self.world, &input, &self.config.controls, max_pitch, dt.as_secs_f32());

        let removed = self.world.cleanup_sprites();
        if removed > 0 {
            tracing::debug!(removed, "sprites despawned");
        }
    }

    fn interact(&mut self) {
        if let Some((x, y, open)) = self.player.interact(&mut self.world, self.config.controls.radius) {
            tracing::info!(x, y, open, "door used");
        }
    }

    fn draw_internal(&mut self) {
        let camera = self.camera();
        let [sr, sg, sb] = self.config.sky_color;
        let [gr, gg, gb] = self.config.ground_color;
        clear_background(
            &mut self.fb_small,
            self.fb_w,
            self.fb_h,
            camera.horizon(),
            pack_rgb(sr, sg, sb),
            pack_rgb(gr, gg, gb),
        );

        let intents = render_frame(&self.world, &camera, &mut self.depth, &self.settings);
        let mut sink = SoftwareSink::new(&mut self.fb_small, self.fb_w, self.fb_h, &self.textures);
        submit(&intents, &mut sink);
    }

    fn rebuild_internal_fb_and_lut(&mut self, dst_w: usize, dst_h: usize) {
        let (target_w, target_h) = internal_size(dst_w, dst_h, self.config.internal_height);

        // Reallocate internal FB if size changed
        if target_w != self.fb_w || target_h != self.fb_h {
            self.fb_w = target_w;
            self.fb_h = target_h;
            self.fb_small = vec![0u32; self.fb_w * self.fb_h];
            tracing::debug!(width = self.fb_w, height = self.fb_h, "internal framebuffer resized");
        }

        self.upscaler = Upscaler::new(self.fb_w, self.fb_h, dst_w, dst_h);
    }

    fn present(&mut self, id: WindowId) {
        let (window, surface) = match (&self.window, &mut self.surface) {
            (Some(w), Some(s)) if w.id() == id => (w, s),
            _ => return,
        };

        let size = window.inner_size();
        let (Some(nw), Some(nh)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) else {
            return; // Minimized window, skip drawing
        };
        if let Err(err) = surface.resize(nw, nh) {
            tracing::error!(%err, "surface resize failed");
            return;
        }
        if self.upscaler.target_size() != (size.width as usize, size.height as usize) {
            let (dw, dh) = (size.width as usize, size.height as usize);
            self.rebuild_internal_fb_and_lut(dw, dh);
        }

        self.draw_internal();

        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let mut buf = match surface.buffer_mut() {
            Ok(buf) => buf,
            Err(err) => {
                tracing::error!(%err, "surface buffer unavailable");
                return;
            }
        };
        self.upscaler.blit(&self.fb_small, &mut buf);
        if let Err(err) = buf.present() {
            tracing::error!(%err, "present failed");
        }

        self.frame_counter += 1;
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_fps_print).as_secs_f32();
        if elapsed >= 1.0 {
            let fps = self.frame_counter as f32 / elapsed;
            tracing::info!(width = self.fb_w, height = self.fb_h, "FPS: {:.1}", fps);
            self.frame_counter = 0;
            self.last_fps_print = now;
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = Window::default_attributes()
            .with_title("tile raycaster")
            .with_inner_size(LogicalSize::new(800.0, 600.0));

        let window = match event_loop.create_window(attributes) {
            Ok(w) => Rc::new(w),
            Err(err) => {
                tracing::error!(%err, "could not create window");
                event_loop.exit();
                return;
            }
        };
        let surface = softbuffer::Context::new(window.clone())
            .and_then(|context| softbuffer::Surface::new(&context, window.clone()));
        let surface = match surface {
            Ok(s) => s,
            Err(err) => {
                tracing::error!(%err, "could not create softbuffer surface");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.rebuild_internal_fb_and_lut(size.width as usize, size.height as usize);

        window.request_redraw();
        self.surface = Some(surface);
        self.window = Some(window);
        self.last_tick = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("close requested; stopping");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => {
                    if code == KeyCode::KeyX && !repeat {
                        self.interact();
                    }
                    if code == KeyCode::Escape {
                        event_loop.exit();
                    }
                    self.keys_down.insert(code);
                }
                ElementState::Released => {
                    self.keys_down.remove(&code);
                }
            },

            WindowEvent::RedrawRequested => {
                self.tick();
                self.present(id);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            WindowEvent::Resized(new_size) => {
                self.rebuild_internal_fb_and_lut(new_size.width as usize, new_size.height as usize);
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// `tile_raycaster [render.toml] [map.toml]`; both optional.
fn load() -> Result<(RenderConfig, MapFile), ConfigError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            tracing::info!(%path, "loading render config");
            RenderConfig::from_toml_file(path)?
        }
        None => RenderConfig::default(),
    };
    let map = match args.next() {
        Some(path) => {
            tracing::info!(%path, "loading map");
            MapFile::from_toml_file(path)?
        }
        None => MapFile::from_toml_str(DEMO_MAP)?,
    };
    Ok((config, map))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let (config, map) = load()?;
    let mut app = App::new(config, &map)?;

    let event_loop = EventLoop::new()?;
    // Redraws are requested every frame, so Wait does not stall the loop.
    event_loop.set_control_flow(ControlFlow::Wait);
    event_loop.run_app(&mut app)?;
    Ok(())
}
