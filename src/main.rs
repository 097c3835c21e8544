//! Bounce Lab entry point
//!
//! On the web: WebGPU canvas, requestAnimationFrame loop and keyboard
//! input. Natively: a headless run of the default scene that logs the
//! state of every named entity.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Element, HtmlCanvasElement, KeyboardEvent};

    use bounce_lab::renderer::{RenderState, ShapeBatch};
    use bounce_lab::sim::{Scene, Simulation};
    use bounce_lab::{FrameDriver, SimConfig, SimError};

    /// Application state shared between the frame loop and event handlers
    struct App {
        sim: Simulation,
        driver: FrameDriver,
        batch: ShapeBatch,
        render_state: Option<RenderState>,
        canvas: HtmlCanvasElement,
        /// Absolutely positioned container for text labels
        overlay: Option<Element>,
        device_pixel_ratio: f64,
        /// Pending requestAnimationFrame handle
        animation_id: Option<i32>,
        stopped: bool,
    }

    impl App {
        fn frame(&mut self, time: f64) {
            self.driver.tick(&mut self.sim, time, &mut self.batch);

            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&self.batch) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }

            self.update_labels();
        }

        /// Mirror the batch's text labels into the DOM overlay
        fn update_labels(&self) {
            let Some(ref overlay) = self.overlay else {
                return;
            };
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            overlay.set_inner_html("");
            for label in self.batch.labels() {
                let Ok(el) = document.create_element("div") else {
                    continue;
                };
                el.set_text_content(Some(&label.text));
                let _ = el.set_attribute(
                    "style",
                    &format!(
                        "position:absolute;left:{:.0}px;top:{:.0}px;white-space:nowrap",
                        label.x as f64 / self.device_pixel_ratio,
                        label.y as f64 / self.device_pixel_ratio
                    ),
                );
                let _ = overlay.append_child(&el);
            }
        }

        fn resize(&mut self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            self.device_pixel_ratio = window.device_pixel_ratio();
            let width = (self.canvas.client_width() as f64 * self.device_pixel_ratio) as u32;
            let height = (self.canvas.client_height() as f64 * self.device_pixel_ratio) as u32;
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            self.batch.resize(width as f32, height as f32);
            if let Some(ref mut render_state) = self.render_state {
                render_state.resize(width, height);
            }
            log::debug!("Canvas resized to {}x{}", width, height);
        }

        fn stop(&mut self) {
            self.stopped = true;
            if let Some(id) = self.animation_id.take() {
                if let Some(window) = web_sys::window() {
                    let _ = window.cancel_animation_frame(id);
                }
            }
            log::info!("Frame loop stopped");
        }
    }

    fn now_ms() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or(0.0)
    }

    pub async fn run() -> Result<(), SimError> {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Logger init failed: {e}").into());
        }

        log::info!("Bounce Lab starting...");

        let window = web_sys::window().ok_or_else(|| SimError::Surface("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| SimError::Surface("no document".into()))?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| SimError::Surface("no #canvas element".into()))?
            .dyn_into()
            .map_err(|_| SimError::Surface("#canvas is not a canvas".into()))?;

        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let config = SimConfig::load();
        let mut sim = Simulation::new(&config);
        let seed = js_sys::Date::now() as u64;
        let ids = Scene::demo(seed).spawn(&mut sim);
        log::info!("Spawned {} entities (seed {})", ids.len(), seed);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| SimError::Surface(format!("create surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| SimError::Surface(format!("request adapter: {e}")))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = RenderState::new(surface, &adapter, width, height).await?;

        let app = Rc::new(RefCell::new(App {
            sim,
            driver: FrameDriver::new(&config),
            batch: ShapeBatch::new(width as f32, height as f32),
            render_state: Some(render_state),
            canvas,
            overlay: document.get_element_by_id("labels"),
            device_pixel_ratio: dpr,
            animation_id: None,
            stopped: false,
        }));

        setup_input_handlers(app.clone());
        setup_lifecycle_handlers(app.clone());

        request_animation_frame(app);

        log::info!("Bounce Lab running!");
        Ok(())
    }

    fn setup_input_handlers(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Space holds the boost; p toggles pause; r restarts; m cycles the mode
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut a = app.borrow_mut();
                match event.key().as_str() {
                    " " => {
                        event.prevent_default();
                        if !event.repeat() {
                            a.sim.boost_started(now_ms());
                        }
                    }
                    "p" | "P" => {
                        if a.sim.is_running() {
                            a.sim.pause();
                        } else {
                            a.sim.run();
                        }
                    }
                    "r" | "R" => a.sim.restart(),
                    "m" | "M" => {
                        let mode = a.sim.mode().next();
                        a.sim.set_mode(mode);
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.key() == " " {
                    app.borrow_mut().sim.boost_ended();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Losing focus releases every key
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                app.borrow_mut().sim.boost_ended();
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_lifecycle_handlers(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                app.borrow_mut().resize();
            });
            let _ = window
                .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                app.borrow_mut().stop();
            });
            let _ = window
                .add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let handle = app.clone();
        let closure = Closure::once(move |time: f64| {
            frame_loop(handle, time);
        });
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(id) => app.borrow_mut().animation_id = Some(id),
            Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
        }
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();
            a.animation_id = None;
            if a.stopped {
                return;
            }
            a.frame(time);
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_app::run().await {
        log::error!("Bounce Lab failed to start: {}", e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use bounce_lab::renderer::ShapeBatch;
    use bounce_lab::sim::{Scene, Simulation};
    use bounce_lab::{FrameDriver, SimConfig};

    env_logger::init();
    log::info!("Bounce Lab (native) starting...");
    log::info!("Rendering needs a browser canvas - run with `trunk serve`; running headless");

    let scene = match std::env::args().nth(1) {
        Some(path) => {
            let loaded = std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|json| Scene::from_json(&json).map_err(|e| e.to_string()));
            match loaded {
                Ok(scene) => scene,
                Err(e) => {
                    log::error!("Could not load scene {}: {}", path, e);
                    std::process::exit(1);
                }
            }
        }
        None => Scene::demo(42),
    };

    let config = SimConfig::load();
    let mut sim = Simulation::new(&config);
    scene.spawn(&mut sim);

    let mut driver = FrameDriver::new(&config);
    let mut batch = ShapeBatch::new(1280.0, 720.0);
    let frame_ms = 1000.0 / 60.0;

    for frame in 0..600u32 {
        let metrics = driver.tick(&mut sim, frame as f64 * frame_ms, &mut batch);
        if frame % 60 == 0 {
            let scale = metrics.camera.map_or(0.0, |c| c.scale);
            log::info!("t={:.2}s scale={:.2}px/m", frame as f64 * frame_ms / 1000.0, scale);
            for label in batch.labels() {
                log::info!("  {}", label.text);
            }
        }
    }

    println!("Simulated 600 frames of {} entities", sim.entities().len());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Entry point is wasm_main
}
