//! Terminal front-end for the stlpick scene

use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use stlpick_core::Scene;

pub mod renderer;

pub use renderer::AsciiRenderer;
use renderer::CELL_ASPECT;

/// Degrees of wheel rotation per scroll notch
const DEGREES_PER_NOTCH: f32 = 15.0;

/// Rows reserved for the status line
const STATUS_ROWS: u16 = 1;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    scene: Scene,
    renderer: AsciiRenderer,
    running: bool,
    /// Cell where the left button went down, a click if released there
    pressed_at: Option<(u16, u16)>,
    /// Last cell seen while dragging
    dragged_from: Option<(u16, u16)>,
    message: String,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(scene: Scene) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_size(scene, width, height))
    }

    /// App for a terminal of `width` by `height` cells
    pub fn with_size(scene: Scene, width: u16, height: u16) -> Self {
        let mut app = Self {
            scene,
            renderer: AsciiRenderer::new(0, 0),
            running: true,
            pressed_at: None,
            dragged_from: None,
            message: String::new(),
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        };
        app.resize(width, height);
        app
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;
        terminal::disable_raw_mode()?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let fps = self.scene.config().target_fps.max(1);
        let target_frame_time = Duration::from_millis(1000 / fps as u64);

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                let event = event::read()?;
                self.handle_event(event);
            }

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    /// Apply one input event to the scene
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
    }

    fn handle_key(&mut self, KeyEvent { code, kind, .. }: KeyEvent) {
        if kind == KeyEventKind::Release {
            return;
        }
        let step = self.scene.config().orbit_step;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('w') | KeyCode::Up => self.scene.camera.rotation.rotate(0.0, step),
            KeyCode::Char('s') | KeyCode::Down => self.scene.camera.rotation.rotate(0.0, -step),
            KeyCode::Char('a') | KeyCode::Left => self.scene.camera.rotation.rotate(-step, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.scene.camera.rotation.rotate(step, 0.0),
            KeyCode::Char('+') | KeyCode::Char('=') => self.scene.camera.zoom(-DEGREES_PER_NOTCH),
            KeyCode::Char('-') => self.scene.camera.zoom(DEGREES_PER_NOTCH),
            KeyCode::Char('p') => {
                self.scene.camera.mode = self.scene.camera.mode.toggled();
            }
            KeyCode::Char('r') => {
                let metrics = *self.scene.metrics();
                self.scene.camera.reset_to(&metrics);
            }
            KeyCode::Char('b') => self.rebase(),
            KeyCode::Char('g') => {
                self.scene.grow_selection();
                self.message = format!("{} faces selected", self.scene.selection().len());
            }
            KeyCode::Char('c') => {
                self.scene.clear_selection();
                self.message.clear();
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let cell = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.pressed_at = Some(cell);
                self.dragged_from = Some(cell);
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some((x, y)) = self.dragged_from {
                    let step = self.scene.config().orbit_step;
                    let dx = mouse.column as f32 - x as f32;
                    let dy = mouse.row as f32 - y as f32;
                    self.scene.camera.rotation.rotate(dx * step, dy * step);
                }
                self.dragged_from = Some(cell);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if self.pressed_at == Some(cell) {
                    let additive = mouse.modifiers.contains(KeyModifiers::CONTROL);
                    self.pick(cell, additive);
                }
                self.pressed_at = None;
                self.dragged_from = None;
            }
            MouseEventKind::ScrollUp => self.scene.camera.zoom(-DEGREES_PER_NOTCH),
            MouseEventKind::ScrollDown => self.scene.camera.zoom(DEGREES_PER_NOTCH),
            _ => {}
        }
    }

    /// Select the face drawn under a cell of the last frame
    fn pick(&mut self, (x, y): (u16, u16), additive: bool) {
        let pixel = match y.checked_sub(STATUS_ROWS) {
            Some(row) => self.renderer.face_at(x as usize, row as usize),
            None => [0; 3],
        };
        self.message = match self.scene.click(pixel, additive) {
            Some(face) => format!(
                "face {} picked, {} selected",
                face,
                self.scene.selection().len()
            ),
            None if self.scene.selection().is_empty() => String::new(),
            None => self.message.clone(),
        };
    }

    fn rebase(&mut self) {
        self.message = match self.scene.rebase_selected() {
            Ok(rotation) => format!("rebased by {:.1} degrees", rotation.angle().to_degrees()),
            Err(e) => {
                tracing::debug!(error = %e, "rebase failed");
                format!("cannot rebase: {}", e)
            }
        };
    }

    fn resize(&mut self, width: u16, height: u16) {
        let rows = height.saturating_sub(STATUS_ROWS);
        self.renderer.resize(width as usize, rows as usize);
        self.scene
            .camera
            .set_aspect(width as u32, rows as u32 * CELL_ASPECT);
    }

    /// Rebuild the drafts and rasterize them into the renderer
    fn update(&mut self) {
        self.scene.build_frame();
        self.renderer.clear();
        self.renderer.render_scene(&self.scene);
    }

    fn render(&mut self) -> io::Result<()> {
        self.update();

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, STATUS_ROWS))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "stlpick | FPS: {:.1} | {} faces | WASD/Arrows=Orbit +/-=Zoom Click=Pick Ctrl+Click=Toggle B=Rebase G=Grow C=Clear P=Projection R=Reset Q=Quit | {}",
                self.fps,
                self.scene.model.mesh.faces.len(),
                self.message
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
