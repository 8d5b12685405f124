use crate::canvas::debounce::DebounceTimer;
use crate::canvas::input::{self, PointerEvent, PointerPhase, StrokeCommand, StrokeTracker};
use crate::canvas::surface::{self, CanvasSurface};
use crate::inference::client::{HealthResponse, PredictClient, PredictError};
use crate::inference::orchestrator::Orchestrator;
use crate::inference::state::{self, PredictionState};
use crate::settings::Settings;
use eframe::egui;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct DigitPadApp {
    surface: CanvasSurface,
    tracker: StrokeTracker,
    debounce: DebounceTimer,
    orchestrator: Orchestrator,
    state: PredictionState,
    texture: Option<egui::TextureHandle>,
    texture_dirty: bool,
    health_rx: Option<Receiver<Result<HealthResponse, PredictError>>>,
    health: Option<Result<HealthResponse, PredictError>>,
}

impl DigitPadApp {
    pub fn new(settings: Settings, client: Arc<PredictClient>) -> Self {
        let (health_tx, health_rx) = channel();
        {
            let client = Arc::clone(&client);
            std::thread::spawn(move || {
                let _ = health_tx.send(client.health());
            });
        }

        Self {
            surface: CanvasSurface::new(None),
            tracker: StrokeTracker::default(),
            debounce: DebounceTimer::new(),
            orchestrator: Orchestrator::new(client),
            state: PredictionState::new(settings.history_limit),
            texture: None,
            texture_dirty: true,
            health_rx: Some(health_rx),
            health: None,
        }
    }

    fn submit_prediction(&mut self) {
        let snapshot = self.surface.export_snapshot();
        self.orchestrator.submit(snapshot, &mut self.state);
    }

    fn refresh_texture(&mut self, ctx: &egui::Context) {
        if !self.texture_dirty && self.texture.is_some() {
            return;
        }
        let side = self.surface.side() as usize;
        let img = egui::ColorImage::from_rgba_unmultiplied([side, side], self.surface.pixels());
        match &mut self.texture {
            Some(texture) => texture.set(img, egui::TextureOptions::NEAREST),
            None => {
                self.texture =
                    Some(ctx.load_texture("digit-canvas", img, egui::TextureOptions::NEAREST));
            }
        }
        self.texture_dirty = false;
    }

    fn canvas_panel(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Drawing Canvas");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let clear = ui.add_enabled(self.surface.has_drawn(), egui::Button::new("Clear"));
                if clear.clicked() {
                    self.surface.clear();
                    self.texture_dirty = true;
                }
            });
        });
        ui.label("Draw a digit (0-9)");
        ui.add_space(4.0);

        // Resize only when the container width actually changes the side.
        let desired = surface::side_for_container(Some(ui.available_width()));
        if desired != self.surface.side() {
            self.surface.resize(desired);
            self.texture_dirty = true;
        }

        let side = self.surface.side() as f32;
        let (rect, response) =
            ui.allocate_exact_size(egui::vec2(side, side), egui::Sense::drag());

        for event in pointer_events(&response, rect, self.surface.side()) {
            for command in self.tracker.handle(event) {
                match command {
                    StrokeCommand::Begin => self.surface.begin_stroke(),
                    StrokeCommand::Paint { from, to } => {
                        self.surface.stroke_to(from, to);
                        self.texture_dirty = true;
                    }
                    StrokeCommand::ScheduleTrigger => self.debounce.schedule(Instant::now()),
                    StrokeCommand::TriggerNow => {
                        self.debounce.cancel();
                        self.submit_prediction();
                    }
                }
            }
        }

        self.refresh_texture(ui.ctx());
        if let Some(texture) = &self.texture {
            ui.painter().image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        ui.add_space(6.0);
        ui.weak("Prediction updates in real time");
    }

    fn prediction_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Prediction");
        ui.add_space(8.0);
        match self.state.digit {
            Some(digit) => {
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new(digit.to_string()).size(96.0).strong());
                    let confidence = state::top_confidence(&self.state.probabilities);
                    ui.label(format!("{} confidence", state::format_confidence(confidence)));
                });
            }
            None => {
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new("?").size(64.0).weak());
                    if self.state.loading {
                        ui.label("Analyzing...");
                    } else {
                        ui.label("Draw a digit to predict");
                    }
                });
            }
        }
        ui.add_space(12.0);
        ui.label(egui::RichText::new("Confidence Distribution").small().strong());
        for ranked in state::confidence_ranking(&self.state.probabilities) {
            let is_predicted = Some(ranked.digit) == self.state.digit;
            ui.horizontal(|ui| {
                let digit_text = egui::RichText::new(ranked.digit.to_string()).monospace();
                ui.label(if is_predicted {
                    digit_text.strong()
                } else {
                    digit_text
                });
                ui.add(
                    egui::ProgressBar::new(ranked.probability)
                        .desired_width(ui.available_width() - 8.0)
                        .text(state::format_confidence(ranked.probability)),
                );
            });
        }
    }

    fn history_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("History");
        ui.add_space(8.0);
        let rows = state::history_rows(self.state.history());
        if rows.is_empty() {
            ui.weak("No predictions yet");
            return;
        }
        egui::ScrollArea::vertical().show(ui, |ui| {
            for (digit, confidence, time) in rows {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(digit.to_string()).monospace().strong());
                    ui.label(confidence);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.weak(time);
                    });
                });
            }
        });
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            match &self.health {
                Some(Ok(health)) => {
                    let model = if health.model_loaded {
                        "model loaded"
                    } else {
                        "model not loaded"
                    };
                    ui.label(format!("Service {}, {}", health.status, model));
                }
                Some(Err(err)) => {
                    ui.colored_label(
                        egui::Color32::from_rgb(0xe0, 0x50, 0x50),
                        format!("Service unreachable: {err}"),
                    );
                }
                None => {
                    ui.weak("Checking service...");
                }
            }
            if self.state.loading {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak("Analyzing...");
                });
            }
        });
    }
}

impl eframe::App for DigitPadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        if let Some(rx) = &self.health_rx {
            if let Ok(result) = rx.try_recv() {
                self.health = Some(result);
                self.health_rx = None;
            }
        }

        if self.debounce.poll(now) {
            self.submit_prediction();
        }
        self.orchestrator.poll(&mut self.state);

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_bar(ui));
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Draw & Predict");
            ui.label("Draw a digit and let the neural network classify it in real time");
            if let Some(error) = self.state.error.clone() {
                ui.colored_label(egui::Color32::from_rgb(0xe0, 0x50, 0x50), error);
            }
            ui.add_space(8.0);
            ui.columns(3, |cols| {
                self.canvas_panel(&mut cols[0]);
                self.prediction_panel(&mut cols[1]);
                self.history_panel(&mut cols[2]);
            });
        });

        if let Some(remaining) = self.debounce.time_remaining(now) {
            ctx.request_repaint_after(remaining);
        } else if self.state.loading || self.health_rx.is_some() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }
}

fn pointer_events(
    response: &egui::Response,
    rect: egui::Rect,
    backing_side: u32,
) -> Vec<PointerEvent> {
    let translated = |pos: egui::Pos2| {
        input::translate(
            (pos.x, pos.y),
            (rect.min.x, rect.min.y),
            (rect.width(), rect.height()),
            backing_side,
        )
    };

    let mut events = Vec::new();
    if response.drag_started() {
        if let Some(pos) = response.interact_pointer_pos() {
            let (x, y) = translated(pos);
            events.push(PointerEvent {
                x,
                y,
                phase: PointerPhase::Start,
            });
        }
    } else if response.dragged() {
        if let Some(pos) = response.interact_pointer_pos() {
            let (x, y) = translated(pos);
            if rect.contains(pos) {
                events.push(PointerEvent {
                    x,
                    y,
                    phase: PointerPhase::Move,
                });
            } else {
                // Pointer left the surface mid-stroke: treat as stroke end.
                events.push(PointerEvent {
                    x,
                    y,
                    phase: PointerPhase::End,
                });
            }
        }
    }
    if response.drag_stopped() {
        let pos = response.interact_pointer_pos().unwrap_or(rect.min);
        let (x, y) = translated(pos);
        events.push(PointerEvent {
            x,
            y,
            phase: PointerPhase::End,
        });
    }
    events
}
