/// Unified pointer capability: mouse and first-touch input are mapped into
/// this shape at the widget boundary before any downstream logic sees them.
/// Touch points beyond the first are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
    pub phase: PointerPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Start,
    Move,
    End,
}

/// Map client coordinates into backing-store space, accounting for the
/// difference between the on-screen rectangle and the backing resolution.
pub fn translate(
    client: (f32, f32),
    rect_origin: (f32, f32),
    rect_size: (f32, f32),
    backing_side: u32,
) -> (f32, f32) {
    let sx = if rect_size.0 > 0.0 {
        backing_side as f32 / rect_size.0
    } else {
        1.0
    };
    let sy = if rect_size.1 > 0.0 {
        backing_side as f32 / rect_size.1
    } else {
        1.0
    };
    ((client.0 - rect_origin.0) * sx, (client.1 - rect_origin.1) * sy)
}

/// What the caller must do in response to one pointer event, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeCommand {
    /// A stroke began; mark the surface as drawn.
    Begin,
    /// Paint one segment of the active stroke.
    Paint { from: (f32, f32), to: (f32, f32) },
    /// Stroke extension: (re)start the debounce quiet period.
    ScheduleTrigger,
    /// Stroke end: fire the inference trigger immediately and drop any
    /// pending debounce deadline.
    TriggerNow,
}

/// Stroke lifecycle from pointer-down to pointer-up/leave. Owns the path
/// head for the duration of the stroke; moves without a preceding start are
/// ignored, as are repeated ends.
#[derive(Debug, Default)]
pub struct StrokeTracker {
    last: Option<(f32, f32)>,
}

impl StrokeTracker {
    pub fn is_drawing(&self) -> bool {
        self.last.is_some()
    }

    pub fn handle(&mut self, event: PointerEvent) -> Vec<StrokeCommand> {
        match event.phase {
            PointerPhase::Start => {
                self.last = Some((event.x, event.y));
                vec![StrokeCommand::Begin]
            }
            PointerPhase::Move => match self.last.replace((event.x, event.y)) {
                Some(prev) => vec![
                    StrokeCommand::Paint {
                        from: prev,
                        to: (event.x, event.y),
                    },
                    StrokeCommand::ScheduleTrigger,
                ],
                None => {
                    self.last = None;
                    Vec::new()
                }
            },
            PointerPhase::End => {
                if self.last.take().is_some() {
                    vec![StrokeCommand::TriggerNow]
                } else {
                    Vec::new()
                }
            }
        }
    }
}
