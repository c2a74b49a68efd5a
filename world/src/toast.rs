//! Animated notification toasts.
//!
//! Only one toast fades in at a time. Messages pushed meanwhile wait in a
//! queue and start as soon as the running fade-in finishes.

use std::collections::{BTreeMap, VecDeque};

use setlerio_core::DrawPriority;
use tracing::debug;

use crate::{
    drawables::{DrawKind, DrawableHandle},
    scheduler::{EventDuration, EventProgress},
    World,
};

/// Read-only view of a toast on screen.
#[derive(Clone, Debug, PartialEq)]
pub struct ToastView {
    /// Message shown to the player.
    pub text: String,
    /// Vertical offset in toast heights relative to the resting position.
    pub offset: f64,
    /// Opacity in `0.0..=1.0`.
    pub opacity: f64,
}

#[derive(Debug)]
struct Toast {
    text: String,
    offset: f64,
    opacity: f64,
}

/// Toasts on screen and messages waiting to appear.
#[derive(Debug, Default)]
pub(crate) struct Toasts {
    next_id: u64,
    active: BTreeMap<u64, Toast>,
    queue: VecDeque<String>,
    fading_in: bool,
    drawable: Option<DrawableHandle>,
}

impl Toasts {
    pub(crate) fn views(&self) -> Vec<ToastView> {
        self.active
            .values()
            .map(|toast| ToastView {
                text: toast.text.clone(),
                offset: toast.offset,
                opacity: toast.opacity,
            })
            .collect()
    }

    pub(crate) fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl World {
    /// Shows a toast, or queues it while another toast is fading in.
    pub fn push_toast(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.toasts.fading_in {
            debug!(%text, "toast queued");
            self.toasts.queue.push_back(text);
        } else {
            self.start_toast(text);
        }
    }

    fn start_toast(&mut self, text: String) {
        let id = self.toasts.next_id;
        self.toasts.next_id += 1;
        debug!(%text, "toast shown");
        let _ = self.toasts.active.insert(
            id,
            Toast {
                text,
                offset: -1.0,
                opacity: 0.0,
            },
        );
        self.toasts.fading_in = true;
        if self.toasts.drawable.is_none() {
            self.toasts.drawable =
                Some(self.drawables.push(DrawPriority::Toasts, DrawKind::Toasts, None));
        }

        let timing = self.config.toast;
        let animation = self.ticks_for(timing.animation_ms);
        let visible = self.ticks_for(timing.visible_ms);
        let _ = self.schedule(
            0,
            EventDuration::Ticks(animation),
            Box::new(move |world: &mut World, progress| world.fade_in_toast(id, progress)),
        );
        let _ = self.schedule(
            animation + visible,
            EventDuration::Ticks(animation),
            Box::new(move |world: &mut World, progress| world.fade_out_toast(id, progress)),
        );
    }

    fn fade_in_toast(&mut self, id: u64, progress: EventProgress) {
        let fraction = progress.fraction();
        if let Some(toast) = self.toasts.active.get_mut(&id) {
            toast.offset = fraction - 1.0;
            toast.opacity = fraction;
        }

        if progress.is_final() {
            self.toasts.fading_in = false;
            if let Some(next) = self.toasts.queue.pop_front() {
                self.start_toast(next);
            }
        }
    }

    fn fade_out_toast(&mut self, id: u64, progress: EventProgress) {
        let fraction = progress.fraction();
        if let Some(toast) = self.toasts.active.get_mut(&id) {
            toast.offset = fraction / 3.0;
            toast.opacity = 1.0 - fraction;
        }

        if progress.is_final() {
            let _ = self.toasts.active.remove(&id);
            if self.toasts.active.is_empty() {
                if let Some(handle) = self.toasts.drawable.take() {
                    self.drawables.remove(handle);
                }
            }
        }
    }
}
