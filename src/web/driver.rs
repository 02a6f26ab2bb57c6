//! `requestAnimationFrame` loop for the animator.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlElement;

use super::{entropy_seed, now_ms, ElementSurface, Listener};
use crate::animator::{Animator, AnimatorOptions, AnimatorStatus};
use crate::observer::{ListenerId, Observers};
use crate::pattern::PatternKind;

// Timer step used when requestAnimationFrame is unavailable.
const FALLBACK_FRAME_MS: i32 = 16;

#[derive(Clone, Copy, Debug)]
enum Scheduled {
    Frame(i32),
    Timeout(i32),
}

struct DriverInner {
    animator: RefCell<Animator<ElementSurface>>,
    tick: RefCell<Option<Closure<dyn FnMut()>>>,
    scheduled: Cell<Option<Scheduled>>,
    resize: RefCell<Option<Listener>>,
    observers: RefCell<Observers<AnimatorStatus>>,
    published: Cell<Option<AnimatorStatus>>,
}

/// Runs an [`Animator`] from `requestAnimationFrame` callbacks.
///
/// Falls back to a timer loop when animation frames are unavailable.
/// Stopping cancels the pending callback, so nothing touches the element
/// afterwards. Dropping the driver stops it.
pub struct AnimatorDriver {
    inner: Rc<DriverInner>,
}

impl AnimatorDriver {
    /// Drive `element`; `None` gives an inert driver. A zero seed is
    /// replaced by a random one.
    pub fn new(element: Option<HtmlElement>, mut options: AnimatorOptions) -> Self {
        if options.seed == 0 {
            options.seed = entropy_seed();
        }
        let animator = Animator::new(element.map(ElementSurface::new), options);
        let inner = Rc::new(DriverInner {
            animator: RefCell::new(animator),
            tick: RefCell::new(None),
            scheduled: Cell::new(None),
            resize: RefCell::new(None),
            observers: RefCell::new(Observers::new()),
            published: Cell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        *inner.tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                on_tick(&inner);
            }
        }) as Box<dyn FnMut()>));

        Self { inner }
    }

    pub fn by_id(id: &str, options: AnimatorOptions) -> Self {
        let element = ElementSurface::by_id(id).map(|s| s.element().clone());
        if element.is_none() {
            warn!("#{id} not found; background stays inert");
        }
        Self::new(element, options)
    }

    pub fn is_running(&self) -> bool {
        self.inner.animator.borrow().is_running()
    }

    /// Start animating and listen for window resizes.
    pub fn start(&self) -> Result<(), JsValue> {
        {
            let mut animator = self.inner.animator.borrow_mut();
            if animator.is_inert() || animator.is_running() {
                return Ok(());
            }
            animator.start(now_ms());
        }
        publish(&self.inner);

        if let Some(window) = web_sys::window() {
            let weak = Rc::downgrade(&self.inner);
            let listener = Listener::new(&window, "resize", move |_| {
                if let Some(inner) = weak.upgrade() {
                    inner.animator.borrow_mut().resize(now_ms());
                    publish(&inner);
                }
            })?;
            *self.inner.resize.borrow_mut() = Some(listener);
        }

        schedule(&self.inner);
        Ok(())
    }

    pub fn stop(&self) {
        self.inner.animator.borrow_mut().stop();
        cancel(&self.inner);
        self.inner.resize.borrow_mut().take();
        publish(&self.inner);
    }

    pub fn transition_to_fps(&self, target_fps: f64) {
        self.inner
            .animator
            .borrow_mut()
            .transition_to_fps(target_fps, now_ms());
        publish(&self.inner);
    }

    pub fn enable_static_mode(&self) {
        self.inner.animator.borrow_mut().enable_static_mode(now_ms());
        publish(&self.inner);
    }

    pub fn disable_static_mode(&self) {
        self.inner.animator.borrow_mut().disable_static_mode(now_ms());
        publish(&self.inner);
    }

    pub fn trigger_page_transition(&self) {
        self.inner
            .animator
            .borrow_mut()
            .trigger_page_transition(now_ms());
        publish(&self.inner);
    }

    pub fn set_pattern(&self, kind: PatternKind) {
        self.inner.animator.borrow_mut().set_pattern(kind, now_ms());
        publish(&self.inner);
    }

    /// Listen for status changes; called immediately with the current status.
    ///
    /// Listeners run after the animator is released, so they may call back
    /// into the driver. They must not subscribe or unsubscribe from inside
    /// the callback.
    pub fn subscribe<F>(&self, callback: F) -> ListenerId
    where
        F: FnMut(&AnimatorStatus) + 'static,
    {
        let status = self.inner.animator.borrow().status();
        self.inner.published.set(Some(status));
        self.inner.observers.borrow_mut().subscribe(&status, callback)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.observers.borrow_mut().unsubscribe(id)
    }

    /// Run `f` against the animator.
    ///
    /// The animator stays borrowed for the whole call, including any
    /// listener registered with [`Animator::subscribe`]; such listeners must
    /// not call back into the driver. Use [`AnimatorDriver::subscribe`] for
    /// listeners that do.
    pub fn with_animator<R>(&self, f: impl FnOnce(&mut Animator<ElementSurface>) -> R) -> R {
        let result = f(&mut *self.inner.animator.borrow_mut());
        publish(&self.inner);
        result
    }
}

impl Drop for AnimatorDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn on_tick(inner: &Rc<DriverInner>) {
    inner.scheduled.set(None);
    let tick = inner.animator.borrow_mut().frame(now_ms());
    publish(inner);
    // A listener may have stopped the animator.
    if tick.should_reschedule() && inner.animator.borrow().is_running() {
        schedule(inner);
    }
}

// Broadcast the status if it changed. Nested calls from a listener return
// early; the outer loop picks up their changes.
fn publish(inner: &DriverInner) {
    let Ok(mut observers) = inner.observers.try_borrow_mut() else {
        return;
    };
    loop {
        let status = inner.animator.borrow().status();
        if inner.published.get() == Some(status) {
            return;
        }
        inner.published.set(Some(status));
        observers.notify(&status);
    }
}

fn schedule(inner: &Rc<DriverInner>) {
    if inner.scheduled.get().is_some() {
        return;
    }
    let Some(window) = web_sys::window() else {
        return;
    };
    let tick = inner.tick.borrow();
    let Some(callback) = tick.as_ref() else {
        return;
    };
    let function: &js_sys::Function = callback.as_ref().unchecked_ref();

    let scheduled = match window.request_animation_frame(function) {
        Ok(id) => Some(Scheduled::Frame(id)),
        Err(_) => window
            .set_timeout_with_callback_and_timeout_and_arguments_0(function, FALLBACK_FRAME_MS)
            .map(Scheduled::Timeout)
            .map_err(|err| warn!("no frame scheduler available: {err:?}"))
            .ok(),
    };
    inner.scheduled.set(scheduled);
}

fn cancel(inner: &DriverInner) {
    let Some(scheduled) = inner.scheduled.take() else {
        return;
    };
    let Some(window) = web_sys::window() else {
        return;
    };
    match scheduled {
        Scheduled::Frame(id) => {
            let _ = window.cancel_animation_frame(id);
        }
        Scheduled::Timeout(id) => window.clear_timeout_with_handle(id),
    }
}
