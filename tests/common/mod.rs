//! Common utilities for frame graph integration tests.
//!
//! [`Texture`] is a fake backend resource that records every realize and
//! derealize into a shared [`Recorder`], so tests can assert on the exact
//! schedule of a frame.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use redlilium_framegraph::{Realize, ResourceError};

/// Install a logger for the test binary. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Trace)
        .try_init();
}

// ============================================================================
// Events
// ============================================================================

/// Something observable that happened during a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Realize(String),
    Execute(String),
    Derealize(String),
}

impl Event {
    pub fn realize(name: &str) -> Self {
        Event::Realize(name.to_string())
    }

    pub fn execute(name: &str) -> Self {
        Event::Execute(name.to_string())
    }

    pub fn derealize(name: &str) -> Self {
        Event::Derealize(name.to_string())
    }
}

#[derive(Default)]
struct RecorderState {
    events: Vec<Event>,
    failing: HashSet<String>,
}

/// Shared event log for one test.
#[derive(Clone, Default)]
pub struct Recorder {
    state: Rc<RefCell<RecorderState>>,
}

impl Recorder {
    pub fn push(&self, event: Event) {
        self.state.borrow_mut().events.push(event);
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut self.state.borrow_mut().events)
    }

    /// Make every realize of the named texture fail with out-of-memory.
    pub fn fail_on(&self, name: &str) {
        self.state.borrow_mut().failing.insert(name.to_string());
    }

    fn should_fail(&self, name: &str) -> bool {
        self.state.borrow().failing.contains(name)
    }

    pub fn describe(&self, name: &str) -> TextureDesc {
        TextureDesc {
            name: name.to_string(),
            recorder: self.clone(),
        }
    }

    /// A texture backed by the caller, for retained resources.
    pub fn texture(&self, name: &str) -> Texture {
        Texture {
            name: name.to_string(),
            recorder: self.clone(),
        }
    }
}

// ============================================================================
// Fake Backend Resource
// ============================================================================

pub struct TextureDesc {
    pub name: String,
    recorder: Recorder,
}

pub struct Texture {
    pub name: String,
    recorder: Recorder,
}

impl Realize for Texture {
    type Description = TextureDesc;

    fn realize(description: &TextureDesc) -> Result<Self, ResourceError> {
        if description.recorder.should_fail(&description.name) {
            return Err(ResourceError::OutOfMemory);
        }
        description.recorder.push(Event::realize(&description.name));
        Ok(description.recorder.texture(&description.name))
    }

    fn derealize(self, _description: &TextureDesc) -> Result<(), ResourceError> {
        self.recorder.push(Event::derealize(&self.name));
        Ok(())
    }
}
