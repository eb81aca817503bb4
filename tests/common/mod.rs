#![allow(dead_code)]

use std::collections::VecDeque;

use sss_gems::input::EventQueue;
use sss_gems::{Frame, FrameError, FramebufferError, Host, InitError, InputEvent};

/// Host that replays scripted input and records what it was asked to do.
pub struct ScriptedHost {
    pub init_error: Option<InitError>,
    pub framebuffer: Result<(), FramebufferError>,
    pub fail_on_frame: Option<usize>,
    pub frame_time: f32,
    pub script: VecDeque<Vec<InputEvent>>,
    pub clock: f32,
    pub polls: usize,
    pub submitted: Vec<Frame>,
    pub shut_down: bool,
}

impl ScriptedHost {
    pub fn new(script: Vec<Vec<InputEvent>>) -> Self {
        Self {
            init_error: None,
            framebuffer: Ok(()),
            fail_on_frame: None,
            frame_time: 0.016,
            script: script.into(),
            clock: 0.0,
            polls: 0,
            submitted: Vec::new(),
            shut_down: false,
        }
    }
}

impl Host for ScriptedHost {
    fn init(&mut self) -> Result<(), InitError> {
        match self.init_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn framebuffer_status(&self) -> Result<(), FramebufferError> {
        self.framebuffer.clone()
    }

    fn elapsed(&self) -> f32 {
        self.clock
    }

    fn poll_events(&mut self, queue: &mut EventQueue) {
        self.polls += 1;
        self.clock += self.frame_time;
        match self.script.pop_front() {
            Some(events) => queue.extend(events),
            // Out of script: behave like the user closed the window.
            None => queue.push(InputEvent::CloseRequested),
        }
    }

    fn submit(&mut self, frame: &Frame) -> Result<(), FrameError> {
        if self.fail_on_frame == Some(self.submitted.len()) {
            return Err(FrameError::OutOfMemory);
        }
        self.submitted.push(frame.clone());
        Ok(())
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
    }
}
