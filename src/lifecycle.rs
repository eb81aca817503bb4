//! `Init → FrameLoop → Shutdown` driver.
//!
//! The loop talks to the platform only through [`Host`], so it can be run
//! against the real winit/wgpu host or against a scripted one in tests.

use std::any::Any;
use std::fmt;

use log::{debug, error, info};
use thiserror::Error;

use crate::app::AppState;
use crate::config::DemoConfig;
use crate::input::EventQueue;
use crate::model::ModelError;
use crate::render::{Frame, FrameError, FramebufferError, ShaderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    FrameLoop,
    Shutdown,
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to initialize {stage}: {message}")]
    Platform { stage: &'static str, message: String },
    #[error("failed to initialize graphics context: {0}")]
    Context(String),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl InitError {
    pub fn from_panic(stage: &'static str, panic: Box<dyn Any + Send>) -> Self {
        Self::Platform {
            stage,
            message: panic_message(panic),
        }
    }

    pub fn from_error(stage: &'static str, err: impl fmt::Display) -> Self {
        Self::Platform {
            stage,
            message: err.to_string(),
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Init(#[from] InitError),
    #[error("frame {frame} failed")]
    Frame {
        frame: u64,
        #[source]
        source: FrameError,
    },
}

impl RunError {
    /// The error followed by its full cause chain, for printing on exit.
    pub fn report(self) -> String {
        format!("{:?}", anyhow::Error::from(self))
    }
}

/// Platform collaborator: window, context, input and presentation.
pub trait Host {
    /// Creates the window and GPU context and loads assets.
    fn init(&mut self) -> Result<(), InitError>;

    /// Completeness of the offscreen target. Queried once after `init`.
    fn framebuffer_status(&self) -> Result<(), FramebufferError>;

    /// Seconds since the host clock started.
    fn elapsed(&self) -> f32;

    /// Moves pending platform input into `queue`.
    fn poll_events(&mut self, queue: &mut EventQueue);

    /// Renders and presents one frame. Only unrecoverable failures are
    /// returned.
    fn submit(&mut self, frame: &Frame) -> Result<(), FrameError>;

    fn shutdown(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub frames: u64,
    pub stage: Stage,
}

/// Runs the demo until the close flag is set.
pub fn run<H: Host>(
    host: &mut H,
    state: &mut AppState,
    config: &DemoConfig,
) -> Result<RunReport, RunError> {
    debug!("stage {:?}", Stage::Init);
    if let Err(err) = host.init() {
        error!("{err}");
        debug!("stage {:?}", Stage::Shutdown);
        return Err(err.into());
    }

    if let Err(err) = host.framebuffer_status() {
        error!("framebuffer is not complete: {err}");
    }

    debug!("stage {:?}", Stage::FrameLoop);
    let mut queue = EventQueue::new();
    let mut frames = 0u64;
    while !state.should_close() {
        host.poll_events(&mut queue);
        state.update_timing(host.elapsed());
        for event in queue.drain() {
            state.handle_event(event);
        }
        state.process_input();

        let frame = state.build_frame(config);
        if let Err(source) = host.submit(&frame) {
            error!("frame {frames} failed: {source}");
            host.shutdown();
            return Err(RunError::Frame {
                frame: frames,
                source,
            });
        }
        frames += 1;
    }

    debug!("stage {:?}", Stage::Shutdown);
    host.shutdown();
    info!("rendered {frames} frames");
    Ok(RunReport {
        frames,
        stage: Stage::Shutdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_become_messages() {
        let err = InitError::from_panic("event loop", Box::new("no display"));
        assert_eq!(err.to_string(), "failed to initialize event loop: no display");
        let err = InitError::from_panic("window", Box::new(String::from("denied")));
        assert_eq!(err.to_string(), "failed to initialize window: denied");
        let err = InitError::from_panic("window", Box::new(7u8));
        assert_eq!(err.to_string(), "failed to initialize window: unknown panic");
    }

    #[test]
    fn report_includes_frame_cause() {
        let err = RunError::Frame {
            frame: 2,
            source: FrameError::OutOfMemory,
        };
        let report = err.report();
        assert!(report.starts_with("frame 2 failed"));
        assert!(report.contains("GPU is out of memory"));
    }
}
