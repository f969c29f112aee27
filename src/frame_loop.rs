// frame_loop.rs

use crossbeam::channel::{never, select, tick, Receiver};
use log::{debug, info};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// The application side of a node: reacts to user commands and is ticked once
/// per frame.
pub trait FrameHandler<C> {
    fn command(&mut self, command: C) -> LoopControl;
    fn frame(&mut self) -> LoopControl;
}

/// Fixed-rate application loop, interleaving frame ticks with commands.
pub struct FrameLoop<C> {
    interval: Duration,
    commands: Receiver<C>,
}

impl<C> FrameLoop<C> {
    pub fn new(interval: Duration, commands: Receiver<C>) -> Self {
        FrameLoop { interval, commands }
    }

    /// Runs until the handler asks to exit. Returns the number of frames run.
    pub fn run<H: FrameHandler<C>>(&self, handler: &mut H) -> u64 {
        info!("Frame loop running every {:?}", self.interval);
        let ticker = tick(self.interval);
        let mut commands = self.commands.clone();
        let mut frames = 0;

        loop {
            select! {
                recv(commands) -> msg => match msg {
                    Ok(command) => {
                        if handler.command(command) == LoopControl::Exit {
                            break;
                        }
                    }
                    Err(_) => {
                        debug!("Command channel closed, running frames only");
                        commands = never();
                    }
                },
                recv(ticker) -> _ => {
                    frames += 1;
                    if handler.frame() == LoopControl::Exit {
                        break;
                    }
                }
            }
        }

        info!("Frame loop exited after {} frames", frames);
        frames
    }
}
