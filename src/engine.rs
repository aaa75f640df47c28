use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{info, warn};

use crate::command::{Command, Response};
use crate::config::{ConfigStore, EngineConfig};
use crate::document::FeedDocument;
use crate::navigation;
use crate::scheduler::{LifecycleState, Scheduler};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine thread is no longer running")]
    Gone,
}

pub struct Engine<D: FeedDocument> {
    scheduler: Scheduler<D>,
    store: Arc<dyn ConfigStore>,
    location: String,
}

impl<D: FeedDocument> Engine<D> {
    pub fn new(store: Arc<dyn ConfigStore>, doc: D, location: impl Into<String>) -> Self {
        let location = location.into();
        let config = load_config(store.as_ref());
        let wants_active = config.is_active;
        let mut engine = Self {
            scheduler: Scheduler::new(doc, config),
            store,
            location,
        };
        info!("engine ready on {:?}", engine.location);
        if wants_active && navigation::is_feed_location(&engine.location) {
            engine.scheduler.start();
        }
        engine
    }

    pub fn state(&self) -> LifecycleState {
        self.scheduler.state()
    }

    pub fn scheduler(&self) -> &Scheduler<D> {
        &self.scheduler
    }

    pub fn handle(&mut self, command: Command) -> Response {
        match command {
            Command::Start => {
                if navigation::is_feed_location(&self.location) {
                    self.scheduler.start();
                } else {
                    info!("start ignored off the feed view ({})", self.location);
                }
                Response::ok()
            }
            Command::Stop => {
                self.scheduler.stop();
                Response::ok()
            }
            Command::UpdateConfig { config } => {
                self.scheduler.update_config(&config);
                Response::ok()
            }
            Command::GetStatus => Response::Status {
                is_active: self.scheduler.is_active(),
            },
        }
    }

    pub fn navigate(&mut self, location: impl Into<String>) {
        self.location = location.into();
        let is_active = load_config(self.store.as_ref()).is_active;
        if let Some(command) = navigation::decide(&self.location, is_active) {
            self.handle(command);
        }
    }

    pub fn into_document(self) -> D {
        self.scheduler.into_document()
    }
}

fn load_config(store: &dyn ConfigStore) -> EngineConfig {
    store.get().unwrap_or_else(|err| {
        warn!("using default config: {err:#}");
        EngineConfig::default()
    })
}

enum Envelope {
    Command(Command, Sender<Response>),
    Navigate(String),
    Shutdown,
}

enum Wake {
    Inbox(Option<Envelope>),
    Tick,
}

impl<D> Engine<D>
where
    D: FeedDocument + Send + 'static,
{
    pub fn spawn(self) -> EngineHandle<D> {
        let (inbox_tx, inbox_rx) = unbounded();
        let thread = thread::spawn(move || self.run(inbox_rx));
        EngineHandle {
            inbox: inbox_tx,
            thread: Some(thread),
        }
    }

    fn run(mut self, inbox: Receiver<Envelope>) -> D {
        loop {
            let wake = {
                let never = crossbeam_channel::never();
                let ticks = self.scheduler.ticker().unwrap_or(&never);
                crossbeam_channel::select! {
                    recv(inbox) -> msg => Wake::Inbox(msg.ok()),
                    recv(ticks) -> _ => Wake::Tick,
                }
            };

            match wake {
                Wake::Tick => {
                    self.scheduler.tick();
                }
                Wake::Inbox(Some(Envelope::Command(command, reply))) => {
                    let response = self.handle(command);
                    if reply.send(response).is_err() {
                        warn!("dropping response: requester went away");
                    }
                }
                Wake::Inbox(Some(Envelope::Navigate(location))) => self.navigate(location),
                Wake::Inbox(Some(Envelope::Shutdown)) | Wake::Inbox(None) => break,
            }
        }
        info!("engine shutting down");
        self.into_document()
    }
}

pub struct EngineHandle<D> {
    inbox: Sender<Envelope>,
    thread: Option<thread::JoinHandle<D>>,
}

impl<D> EngineHandle<D> {
    pub fn send(&self, command: Command) -> Result<Response, EngineError> {
        let (tx, rx) = bounded(1);
        self.inbox
            .send(Envelope::Command(command, tx))
            .map_err(|_| EngineError::Gone)?;
        rx.recv().map_err(|_| EngineError::Gone)
    }

    pub fn navigate(&self, location: impl Into<String>) -> Result<(), EngineError> {
        self.inbox
            .send(Envelope::Navigate(location.into()))
            .map_err(|_| EngineError::Gone)
    }

    pub fn shutdown(mut self) -> Option<D> {
        self.join()
    }

    fn join(&mut self) -> Option<D> {
        let thread = self.thread.take()?;
        let _ = self.inbox.send(Envelope::Shutdown);
        match thread.join() {
            Ok(doc) => Some(doc),
            Err(_) => {
                warn!("engine thread panicked");
                None
            }
        }
    }
}

impl<D> Drop for EngineHandle<D> {
    fn drop(&mut self) {
        self.join();
    }
}
