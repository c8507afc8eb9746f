use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};

use crate::{
    book::Book,
    command::{Command, Reply},
    core::library::Library,
    error::LibraryError,
    persist::{BookStore, PersistError},
};

use super::events::{LibraryEvent, Version};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error("persistence failed: {0}")]
    Persist(#[from] PersistError),
    #[error("library runtime has stopped")]
    ChannelClosed,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command_queue_bound: usize,
    pub persist_queue_bound: usize,
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 64,
            persist_queue_bound: 64,
            event_capacity: 256,
        }
    }
}

/// Cloneable handle to the task that owns the [`Library`].
///
/// All commands are applied one at a time by that task, so the catalogue,
/// shelves, and undo history never see concurrent access.
pub struct LibraryHandle {
    cmd_tx: mpsc::Sender<Request>,
    events_tx: broadcast::Sender<LibraryEvent>,
}

impl Clone for LibraryHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Request {
    Execute {
        command: Command,
        resp: oneshot::Sender<Result<Reply, RuntimeError>>,
    },
    Books {
        resp: oneshot::Sender<Vec<Book>>,
    },
    UndoLen {
        resp: oneshot::Sender<usize>,
    },
    Flush {
        resp: oneshot::Sender<Result<Version, RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
}

enum PersistMsg {
    Write {
        version: Version,
        books: Vec<Book>,
    },
    Flush {
        resp: oneshot::Sender<Result<Version, PersistError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Starts the owning task. With a store, the full catalogue is written
/// after every successful mutation; write failures are logged and reported
/// as [`LibraryEvent::PersistFailed`] without touching in-memory state.
pub fn spawn_library(
    library: Library,
    store: Option<Box<dyn BookStore>>,
    config: RuntimeConfig,
) -> LibraryHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel(config.command_queue_bound);
    let (events_tx, _) = broadcast::channel(config.event_capacity);

    let (persist_tx_opt, mut durable_rx) = if let Some(store) = store {
        let (persist_tx, persist_rx) = mpsc::channel(config.persist_queue_bound);
        let (durable_tx, durable_rx) = mpsc::unbounded_channel();
        spawn_persistence_worker(store, persist_rx, durable_tx);
        (Some(persist_tx), Some(durable_rx))
    } else {
        (None, None)
    };

    if let Some(tx) = persist_tx_opt.as_ref() {
        if library.reseated_on_load() > 0 {
            let books = library.books().to_vec();
            if tx.try_send(PersistMsg::Write { version: 0, books }).is_err() {
                tracing::warn!("could not queue rewrite of reseated catalogue");
            }
        }
    }

    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut library = library;
        let mut version: Version = 0;
        let mut durable_open = durable_rx.is_some();

        loop {
            if let Some(rx) = durable_rx.as_mut().filter(|_| durable_open) {
                tokio::select! {
                    req = cmd_rx.recv() => {
                        let Some(req) = req else { break; };
                        let done = handle_request(
                            req,
                            &mut library,
                            &mut version,
                            &events_tx_loop,
                            persist_tx_opt.as_ref(),
                        ).await;
                        if done {
                            break;
                        }
                    }
                    durable = rx.recv() => {
                        match durable {
                            Some(Ok(version)) => {
                                let _ = events_tx_loop.send(LibraryEvent::DurableUpTo { version });
                            }
                            Some(Err((version, message))) => {
                                let _ = events_tx_loop.send(LibraryEvent::PersistFailed { version, message });
                            }
                            None => durable_open = false,
                        }
                    }
                }
            } else {
                let Some(req) = cmd_rx.recv().await else { break; };
                let done = handle_request(
                    req,
                    &mut library,
                    &mut version,
                    &events_tx_loop,
                    persist_tx_opt.as_ref(),
                )
                .await;
                if done {
                    break;
                }
            }
        }
    });

    LibraryHandle { cmd_tx, events_tx }
}

impl LibraryHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<LibraryEvent> {
        self.events_tx.subscribe()
    }

    pub async fn execute(&self, command: Command) -> Result<Reply, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Request::Execute { command, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    pub async fn books(&self) -> Result<Vec<Book>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Request::Books { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    pub async fn undo_len(&self) -> Result<usize, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Request::UndoLen { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Waits until every queued write has reached storage. Fails with
    /// [`PersistError::Behind`] when the newest catalogue could not be
    /// written.
    pub async fn flush(&self) -> Result<Version, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Request::Flush { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Request::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }
}

async fn handle_request(
    req: Request,
    library: &mut Library,
    version: &mut Version,
    events_tx: &broadcast::Sender<LibraryEvent>,
    persist_tx: Option<&mpsc::Sender<PersistMsg>>,
) -> bool {
    match req {
        Request::Execute { command, resp } => {
            let mutating = command.is_mutating();
            let res = command.apply(library).map_err(RuntimeError::from);
            if let Ok(reply) = &res {
                if let Some(event) = event_for(reply) {
                    let _ = events_tx.send(event);
                }
                if mutating {
                    *version += 1;
                    if let Some(tx) = persist_tx {
                        enqueue_write(tx, *version, library.books().to_vec()).await;
                    } else {
                        let _ = events_tx.send(LibraryEvent::DurableUpTo { version: *version });
                    }
                }
            }
            let _ = resp.send(res);
        }
        Request::Books { resp } => {
            let _ = resp.send(library.books().to_vec());
        }
        Request::UndoLen { resp } => {
            let _ = resp.send(library.undo_len());
        }
        Request::Flush { resp } => {
            let out = if let Some(tx) = persist_tx {
                let (flush_tx, flush_rx) = oneshot::channel();
                if tx.send(PersistMsg::Flush { resp: flush_tx }).await.is_err() {
                    Err(RuntimeError::ChannelClosed)
                } else {
                    flush_rx
                        .await
                        .map_err(|_| RuntimeError::ChannelClosed)
                        .and_then(|r| r.map_err(RuntimeError::from))
                }
            } else {
                Ok(*version)
            };
            let _ = resp.send(out);
        }
        Request::Shutdown { resp } => {
            let out = if let Some(tx) = persist_tx {
                let (done_tx, done_rx) = oneshot::channel();
                if tx.send(PersistMsg::Shutdown { resp: done_tx }).await.is_err() {
                    Err(RuntimeError::ChannelClosed)
                } else {
                    done_rx.await.map_err(|_| RuntimeError::ChannelClosed)
                }
            } else {
                Ok(())
            };
            let _ = resp.send(out);
            return true;
        }
    }

    false
}

fn event_for(reply: &Reply) -> Option<LibraryEvent> {
    match reply {
        Reply::Added(book) => book.book_id.map(|id| LibraryEvent::BookAdded { id }),
        Reply::Deleted { book, .. } => book.book_id.map(|id| LibraryEvent::BookDeleted { id }),
        Reply::StatusChanged { book, .. } => book.book_id.map(|id| LibraryEvent::StatusChanged {
            id,
            borrowed: book.is_borrowed(),
        }),
        Reply::Undone(records) => Some(LibraryEvent::UndoApplied {
            count: records.len(),
        }),
        _ => None,
    }
}

async fn enqueue_write(tx: &mpsc::Sender<PersistMsg>, version: Version, books: Vec<Book>) {
    if tx.send(PersistMsg::Write { version, books }).await.is_err() {
        tracing::warn!(version, "persistence worker gone; catalogue not written");
    }
}

fn spawn_persistence_worker(
    store: Box<dyn BookStore>,
    mut rx: mpsc::Receiver<PersistMsg>,
    durable_tx: mpsc::UnboundedSender<Result<Version, (Version, String)>>,
) {
    let store = Arc::new(Mutex::new(store));
    tokio::spawn(async move {
        let mut last_durable: Version = 0;
        let mut requested: Version = 0;
        let mut last_error: Option<String> = None;
        let mut deferred: Option<PersistMsg> = None;

        loop {
            let msg = match deferred.take() {
                Some(msg) => msg,
                None => match rx.recv().await {
                    Some(msg) => msg,
                    None => break,
                },
            };
            match msg {
                PersistMsg::Write {
                    mut version,
                    mut books,
                } => {
                    // Each write carries the whole catalogue, so only the newest queued one matters.
                    while let Ok(next) = rx.try_recv() {
                        match next {
                            PersistMsg::Write {
                                version: newer,
                                books: newer_books,
                            } => {
                                version = newer;
                                books = newer_books;
                            }
                            other => {
                                deferred = Some(other);
                                break;
                            }
                        }
                    }
                    requested = requested.max(version);

                    let store_ref = Arc::clone(&store);
                    let res = tokio::task::spawn_blocking(move || {
                        let mut store = store_ref.blocking_lock();
                        store.write(&books)
                    })
                    .await
                    .map_err(|e| PersistError::Message(format!("join error: {e}")))
                    .and_then(|r| r);

                    match res {
                        Ok(()) => {
                            last_durable = last_durable.max(version);
                            last_error = None;
                            let _ = durable_tx.send(Ok(last_durable));
                        }
                        Err(err) => {
                            tracing::warn!(version, error = %err, "catalogue write failed");
                            last_error = Some(err.to_string());
                            let _ = durable_tx.send(Err((version, err.to_string())));
                        }
                    }
                }
                PersistMsg::Flush { resp } => {
                    let store_ref = Arc::clone(&store);
                    let res = tokio::task::spawn_blocking(move || {
                        let mut store = store_ref.blocking_lock();
                        store.flush()
                    })
                    .await
                    .map_err(|e| PersistError::Message(format!("join error: {e}")))
                    .and_then(|r| r);
                    let res = res.and_then(|()| match &last_error {
                        Some(reason) => Err(PersistError::Behind {
                            durable: last_durable,
                            requested,
                            reason: reason.clone(),
                        }),
                        None => Ok(last_durable),
                    });
                    let _ = resp.send(res);
                }
                PersistMsg::Shutdown { resp } => {
                    let store_ref = Arc::clone(&store);
                    let flushed = tokio::task::spawn_blocking(move || {
                        let mut store = store_ref.blocking_lock();
                        store.flush()
                    })
                    .await;
                    if let Ok(Err(err)) = flushed {
                        tracing::warn!(error = %err, "final flush failed");
                    }
                    let _ = resp.send(());
                    break;
                }
            }
        }
    });
}
