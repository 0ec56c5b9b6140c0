//! The move oracle boundary.
//!
//! An oracle gets the current position (FEN) and answers with a move in
//! coordinate notation, or fails. The game never blocks on it: requests go
//! through an [`OracleHandle`], which is polled once per tick.

use crate::game_repr::MoveParseError;
use log::debug;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("an oracle request is already outstanding")]
    Busy,
    #[error("oracle worker is gone")]
    Disconnected,
    #[error("engine i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("engine closed its output")]
    EngineClosed,
    #[error("oracle has no move in this position")]
    NoMove,
    #[error("malformed oracle reply `{reply}`")]
    Malformed {
        reply: String,
        #[source]
        source: MoveParseError,
    },
    #[error("oracle rejected position `{0}`")]
    InvalidPosition(String),
}

/// Anything that can answer "what is the best move here?".
pub trait MoveOracle: Send {
    /// Best move for the side to move in `position`, in coordinate notation.
    fn best_move(&mut self, position: &str) -> Result<String, OracleError>;

    fn name(&self) -> &str;
}

type Reply = Result<String, OracleError>;

/// Owns an oracle and keeps at most one request outstanding.
pub enum OracleHandle {
    /// Answers on the caller's thread; the reply is held until the next poll.
    Inline {
        oracle: Box<dyn MoveOracle>,
        pending: Option<Reply>,
    },
    /// Answers on a worker thread.
    Threaded(ThreadedOracle),
}

impl OracleHandle {
    pub fn inline(oracle: impl MoveOracle + 'static) -> Self {
        OracleHandle::Inline {
            oracle: Box::new(oracle),
            pending: None,
        }
    }

    pub fn threaded(oracle: impl MoveOracle + 'static) -> Self {
        OracleHandle::Threaded(ThreadedOracle::spawn(Box::new(oracle)))
    }

    pub fn name(&self) -> &str {
        match self {
            OracleHandle::Inline { oracle, .. } => oracle.name(),
            OracleHandle::Threaded(worker) => &worker.name,
        }
    }

    /// True while a request has been sent and its reply not yet polled.
    pub fn is_waiting(&self) -> bool {
        match self {
            OracleHandle::Inline { pending, .. } => pending.is_some(),
            OracleHandle::Threaded(worker) => worker.in_flight,
        }
    }

    /// Send `position` to the oracle. Fails with [`OracleError::Busy`] if a
    /// previous request has not been polled yet.
    pub fn submit(&mut self, position: &str) -> Result<(), OracleError> {
        if self.is_waiting() {
            return Err(OracleError::Busy);
        }
        debug!("asking {} for a move in {position}", self.name());
        match self {
            OracleHandle::Inline { oracle, pending } => {
                *pending = Some(oracle.best_move(position));
                Ok(())
            }
            OracleHandle::Threaded(worker) => worker.submit(position),
        }
    }

    /// The reply to the outstanding request, once it is available.
    pub fn poll(&mut self) -> Option<Reply> {
        match self {
            OracleHandle::Inline { pending, .. } => pending.take(),
            OracleHandle::Threaded(worker) => worker.poll(),
        }
    }
}

/// An oracle running on its own thread, fed through a channel.
pub struct ThreadedOracle {
    name: String,
    requests: Option<Sender<String>>,
    replies: Receiver<Reply>,
    in_flight: bool,
    worker: Option<JoinHandle<()>>,
}

impl ThreadedOracle {
    fn spawn(mut oracle: Box<dyn MoveOracle>) -> Self {
        let name = oracle.name().to_owned();
        let (request_tx, request_rx) = mpsc::channel::<String>();
        let (reply_tx, reply_rx) = mpsc::channel();
        let worker = thread::spawn(move || {
            for position in request_rx {
                if reply_tx.send(oracle.best_move(&position)).is_err() {
                    break;
                }
            }
        });
        Self {
            name,
            requests: Some(request_tx),
            replies: reply_rx,
            in_flight: false,
            worker: Some(worker),
        }
    }

    fn submit(&mut self, position: &str) -> Result<(), OracleError> {
        let requests = self.requests.as_ref().ok_or(OracleError::Disconnected)?;
        requests
            .send(position.to_owned())
            .map_err(|_| OracleError::Disconnected)?;
        self.in_flight = true;
        Ok(())
    }

    fn poll(&mut self) -> Option<Reply> {
        if !self.in_flight {
            return None;
        }
        match self.replies.try_recv() {
            Ok(reply) => {
                self.in_flight = false;
                Some(reply)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.in_flight = false;
                Some(Err(OracleError::Disconnected))
            }
        }
    }
}

impl Drop for ThreadedOracle {
    fn drop(&mut self) {
        // closing the request channel ends the worker loop
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
