use flume::{Receiver, RecvError, SendError, Sender};
use tokio::sync::oneshot::{Sender as OneShotSender, channel as oneshot_channel};

use crate::folio_player::PlayerError;

type Request<TIn, TOut> = (TIn, Option<OneShotSender<TOut>>);

/// A command channel where the sender may optionally wait for a reply.
pub(crate) fn request_channel<TIn, TOut>() -> (RequestSender<TIn, TOut>, RequestReceiver<TIn, TOut>)
{
    let (tx, rx) = flume::unbounded();
    (RequestSender { tx }, RequestReceiver { rx, reply: None })
}

#[derive(Clone, Debug)]
pub(crate) struct RequestSender<TIn, TOut> {
    tx: Sender<Request<TIn, TOut>>,
}

#[derive(Debug)]
pub(crate) struct RequestReceiver<TIn, TOut> {
    rx: Receiver<Request<TIn, TOut>>,
    reply: Option<OneShotSender<TOut>>,
}

impl<TIn, TOut> RequestSender<TIn, TOut> {
    pub(crate) async fn send_async(&self, message: TIn) -> Result<(), PlayerError> {
        self.tx
            .send_async((message, None))
            .await
            .map_err(|_| PlayerError::Disconnected)
    }

    pub(crate) fn send(&self, message: TIn) -> Result<(), SendError<Request<TIn, TOut>>> {
        self.tx.send((message, None))
    }

    pub(crate) async fn get_response(&self, message: TIn) -> Result<TOut, PlayerError> {
        let (reply_tx, reply_rx) = oneshot_channel();
        self.tx
            .send_async((message, Some(reply_tx)))
            .await
            .map_err(|_| PlayerError::Disconnected)?;
        reply_rx.await.map_err(|_| PlayerError::Disconnected)
    }
}

impl<TIn, TOut> RequestReceiver<TIn, TOut> {
    pub(crate) async fn recv_async(&mut self) -> Result<TIn, RecvError> {
        let (message, reply) = self.rx.recv_async().await?;
        self.reply = reply;
        Ok(message)
    }

    /// Replies to the last received message, if its sender is waiting.
    pub(crate) fn respond(&mut self, response: TOut) -> Result<(), TOut> {
        match self.reply.take() {
            Some(reply) => reply.send(response),
            None => Ok(()),
        }
    }
}
