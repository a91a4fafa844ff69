//! The turn-synchronized game loop run over one connection.

use crate::board::{Board, Game, GameError, InvalidMoveError, Move, Outcome, Symbol};
use crate::common::{bind_stream, FramedStream};
use crate::message::{Message, MessageError};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("error sending frame: {0}")]
    SendFrame(io::Error),
    #[error("local move could not be applied: {0}")]
    Game(#[from] GameError),
}

/// Why the opponent's last frame ended the session.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error("illegal move: {0}")]
    Game(#[from] GameError),
}

/// Everything the session reports to whoever shows the game to the local player.
#[derive(Debug)]
pub enum Event {
    /// Snapshot after every applied move.
    Board(Board),
    /// A move is expected from the local player.
    YourTurn(Symbol),
    InvalidMove(InvalidMoveError),
    Won,
    Lost,
    Tie,
    /// The opponent closed the connection before the game was decided.
    Disconnected,
    PeerMisbehaved(PeerError),
}

pub trait Presenter {
    fn present(&mut self, event: Event);
}

impl Presenter for Vec<Event> {
    fn present(&mut self, event: Event) {
        self.push(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    LocalTurn,
    RemoteTurn,
    Finished,
}

/// One game against one opponent over `stream`.
///
/// The session owns the stream and closes it once, on entering [`State::Finished`].
pub struct Session<S> {
    stream: Option<FramedStream<S>>,
    game: Game,
    local: Symbol,
    state: State,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, local: Symbol) -> Self {
        let game = Game::new();
        let state = if game.turn() == local {
            State::LocalTurn
        } else {
            State::RemoteTurn
        };
        Self {
            stream: Some(bind_stream(stream)),
            game,
            local,
            state,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn local_symbol(&self) -> Symbol {
        self.local
    }

    /// Plays until the game is decided, the opponent goes away or `intents` closes.
    ///
    /// Returns [`Outcome::Undecided`] when the game was cut short.
    pub async fn run<P: Presenter>(
        &mut self,
        intents: &mut mpsc::Receiver<String>,
        presenter: &mut P,
    ) -> Result<Outcome, SessionError> {
        loop {
            let step = match self.state {
                State::LocalTurn => self.local_turn(intents, presenter).await,
                State::RemoteTurn => {
                    self.remote_turn(presenter).await;
                    Ok(())
                }
                State::Finished => return Ok(self.game.outcome()),
            };
            if let Err(err) = step {
                self.finish().await;
                return Err(err);
            }
        }
    }

    async fn local_turn<P: Presenter>(
        &mut self,
        intents: &mut mpsc::Receiver<String>,
        presenter: &mut P,
    ) -> Result<(), SessionError> {
        loop {
            presenter.present(Event::YourTurn(self.local));
            let Some(input) = intents.recv().await else {
                info!("local player left the game");
                self.finish().await;
                return Ok(());
            };
            match self.game.validate(&input) {
                Ok(mv) => {
                    // the opponent hears about the move before it lands here
                    self.send(mv).await?;
                    self.advance(mv, presenter).await?;
                    return Ok(());
                }
                Err(err) => {
                    debug!(%input, %err, "rejected local move");
                    presenter.present(Event::InvalidMove(err));
                }
            }
        }
    }

    async fn remote_turn<P: Presenter>(&mut self, presenter: &mut P) {
        let Some(stream) = self.stream.as_mut() else {
            self.state = State::Finished;
            return;
        };
        let frame = match stream.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(err)) => {
                warn!(%err, "error receiving frame");
                presenter.present(Event::Disconnected);
                self.finish().await;
                return;
            }
            None => {
                info!("opponent disconnected");
                presenter.present(Event::Disconnected);
                self.finish().await;
                return;
            }
        };

        let played = match Move::decode(&frame) {
            Ok(mv) => {
                debug!(%mv, "received move");
                self.advance(mv, presenter).await.map_err(PeerError::from)
            }
            Err(err) => Err(err.into()),
        };
        if let Err(err) = played {
            warn!(%err, "ending session on bad frame from opponent");
            presenter.present(Event::PeerMisbehaved(err));
            self.finish().await;
        }
    }

    async fn send(&mut self, mv: Move) -> Result<(), SessionError> {
        if let Some(stream) = self.stream.as_mut() {
            stream
                .send(mv.encode())
                .await
                .map_err(SessionError::SendFrame)?;
            debug!(%mv, "sent move");
        }
        Ok(())
    }

    /// Applies `mv` for whoever's turn it is and moves the state machine on.
    async fn advance<P: Presenter>(
        &mut self,
        mv: Move,
        presenter: &mut P,
    ) -> Result<(), GameError> {
        let outcome = self.game.apply(mv)?;
        presenter.present(Event::Board(*self.game.board()));
        match outcome {
            Outcome::Undecided => {
                self.state = match self.state {
                    State::LocalTurn => State::RemoteTurn,
                    _ => State::LocalTurn,
                };
            }
            Outcome::Winner(symbol) => {
                info!(winner = %symbol, moves = self.game.moves(), "game won");
                presenter.present(if symbol == self.local {
                    Event::Won
                } else {
                    Event::Lost
                });
                self.finish().await;
            }
            Outcome::Tie => {
                info!("game tied");
                presenter.present(Event::Tie);
                self.finish().await;
            }
        }
        Ok(())
    }

    async fn finish(&mut self) {
        self.state = State::Finished;
        if let Some(mut stream) = self.stream.take() {
            if let Err(err) = SinkExt::<Bytes>::close(&mut stream).await {
                debug!(%err, "error closing stream");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_symbol_starts_on_local_turn() {
        let (a, b) = tokio::io::duplex(64);
        assert_eq!(Session::new(a, Symbol::X).state(), State::LocalTurn);
        assert_eq!(Session::new(b, Symbol::O).state(), State::RemoteTurn);
    }

    #[tokio::test]
    async fn closed_intents_end_the_session_undecided() {
        let (a, _b) = tokio::io::duplex(64);
        let mut session = Session::new(a, Symbol::X);
        let (tx, mut rx) = mpsc::channel(1);
        drop(tx);
        let mut events = Vec::new();
        let outcome = session.run(&mut rx, &mut events).await.unwrap();
        assert_eq!(outcome, Outcome::Undecided);
        assert_eq!(session.state(), State::Finished);
        assert_eq!(session.game().moves(), 0);
    }
}
