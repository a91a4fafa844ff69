mod board;
mod common;
mod connection;
mod message;
mod session;

pub use board::{
    evaluate, Board, Cell, Game, GameError, InvalidMoveError, Move, Outcome, Symbol,
};
pub use common::{ChunkCodec, MAX_READ};
pub use connection::{connect, establish, host, Connection, ConnectionError, Host, Role};
pub use message::{Message, MessageError};
pub use session::{Event, PeerError, Presenter, Session, SessionError, State};
