use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use ttt_duel::{Game, GameError, Move, Outcome, Symbol};

fn all_moves() -> Vec<Move> {
    (0..3)
        .flat_map(|row| (0..3).map(move |col| Move::new(row, col).unwrap()))
        .collect()
}

#[test]
fn random_games_end_exactly_once() {
    let mut rng = StdRng::seed_from_u64(0x7177);
    let mut ties = 0;
    for _ in 0..2000 {
        let mut order = all_moves();
        order.shuffle(&mut rng);
        let mut game = Game::new();

        for (i, &mv) in order.iter().enumerate() {
            let mover = game.turn();
            assert_eq!(mover, if i % 2 == 0 { Symbol::X } else { Symbol::O });
            let outcome = game.apply(mv).unwrap();
            assert_eq!(game.moves() as usize, i + 1);
            assert_eq!(game.turn(), mover.opponent());

            match outcome {
                Outcome::Undecided => assert!(i < 8),
                Outcome::Tie => {
                    assert_eq!(i, 8);
                    assert_eq!(game.board().winner(), None);
                    ties += 1;
                }
                Outcome::Winner(symbol) => {
                    assert_eq!(symbol, mover);
                    assert_eq!(game.board().winner(), Some(symbol));
                }
            }

            if outcome.is_terminal() {
                let board = *game.board();
                if let Some(&next) = order.get(i + 1) {
                    assert_eq!(game.apply(next), Err(GameError::Finished));
                }
                assert_eq!(*game.board(), board);
                assert_eq!(game.outcome(), outcome);
                break;
            }
        }
        assert!(game.is_finished());
    }
    assert!(ties > 0);
}
