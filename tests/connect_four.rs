use dropfour::connect_four::position::Position;
use dropfour::connect_four::{Column, HEIGHT, WIDTH};
use dropfour::environment::{Environment, Player, WinningStatus};
use pretty_assertions::assert_eq;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Plays random games and calls `check` after every move with the positions
/// before and after it.
fn random_games(seed: u64, games: usize, mut check: impl FnMut(&Position, Column, &Position)) {
    let mut rng = SmallRng::seed_from_u64(seed);
    for _ in 0..games {
        let mut position = Position::starting();
        while !position.is_done() {
            let actions = position.legal_actions();
            let action = actions[rng.gen_range(0..actions.len())];
            let previous = position.clone();
            position.advance(action);
            check(&previous, action, &position);
        }
    }
}

fn is_full(position: &Position, column: usize) -> bool {
    position.cell(HEIGHT - 1, column).is_some()
}

#[test]
fn legal_actions_are_ascending_and_open() {
    random_games(1, 300, |_, _, position| {
        let actions = position.legal_actions();
        assert!(actions.windows(2).all(|pair| pair[0] < pair[1]));
        for column in Column::iter() {
            assert_eq!(actions.contains(&column), !is_full(position, column.get()));
        }
    });
}

#[test]
fn one_column_at_most_closes_per_move() {
    random_games(2, 300, |previous, action, position| {
        let before = previous.legal_actions().len();
        let after = position.legal_actions().len();
        if is_full(position, action.get()) {
            assert_eq!(after, before - 1);
        } else {
            assert_eq!(after, before);
        }
    });
}

#[test]
fn stones_obey_gravity() {
    random_games(3, 300, |_, _, position| {
        for column in 0..WIDTH {
            let height = (0..HEIGHT)
                .take_while(|&row| position.cell(row, column).is_some())
                .count();
            assert!((height..HEIGHT).all(|row| position.cell(row, column).is_none()));
        }
    });
}

#[test]
fn turns_alternate() {
    random_games(4, 100, |previous, _, position| {
        assert_eq!(position.side_to_move(), !previous.side_to_move());
        assert_eq!(position.stones(), previous.stones() + 1);
        assert_ne!(position.is_first_player(), previous.is_first_player());
    });
}

#[test]
fn advancing_a_clone_keeps_the_original() {
    random_games(5, 50, |previous, _, position| {
        let snapshot = position.to_string();
        let mut clone = position.clone();
        if let Some(&action) = clone.legal_actions().first() {
            clone.advance(action);
        }
        assert_eq!(position.to_string(), snapshot);
        assert!(previous.stones() < position.stones());
    });
}

#[test]
fn games_end_with_loss_or_draw() {
    let mut outcomes = Vec::new();
    random_games(6, 500, |_, _, position| {
        if position.is_done() {
            outcomes.push(position.winning_status());
        }
    });
    assert_eq!(outcomes.len(), 500);
    assert!(outcomes
        .iter()
        .all(|&status| status == WinningStatus::Lose || status == WinningStatus::Draw));
    assert!(outcomes.contains(&WinningStatus::Lose));
}

#[test]
fn vertical_win_scenario() {
    let mut position = Position::starting();
    for column in [0u8, 6, 0, 6, 0, 6, 0] {
        assert!(!position.is_done());
        position.advance(Column::try_from(column).unwrap());
    }
    assert!(position.is_done());
    assert_ne!(position.winning_status(), WinningStatus::Ongoing);
    assert_eq!(
        (0..4).map(|row| position.cell(row, 0)).collect::<Vec<_>>(),
        vec![Some(Player::First); 4]
    );
}

#[test]
fn draw_by_exhaustion() {
    let position = Position::from_moves("436014551150160155104632660465204242223333").unwrap();
    assert!(position.is_done());
    assert_eq!(position.winning_status(), WinningStatus::Draw);
    assert!((0..WIDTH).all(|column| is_full(&position, column)));
}
