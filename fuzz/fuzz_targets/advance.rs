#![no_main]
use dropfour::connect_four::position::Position;
use dropfour::connect_four::{Column, HEIGHT, WIDTH};
use dropfour::environment::{Environment, WinningStatus};
use libfuzzer_sys::fuzz_target;
use pretty_assertions::assert_eq;

fuzz_target!(|data: &[u8]| {
    let mut position = Position::starting();
    for &byte in data {
        if position.is_done() {
            break;
        }
        let legal = position.legal_actions();
        let column = legal[usize::from(byte) % legal.len()];
        let before = position.clone();
        position.advance(column);

        assert_eq!(position.stones(), before.stones() + 1);
        assert_ne!(position.winning_status(), WinningStatus::Win);
        for x in 0..WIDTH {
            let height = (0..HEIGHT).take_while(|&y| position.cell(y, x).is_some()).count();
            assert!((height..HEIGHT).all(|y| position.cell(y, x).is_none()));
        }
        let legal = position.legal_actions();
        assert!(legal.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(
            legal.len(),
            Column::iter().filter(|c| position.cell(HEIGHT - 1, c.get()).is_none()).count()
        );
    }
});
