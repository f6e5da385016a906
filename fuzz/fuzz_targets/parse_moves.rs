#![no_main]
use dropfour::connect_four::position::Position;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(position) = Position::from_moves(s) {
            assert_eq!(
                position.stones() as usize,
                s.chars().filter(|c| !c.is_whitespace()).count()
            );
        }
    }
});
