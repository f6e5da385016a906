use crate::connect_four::Column;

/// Search limits that can be passed to `go` and `scores`.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub(super) struct Limits {
    pub(super) movetime: Option<u64>,
    pub(super) iterations: Option<u32>,
}

#[derive(Debug, PartialEq)]
pub(super) enum Command {
    Uci,
    IsReady,
    SetOption {
        option: EngineOption,
        value: OptionValue,
    },
    SetPosition {
        moves: String,
    },
    Play {
        column: Column,
    },
    NewGame,
    Go(Limits),
    Scores(Limits),
    SelfPlay {
        movetime: Option<u64>,
    },
    Display,
    Quit,
    Unknown(String),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(super) enum EngineOption {
    MoveTime,
    Exploration,
    ExpansionThreshold,
    Seed,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub(super) enum OptionValue {
    Integer(u64),
    Float(f64),
}

fn parse_limits(parts: &[&str]) -> Limits {
    let mut limits = Limits::default();

    let mut i = 1;
    while i < parts.len() {
        match parts[i] {
            "movetime" if i + 1 < parts.len() => limits.movetime = parts[i + 1].parse().ok(),
            "iterations" if i + 1 < parts.len() => limits.iterations = parts[i + 1].parse().ok(),
            _ => {},
        }
        i += 2;
    }

    limits
}

fn parse_setoption(parts: &[&str]) -> Option<Command> {
    if parts.len() < 5 || parts[1] != "name" {
        return None;
    }
    let name_end = parts.iter().position(|&x| x == "value")?;
    let option = match parts[2..name_end].join(" ").as_str() {
        "MoveTime" => EngineOption::MoveTime,
        "Exploration" => EngineOption::Exploration,
        "ExpansionThreshold" => EngineOption::ExpansionThreshold,
        "Seed" => EngineOption::Seed,
        _ => return None,
    };
    let raw = parts.get(name_end + 1)?;
    let value = match option {
        EngineOption::Exploration => OptionValue::Float(raw.parse().ok()?),
        EngineOption::MoveTime | EngineOption::ExpansionThreshold | EngineOption::Seed => {
            OptionValue::Integer(raw.parse().ok()?)
        },
    };
    Some(Command::SetOption { option, value })
}

fn parse_setposition(parts: &[&str]) -> Command {
    let moves = parts
        .iter()
        .position(|&x| x == "moves")
        .map_or_else(String::new, |index| parts[index + 1..].join(" "));
    Command::SetPosition { moves }
}

impl Command {
    pub(super) fn parse(input: &str) -> Self {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let unknown = || Self::Unknown(input.trim().to_string());

        let Some(&command) = parts.first() else {
            return unknown();
        };

        match command {
            "uci" => Self::Uci,
            "isready" => Self::IsReady,
            "setoption" => parse_setoption(&parts).unwrap_or_else(unknown),
            "position" => parse_setposition(&parts),
            "play" if parts.len() == 2 => match Column::try_from(parts[1]) {
                Ok(column) => Self::Play { column },
                Err(_) => unknown(),
            },
            "newgame" => Self::NewGame,
            "go" => Self::Go(parse_limits(&parts)),
            "scores" => Self::Scores(parse_limits(&parts)),
            "selfplay" => Self::SelfPlay {
                movetime: parse_limits(&parts).movetime,
            },
            "d" => Self::Display,
            "quit" => Self::Quit,
            _ => unknown(),
        }
    }
}
