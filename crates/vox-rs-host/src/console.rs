//! Console command parsing.

use vox_rs_world::{BlockPos, BlockType};

/// Held movement key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKey {
    Forward,
    Back,
    Left,
    Right,
}

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Hold a movement key for some seconds.
    Move(MoveKey, f32),
    Stop,
    Jump,
    Yaw(f32),
    /// Yaw and pitch in degrees.
    Look(f32, f32),
    Place(BlockPos, BlockType),
    Break(BlockPos),
    Use,
    Dig,
    Pick,
    Pos,
    Save,
    Regen,
    Help,
    Quit,
}

pub const HELP: &[(&str, &str)] = &[
    ("forward|back|left|right <seconds>", "Hold a movement key"),
    ("stop", "Release all movement keys"),
    ("jump", "Jump on the next frame"),
    ("yaw <degrees>", "Turn to face a heading"),
    ("look <yaw> <pitch>", "Set heading and pitch in degrees"),
    ("place <x> <y> <z> [type]", "Place a block (default stone)"),
    ("break <x> <y> <z>", "Remove a block"),
    ("use", "Place stone against the block in view"),
    ("dig", "Remove the block in view"),
    ("pick", "Show the block in view"),
    ("pos", "Show the player state"),
    ("save", "Write the world to disk"),
    ("regen", "Generate fresh terrain"),
    ("quit", "Save and exit"),
];

/// Parse one console line. The error is a message for the user.
pub fn parse(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(name) = parts.next() else {
        return Err("Empty command".into());
    };
    let args: Vec<&str> = parts.collect();

    let key = match name {
        "forward" | "w" => Some(MoveKey::Forward),
        "back" | "s" => Some(MoveKey::Back),
        "left" | "a" => Some(MoveKey::Left),
        "right" | "d" => Some(MoveKey::Right),
        _ => None,
    };
    if let Some(key) = key {
        let seconds = match args.first() {
            Some(s) => parse_number(s, "seconds")?,
            None => 1.0,
        };
        if seconds < 0.0 {
            return Err(format!("Usage: {name} <seconds>"));
        }
        return Ok(Command::Move(key, seconds));
    }

    match name {
        "stop" => Ok(Command::Stop),
        "jump" | "space" => Ok(Command::Jump),
        "yaw" => match args.as_slice() {
            [deg] => Ok(Command::Yaw(parse_number(deg, "yaw")?)),
            _ => Err("Usage: yaw <degrees>".into()),
        },
        "look" => match args.as_slice() {
            [yaw, pitch] => Ok(Command::Look(
                parse_number(yaw, "yaw")?,
                parse_number(pitch, "pitch")?,
            )),
            _ => Err("Usage: look <yaw> <pitch>".into()),
        },
        "place" => match args.as_slice() {
            [x, y, z] => Ok(Command::Place(parse_pos(x, y, z)?, BlockType::Stone)),
            [x, y, z, ty] => {
                let block_type = ty
                    .parse::<BlockType>()
                    .map_err(|_| format!("Unknown block type: {ty}"))?;
                Ok(Command::Place(parse_pos(x, y, z)?, block_type))
            }
            _ => Err("Usage: place <x> <y> <z> [type]".into()),
        },
        "break" => match args.as_slice() {
            [x, y, z] => Ok(Command::Break(parse_pos(x, y, z)?)),
            _ => Err("Usage: break <x> <y> <z>".into()),
        },
        "use" => Ok(Command::Use),
        "dig" => Ok(Command::Dig),
        "pick" => Ok(Command::Pick),
        "pos" => Ok(Command::Pos),
        "save" => Ok(Command::Save),
        "regen" => Ok(Command::Regen),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        _ => Err(format!(
            "Unknown command: {name}. Type help for a list of commands."
        )),
    }
}

fn parse_number(s: &str, what: &str) -> Result<f32, String> {
    match s.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid {what}: {s}")),
    }
}

fn parse_pos(x: &str, y: &str, z: &str) -> Result<BlockPos, String> {
    let coord = |s: &str| {
        s.parse::<i32>()
            .map_err(|_| format!("Invalid coordinate: {s}"))
    };
    Ok(BlockPos::new(coord(x)?, coord(y)?, coord(z)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_commands() {
        assert_eq!(parse("forward 2"), Ok(Command::Move(MoveKey::Forward, 2.0)));
        assert_eq!(parse("left 0.5"), Ok(Command::Move(MoveKey::Left, 0.5)));
        assert_eq!(parse("back"), Ok(Command::Move(MoveKey::Back, 1.0)));
        assert_eq!(parse("d 3"), Ok(Command::Move(MoveKey::Right, 3.0)));
        assert!(parse("forward -1").is_err());
        assert!(parse("forward fast").is_err());
    }

    #[test]
    fn look_commands() {
        assert_eq!(parse("yaw 90"), Ok(Command::Yaw(90.0)));
        assert_eq!(parse("look -45 30"), Ok(Command::Look(-45.0, 30.0)));
        assert!(parse("look 10").is_err());
        assert!(parse("yaw NaN").is_err());
    }

    #[test]
    fn block_commands() {
        assert_eq!(
            parse("place 1 2 -3"),
            Ok(Command::Place(BlockPos::new(1, 2, -3), BlockType::Stone))
        );
        assert_eq!(
            parse("place 0 5 0 wood"),
            Ok(Command::Place(BlockPos::new(0, 5, 0), BlockType::Wood))
        );
        assert_eq!(parse("break 4 0 4"), Ok(Command::Break(BlockPos::new(4, 0, 4))));
        assert!(parse("place 0 0 0 lava").is_err());
        assert!(parse("place 0.5 0 0").is_err());
        assert!(parse("break 1 2").is_err());
    }

    #[test]
    fn simple_commands() {
        assert_eq!(parse("  jump "), Ok(Command::Jump));
        assert_eq!(parse("stop"), Ok(Command::Stop));
        assert_eq!(parse("use"), Ok(Command::Use));
        assert_eq!(parse("dig"), Ok(Command::Dig));
        assert_eq!(parse("pick"), Ok(Command::Pick));
        assert_eq!(parse("pos"), Ok(Command::Pos));
        assert_eq!(parse("save"), Ok(Command::Save));
        assert_eq!(parse("regen"), Ok(Command::Regen));
        assert_eq!(parse("help"), Ok(Command::Help));
        assert_eq!(parse("exit"), Ok(Command::Quit));
    }

    #[test]
    fn unknown_and_empty() {
        let err = parse("fly").unwrap_err();
        assert!(err.contains("Unknown command: fly"));
        assert!(parse("   ").is_err());
    }
}
