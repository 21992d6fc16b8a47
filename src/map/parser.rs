//! Map parsing functionality for converting raw board layouts into structured data.

use crate::constants::MapTile;
use crate::error::ParseError;
use glam::IVec2;

/// Structured representation of a parsed ASCII board.
#[derive(Debug, Clone)]
pub struct ParsedMap {
    pub width: i32,
    pub height: i32,
    /// Row-major tiles, `width * height` long.
    pub tiles: Vec<MapTile>,
    /// Starting cell for the player (marked by an `X` in the layout).
    pub player_start: Option<IVec2>,
}

/// Parser for converting raw board layouts into structured map data.
pub struct MapTileParser;

impl MapTileParser {
    /// Converts ASCII characters from the board layout into corresponding tile types.
    ///
    /// Walls (`#`), dots (`.`), power pellets (`o`), open floor (` `) and the tennis
    /// court (`~`). The player start marker `X` becomes an empty tile; its position is
    /// tracked separately by [`MapTileParser::parse_board`].
    ///
    /// # Errors
    ///
    /// Returns `ParseError::UnknownCharacter` for any character outside that vocabulary.
    pub fn parse_character(c: char) -> Result<MapTile, ParseError> {
        match c {
            '#' => Ok(MapTile::Wall),
            '.' => Ok(MapTile::Dot),
            'o' => Ok(MapTile::PowerPellet),
            ' ' => Ok(MapTile::Empty),
            '~' => Ok(MapTile::SpecialZone),
            'X' => Ok(MapTile::Empty),
            _ => Err(ParseError::UnknownCharacter(c)),
        }
    }

    /// Parses a raw board layout of any rectangular size.
    ///
    /// # Errors
    ///
    /// Returns an error if the board is empty or ragged, contains unknown characters,
    /// or marks more than one player start.
    pub fn parse_board(raw_board: &[&str]) -> Result<ParsedMap, ParseError> {
        let Some(first) = raw_board.first() else {
            return Err(ParseError::ParseFailed("Board has no rows".to_string()));
        };
        let width = first.chars().count();
        if width == 0 {
            return Err(ParseError::ParseFailed("Board has no columns".to_string()));
        }

        for (i, line) in raw_board.iter().enumerate() {
            let len = line.chars().count();
            if len != width {
                return Err(ParseError::ParseFailed(format!(
                    "Invalid board width at line {}: expected {}, got {}",
                    i, width, len
                )));
            }
        }

        let mut tiles = Vec::with_capacity(width * raw_board.len());
        let mut starts = Vec::new();

        for (y, line) in raw_board.iter().enumerate() {
            for (x, character) in line.chars().enumerate() {
                tiles.push(Self::parse_character(character)?);
                if character == 'X' {
                    starts.push(IVec2::new(x as i32, y as i32));
                }
            }
        }

        if starts.len() > 1 {
            return Err(ParseError::InvalidPlayerStartCount(starts.len()));
        }

        Ok(ParsedMap {
            width: width as i32,
            height: raw_board.len() as i32,
            tiles,
            player_start: starts.first().copied(),
        })
    }
}
