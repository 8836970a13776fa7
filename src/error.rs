/**
 * SgdReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::error;
use std::fmt;
use std::io;
use std::result;

/// Which side of the rating matrix an index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Item,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Entity::User => write!(f, "user"),
            Entity::Item => write!(f, "item"),
        }
    }
}

/// Everything that can abort a training run. None of these are retried, the caller has to fix
/// the input or the configuration and start over.
#[derive(Debug)]
pub enum Error {
    /// A rating stream was not specified or could not be opened.
    MissingInput(String),
    /// The number of factors or iterations is unset or zero, or a hyperparameter is invalid.
    Configuration(String),
    /// A rating references an id outside of the scanned dimensions.
    IndexOutOfRange { entity: Entity, index: usize, bound: usize },
    /// A token in a rating stream is not a number, or the stream ends mid-tuple.
    Parse { token: String, position: usize },
    /// A rating set without a single rating, all means over it would be undefined.
    EmptyInput(String),
    Io(io::Error),
}

pub type Result<T> = result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::MissingInput(ref what) => write!(f, "missing input: {}", what),
            Error::Configuration(ref what) => write!(f, "invalid configuration: {}", what),
            Error::IndexOutOfRange { entity, index, bound } => write!(
                f,
                "{} index {} is out of range, only {} {}s are known",
                entity, index, bound, entity
            ),
            Error::Parse { ref token, position } => {
                write!(f, "cannot parse token {:?} at position {}", token, position)
            }
            Error::EmptyInput(ref what) => write!(f, "no ratings in {}", what),
            Error::Io(ref cause) => write!(f, "io error: {}", cause),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref cause) => Some(cause),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(cause: io::Error) -> Self {
        Error::Io(cause)
    }
}

/// Fails with `IndexOutOfRange` unless `index < bound`.
pub fn check_index(entity: Entity, index: usize, bound: usize) -> Result<()> {
    if index < bound {
        Ok(())
    } else {
        Err(Error::IndexOutOfRange { entity, index, bound })
    }
}

#[cfg(test)]
mod tests {

    use error::{check_index, Entity, Error};

    #[test]
    fn index_checks() {
        assert!(check_index(Entity::User, 3, 4).is_ok());

        match check_index(Entity::Item, 4, 4) {
            Err(Error::IndexOutOfRange { entity, index, bound }) => {
                assert_eq!(entity, Entity::Item);
                assert_eq!(index, 4);
                assert_eq!(bound, 4);
            },
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn messages() {
        let failure = Error::IndexOutOfRange { entity: Entity::User, index: 9, bound: 8 };
        assert_eq!(failure.to_string(), "user index 9 is out of range, only 8 users are known");

        let failure = Error::Configuration(String::from("number of factors is not set"));
        assert_eq!(failure.to_string(), "invalid configuration: number of factors is not set");
    }
}
