use std::fmt::{self, Display, Formatter};

use super::{as_to_dot, parse_as, AsDot, CodecError};

/// A route target `<as>:<index>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteTarget {
    pub as_number: u32,
    pub index: u32,
}

impl RouteTarget {
    pub fn parse(text: &str) -> Result<Self, CodecError> {
        let text = text.trim();
        let invalid = || CodecError::RouteTarget(text.to_string());
        let (as_number, index) = text.split_once(':').ok_or_else(invalid)?;
        Ok(Self {
            as_number: parse_as(as_number).map_err(|_| invalid())?,
            index: index.parse::<u32>().map_err(|_| invalid())?,
        })
    }

    pub fn as_dot(&self) -> AsDot {
        as_to_dot(self.as_number)
    }
}

impl Display for RouteTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.as_number, self.index)
    }
}
