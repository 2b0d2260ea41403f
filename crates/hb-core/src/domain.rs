use std::fmt;

/// Platform status id (numeric, monotonically increasing per account).
///
/// Identifies both incoming mentions and the posts the bot creates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatusId(pub u64);

impl fmt::Display for StatusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for StatusId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(StatusId)
    }
}

/// A status that mentions the bot's account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mention {
    pub id: StatusId,
    /// Screen name of the author, without the leading `@`.
    pub author_handle: String,
    /// Screen names referenced in the status' own entity list, without `@`.
    pub mentioned_handles: Vec<String>,
}

/// Last processed mention. `None` means nothing has been processed yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub last_id: Option<StatusId>,
}

impl Cursor {
    pub fn at(id: StatusId) -> Self {
        Self { last_id: Some(id) }
    }
}
