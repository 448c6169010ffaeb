use std::fmt;

use serde::{Deserialize, Serialize};

use crate::asset::Assets;
use crate::currency::Currency;
use crate::identity::{RecordId, User};

/// Note carried by mints that are stipend grants.
pub const STIPEND_NOTE: &str = "Stipend";

/// Classification of ledger events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Transfer,
    Mint,
    Burn,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Transfer => "transfer",
            Self::Mint => "mint",
            Self::Burn => "burn",
        };
        f.write_str(s)
    }
}

/// Balance-preserving move of currency between two accounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: User,
    pub to: User,
    pub amount: Currency,
    #[serde(default)]
    pub note: String,
    #[serde(default, skip_serializing_if = "Assets::is_empty")]
    pub returns: Assets,
}

/// Creation of currency credited to one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mint {
    pub to: User,
    pub amount: Currency,
    #[serde(default)]
    pub note: String,
}

impl Mint {
    /// Whether this mint is a stipend grant.
    pub fn is_stipend(&self) -> bool {
        self.note == STIPEND_NOTE
    }
}

/// Destruction of currency debited from one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Burn {
    pub from: User,
    pub amount: Currency,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Assets::is_empty")]
    pub returns: Assets,
}

/// Payload of a ledger event, tagged by `kind` on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventBody {
    Transfer(Transfer),
    Mint(Mint),
    Burn(Burn),
}

impl EventBody {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Transfer(_) => EventKind::Transfer,
            Self::Mint(_) => EventKind::Mint,
            Self::Burn(_) => EventKind::Burn,
        }
    }

    pub fn amount(&self) -> Currency {
        match self {
            Self::Transfer(t) => t.amount,
            Self::Mint(m) => m.amount,
            Self::Burn(b) => b.amount,
        }
    }

    pub fn note(&self) -> &str {
        match self {
            Self::Transfer(t) => &t.note,
            Self::Mint(m) => &m.note,
            Self::Burn(b) => &b.note,
        }
    }

    /// The debited account, if any.
    pub fn sender(&self) -> Option<&User> {
        match self {
            Self::Transfer(t) => Some(&t.from),
            Self::Mint(_) => None,
            Self::Burn(b) => Some(&b.from),
        }
    }

    /// The credited account, if any.
    pub fn recipient(&self) -> Option<&User> {
        match self {
            Self::Transfer(t) => Some(&t.to),
            Self::Mint(m) => Some(&m.to),
            Self::Burn(_) => None,
        }
    }

    /// Whether `user` is the sender or recipient.
    pub fn involves(&self, user: &User) -> bool {
        self.sender() == Some(user) || self.recipient() == Some(user)
    }

    pub fn is_stipend(&self) -> bool {
        matches!(self, Self::Mint(m) if m.is_stipend())
    }
}

/// An event as committed to the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub record_id: RecordId,
    /// Milliseconds since the UNIX epoch, assigned at commit.
    pub commit_time: u64,
    pub event: EventBody,
}

impl StoredEvent {
    pub fn new(record_id: RecordId, commit_time: u64, event: EventBody) -> Self {
        Self {
            record_id,
            commit_time,
            event,
        }
    }

    /// Replay order key: commit time, then record id.
    pub fn order_key(&self) -> (u64, &RecordId) {
        (self.commit_time, &self.record_id)
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    pub fn involves(&self, user: &User) -> bool {
        self.event.involves(user)
    }
}
