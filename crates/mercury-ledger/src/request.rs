use serde::{Deserialize, Serialize};

use mercury_types::{Assets, Burn, Currency, EventBody, Mint, Transfer, User};

/// Request to move currency from one account to another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from: User,
    pub to: User,
    pub amount: Currency,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub returns: Assets,
}

impl TransferRequest {
    pub fn new(
        from: impl Into<User>,
        to: impl Into<User>,
        amount: Currency,
        note: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
            note: note.into(),
            returns: Assets::new(),
        }
    }

    pub fn with_returns(mut self, returns: Assets) -> Self {
        self.returns = returns;
        self
    }
}

impl From<TransferRequest> for EventBody {
    fn from(request: TransferRequest) -> Self {
        EventBody::Transfer(Transfer {
            from: request.from,
            to: request.to,
            amount: request.amount,
            note: request.note,
            returns: request.returns,
        })
    }
}

/// Request to create currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRequest {
    pub to: User,
    pub amount: Currency,
    #[serde(default)]
    pub note: String,
}

impl MintRequest {
    pub fn new(to: impl Into<User>, amount: Currency, note: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            amount,
            note: note.into(),
        }
    }
}

impl From<MintRequest> for EventBody {
    fn from(request: MintRequest) -> Self {
        EventBody::Mint(Mint {
            to: request.to,
            amount: request.amount,
            note: request.note,
        })
    }
}

/// Request to destroy currency, e.g. a purchase from the system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnRequest {
    pub from: User,
    pub amount: Currency,
    #[serde(default)]
    pub note: String,
    /// Reference to whatever the burn paid for.
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub returns: Assets,
}

impl BurnRequest {
    pub fn new(from: impl Into<User>, amount: Currency, note: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            amount,
            note: note.into(),
            link: String::new(),
            returns: Assets::new(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn with_returns(mut self, returns: Assets) -> Self {
        self.returns = returns;
        self
    }
}

impl From<BurnRequest> for EventBody {
    fn from(request: BurnRequest) -> Self {
        EventBody::Burn(Burn {
            from: request.from,
            amount: request.amount,
            note: request.note,
            link: request.link,
            returns: request.returns,
        })
    }
}
