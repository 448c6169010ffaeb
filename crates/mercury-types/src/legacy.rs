//! Decoding of ledger records written before events carried a `kind` tag.
//!
//! Older records are flat objects with capitalised keys (`To`, `From`,
//! `Amount`, `Note`, `Link`, `Returns`, `Time`, `id`). Their variant is
//! implied by which endpoints are present: both is a transfer, `To` alone
//! is a mint, `From` alone is a burn. Numbers may arrive as floats.

use serde::Deserialize;
use serde_json::Value;

use crate::asset::{Asset, Assets};
use crate::currency::Currency;
use crate::error::TypeError;
use crate::event::{Burn, EventBody, Mint, StoredEvent, Transfer};
use crate::identity::{RecordId, User};

/// A record in the untagged shape.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LegacyRecord {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub amount: Value,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub returns: Option<Value>,
    #[serde(default)]
    pub time: Value,
    #[serde(default, rename = "id")]
    pub id: Value,
}

impl LegacyRecord {
    /// Parse the record at `position` of an export and convert it.
    pub fn decode(position: usize, raw: &Value) -> Result<StoredEvent, TypeError> {
        let record: LegacyRecord =
            serde_json::from_value(raw.clone()).map_err(|e| TypeError::LegacyRecord {
                position,
                reason: e.to_string(),
            })?;
        record.into_event(position)
    }

    /// Classify by endpoint presence and convert into a tagged event.
    pub fn into_event(self, position: usize) -> Result<StoredEvent, TypeError> {
        let malformed = |reason: String| TypeError::LegacyRecord { position, reason };

        let amount = whole_number(&self.amount)
            .map(Currency::from_micros)
            .ok_or_else(|| malformed(format!("unparsable amount {}", self.amount)))?;
        let commit_time = match &self.time {
            Value::Null => 0,
            other => {
                whole_number(other).ok_or_else(|| malformed(format!("unparsable time {other}")))?
            }
        };
        let returns = match &self.returns {
            None | Some(Value::Null) => Assets::new(),
            Some(value) => decode_assets(value)
                .ok_or_else(|| malformed(format!("unparsable returns {value}")))?,
        };
        let note = self.note.unwrap_or_default();

        let event = match (self.to, self.from) {
            (Some(to), Some(from)) => EventBody::Transfer(Transfer {
                from: User::new(from),
                to: User::new(to),
                amount,
                note,
                returns,
            }),
            (Some(to), None) => EventBody::Mint(Mint {
                to: User::new(to),
                amount,
                note,
            }),
            (None, Some(from)) => EventBody::Burn(Burn {
                from: User::new(from),
                amount,
                note,
                link: self.link.unwrap_or_default(),
                returns,
            }),
            (None, None) => return Err(malformed("record has neither To nor From".into())),
        };

        let record_id = match self.id {
            Value::String(id) => RecordId::from_string(id),
            Value::Null => RecordId::from_string(format!("legacy-{position:012}")),
            other => RecordId::from_string(other.to_string()),
        };

        Ok(StoredEvent::new(record_id, commit_time, event))
    }
}

/// A non-negative integer, also accepting floats with no fractional part.
fn whole_number(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

fn decode_assets(value: &Value) -> Option<Assets> {
    value
        .as_object()?
        .iter()
        .map(|(name, quantity)| Some((Asset::new(name.clone()), whole_number(quantity)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::event::EventKind;

    #[test]
    fn classifies_by_endpoint_presence() {
        let transfer = json!({"To": "b", "From": "a", "Amount": 5.0, "Note": "hi", "Time": 10.0, "id": "ledger:1"});
        let mint = json!({"To": "b", "Amount": 10000000, "Note": "Stipend", "Time": 11});
        let burn = json!({"From": "a", "Amount": 2, "Note": "buy", "Link": "/x", "Time": 12});

        let t = LegacyRecord::decode(0, &transfer).unwrap();
        assert_eq!(t.kind(), EventKind::Transfer);
        assert_eq!(t.record_id.as_str(), "ledger:1");
        assert_eq!(t.commit_time, 10);

        let m = LegacyRecord::decode(1, &mint).unwrap();
        assert_eq!(m.kind(), EventKind::Mint);
        assert!(m.event.is_stipend());
        assert_eq!(m.record_id.as_str(), "legacy-000000000001");

        let b = LegacyRecord::decode(2, &burn).unwrap();
        let EventBody::Burn(burn) = b.event else {
            panic!("expected burn");
        };
        assert_eq!(burn.link, "/x");
        assert_eq!(burn.amount, Currency::from_micros(2));
    }

    #[test]
    fn null_from_is_treated_as_absent() {
        let raw = json!({"To": "b", "From": null, "Amount": 1, "Time": 1});
        let event = LegacyRecord::decode(0, &raw).unwrap();
        assert_eq!(event.kind(), EventKind::Mint);
    }

    #[test]
    fn record_without_endpoints_is_rejected() {
        let raw = json!({"Amount": 1, "Time": 1});
        let err = LegacyRecord::decode(7, &raw).unwrap_err();
        assert!(matches!(err, TypeError::LegacyRecord { position: 7, .. }));
    }

    #[test]
    fn fractional_or_negative_amounts_are_rejected() {
        for amount in [json!(1.5), json!(-3), json!("ten"), Value::Null] {
            let raw = json!({"To": "b", "Amount": amount, "Time": 1});
            assert!(LegacyRecord::decode(0, &raw).is_err());
        }
    }

    #[test]
    fn returns_are_carried() {
        let raw = json!({"To": "b", "From": "a", "Amount": 1, "Time": 1, "Returns": {"hat": 2}});
        let event = LegacyRecord::decode(0, &raw).unwrap();
        let EventBody::Transfer(transfer) = event.event else {
            panic!("expected transfer");
        };
        assert_eq!(transfer.returns.get(&Asset::from("hat")), Some(&2));
    }
}
