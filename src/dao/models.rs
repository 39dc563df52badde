//! Persisted representation of a session and the lenient decoding of older records.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::Value;
use serde_with::{DefaultOnError, DeserializeAs, serde_as};
use tracing::warn;

use crate::{
    dto::validation::validate_player_id,
    state::session::{Player, PlayerId, Session},
};

/// Session snapshot exactly as it is written to storage.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntity {
    /// Players in display order.
    pub players: Vec<PlayerEntity>,
    /// Session-wide hidden mode flag.
    pub hide_totals: bool,
}

/// One stored player record.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntity {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Merged score.
    pub score: i64,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
    /// Hidden-mode presses not merged yet.
    pub pending_delta: i64,
    /// Per-player reveal flag.
    pub revealed: bool,
}

impl From<&Player> for PlayerEntity {
    fn from(value: &Player) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name.clone(),
            score: value.score,
            created_at: value.created_at,
            pending_delta: value.pending_delta,
            revealed: value.revealed,
        }
    }
}

impl From<&Session> for SessionEntity {
    fn from(value: &Session) -> Self {
        Self {
            players: value.players().map(Into::into).collect(),
            hide_totals: value.hide_totals(),
        }
    }
}

/// Top-level shape accepted when reading. `players` must be an array; each entry is
/// decoded separately so one bad record does not discard the whole session.
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSessionEntity {
    players: Vec<Value>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    hide_totals: bool,
}

/// Player record as written by any schema version.
///
/// Fields added after the first release are optional and coerced; `id` and `name`
/// must be strings.
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlayerEntity {
    id: String,
    name: String,
    #[serde_as(as = "DefaultOnError<Option<LenientInt>>")]
    #[serde(default)]
    score: Option<i64>,
    #[serde_as(as = "DefaultOnError<Option<LenientInt>>")]
    #[serde(default)]
    created_at: Option<i64>,
    #[serde_as(as = "DefaultOnError<Option<LenientInt>>")]
    #[serde(default)]
    pending_delta: Option<i64>,
    // Only JSON booleans count; anything else loads hidden.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    revealed: bool,
}

impl RawPlayerEntity {
    fn into_player(self, now: i64) -> Player {
        Player {
            id: PlayerId::from(self.id),
            name: self.name,
            score: self.score.unwrap_or(0),
            created_at: self.created_at.unwrap_or(now),
            pending_delta: self.pending_delta.unwrap_or(0),
            revealed: self.revealed,
        }
    }
}

/// Accepts JSON integers, finite floats (truncated toward zero) and numeric strings.
struct LenientInt;

impl<'de> DeserializeAs<'de, i64> for LenientInt {
    fn deserialize_as<D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        coerce_int(&value).ok_or_else(|| D::Error::custom(format!("not a number: {value}")))
    }
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_u64().map(|n| i64::try_from(n).unwrap_or(i64::MAX)))
            .or_else(|| number.as_f64().and_then(float_to_int)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(float_to_int))
        }
        _ => None,
    }
}

fn float_to_int(value: f64) -> Option<i64> {
    // `as` saturates at the i64 bounds.
    value.is_finite().then(|| value.trunc() as i64)
}

/// Decode a stored snapshot.
///
/// Fails when the value is not JSON or has no `players` array. Individual entries
/// that cannot be represented (not an object, missing string `id`/`name`) and
/// entries repeating an id already seen are skipped with a warning.
pub fn decode_session(raw: &str, now: i64) -> serde_json::Result<Session> {
    let RawSessionEntity {
        players,
        hide_totals,
    } = serde_json::from_str(raw)?;

    let mut seen = HashSet::new();
    let mut restored = Vec::with_capacity(players.len());
    for (index, entry) in players.into_iter().enumerate() {
        match serde_json::from_value::<RawPlayerEntity>(entry) {
            Ok(player) => {
                if let Err(err) = validate_player_id(&player.id) {
                    warn!(index, id = %player.id, reason = %err.code, "skipping stored player with unaddressable id");
                    continue;
                }
                if !seen.insert(player.id.clone()) {
                    warn!(index, id = %player.id, "skipping stored player with duplicate id");
                    continue;
                }
                restored.push(player.into_player(now));
            }
            Err(err) => warn!(index, error = %err, "skipping unreadable stored player"),
        }
    }

    Ok(Session::restore(restored, hide_totals))
}

/// Encode a session into its stored JSON form.
pub fn encode_session(session: &Session) -> serde_json::Result<String> {
    serde_json::to_string(&SessionEntity::from(session))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_750_000_000_000;

    fn player(id: &str, name: &str, score: i64, pending_delta: i64, revealed: bool) -> Player {
        Player {
            id: id.into(),
            name: name.into(),
            score,
            created_at: 1_700_000_000_000,
            pending_delta,
            revealed,
        }
    }

    #[test]
    fn encode_uses_camel_case_schema() {
        let session = Session::restore(vec![player("a", "Ann", 3, -1, true)], true);
        let json: Value = serde_json::from_str(&encode_session(&session).unwrap()).unwrap();

        assert_eq!(json["hideTotals"], true);
        let ann = &json["players"][0];
        assert_eq!(ann["id"], "a");
        assert_eq!(ann["name"], "Ann");
        assert_eq!(ann["score"], 3);
        assert_eq!(ann["createdAt"], 1_700_000_000_000_i64);
        assert_eq!(ann["pendingDelta"], -1);
        assert_eq!(ann["revealed"], true);
    }

    #[test]
    fn round_trip_preserves_session() {
        let session = Session::restore(
            vec![
                player("a", "Ann", 3, 2, true),
                player("b", "Bob", -7, 0, false),
            ],
            true,
        );

        let decoded = decode_session(&encode_session(&session).unwrap(), NOW).unwrap();
        assert_eq!(decoded, session);
    }

    #[test]
    fn first_schema_records_get_defaults() {
        let raw = r#"{"players":[{"id":"a","name":"Ann","score":4,"createdAt":123}]}"#;
        let session = decode_session(raw, NOW).unwrap();

        assert!(!session.hide_totals());
        let ann = session.players().next().unwrap();
        assert_eq!(ann.name, "Ann");
        assert_eq!(ann.score, 4);
        assert_eq!(ann.created_at, 123);
        assert_eq!(ann.pending_delta, 0);
        assert!(!ann.revealed);
    }

    #[test]
    fn missing_numbers_default_and_created_at_uses_now() {
        let raw = r#"{"players":[{"id":"a","name":"Ann"}],"hideTotals":true}"#;
        let session = decode_session(raw, NOW).unwrap();

        let ann = session.players().next().unwrap();
        assert_eq!(ann.score, 0);
        assert_eq!(ann.created_at, NOW);
        assert!(session.hide_totals());
    }

    #[test]
    fn numbers_are_coerced() {
        let raw = r#"{"players":[
            {"id":"a","name":"Ann","score":"12","pendingDelta":-2.9,"createdAt":null},
            {"id":"b","name":"Bob","score":"abc","pendingDelta":true,"revealed":"yes"}
        ]}"#;
        let session = decode_session(raw, NOW).unwrap();
        let mut players = session.players();

        let ann = players.next().unwrap();
        assert_eq!(ann.score, 12);
        assert_eq!(ann.pending_delta, -2);
        assert_eq!(ann.created_at, NOW);

        let bob = players.next().unwrap();
        assert_eq!(bob.score, 0);
        assert_eq!(bob.pending_delta, 0);
        assert!(!bob.revealed);
    }

    #[test]
    fn non_boolean_hide_totals_is_false() {
        let raw = r#"{"players":[],"hideTotals":"yes"}"#;
        assert!(!decode_session(raw, NOW).unwrap().hide_totals());
    }

    #[test]
    fn non_boolean_revealed_is_false() {
        let raw = r#"{"players":[
            {"id":"a","name":"Ann","revealed":1},
            {"id":"b","name":"Bob","revealed":"yes"},
            {"id":"c","name":"Cid","revealed":true}
        ],"hideTotals":true}"#;
        let session = decode_session(raw, NOW).unwrap();

        let revealed: Vec<_> = session.players().map(|p| p.revealed).collect();
        assert_eq!(revealed, vec![false, false, true]);
    }

    #[test]
    fn players_must_be_an_array() {
        assert!(decode_session(r#"{"players":{}}"#, NOW).is_err());
        assert!(decode_session(r#"{"hideTotals":true}"#, NOW).is_err());
        assert!(decode_session("null", NOW).is_err());
        assert!(decode_session("not json", NOW).is_err());
    }

    #[test]
    fn unrepresentable_and_duplicate_entries_are_skipped() {
        let raw = r#"{"players":[
            {"id":"a","name":"Ann","score":1},
            42,
            {"name":"No id"},
            {"id":7,"name":"Numeric id"},
            {"id":"a","name":"Ann again","score":9},
            {"id":"b","name":"Bob"}
        ]}"#;
        let session = decode_session(raw, NOW).unwrap();

        let names: Vec<_> = session.players().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Bob"]);
        assert_eq!(session.player(&"a".into()).unwrap().score, 1);
    }

    #[test]
    fn ids_commands_cannot_address_are_skipped() {
        let long_id = "x".repeat(80);
        let raw = format!(
            r#"{{"players":[
                {{"id":"","name":"Empty"}},
                {{"id":"{long_id}","name":"Too long"}},
                {{"id":"bell\u0007","name":"Control"}},
                {{"id":"ok","name":"Kept"}}
            ]}}"#
        );
        let session = decode_session(&raw, NOW).unwrap();

        let names: Vec<_> = session.players().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Kept"]);
    }

    #[test]
    fn coerce_int_handles_edge_values() {
        assert_eq!(coerce_int(&Value::from(u64::MAX)), Some(i64::MAX));
        assert_eq!(coerce_int(&Value::from(" 5 ")), Some(5));
        assert_eq!(coerce_int(&Value::from("1e3")), Some(1000));
        assert_eq!(coerce_int(&Value::Bool(true)), None);
        assert_eq!(coerce_int(&Value::Null), None);
    }
}
