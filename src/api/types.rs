use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================================================
// Character
// ============================================================================

/// Life status as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterStatus {
    Alive,
    Dead,
    #[serde(rename = "unknown")]
    Unknown,
}

impl CharacterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CharacterStatus::Alive => "Alive",
            CharacterStatus::Dead => "Dead",
            CharacterStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CharacterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
    Genderless,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
            Gender::Genderless => "Genderless",
            Gender::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `{ name, url }` reference to an origin or location.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// A character record exactly as the API describes it.
///
/// Records are never mutated locally; a refresh replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub status: CharacterStatus,
    pub species: String,
    /// Sub-type; the API sends `""` when there is none.
    #[serde(rename = "type", default, deserialize_with = "empty_as_none")]
    pub kind: Option<String>,
    pub gender: Gender,
    pub origin: NamedRef,
    pub location: NamedRef,
    pub image: String,
    #[serde(default)]
    pub episode: Vec<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub created: String,
}

impl Character {
    /// "Appeared in N episode(s)"
    pub fn episode_summary(&self) -> String {
        let n = self.episode.len();
        format!("Appeared in {} episode{}", n, if n == 1 { "" } else { "s" })
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

// ============================================================================
// Envelopes
// ============================================================================

/// Pagination envelope returned alongside every list response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageInfo {
    pub count: u32,
    pub pages: u32,
    pub next: Option<String>,
    pub prev: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharactersPage {
    pub info: PageInfo,
    pub results: Vec<Character>,
}

/// Response of a multi-ID lookup.
///
/// `/character/1,2` returns an array but `/character/1` returns a bare
/// object, so the shape has to be decided at decode time and normalized
/// with [`CharacterBatch::into_vec`] before anything else sees it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CharacterBatch {
    Many(Vec<Character>),
    One(Box<Character>),
}

impl CharacterBatch {
    pub fn into_vec(self) -> Vec<Character> {
        match self {
            CharacterBatch::Many(list) => list,
            CharacterBatch::One(character) => vec![*character],
        }
    }
}

// ============================================================================
// Request parameters
// ============================================================================

/// Normalized parameters of a list request.
///
/// Doubles as the cache key of the characters query. Build keys through
/// [`normalized`](Self::normalized) so that two queries producing the same
/// URL compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharacterQuery {
    pub page: u32,
    pub name: Option<String>,
    pub status: Option<String>,
    pub species: Option<String>,
    pub gender: Option<String>,
}

impl Default for CharacterQuery {
    fn default() -> Self {
        Self {
            page: 1,
            name: None,
            status: None,
            species: None,
            gender: None,
        }
    }
}

impl CharacterQuery {
    /// Blank filters become `None` and `page` is at least 1.
    pub fn normalized(self) -> Self {
        let keep = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            page: self.page.max(1),
            name: keep(self.name),
            status: keep(self.status),
            species: keep(self.species),
            gender: keep(self.gender),
        }
    }

    /// Query-string pairs for the list endpoint.
    ///
    /// `page` is always sent; the filters only when they carry a value.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.max(1).to_string())];
        let filters = [
            ("name", &self.name),
            ("status", &self.status),
            ("species", &self.species),
            ("gender", &self.gender),
        ];
        for (key, value) in filters {
            if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                pairs.push((key, v.to_string()));
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalized_query_keys_match_their_url() {
        let blank = CharacterQuery {
            page: 0,
            name: Some(String::new()),
            status: Some("  ".to_string()),
            species: None,
            gender: Some("Female".to_string()),
        };
        let plain = CharacterQuery {
            gender: Some("Female".to_string()),
            ..CharacterQuery::default()
        };
        assert_eq!(blank.query_pairs(), plain.query_pairs());
        assert_eq!(blank.normalized(), plain);
    }

    const RICK: &str = r#"{
        "id": 1,
        "name": "Rick Sanchez",
        "status": "Alive",
        "species": "Human",
        "type": "",
        "gender": "Male",
        "origin": {"name": "Earth (C-137)", "url": "https://example.test/location/1"},
        "location": {"name": "Citadel of Ricks", "url": "https://example.test/location/3"},
        "image": "https://example.test/avatar/1.jpeg",
        "episode": ["https://example.test/episode/1", "https://example.test/episode/2"],
        "url": "https://example.test/character/1",
        "created": "2017-11-04T18:48:46.250Z"
    }"#;

    #[test]
    fn test_character_decodes_empty_type_as_none() {
        let c: Character = serde_json::from_str(RICK).unwrap();
        assert_eq!(c.id, 1);
        assert_eq!(c.status, CharacterStatus::Alive);
        assert_eq!(c.gender, Gender::Male);
        assert_eq!(c.kind, None);
        assert_eq!(c.origin.name, "Earth (C-137)");
        assert_eq!(c.episode.len(), 2);
    }

    #[test]
    fn test_character_decodes_lowercase_unknown() {
        let json = RICK
            .replace("\"Alive\"", "\"unknown\"")
            .replace("\"Male\"", "\"unknown\"")
            .replace("\"type\": \"\"", "\"type\": \"Parasite\"");
        let c: Character = serde_json::from_str(&json).unwrap();
        assert_eq!(c.status, CharacterStatus::Unknown);
        assert_eq!(c.gender, Gender::Unknown);
        assert_eq!(c.kind.as_deref(), Some("Parasite"));
    }

    #[test]
    fn test_batch_normalizes_single_object() {
        let batch: CharacterBatch = serde_json::from_str(RICK).unwrap();
        let list = batch.into_vec();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Rick Sanchez");
    }

    #[test]
    fn test_batch_normalizes_array() {
        let json = format!("[{},{}]", RICK, RICK.replace("\"id\": 1", "\"id\": 2"));
        let batch: CharacterBatch = serde_json::from_str(&json).unwrap();
        let ids: Vec<i64> = batch.into_vec().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_episode_summary_pluralization() {
        let mut c: Character = serde_json::from_str(RICK).unwrap();
        assert_eq!(c.episode_summary(), "Appeared in 2 episodes");
        c.episode.truncate(1);
        assert_eq!(c.episode_summary(), "Appeared in 1 episode");
    }

    #[test]
    fn test_query_pairs_omit_empty_filters() {
        let query = CharacterQuery {
            page: 2,
            name: Some("rick".into()),
            status: Some(String::new()),
            species: None,
            gender: Some("Male".into()),
        };
        assert_eq!(
            query.query_pairs(),
            vec![
                ("page", "2".to_string()),
                ("name", "rick".to_string()),
                ("gender", "Male".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_default_is_page_only() {
        assert_eq!(
            CharacterQuery::default().query_pairs(),
            vec![("page", "1".to_string())]
        );
    }
}
