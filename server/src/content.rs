use crate::config::{ContentConfig, ContentSourceType, LANGUAGE_PLACEHOLDER};
use crate::error::ContentError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::game_logic::utils::normalize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default = "default_category_icon")]
    pub icon: String,
}

fn default_category_icon() -> String {
    "❓".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "cat", alias = "category")]
    pub category_id: String,
    #[serde(rename = "diff", alias = "difficulty")]
    pub difficulty: String,
    #[serde(rename = "q", alias = "prompt")]
    pub prompt: String,
    #[serde(rename = "a", alias = "answer")]
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WildcardQuestion {
    #[serde(rename = "q", alias = "prompt")]
    pub prompt: String,
    #[serde(rename = "a", alias = "answer")]
    pub answer: String,
}

/// Anything that can be drawn without repetition.
pub trait Identified {
    /// Key used for no-repeat bookkeeping.
    fn identity(&self) -> String;
}

impl Identified for Question {
    fn identity(&self) -> String {
        format!(
            "{}|{}|{}",
            normalize(&self.category_id),
            normalize(&self.difficulty),
            self.prompt
        )
    }
}

impl Identified for WildcardQuestion {
    fn identity(&self) -> String {
        self.prompt.clone()
    }
}

// Root data structure matching the JSON schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentBundle {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default, rename = "fearQuestions", alias = "wildcardQuestions")]
    pub wildcard_questions: Vec<WildcardQuestion>,
}

impl ContentBundle {
    pub fn category(&self, category_id: &str) -> Option<&Category> {
        let wanted = normalize(category_id);
        self.categories.iter().find(|c| normalize(&c.id) == wanted)
    }
}

pub struct ContentParser;

impl ContentParser {
    /// Parse one language's question bank. Either the whole document parses or nothing is accepted.
    #[tracing::instrument(skip(content), fields(content.length = content.len()))]
    pub fn parse_bundle(content: &str) -> Result<ContentBundle, ContentError> {
        tracing::debug!("Parsing JSON question bank");

        let bundle: ContentBundle = serde_json::from_str(content)
            .map_err(|e| ContentError::Parse(format!("Failed to parse JSON: {}", e)))?;

        if bundle.categories.is_empty() {
            tracing::warn!("Question bank has no categories");
        }

        Ok(bundle)
    }
}

/// Source of language-tagged question banks.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch_bundle(&self, language: &str) -> Result<ContentBundle, ContentError>;
}

/// Reads the question bank from a file or URL template chosen by configuration.
#[derive(Debug, Clone)]
pub struct ConfiguredContentStore {
    config: ContentConfig,
}

impl ConfiguredContentStore {
    pub fn new(config: ContentConfig) -> Self {
        Self { config }
    }

    #[tracing::instrument(skip(self), fields(data.source_type = ?self.config.source_type))]
    async fn load_raw_content(&self, language: &str) -> Result<String, ContentError> {
        match self.config.source_type {
            ContentSourceType::File => {
                let template = self.config.file_path.as_ref().ok_or_else(|| {
                    ContentError::Config("File path required for file source".to_string())
                })?;
                let file_path = expand_language(template, language);
                tracing::debug!(file.path = %file_path, "Loading question bank from file");
                tokio::fs::read_to_string(&file_path)
                    .await
                    .map_err(|e| ContentError::FileRead {
                        path: file_path.clone(),
                        source: e,
                    })
            }
            ContentSourceType::Http => {
                let template = self.config.http_url.as_ref().ok_or_else(|| {
                    ContentError::Config("HTTP URL required for http source".to_string())
                })?;
                let url = expand_language(template, language);
                tracing::debug!(http.url = %url, "Fetching question bank from URL");
                let response = reqwest::get(&url).await.map_err(|e| ContentError::HttpFetch {
                    url: url.clone(),
                    source: e,
                })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(ContentError::HttpStatus {
                        url,
                        status: status.as_u16(),
                    });
                }

                response.text().await.map_err(|e| ContentError::HttpFetch {
                    url: url.clone(),
                    source: e,
                })
            }
        }
    }
}

#[async_trait]
impl ContentStore for ConfiguredContentStore {
    #[tracing::instrument(skip(self))]
    async fn fetch_bundle(&self, language: &str) -> Result<ContentBundle, ContentError> {
        let raw_content = self.load_raw_content(language).await?;
        let bundle = ContentParser::parse_bundle(&raw_content)?;

        tracing::info!(
            content.language = %language,
            categories.count = bundle.categories.len(),
            questions.count = bundle.questions.len(),
            wildcard.count = bundle.wildcard_questions.len(),
            "Loaded question bank"
        );

        Ok(bundle)
    }
}

fn expand_language(template: &str, language: &str) -> String {
    template.replace(LANGUAGE_PLACEHOLDER, language)
}


#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
  "categories": [
    { "id": "SCIENCE", "name": "Science", "tag": "Lab", "icon": "🔬" },
    { "id": "ART", "name": "Art" }
  ],
  "questions": [
    { "cat": "SCIENCE", "diff": "hard", "q": "What is H2O?", "a": "Water" },
    { "cat": "ART", "diff": "easy", "q": "Who painted the Mona Lisa?", "a": "Leonardo" }
  ],
  "fearQuestions": [
    { "q": "Name a fear of spiders", "a": "Arachnophobia" }
  ]
}"#;

    #[test]
    fn test_parse_json_data() {
        let bundle = ContentParser::parse_bundle(SAMPLE).unwrap();
        assert_eq!(bundle.categories.len(), 2);
        assert_eq!(bundle.categories[1].icon, "❓");
        assert_eq!(bundle.categories[1].tag, "");
        assert_eq!(bundle.questions[0].category_id, "SCIENCE");
        assert_eq!(bundle.questions[0].difficulty, "hard");
        assert_eq!(bundle.questions[1].answer, "Leonardo");
        assert_eq!(bundle.wildcard_questions.len(), 1);
    }

    #[test]
    fn test_missing_sections_are_empty() {
        let bundle = ContentParser::parse_bundle(r#"{ "categories": [] }"#).unwrap();
        assert!(bundle.questions.is_empty());
        assert!(bundle.wildcard_questions.is_empty());
    }

    #[test]
    fn test_long_form_keys_are_accepted() {
        let bundle = ContentParser::parse_bundle(
            r#"{
  "questions": [
    { "category": "ART", "difficulty": "easy", "prompt": "P", "answer": "A" }
  ],
  "wildcardQuestions": [{ "prompt": "W", "answer": "X" }]
}"#,
        )
        .unwrap();
        assert_eq!(bundle.questions[0].prompt, "P");
        assert_eq!(bundle.wildcard_questions[0].answer, "X");
    }

    #[test]
    fn test_malformed_bundle_is_rejected_whole() {
        let result = ContentParser::parse_bundle(
            r#"{ "categories": [{ "id": "ART", "name": "Art" }], "questions": [{ "cat": "ART" }] }"#,
        );
        assert!(matches!(result, Err(ContentError::Parse(_))));

        let result = ContentParser::parse_bundle("not json");
        assert!(matches!(result, Err(ContentError::Parse(_))));
    }

    #[test]
    fn test_question_identity_ignores_case_and_whitespace() {
        let a = Question {
            category_id: " Science ".to_string(),
            difficulty: "HARD".to_string(),
            prompt: "What is H2O?".to_string(),
            answer: "Water".to_string(),
        };
        let b = Question {
            category_id: "science".to_string(),
            difficulty: "hard ".to_string(),
            prompt: "What is H2O?".to_string(),
            answer: "H2O is water".to_string(),
        };
        assert_eq!(a.identity(), b.identity());

        let c = Question {
            prompt: "what is H2O?".to_string(),
            ..b.clone()
        };
        assert_ne!(b.identity(), c.identity());
    }

    #[test]
    fn test_category_lookup_is_normalized() {
        let bundle = ContentParser::parse_bundle(SAMPLE).unwrap();
        assert_eq!(bundle.category(" science").map(|c| c.name.as_str()), Some("Science"));
        assert!(bundle.category("MUSIC").is_none());
    }

    #[tokio::test]
    async fn test_file_store_expands_language_template() {
        let dir = std::env::temp_dir().join(format!("brain-battle-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("questions.sv.json"), SAMPLE)
            .await
            .unwrap();

        let store = ConfiguredContentStore::new(ContentConfig {
            source_type: ContentSourceType::File,
            file_path: Some(format!("{}/questions.{{lang}}.json", dir.display())),
            http_url: None,
            default_language: "sv".to_string(),
        });

        let bundle = store.fetch_bundle("sv").await.unwrap();
        assert_eq!(bundle.questions.len(), 2);

        let missing = store.fetch_bundle("de").await;
        assert!(matches!(missing, Err(ContentError::FileRead { .. })));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_http_store_requires_url() {
        let store = ConfiguredContentStore::new(ContentConfig {
            source_type: ContentSourceType::Http,
            file_path: None,
            http_url: None,
            default_language: "en".to_string(),
        });
        let result = store.fetch_bundle("en").await;
        assert!(matches!(result, Err(ContentError::Config(_))));
    }
}
