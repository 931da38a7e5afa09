use std::path::{Path, PathBuf};

use crate::{
    error::ConfigError,
    models::{PersonaCandidate, PersonaType, PersonaVector},
};

const DEFAULT_TOP_K: usize = 5;

/// Source of retrieval-based persona suggestions
///
/// Used by the classifier to correct its prototype-distance confidence.
/// Implementations must be deterministic for identical input.
pub trait PersonaCandidateSource: Send + Sync {
    fn persona_candidates(&self, vector: &PersonaVector) -> Vec<PersonaCandidate>;
}

/// A playbook document describing one persona
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybookDocument {
    pub persona: PersonaType,
    pub content: String,
    pub source: PathBuf,
}

/// Retrieves persona candidates from the playbook corpus
///
/// Each document is embedded as its persona's prototype vector, and the
/// buyer vector is compared by cosine similarity. No model is involved.
#[derive(Debug, Clone)]
pub struct PlaybookRetriever {
    documents: Vec<PlaybookDocument>,
    top_k: usize,
}

impl PlaybookRetriever {
    pub fn new(documents: Vec<PlaybookDocument>) -> Self {
        Self {
            documents,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Loads `<playbook_dir>/personas/<persona>.md` documents
    pub fn load(playbook_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let personas_dir = playbook_dir.as_ref().join("personas");
        if !personas_dir.is_dir() {
            return Err(ConfigError::Missing(personas_dir.display().to_string()));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&personas_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
            .collect();
        // read_dir order is platform dependent
        paths.sort();

        let mut documents = Vec::new();
        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let persona = match stem.parse::<PersonaType>() {
                Ok(persona) => persona,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping playbook document");
                    continue;
                }
            };
            let content = std::fs::read_to_string(&path)?;
            documents.push(PlaybookDocument {
                persona,
                content,
                source: path,
            });
        }

        tracing::info!(
            dir = %personas_dir.display(),
            documents = documents.len(),
            "Loaded persona playbook"
        );

        Ok(Self::new(documents))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl PersonaCandidateSource for PlaybookRetriever {
    fn persona_candidates(&self, vector: &PersonaVector) -> Vec<PersonaCandidate> {
        let mut scored: Vec<(f64, &PlaybookDocument)> = self
            .documents
            .iter()
            .map(|doc| {
                let similarity = vector
                    .cosine_similarity(&doc.persona.prototype())
                    .clamp(0.0, 1.0);
                (similarity, doc)
            })
            .collect();

        // Stable: equal similarities keep document order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        scored
            .into_iter()
            .take(self.top_k)
            .map(|(similarity, doc)| PersonaCandidate {
                persona_name: doc.persona.as_str().to_string(),
                similarity,
                content: doc.content.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<PlaybookDocument> {
        PersonaType::ALL
            .iter()
            .map(|&persona| PlaybookDocument {
                persona,
                content: format!("# {}", persona.display_name()),
                source: PathBuf::from(format!("{}.md", persona)),
            })
            .collect()
    }

    #[test]
    fn test_prototype_retrieves_itself_first() {
        let retriever = PlaybookRetriever::new(corpus());
        let candidates =
            retriever.persona_candidates(&PersonaType::NegotiationFriendly.prototype());

        assert_eq!(candidates.len(), 5);
        assert_eq!(candidates[0].persona_name, "negotiation_friendly");
        assert!((candidates[0].similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_candidates_sorted_and_bounded() {
        let retriever = PlaybookRetriever::new(corpus()).with_top_k(10);
        let candidates =
            retriever.persona_candidates(&PersonaVector::new(10.0, 90.0, 30.0, 60.0, 0.0));

        assert_eq!(candidates.len(), 10);
        for pair in candidates.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
        assert!(candidates
            .iter()
            .all(|c| (0.0..=1.0).contains(&c.similarity)));
    }

    #[test]
    fn test_retrieval_is_deterministic() {
        let retriever = PlaybookRetriever::new(corpus());
        let vector = PersonaVector::new(70.0, 20.0, 80.0, 40.0, 30.0);
        assert_eq!(
            retriever.persona_candidates(&vector),
            retriever.persona_candidates(&vector)
        );
    }

    #[test]
    fn test_empty_corpus_returns_nothing() {
        let retriever = PlaybookRetriever::new(Vec::new());
        assert!(retriever
            .persona_candidates(&PersonaVector::neutral())
            .is_empty());
    }

    #[test]
    fn test_load_missing_directory() {
        let err = PlaybookRetriever::load("/nonexistent/playbook").unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_load_shipped_playbook() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/playbook");
        let retriever = PlaybookRetriever::load(dir).unwrap();
        assert_eq!(retriever.len(), PersonaType::ALL.len());
    }
}
