use serde::{Deserialize, Serialize};

/// The closed set of fact types a `Memory` row can carry.
///
/// `ProjectConfig` is structural-only: it widens dedup/contradiction radii
/// like the other structural types but is not a type the Extractor is ever
/// instructed to emit on its own — it exists so callers that supply their
/// own typed facts (e.g. ingesting a config file) have a home for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryType {
    ProjectBrief,
    Architecture,
    TechContext,
    ProductContext,
    SessionSummary,
    Progress,
    ErrorSolution,
    Preference,
    LearnedPattern,
    ProjectConfig,
}

impl MemoryType {
    pub fn as_str(self) -> &'static str {
        match self {
            MemoryType::ProjectBrief => "project-brief",
            MemoryType::Architecture => "architecture",
            MemoryType::TechContext => "tech-context",
            MemoryType::ProductContext => "product-context",
            MemoryType::SessionSummary => "session-summary",
            MemoryType::Progress => "progress",
            MemoryType::ErrorSolution => "error-solution",
            MemoryType::Preference => "preference",
            MemoryType::LearnedPattern => "learned-pattern",
            MemoryType::ProjectConfig => "project-config",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "project-brief" => MemoryType::ProjectBrief,
            "architecture" => MemoryType::Architecture,
            "tech-context" => MemoryType::TechContext,
            "product-context" => MemoryType::ProductContext,
            "session-summary" => MemoryType::SessionSummary,
            "progress" => MemoryType::Progress,
            "error-solution" => MemoryType::ErrorSolution,
            "preference" => MemoryType::Preference,
            "learned-pattern" => MemoryType::LearnedPattern,
            "project-config" => MemoryType::ProjectConfig,
            _ => return None,
        })
    }

    /// Structural types get widened dedup and contradiction radii and never
    /// accumulate copies.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            MemoryType::ProjectBrief
                | MemoryType::Architecture
                | MemoryType::TechContext
                | MemoryType::ProductContext
                | MemoryType::ProjectConfig
        )
    }

    /// Versioning-skip types bypass the Versioner because they have their
    /// own aging rules instead.
    pub fn skips_versioning(self) -> bool {
        matches!(self, MemoryType::SessionSummary | MemoryType::Progress)
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
