use serde::Deserialize;
use tracing::{info, warn};

use super::types::{Category, InterviewKind};
use super::CategorySource;

/// Catalog bodies come either bare or wrapped in `data`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CatalogPayload {
    Wrapped { data: Vec<Category> },
    Bare(Vec<Category>),
}

impl CatalogPayload {
    pub(crate) fn into_categories(self) -> Vec<Category> {
        match self {
            CatalogPayload::Wrapped { data } => data,
            CatalogPayload::Bare(categories) => categories,
        }
    }
}

/// Fetch the catalog, falling back to the built-in list on any failure
pub async fn load_catalog(source: &dyn CategorySource) -> Vec<Category> {
    match source.categories().await {
        Ok(categories) if !categories.is_empty() => {
            info!("Loaded {} interview categories", categories.len());
            categories
        }
        Ok(_) => {
            warn!("Catalog is empty, using built-in categories");
            builtin_categories()
        }
        Err(e) => {
            warn!("Failed to fetch interview categories: {:#}", e);
            builtin_categories()
        }
    }
}

fn category(
    id: &str,
    title: &str,
    description: &str,
    kind: InterviewKind,
    icon: &str,
    duration: &str,
    skills: &[&str],
) -> Category {
    Category {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        kind,
        icon: icon.to_string(),
        duration: duration.to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
    }
}

/// Categories offered when the catalog service is unreachable
pub fn builtin_categories() -> Vec<Category> {
    vec![
        category(
            "software-engineer-technical",
            "Software Engineer – Technical",
            "Algorithmic problems, data structures, and coding challenges",
            InterviewKind::Technical,
            "code",
            "45-60 minutes",
            &["Algorithms", "Data Structures", "System Design"],
        ),
        category(
            "product-manager-role",
            "Product Manager – Role-based",
            "Product strategy, market analysis, and leadership scenarios",
            InterviewKind::RoleBased,
            "briefcase",
            "30-45 minutes",
            &["Strategy", "Analytics", "Communication"],
        ),
        category(
            "data-scientist-technical",
            "Data Scientist – Technical",
            "Machine learning, statistics, and data analysis",
            InterviewKind::Technical,
            "brain",
            "45-60 minutes",
            &["ML/AI", "Statistics", "Python/R"],
        ),
        category(
            "frontend-developer",
            "Frontend Developer – Technical",
            "React, JavaScript, CSS, and web development challenges",
            InterviewKind::Technical,
            "laptop",
            "40-50 minutes",
            &["React", "JavaScript", "CSS"],
        ),
        category(
            "general-interview",
            "General Interview",
            "Behavioral questions and general assessment",
            InterviewKind::RoleBased,
            "users",
            "30 minutes",
            &["Communication", "Problem Solving", "Leadership"],
        ),
    ]
}

/// Look a category up by id
pub fn find_category<'a>(categories: &'a [Category], id: &str) -> Option<&'a Category> {
    categories.iter().find(|c| c.id == id)
}
