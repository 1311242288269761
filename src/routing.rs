//! Waterfall routing: organization first, then department.
//!
//! Each rule fully overrides the ones below it; signals are never merged.

use crate::catalog::Catalog;
use crate::classifier::has_any;
use crate::models::{Action, Department, Intent};

const CLOUD_ORG: &str = "cloud";
const AI_ORG: &str = "ai";
const STUDIO_ORG: &str = "studio";

/// Pick the target organization for an intent.
///
/// 1. first detected product -> its owning org
/// 2. infrastructure keyword or node reference -> cloud
/// 3. "ai" / "model" -> ai
/// 4. "design" / "ui" -> studio
/// 5. caller fallback, else the catalog default
pub fn route_organization(catalog: &Catalog, intent: &Intent, fallback_org: Option<&str>) -> String {
    let hay = intent.raw_text.to_lowercase();

    if let Some(entry) = intent.products.first().and_then(|p| catalog.product(p)) {
        return catalog.organization_or_default(&entry.org);
    }
    if hay.contains("infrastructure") || !intent.infra_refs.is_empty() {
        return catalog.organization_or_default(CLOUD_ORG);
    }
    if has_any(&hay, &["ai", "model"]) {
        return catalog.organization_or_default(AI_ORG);
    }
    if has_any(&hay, &["design", "ui"]) {
        return catalog.organization_or_default(STUDIO_ORG);
    }

    match fallback_org.map(str::trim).filter(|org| !org.is_empty()) {
        Some(org) => catalog
            .organization_name(org)
            .map(str::to_string)
            .unwrap_or_else(|| org.to_string()),
        None => catalog.organization_or_default(&catalog.default_org),
    }
}

/// Any product reference sends work to the products department, whatever
/// verb came with it. Otherwise the action decides.
pub fn resolve_department(intent: &Intent) -> Department {
    if !intent.products.is_empty() {
        return Department::Products;
    }
    match intent.action {
        Action::Deploy | Action::Monitor => Department::Infrastructure,
        Action::Enhance | Action::Fix => Department::Products,
        Action::Test => Department::Testing,
        Action::Docs => Department::Documentation,
        Action::Review => Department::Security,
        Action::General => Department::General,
    }
}
