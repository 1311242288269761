//! Static routing configuration: products, organizations and infrastructure nodes.
//!
//! Built once (builtin or from the `CASCADE_CATALOG` worker variable) and only
//! ever handed out by shared reference.

use crate::models::{Department, Priority};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use wasm_bindgen::JsValue;
use worker::Env;

pub const CATALOG_VAR: &str = "CASCADE_CATALOG";

static CATALOG: OnceLock<Catalog> = OnceLock::new();

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductEntry {
    pub product: String,
    /// Short organization key, resolved through [`Catalog::organizations`].
    pub org: String,
    pub department: Department,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrganizationEntry {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    /// Iteration order decides which product wins when several match.
    pub products: Vec<ProductEntry>,
    pub organizations: Vec<OrganizationEntry>,
    pub infra_nodes: Vec<String>,
    #[serde(default = "default_org_key")]
    pub default_org: String,
}

fn default_org_key() -> String {
    "os".into()
}

impl Catalog {
    pub fn builtin() -> Self {
        let product = |product: &str, org: &str, priority: Priority| ProductEntry {
            product: product.into(),
            org: org.into(),
            department: Department::Products,
            priority,
        };
        let org = |key: &str, name: &str| OrganizationEntry {
            key: key.into(),
            name: name.into(),
        };

        Self {
            products: vec![
                product("roadcommand", "os", Priority::High),
                product("roadwork", "os", Priority::Medium),
                product("roadview", "studio", Priority::Medium),
                product("roadchain", "foundation", Priority::High),
                product("roadcoin", "foundation", Priority::Medium),
                product("cadence", "ai", Priority::Low),
                product("prism", "cloud", Priority::High),
            ],
            organizations: vec![
                org("os", "BlackRoad-OS"),
                org("ai", "BlackRoad-AI"),
                org("cloud", "BlackRoad-Cloud"),
                org("studio", "BlackRoad-Studio"),
                org("foundation", "BlackRoad-Foundation"),
                org("labs", "BlackRoad-Labs"),
            ],
            infra_nodes: ["octavia", "lucidia", "aria", "alice", "cecilia"]
                .iter()
                .map(|n| n.to_string())
                .collect(),
            default_org: default_org_key(),
        }
    }

    /// Parse an operator-supplied catalog. Keys are normalized to lowercase
    /// since every match against mention text is case-insensitive.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let mut catalog: Catalog =
            serde_json::from_str(text).map_err(|e| format!("invalid catalog json: {e}"))?;
        for entry in &mut catalog.products {
            entry.product = entry.product.to_ascii_lowercase();
        }
        for node in &mut catalog.infra_nodes {
            *node = node.to_ascii_lowercase();
        }
        if catalog.organization_name(&catalog.default_org).is_none() {
            return Err(format!(
                "default_org {:?} is not a known organization",
                catalog.default_org
            ));
        }
        if let Some(orphan) = catalog
            .products
            .iter()
            .find(|p| catalog.organization_name(&p.org).is_none())
        {
            return Err(format!(
                "product {:?} points at unknown organization {:?}",
                orphan.product, orphan.org
            ));
        }
        Ok(catalog)
    }

    /// Isolate-wide catalog, parsed on first use. The builtin applies only
    /// when no override is bound; a failed parse is returned and not cached.
    pub fn load(env: &Env) -> Result<&'static Self, String> {
        Self::load_into(&CATALOG, || read_override(env))
    }

    fn load_into<'a>(
        cell: &'a OnceLock<Catalog>,
        read: impl FnOnce() -> Result<Option<String>, String>,
    ) -> Result<&'a Self, String> {
        if let Some(catalog) = cell.get() {
            return Ok(catalog);
        }
        let catalog = match read()? {
            Some(text) => Self::from_json(&text)?,
            None => Self::builtin(),
        };
        Ok(cell.get_or_init(|| catalog))
    }

    pub fn product(&self, product: &str) -> Option<&ProductEntry> {
        self.products.iter().find(|p| p.product == product)
    }

    pub fn organization_name(&self, key: &str) -> Option<&str> {
        self.organizations
            .iter()
            .find(|o| o.key.eq_ignore_ascii_case(key))
            .map(|o| o.name.as_str())
    }

    /// Canonical name for `key`; unknown keys fall back to the default org.
    pub fn organization_or_default(&self, key: &str) -> String {
        self.organization_name(key)
            .or_else(|| self.organization_name(&self.default_org))
            .unwrap_or(&self.default_org)
            .to_string()
    }
}

/// `Ok(None)` only when the binding is absent. A binding of the wrong kind
/// (a secret, a KV namespace) is a configuration error.
fn read_override(env: &Env) -> Result<Option<String>, String> {
    let bound = js_sys::Reflect::has(env.as_ref(), &JsValue::from_str(CATALOG_VAR))
        .map_err(|_| "cannot inspect worker bindings".to_string())?;
    if !bound {
        return Ok(None);
    }
    env.var(CATALOG_VAR)
        .map(|var| Some(var.to_string()))
        .map_err(|e| format!("{CATALOG_VAR} is bound but not a plain variable: {e}"))
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
