//! Route → required scope declarations, built once at startup and read-only afterwards.

use std::collections::HashMap;

use axum::http::Method;

use crate::config::ConfigError;
use crate::services::auth::authorize::RequiredScope;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteScopeEntry {
    pub method: Method,
    pub path: String,
    pub required_scope: RequiredScope,
}

#[derive(Debug, Clone, Default)]
pub struct RouteScopeMap {
    entries: HashMap<(Method, String), RequiredScope>,
}

impl RouteScopeMap {
    pub fn builder() -> RouteScopeMapBuilder {
        RouteScopeMapBuilder::default()
    }

    pub fn required_scope(&self, method: &Method, path: &str) -> Option<&RequiredScope> {
        self.entries.get(&(method.clone(), path.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by path then method, for startup logging.
    pub fn entries(&self) -> Vec<RouteScopeEntry> {
        let mut entries: Vec<RouteScopeEntry> = self
            .entries
            .iter()
            .map(|((method, path), scope)| RouteScopeEntry {
                method: method.clone(),
                path: path.clone(),
                required_scope: scope.clone(),
            })
            .collect();
        entries.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| a.method.as_str().cmp(b.method.as_str()))
        });
        entries
    }
}

#[derive(Debug, Default)]
pub struct RouteScopeMapBuilder {
    declared: Vec<(Method, String, String)>,
}

impl RouteScopeMapBuilder {
    pub fn protect(mut self, method: Method, path: &str, scope: &str) -> Self {
        self.declared.push((method, path.to_string(), scope.to_string()));
        self
    }

    /// Invalid scopes and duplicate `(method, path)` pairs are fatal.
    pub fn build(self) -> Result<RouteScopeMap, ConfigError> {
        let mut entries = HashMap::with_capacity(self.declared.len());

        for (method, path, scope) in self.declared {
            if !path.starts_with('/') {
                return Err(ConfigError::Route(format!(
                    "{method} {path}: path must start with '/'"
                )));
            }
            let scope = RequiredScope::new(scope)?;
            let key = (method, path);
            if entries.contains_key(&key) {
                return Err(ConfigError::Route(format!(
                    "{} {} declared more than once",
                    key.0, key.1
                )));
            }
            entries.insert(key, scope);
        }

        Ok(RouteScopeMap { entries })
    }
}
