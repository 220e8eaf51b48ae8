use thiserror::Error;

use super::LOGIN_ROUTE;

/// Redirect hops followed before giving up
const MAX_REDIRECTS: usize = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("No route matches {0}")]
    NotFound(String),

    #[error("Redirect loop while resolving {0}")]
    RedirectLoop(String),
}

/// One entry in the route tree. Child paths are relative to the parent.
///
/// `requires_auth` is inherited: a child without its own flag takes the
/// nearest ancestor's value.
#[derive(Debug, Clone, Default)]
pub struct RouteRecord {
    pub path: String,
    pub name: Option<String>,
    pub requires_auth: Option<bool>,
    pub redirect: Option<String>,
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn requires_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = Some(requires_auth);
        self
    }

    pub fn redirect(mut self, to: impl Into<String>) -> Self {
        self.redirect = Some(to.into());
        self
    }

    pub fn child(mut self, child: RouteRecord) -> Self {
        self.children.push(child);
        self
    }
}

/// Outcome of resolving a path: the destination and its effective flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub path: String,
    pub name: Option<String>,
    pub requires_auth: bool,
}

/// A flattened route with inherited flags.
#[derive(Debug, Clone)]
struct FlatRoute {
    path: String,
    name: Option<String>,
    requires_auth: bool,
    redirect: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    // Deepest records first so a child with an empty path wins over its layout
    routes: Vec<FlatRoute>,
}

impl RouteTable {
    pub fn new(records: Vec<RouteRecord>) -> Self {
        let mut routes = Vec::new();
        for record in &records {
            Self::flatten(record, "", false, &mut routes);
        }
        Self { routes }
    }

    /// The platform's route tree.
    pub fn default_app() -> Self {
        let layout = |path: &str, default_child: &str| {
            RouteRecord::new(path)
                .requires_auth(true)
                .child(RouteRecord::new("").redirect(default_child))
        };

        Self::new(vec![
            RouteRecord::new("/").redirect(LOGIN_ROUTE),
            RouteRecord::new(LOGIN_ROUTE).named("Login").requires_auth(false),
            RouteRecord::new("/register").named("Register").requires_auth(false),
            RouteRecord::new("/dashboard")
                .requires_auth(true)
                .child(RouteRecord::new("").named("Dashboard")),
            layout("/ai-analysis", "/ai-analysis/image-comparison")
                .child(RouteRecord::new("image-comparison").named("ImageComparison"))
                .child(RouteRecord::new("object-detection").named("ObjectDetection"))
                .child(RouteRecord::new("image-recognition").named("ImageRecognition")),
            layout("/data-processing", "/data-processing/excel-analysis")
                .child(RouteRecord::new("excel-analysis").named("ExcelAnalysis"))
                .child(RouteRecord::new("data-clustering").named("DataClustering"))
                .child(RouteRecord::new("data-cleaning").named("DataCleaning")),
            layout("/ml-training", "/ml-training/create")
                .child(RouteRecord::new("yolo").named("YOLOTraining"))
                .child(RouteRecord::new("create").named("MLTrainingCreate"))
                .child(RouteRecord::new("tasks").named("MLTrainingTasks"))
                .child(RouteRecord::new("models").named("MLModels")),
        ])
    }

    fn flatten(record: &RouteRecord, parent: &str, inherited: bool, out: &mut Vec<FlatRoute>) {
        let path = Self::join(parent, &record.path);
        let requires_auth = record.requires_auth.unwrap_or(inherited);

        for child in &record.children {
            Self::flatten(child, &path, requires_auth, out);
        }
        out.push(FlatRoute {
            path,
            name: record.name.clone(),
            requires_auth,
            redirect: record.redirect.clone(),
        });
    }

    fn join(parent: &str, path: &str) -> String {
        if path.starts_with('/') {
            return Self::normalize(path);
        }
        if path.is_empty() {
            return Self::normalize(parent);
        }
        Self::normalize(&format!("{}/{}", parent.trim_end_matches('/'), path))
    }

    /// Drop query, fragment and trailing slashes.
    fn normalize(path: &str) -> String {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        }
    }

    fn find(&self, path: &str) -> Option<&FlatRoute> {
        self.routes.iter().find(|r| r.path == path)
    }

    /// Resolve a path, following redirects.
    pub fn resolve(&self, path: &str) -> Result<ResolvedRoute, RouteError> {
        let mut current = Self::normalize(path);
        for _ in 0..=MAX_REDIRECTS {
            let route = self
                .find(&current)
                .ok_or_else(|| RouteError::NotFound(current.clone()))?;
            match &route.redirect {
                Some(to) => current = Self::normalize(to),
                None => {
                    return Ok(ResolvedRoute {
                        path: route.path.clone(),
                        name: route.name.clone(),
                        requires_auth: route.requires_auth,
                    })
                }
            }
        }
        Err(RouteError::RedirectLoop(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(RouteTable::normalize(""), "/");
        assert_eq!(RouteTable::normalize("/"), "/");
        assert_eq!(RouteTable::normalize("/dashboard/"), "/dashboard");
        assert_eq!(RouteTable::normalize("dashboard"), "/dashboard");
        assert_eq!(RouteTable::normalize("/ml-training/tasks?page=2#top"), "/ml-training/tasks");
    }

    #[test]
    fn test_resolve_public_routes() {
        let table = RouteTable::default_app();
        let login = table.resolve("/login").unwrap();
        assert_eq!(login.name.as_deref(), Some("Login"));
        assert!(!login.requires_auth);

        let register = table.resolve("/register").unwrap();
        assert!(!register.requires_auth);
    }

    #[test]
    fn test_children_inherit_requires_auth() {
        let table = RouteTable::default_app();
        let route = table.resolve("/ml-training/yolo").unwrap();
        assert_eq!(route.name.as_deref(), Some("YOLOTraining"));
        assert!(route.requires_auth);

        let route = table.resolve("/dashboard").unwrap();
        assert_eq!(route.name.as_deref(), Some("Dashboard"));
        assert!(route.requires_auth);
    }

    #[test]
    fn test_child_can_override_inherited_flag() {
        let table = RouteTable::new(vec![RouteRecord::new("/docs")
            .requires_auth(true)
            .child(RouteRecord::new("public").requires_auth(false))
            .child(RouteRecord::new("private"))]);

        assert!(!table.resolve("/docs/public").unwrap().requires_auth);
        assert!(table.resolve("/docs/private").unwrap().requires_auth);
    }

    #[test]
    fn test_redirects_are_followed() {
        let table = RouteTable::default_app();
        assert_eq!(table.resolve("/").unwrap().path, "/login");
        assert_eq!(table.resolve("/ml-training").unwrap().path, "/ml-training/create");
        assert_eq!(
            table.resolve("/ai-analysis/").unwrap().path,
            "/ai-analysis/image-comparison"
        );
    }

    #[test]
    fn test_unknown_route() {
        let table = RouteTable::default_app();
        assert_eq!(
            table.resolve("/nowhere"),
            Err(RouteError::NotFound("/nowhere".to_string()))
        );
    }

    #[test]
    fn test_redirect_loop() {
        let table = RouteTable::new(vec![
            RouteRecord::new("/a").redirect("/b"),
            RouteRecord::new("/b").redirect("/a"),
        ]);
        assert_eq!(table.resolve("/a"), Err(RouteError::RedirectLoop("/a".to_string())));
    }
}
