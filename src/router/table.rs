//! Route definitions and the flattened route table.
//!
//! DESIGN
//! ======
//! Routes are declared as a tree of [`RouteDef`] and flattened once into
//! [`Route`] entries with absolute paths. A child that does not declare its
//! own meta inherits the parent's effective meta, so nesting a screen under
//! `/member/account` can never silently make it public.

#[cfg(test)]
#[path = "table_test.rs"]
mod table_test;

use crate::auth::Role;

/// Access requirements attached to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMeta {
    /// Unauthenticated users are sent to a login page.
    pub requires_auth: bool,
    /// Only users with this role may enter.
    pub role: Option<Role>,
    /// Login-style page that authenticated users are bounced away from.
    pub guest_only: bool,
}

impl Default for RouteMeta {
    fn default() -> Self {
        Self { requires_auth: true, role: None, guest_only: false }
    }
}

impl RouteMeta {
    /// Open to everyone.
    #[must_use]
    pub const fn public() -> Self {
        Self { requires_auth: false, role: None, guest_only: false }
    }

    /// Open to unauthenticated users only.
    #[must_use]
    pub const fn guest() -> Self {
        Self { requires_auth: false, role: None, guest_only: true }
    }

    /// Authenticated users holding `role`.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        Self { requires_auth: true, role: Some(role), guest_only: false }
    }
}

// =============================================================================
// ROUTE DEFINITIONS
// =============================================================================

/// One node of the declared route tree.
#[derive(Debug, Clone, Default)]
pub struct RouteDef {
    path: &'static str,
    name: Option<&'static str>,
    view: Option<&'static str>,
    meta: Option<RouteMeta>,
    children: Vec<RouteDef>,
}

impl RouteDef {
    /// `path` is absolute when it starts with `/`, otherwise relative to the parent.
    #[must_use]
    pub fn new(path: &'static str) -> Self {
        Self { path, ..Self::default() }
    }

    #[must_use]
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    #[must_use]
    pub fn view(mut self, view: &'static str) -> Self {
        self.view = Some(view);
        self
    }

    #[must_use]
    pub fn meta(mut self, meta: RouteMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    #[must_use]
    pub fn children(mut self, children: Vec<RouteDef>) -> Self {
        self.children = children;
        self
    }

    fn flatten_into(&self, parent_path: &str, parent_meta: RouteMeta, depth: usize, out: &mut Vec<Route>) {
        let path = join_path(parent_path, self.path);
        let meta = self.meta.unwrap_or(parent_meta);
        out.push(Route { path: path.clone(), name: self.name, view: self.view, meta, depth });
        for child in &self.children {
            child.flatten_into(&path, meta, depth + 1, out);
        }
    }
}

fn join_path(parent: &str, segment: &str) -> String {
    if segment.starts_with('/') {
        return normalize_path(segment);
    }
    if segment.is_empty() {
        return normalize_path(parent);
    }
    normalize_path(&format!("{}/{segment}", parent.trim_end_matches('/')))
}

/// Strip query/fragment and trailing slashes; the empty path becomes `/`.
#[must_use]
pub fn normalize_path(raw: &str) -> String {
    let path = raw.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

// =============================================================================
// FLATTENED TABLE
// =============================================================================

/// A navigable route with its effective meta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub name: Option<&'static str>,
    /// View identifier; rendering is outside this crate.
    pub view: Option<&'static str>,
    pub meta: RouteMeta,
    depth: usize,
}

impl Route {
    /// Standalone top-level route, outside any table.
    #[must_use]
    pub fn new(path: &str, meta: RouteMeta) -> Self {
        Self { path: normalize_path(path), name: None, view: None, meta, depth: 0 }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.path == "/"
    }
}

/// Flattened, resolvable set of routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Flatten `defs`. Top-level routes without meta get [`RouteMeta::default`].
    #[must_use]
    pub fn new(defs: &[RouteDef]) -> Self {
        let mut routes = Vec::new();
        for def in defs {
            def.flatten_into("/", RouteMeta::default(), 0, &mut routes);
        }
        Self { routes }
    }

    /// Match `path` exactly after normalization. When a parent and its
    /// empty-path child share a path, the deeper route wins.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let path = normalize_path(path);
        self.routes.iter().filter(|r| r.path == path).max_by_key(|r| r.depth)
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == Some(name))
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The admin/member portal route tree.
    #[must_use]
    pub fn portal() -> Self {
        Self::new(&portal_routes())
    }
}

/// Route tree of the admin and member portals.
#[must_use]
pub fn portal_routes() -> Vec<RouteDef> {
    let admin = RouteMeta::for_role(Role::Admin);
    let member = RouteMeta::for_role(Role::Member);

    vec![
        RouteDef::new("/").name("root"),
        RouteDef::new("/admin/login").name("admin-login").view("AdminLoginPage").meta(RouteMeta::guest()),
        RouteDef::new("/member/login").name("member-login").view("MemberLoginPage").meta(RouteMeta::guest()),
        RouteDef::new("/register").name("member-register").view("MemberRegisterView").meta(RouteMeta::public()),
        RouteDef::new("/admin").name("admin").view("AdminPage").meta(admin).children(vec![
            RouteDef::new("").name("admin-dashboard").view("admin/DashboardView"),
            RouteDef::new("services").name("admin-services").view("admin/ServicesView"),
            RouteDef::new("applications").name("admin-applications").view("admin/ApplicationsView"),
            RouteDef::new("announcements").name("admin-announcements").view("admin/AnnouncementsView"),
            RouteDef::new("activity-logs").name("admin-activity").view("admin/ActivityLogsView"),
            RouteDef::new("appointments").name("admin-appointments").view("admin/AppointmentsView"),
        ]),
        RouteDef::new("/member").name("member").view("MemberPage").meta(member).children(vec![
            RouteDef::new("").name("member-dashboard").view("pwd/MemberDashboardView"),
            RouteDef::new("services").name("member-services").view("pwd/MemberServicesView"),
            RouteDef::new("status").name("member-status").view("pwd/MemberApplicationStatusView"),
            RouteDef::new("appointments").name("member-appointments").view("pwd/MemberAppointmentView"),
            RouteDef::new("account").view("pwd/MemberAccountView").children(vec![
                RouteDef::new("").name("member-profile").view("pwd/MemberProfileView"),
                RouteDef::new("edit").name("member-edit-profile").view("pwd/MemberEditProfileView"),
                RouteDef::new("password").name("member-change-password").view("pwd/MemberChangePasswordView"),
            ]),
            RouteDef::new("support").name("member-help").view("pwd/MemberHelpAndSupportView"),
            RouteDef::new("accessibility").name("member-settings").view("pwd/MemberAccessibilitySettingsView"),
            RouteDef::new("announcements").name("member-announcements").view("pwd/MemberAnnouncementView"),
            RouteDef::new("history").name("member-history").view("pwd/MemberHistoryView"),
        ]),
    ]
}
