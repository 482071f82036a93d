//! Route table, access guard and navigator for the admin/member portals.

pub mod guard;
pub mod navigator;
pub mod table;

pub use guard::{GuardDecision, MEMBER_LOGIN_PATH, guard};
pub use navigator::{
    Navigation, NavigationError, NavigationReceiver, NavigationSender, NavigationSignal, Navigator,
    navigation_channel,
};
pub use table::{Route, RouteDef, RouteMeta, RouteTable, portal_routes};
