//! Top navigation bar: links plus a session-dependent right-hand control.
use tracing::instrument;

use super::overlay::{DismissableOverlay, PointerEvents, Rect};
use super::routes::Route;
use crate::model::Identity;
use crate::pages::PageContext;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub route: Route,
}

/// Rightmost header control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionControl {
    LoginButton,
    /// `identity` is `None` while a restored credential is still unconfirmed.
    ProfileMenu { identity: Option<Identity>, open: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    pub links: Vec<NavLink>,
    pub control: SessionControl,
}

impl HeaderView {
    pub fn shows_login(&self) -> bool {
        self.control == SessionControl::LoginButton
    }
}

/// The persistent header. Owns the profile dropdown, whose outside-press
/// listener is released when the navbar is dropped.
#[derive(Debug)]
pub struct Navbar {
    ctx: PageContext,
    profile_menu: DismissableOverlay,
}

impl Navbar {
    pub fn mount(ctx: PageContext, events: &PointerEvents) -> Self {
        Self {
            ctx,
            profile_menu: DismissableOverlay::mount(events),
        }
    }

    /// Current session, with the profile menu forced shut once it is signed out.
    fn session(&self) -> Session {
        let session = self.ctx.session.snapshot();
        if !session.is_authenticated() {
            self.profile_menu.close();
        }
        session
    }

    pub fn view(&self) -> HeaderView {
        let session = self.session();
        build_header(&session, self.profile_menu.is_open())
    }

    /// No-op while signed out; there is no menu to open.
    pub fn toggle_profile_menu(&self) -> bool {
        if !self.session().is_authenticated() {
            return false;
        }
        self.profile_menu.toggle()
    }

    pub fn is_profile_menu_open(&self) -> bool {
        self.session();
        self.profile_menu.is_open()
    }

    /// Where the profile menu (toggle button included) was drawn.
    pub fn set_profile_menu_bounds(&self, bounds: Rect) {
        self.profile_menu.set_bounds(bounds);
    }

    #[instrument(skip_all)]
    pub async fn sign_out(&self) {
        self.ctx.session.logout().await;
        self.profile_menu.close();
        self.ctx.navigator.navigate(Route::Feed);
    }
}

pub fn build_header(session: &Session, menu_open: bool) -> HeaderView {
    let mut links = vec![NavLink {
        label: "Feed",
        route: Route::Feed,
    }];
    let control = if session.is_authenticated() {
        links.push(NavLink {
            label: "Post Article",
            route: Route::CreateArticle,
        });
        SessionControl::ProfileMenu {
            identity: session.identity.clone(),
            open: menu_open,
        }
    } else {
        SessionControl::LoginButton
    };
    HeaderView { links, control }
}
