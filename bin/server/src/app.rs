//! Main Leptos application component and routing.

use crate::access::get_access;
use crate::pages::{AdminPage, HomePage, LoginPage, UnauthorizedPage};
use crate::types::{AccessDecision, AdminInfo};
use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::{
    components::{Redirect, Route, Router, Routes},
    path,
};

/// How long to wait before asking again about an undecided session.
#[cfg(feature = "hydrate")]
const PENDING_RETRY: std::time::Duration = std::time::Duration::from_millis(500);

/// The main application component.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="Ignitus Admin"/>
        <Router>
            <main class="container">
                <Routes fallback=|| "Page not found.".into_view()>
                    <Route path=path!("/") view=HomePage/>
                    <Route path=path!("/login") view=LoginPage/>
                    <Route path=path!("/unauthorized") view=UnauthorizedPage/>
                    <Route
                        path=path!("/admin")
                        view=|| view! { <AdminRoute render=|admin: AdminInfo| view! { <AdminPage admin=admin/> }/> }
                    />
                </Routes>
            </main>
        </Router>
    }
}

/// Guards a protected view.
///
/// Renders `render` only once the server allows access. While the decision is
/// pending only a loading indicator is shown, and any other outcome navigates
/// away.
#[component]
pub fn AdminRoute<F, IV>(render: F) -> impl IntoView
where
    F: Fn(AdminInfo) -> IV + Clone + Send + Sync + 'static,
    IV: IntoView + 'static,
{
    let access = Resource::new(|| (), |_| get_access());

    view! {
        <Suspense fallback=move || view! { <p class="loading">"Loading..."</p> }>
            {move || {
                let render = render.clone();
                access.get().map(move |result| {
                    match result {
                        Ok(check) => match (check.decision, check.admin) {
                            (AccessDecision::Allow, Some(admin)) => render(admin).into_any(),
                            (AccessDecision::Redirect { target }, _) => view! {
                                <Redirect path=target/>
                            }.into_any(),
                            _ => {
                                #[cfg(feature = "hydrate")]
                                leptos::leptos_dom::helpers::set_timeout(
                                    move || access.refetch(),
                                    PENDING_RETRY,
                                );
                                view! { <p class="loading">"Loading..."</p> }.into_any()
                            }
                        },
                        Err(_) => view! {
                            <div>
                                <p>"Failed to check access. Please try again."</p>
                                <a href="/login">"Back to login"</a>
                            </div>
                        }.into_any(),
                    }
                })
            }}
        </Suspense>
    }
}
