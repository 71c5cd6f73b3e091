//! Access-denied page.

use crate::access::explain_denial;
use leptos::prelude::*;
use leptos_router::hooks::use_query_map;

/// Tells a refused visitor why, when the reason is known.
#[component]
pub fn UnauthorizedPage() -> impl IntoView {
    let query = use_query_map();
    let notice = Resource::new(
        move || query.read().get("reason"),
        |reason| explain_denial(reason),
    );

    view! {
        <div class="login-page">
            <div class="login-box">
                <h1>"Access denied"</h1>
                <Suspense fallback=move || view! { <p>"Loading..."</p> }>
                    {move || {
                        notice.get().map(|result| {
                            let message = match result {
                                Ok(Some(notice)) => notice.message,
                                _ => "You are not authorized to access this dashboard.".to_string(),
                            };
                            view! { <p class="error-message">{message}</p> }
                        })
                    }}
                </Suspense>
                <a href="/auth/login" rel="external" class="login-button">"Sign in with another account"</a>
            </div>
        </div>
    }
}
