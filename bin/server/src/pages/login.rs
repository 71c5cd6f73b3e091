//! Login page component.

use leptos::prelude::*;

/// Login page - redirects to the identity provider.
#[component]
pub fn LoginPage() -> impl IntoView {
    view! {
        <div class="login-page">
            <div class="login-box">
                <h1>"Ignitus Admin"</h1>
                <p>"Administrators sign in with their Google account."</p>
                <a href="/auth/login" rel="external" class="login-button">"Sign in with Google"</a>
            </div>
        </div>
    }
}
